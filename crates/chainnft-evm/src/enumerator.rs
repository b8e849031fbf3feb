//! Token listing for a collection.
//!
//! Two strategies:
//!
//! - **Indexed**: walk `tokenByIndex(start..end)` and resolve each token. The
//!   first failing index ends the walk; what was collected is kept.
//! - **Scan**: when the indexed walk produced nothing and either failed or a
//!   scan was requested, read mint `Transfer` logs backward from the head in
//!   fixed windows and resolve the minted ids in discovery order.
//!
//! Per-token resolution may overlap up to `concurrency` requests. Output order
//! is always index order or log-discovery order.

use std::collections::HashSet;

use alloy_primitives::{Address, U256};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use chainnft_core::abi;
use chainnft_core::chain::ChainLabel;
use chainnft_core::types::{decimal, format_address, LogFilter, TokenRecord};

use crate::error::ReaderError;
use crate::inspector::{require_address, CollectionInspector};
use crate::metadata::{token_record, MetadataResolver};

pub const DEFAULT_LIMIT: usize = 24;
pub const MAX_LIMIT: usize = 50;

pub const DEFAULT_WINDOW: u64 = 5_000;
pub const MAX_WINDOW: u64 = 5_000;
pub const DEFAULT_MAX_BACK: u64 = 100_000;
pub const MAX_MAX_BACK: u64 = 200_000;

/// One page of the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub start: u64,
    /// Always within `1..=MAX_LIMIT`.
    pub limit: usize,
    /// Run the log scan even if the indexed walk did not fail.
    pub scan: bool,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            start: 0,
            limit: DEFAULT_LIMIT,
            scan: false,
        }
    }
}

impl PageRequest {
    pub fn new(start: u64, limit: Option<u64>) -> Self {
        let limit = limit.map_or(DEFAULT_LIMIT, |l| l.clamp(1, MAX_LIMIT as u64) as usize);
        Self {
            start,
            limit,
            scan: false,
        }
    }

    pub fn with_scan(mut self, scan: bool) -> Self {
        self.scan = scan;
        self
    }
}

/// Bounds of the backward log scan, in blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    pub window: u64,
    pub max_back: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            max_back: DEFAULT_MAX_BACK,
        }
    }
}

impl ScanConfig {
    /// Clamp to the ceilings. A zero window is raised to one block.
    pub fn new(window: Option<u64>, max_back: Option<u64>) -> Self {
        Self {
            window: window.unwrap_or(DEFAULT_WINDOW).clamp(1, MAX_WINDOW),
            max_back: max_back.unwrap_or(DEFAULT_MAX_BACK).min(MAX_MAX_BACK),
        }
    }

    /// `(from, to)` ranges, newest first. Window `k` starts `k * window`
    /// blocks below `latest` and only windows starting less than `max_back`
    /// blocks back are produced. The oldest range is cut at block zero.
    pub fn windows(&self, latest: u64) -> Vec<(u64, u64)> {
        let mut out = Vec::new();
        let mut upper = latest;
        for k in 1u64.. {
            let offset = match k.checked_mul(self.window) {
                Some(offset) if offset < self.max_back => offset,
                _ => break,
            };
            match latest.checked_sub(offset) {
                Some(from) => {
                    out.push((from, from + self.window));
                    upper = from;
                    if from == 0 {
                        break;
                    }
                }
                None => {
                    out.push((0, upper));
                    break;
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fallback {
    Scan,
}

/// Listing response. `fallback` is set when the items come from the log scan,
/// in which case `total` is the number of items found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPage {
    pub items: Vec<TokenRecord>,
    #[serde(with = "decimal")]
    pub total: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Fallback>,
}

/// Per-request context shared by both strategies.
#[derive(Clone, Copy)]
struct Target<'a> {
    chain_id: u64,
    label: ChainLabel,
    contract: Address,
    collection: &'a str,
}

#[derive(Clone)]
pub struct TokenEnumerator {
    inspector: CollectionInspector,
    resolver: MetadataResolver,
    concurrency: usize,
}

impl TokenEnumerator {
    pub fn new(inspector: CollectionInspector, resolver: MetadataResolver) -> Self {
        Self {
            inspector,
            resolver,
            concurrency: 1,
        }
    }

    /// Overlap up to `n` token resolutions. Zero is treated as one.
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// List one page of tokens. Fails only for invalid input or when the
    /// total supply cannot be read.
    pub async fn tokens(
        &self,
        chain_id: u64,
        address: &str,
        page: &PageRequest,
        scan: &ScanConfig,
    ) -> Result<TokenPage, ReaderError> {
        let label = self.inspector.rpc().endpoint(chain_id)?.label;
        let contract = require_address(address)?;
        let collection = format_address(&contract);
        let target = Target {
            chain_id,
            label,
            contract,
            collection: &collection,
        };

        let total = self
            .inspector
            .total_supply(chain_id, contract)
            .await
            .map_err(|e| {
                tracing::warn!(chain_id, address = %collection, error = %e, "totalSupply read failed");
                ReaderError::contract_read(&collection, e)
            })?;

        let (items, failed) = self.indexed(target, total, page).await;
        if !items.is_empty() || !(failed || page.scan) {
            return Ok(TokenPage {
                items,
                total,
                fallback: None,
            });
        }

        tracing::info!(chain_id, address = %collection, failed, "falling back to mint log scan");
        let items = self.scan(target, page.limit, scan).await;
        Ok(TokenPage {
            total: U256::from(items.len()),
            items,
            fallback: Some(Fallback::Scan),
        })
    }

    /// Indexed walk. Returns the collected records and whether an index failed.
    async fn indexed(&self, target: Target<'_>, total: U256, page: &PageRequest) -> (Vec<TokenRecord>, bool) {
        let stop = page.start.saturating_add(page.limit as u64);
        let end = abi::to_u64(total).map_or(stop, |t| t.min(stop));

        let mut results = stream::iter(page.start..end)
            .map(|index| self.indexed_item(target, U256::from(index)))
            .buffered(self.concurrency);

        let mut items = Vec::new();
        while let Some(result) = results.next().await {
            match result {
                Ok(record) => items.push(record),
                Err(e) => {
                    tracing::debug!(
                        chain_id = target.chain_id,
                        address = %target.collection,
                        index = page.start + items.len() as u64,
                        error = %e,
                        "indexed enumeration stopped"
                    );
                    return (items, true);
                }
            }
        }
        (items, false)
    }

    async fn indexed_item(&self, target: Target<'_>, index: U256) -> Result<TokenRecord, ReaderError> {
        let token_id = self
            .inspector
            .token_by_index(target.chain_id, target.contract, index)
            .await?;
        self.resolve_token(target, token_id).await
    }

    /// Backward mint log scan. Window and per-token failures are skipped.
    async fn scan(&self, target: Target<'_>, limit: usize, config: &ScanConfig) -> Vec<TokenRecord> {
        let rpc = self.inspector.rpc();
        let latest = match rpc.block_number(target.chain_id).await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(chain_id = target.chain_id, error = %e, "eth_blockNumber failed; scan skipped");
                return Vec::new();
            }
        };

        let mut seen: HashSet<U256> = HashSet::new();
        let mut items = Vec::new();

        for (from, to) in config.windows(latest) {
            if items.len() >= limit {
                break;
            }
            let filter = LogFilter::mints(target.contract, from, to);
            let logs = match rpc.get_logs(target.chain_id, &filter).await {
                Ok(logs) => logs,
                Err(e) => {
                    tracing::warn!(chain_id = target.chain_id, from, to, error = %e, "log window failed");
                    continue;
                }
            };

            let fresh: Vec<U256> = logs
                .iter()
                .filter(|log| !log.is_removed())
                .filter_map(|log| log.transfer_token_id())
                .filter(|id| seen.insert(*id))
                .collect();
            tracing::debug!(from, to, logs = logs.len(), fresh = fresh.len(), "scanned window");

            let mut resolved = stream::iter(fresh)
                .map(|token_id| self.resolve_token(target, token_id))
                .buffered(self.concurrency);
            while let Some(result) = resolved.next().await {
                match result {
                    Ok(record) => items.push(record),
                    Err(e) => tracing::debug!(error = %e, "skipping minted token"),
                }
                if items.len() >= limit {
                    break;
                }
            }
        }
        items
    }

    async fn resolve_token(&self, target: Target<'_>, token_id: U256) -> Result<TokenRecord, ReaderError> {
        let uri = self
            .inspector
            .token_uri(target.chain_id, target.contract, token_id)
            .await?;
        let metadata = self.resolver.resolve(&uri).await;
        Ok(token_record(token_id, metadata, target.label, target.collection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::{json, Value};

    use chainnft_core::abi::{selectors, topics};
    use chainnft_core::chain::ChainRegistry;
    use chainnft_core::mock::{decode_call, MockReply, MockTransport, StaticMetadataSource};
    use chainnft_core::transport::RpcTransport;
    use chainnft_core::JsonRpcRequest;

    use crate::rpc::ChainRpc;

    const ADDR: &str = "0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d";
    const HEAD: u64 = 20_000_000;

    fn enumerator(transport: Arc<MockTransport>, source: StaticMetadataSource) -> TokenEnumerator {
        let registry = Arc::new(ChainRegistry::from_urls("mock://eth", "mock://base", "mock://polygon"));
        let rpc = ChainRpc::from_transports(registry, [(137u64, transport as Arc<dyn RpcTransport>)]);
        let inspector = CollectionInspector::new(Arc::new(rpc));
        TokenEnumerator::new(inspector, MetadataResolver::new(Arc::new(source)))
    }

    /// Ten tokens, index `i` holding id `1000 + i`.
    fn enumerable_node(req: &JsonRpcRequest) -> MockReply {
        match decode_call(req) {
            Some((selectors::TOTAL_SUPPLY, _)) => MockReply::uint(U256::from(10u64)),
            Some((selectors::TOKEN_BY_INDEX, Some(i))) if i < U256::from(10u64) => {
                MockReply::uint(i + U256::from(1000u64))
            }
            Some((selectors::TOKEN_URI, Some(id))) => MockReply::string(&format!("ipfs://QmMeta/{id}")),
            _ => MockReply::revert("execution reverted"),
        }
    }

    fn mint_log(id: u64, block: u64) -> Value {
        json!({
            "topics": [
                abi::to_hex(&topics::TRANSFER),
                abi::to_hex(&topics::ZERO_ADDRESS),
                "0x000000000000000000000000d8da6bf26964af9d7eed9e03e53415d37aa96045",
                abi::to_hex(&abi::encode_uint(U256::from(id))),
            ],
            "blockNumber": abi::format_quantity(block),
        })
    }

    /// `tokenByIndex` always reverts; mints live in the newest window.
    fn scan_node(logs: Value) -> impl Fn(&JsonRpcRequest) -> MockReply + Send + Sync + 'static {
        move |req| match req.method.as_str() {
            "eth_blockNumber" => MockReply::result(abi::format_quantity(HEAD)),
            "eth_getLogs" => {
                let from = abi::parse_quantity(req.params[0]["fromBlock"].as_str().unwrap()).unwrap();
                if from == HEAD - DEFAULT_WINDOW {
                    MockReply::result(logs.clone())
                } else {
                    MockReply::result(json!([]))
                }
            }
            _ => match decode_call(req) {
                Some((selectors::TOTAL_SUPPLY, _)) => MockReply::uint(U256::from(5u64)),
                Some((selectors::TOKEN_URI, Some(id))) if id == U256::from(13u64) => {
                    MockReply::revert("URI query for nonexistent token")
                }
                Some((selectors::TOKEN_URI, Some(id))) => {
                    MockReply::string(&format!("https://meta.example/{id}"))
                }
                _ => MockReply::revert("execution reverted"),
            },
        }
    }

    #[test]
    fn page_and_scan_clamps() {
        assert_eq!(PageRequest::new(0, None).limit, 24);
        assert_eq!(PageRequest::new(0, Some(0)).limit, 1);
        assert_eq!(PageRequest::new(0, Some(500)).limit, 50);

        let cfg = ScanConfig::new(Some(10_000), Some(1_000_000));
        assert_eq!(cfg, ScanConfig { window: 5_000, max_back: 200_000 });
        assert_eq!(ScanConfig::new(Some(0), None).window, 1);
    }

    #[test]
    fn windows_walk_backward_and_stop_at_genesis() {
        let cfg = ScanConfig::default();
        let windows = cfg.windows(HEAD);
        assert_eq!(windows.len(), 19);
        assert_eq!(windows[0], (HEAD - 5_000, HEAD));
        assert_eq!(windows[1], (HEAD - 10_000, HEAD - 5_000));

        let windows = cfg.windows(12_000);
        assert_eq!(windows, vec![(7_000, 12_000), (2_000, 7_000), (0, 2_000)]);

        let windows = ScanConfig::new(Some(5_000), Some(0)).windows(HEAD);
        assert!(windows.is_empty());
    }

    #[tokio::test]
    async fn indexed_page_within_supply() {
        let transport = Arc::new(MockTransport::new(enumerable_node));
        let source = StaticMetadataSource::new().with(
            "https://ipfs.io/ipfs/QmMeta/1000",
            br#"{"name":"First","image":"ipfs://QmImg/0.png","attributes":[{"trait_type":"Hat","value":"Cap"}]}"#.to_vec(),
        );
        let page = enumerator(transport.clone(), source)
            .tokens(137, ADDR, &PageRequest::new(0, Some(24)), &ScanConfig::default())
            .await
            .unwrap();

        assert_eq!(page.items.len(), 10);
        assert_eq!(page.total, U256::from(10u64));
        assert_eq!(page.fallback, None);
        assert_eq!(page.items[0].name, "First");
        assert_eq!(page.items[0].image.as_deref(), Some("https://ipfs.io/ipfs/QmImg/0.png"));
        assert_eq!(page.items[0].attributes[0].key, "Hat");
        assert_eq!(page.items[0].chain, ChainLabel::Polygon);
        assert_eq!(page.items[1].name, "#1001");
        assert_eq!(page.items[9].id, U256::from(1009u64));
        assert_eq!(transport.count("eth_getLogs"), 0);

        let v = serde_json::to_value(&page).unwrap();
        assert_eq!(v["total"], "10");
        assert!(v.get("fallback").is_none());
    }

    #[tokio::test]
    async fn start_past_supply_is_empty_without_scan() {
        let transport = Arc::new(MockTransport::new(enumerable_node));
        let page = enumerator(transport.clone(), StaticMetadataSource::new())
            .tokens(137, ADDR, &PageRequest::new(20, Some(24)), &ScanConfig::default())
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, U256::from(10u64));
        assert_eq!(transport.count_calls(selectors::TOKEN_BY_INDEX), 0);
        assert_eq!(transport.count("eth_blockNumber"), 0);
    }

    #[tokio::test]
    async fn concurrent_resolution_keeps_index_order() {
        let transport = Arc::new(MockTransport::new(enumerable_node));
        let page = enumerator(transport, StaticMetadataSource::new())
            .with_concurrency(4)
            .tokens(137, ADDR, &PageRequest::new(3, Some(5)), &ScanConfig::default())
            .await
            .unwrap();
        let ids: Vec<U256> = page.items.iter().map(|r| r.id).collect();
        let expected: Vec<U256> = (1003u64..1008).map(U256::from).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn partial_indexed_result_is_kept() {
        let transport = Arc::new(MockTransport::new(|req| match decode_call(req) {
            Some((selectors::TOKEN_BY_INDEX, Some(i))) if i == U256::from(2u64) => {
                MockReply::fail("connection reset")
            }
            _ => enumerable_node(req),
        }));
        let page = enumerator(transport.clone(), StaticMetadataSource::new())
            .tokens(137, ADDR, &PageRequest::default(), &ScanConfig::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.fallback, None);
        assert_eq!(transport.count_calls(selectors::TOKEN_BY_INDEX), 3);
    }

    #[tokio::test]
    async fn scan_dedups_and_skips_failed_tokens() {
        let logs = json!([mint_log(12, HEAD - 10), mint_log(12, HEAD - 9), mint_log(13, HEAD - 8), mint_log(14, HEAD - 7)]);
        let transport = Arc::new(MockTransport::new(scan_node(logs)));
        let source = StaticMetadataSource::new().with("https://meta.example/14", b"not json".to_vec());

        let page = enumerator(transport.clone(), source)
            .tokens(137, ADDR, &PageRequest::new(0, Some(24)), &ScanConfig::default())
            .await
            .unwrap();

        let ids: Vec<U256> = page.items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![U256::from(12u64), U256::from(14u64)]);
        assert_eq!(page.total, U256::from(2u64));
        assert_eq!(page.fallback, Some(Fallback::Scan));
        assert_eq!(page.items[1].name, "#14");
        assert_eq!(page.items[1].image, None);
        assert_eq!(transport.count_calls(selectors::TOKEN_URI), 3);
        assert!(transport.count("eth_getLogs") <= 20);

        let v = serde_json::to_value(&page).unwrap();
        assert_eq!(v["fallback"], "scan");
        assert_eq!(v["total"], "2");
    }

    #[tokio::test]
    async fn scan_stops_at_limit() {
        let logs = json!([mint_log(1, HEAD - 3), mint_log(2, HEAD - 2), mint_log(3, HEAD - 1)]);
        let transport = Arc::new(MockTransport::new(scan_node(logs)));
        let page = enumerator(transport.clone(), StaticMetadataSource::new())
            .tokens(137, ADDR, &PageRequest::new(0, Some(2)).with_scan(true), &ScanConfig::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(transport.count("eth_getLogs"), 1);
        assert_eq!(transport.count_calls(selectors::TOKEN_URI), 2);
    }

    #[tokio::test]
    async fn empty_scan_exhausts_the_lookback() {
        let transport = Arc::new(MockTransport::new(scan_node(json!([]))));
        let page = enumerator(transport.clone(), StaticMetadataSource::new())
            .tokens(
                137,
                ADDR,
                &PageRequest::default(),
                &ScanConfig::new(Some(5_000), Some(100_000)),
            )
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.fallback, Some(Fallback::Scan));
        let calls = transport.count("eth_getLogs");
        assert!(calls > 0 && calls <= 20);

        let first = &transport
            .requests()
            .into_iter()
            .find(|r| r.method == "eth_getLogs")
            .unwrap()
            .params[0];
        assert_eq!(first["address"], ADDR);
        assert_eq!(first["topics"][0], abi::to_hex(&topics::TRANSFER));
    }

    #[tokio::test]
    async fn failing_windows_are_skipped() {
        let transport = Arc::new(MockTransport::new(|req| match req.method.as_str() {
            "eth_getLogs" => MockReply::Error {
                code: -32005,
                message: "query returned more than 10000 results".into(),
            },
            _ => scan_node(json!([]))(req),
        }));
        let page = enumerator(transport.clone(), StaticMetadataSource::new())
            .tokens(137, ADDR, &PageRequest::default().with_scan(true), &ScanConfig::default())
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(transport.count("eth_getLogs"), 19);
    }

    #[tokio::test]
    async fn unknown_head_yields_an_empty_scan_page() {
        let transport = Arc::new(MockTransport::new(|req| match req.method.as_str() {
            "eth_blockNumber" => MockReply::fail("connection reset"),
            _ => scan_node(json!([]))(req),
        }));
        let page = enumerator(transport.clone(), StaticMetadataSource::new())
            .tokens(137, ADDR, &PageRequest::default().with_scan(true), &ScanConfig::default())
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, U256::ZERO);
        assert_eq!(page.fallback, Some(Fallback::Scan));
        assert_eq!(transport.count("eth_getLogs"), 0);

        let v = serde_json::to_value(&page).unwrap();
        assert_eq!(v["total"], "0");
        assert_eq!(v["fallback"], "scan");
    }

    #[tokio::test]
    async fn unreadable_supply_is_an_error() {
        let transport = Arc::new(MockTransport::new(|_| MockReply::revert("execution reverted")));
        let err = enumerator(transport, StaticMetadataSource::new())
            .tokens(137, ADDR, &PageRequest::default(), &ScanConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ReaderError::ContractRead { .. }));
    }

    #[tokio::test]
    async fn validation_precedes_reads() {
        let transport = Arc::new(MockTransport::new(enumerable_node));
        let e = enumerator(transport.clone(), StaticMetadataSource::new());
        let page = PageRequest::default();
        let scan = ScanConfig::default();

        assert!(matches!(
            e.tokens(999, ADDR, &page, &scan).await.unwrap_err(),
            ReaderError::UnsupportedChain(999)
        ));
        assert!(matches!(
            e.tokens(137, "0x12", &page, &scan).await.unwrap_err(),
            ReaderError::InvalidAddress(_)
        ));
        assert!(transport.requests().is_empty());
    }
}
