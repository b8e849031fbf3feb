//! `CollectionReader`: the entry point used by the HTTP layer.

use std::sync::Arc;

use chainnft_core::chain::ChainRegistry;
use chainnft_core::error::TransportError;
use chainnft_core::metadata::MetadataSource;
use chainnft_core::types::CollectionInfo;
use chainnft_http::{GatewayConfig, HttpClientConfig, HttpMetadataSource};

use crate::enumerator::{PageRequest, ScanConfig, TokenEnumerator, TokenPage};
use crate::error::ReaderError;
use crate::inspector::CollectionInspector;
use crate::metadata::{MetadataResolver, DEFAULT_IPFS_GATEWAY};
use crate::rpc::ChainRpc;

/// Settings for [`CollectionReader::connect`].
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    pub rpc: HttpClientConfig,
    pub metadata: GatewayConfig,
    /// Base URL `ipfs://` URIs are rewritten onto.
    pub ipfs_gateway: String,
    /// Token resolutions in flight per request. 1 is sequential.
    pub fetch_concurrency: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            rpc: HttpClientConfig::default(),
            metadata: GatewayConfig::default(),
            ipfs_gateway: DEFAULT_IPFS_GATEWAY.to_string(),
            fetch_concurrency: 1,
        }
    }
}

/// Stateless reader over every registered chain. Cheap to clone; each call
/// re-reads the chain.
#[derive(Clone)]
pub struct CollectionReader {
    inspector: CollectionInspector,
    enumerator: TokenEnumerator,
}

impl CollectionReader {
    pub fn new(rpc: Arc<ChainRpc>, source: Arc<dyn MetadataSource>, config: &ReaderConfig) -> Self {
        let inspector = CollectionInspector::new(rpc);
        let resolver = MetadataResolver::new(source).with_gateway(config.ipfs_gateway.clone());
        let enumerator = TokenEnumerator::new(inspector.clone(), resolver)
            .with_concurrency(config.fetch_concurrency);
        Self {
            inspector,
            enumerator,
        }
    }

    /// Build HTTP transports for every chain in `registry`.
    pub fn connect(registry: Arc<ChainRegistry>, config: &ReaderConfig) -> Result<Self, TransportError> {
        let rpc = ChainRpc::connect(registry, &config.rpc)?;
        let source = HttpMetadataSource::new(config.metadata.clone())?;
        Ok(Self::new(Arc::new(rpc), Arc::new(source), config))
    }

    pub fn registry(&self) -> &ChainRegistry {
        self.inspector.rpc().registry()
    }

    pub async fn info(&self, chain_id: u64, address: &str) -> Result<CollectionInfo, ReaderError> {
        self.inspector.info(chain_id, address).await
    }

    pub async fn tokens(
        &self,
        chain_id: u64,
        address: &str,
        page: &PageRequest,
        scan: &ScanConfig,
    ) -> Result<TokenPage, ReaderError> {
        self.enumerator.tokens(chain_id, address, page, scan).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use chainnft_core::abi::selectors;
    use chainnft_core::mock::{decode_call, MockReply, MockTransport, StaticMetadataSource};
    use chainnft_core::transport::RpcTransport;

    #[tokio::test]
    async fn reader_uses_configured_gateway() {
        let transport = Arc::new(MockTransport::new(|req| match decode_call(req) {
            Some((selectors::NAME, _)) => MockReply::string("Tiny"),
            Some((selectors::SYMBOL, _)) => MockReply::string("TNY"),
            Some((selectors::TOTAL_SUPPLY, _)) => MockReply::uint(U256::from(1u64)),
            Some((selectors::TOKEN_BY_INDEX, _)) => MockReply::uint(U256::from(5u64)),
            Some((selectors::TOKEN_URI, _)) => MockReply::string("ipfs://QmTiny/5"),
            _ => MockReply::revert("execution reverted"),
        }));
        let registry = Arc::new(ChainRegistry::from_urls("mock://eth", "mock://base", "mock://polygon"));
        let rpc = ChainRpc::from_transports(registry, [(1u64, transport as Arc<dyn RpcTransport>)]);
        let source = StaticMetadataSource::new().with(
            "https://gw.example/ipfs/QmTiny/5",
            br#"{"name":"Tiny #5"}"#.to_vec(),
        );
        let config = ReaderConfig {
            ipfs_gateway: "https://gw.example".into(),
            ..ReaderConfig::default()
        };
        let reader = CollectionReader::new(Arc::new(rpc), Arc::new(source), &config);
        let addr = "0x0000000000000000000000000000000000000001";

        let info = reader.info(1, addr).await.unwrap();
        assert!(info.enumerable);
        assert_eq!(info.symbol, "TNY");

        let page = reader
            .tokens(1, addr, &PageRequest::default(), &ScanConfig::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Tiny #5");
        assert_eq!(reader.registry().len(), 3);
    }
}
