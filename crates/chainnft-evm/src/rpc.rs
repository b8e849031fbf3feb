//! Per-chain JSON-RPC access.
//!
//! `ChainRpc` pairs the immutable [`ChainRegistry`] with one transport per
//! registered chain. Every method resolves the chain first and fails with
//! [`ReaderError::UnsupportedChain`] for ids the registry does not know.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use chainnft_core::abi;
use chainnft_core::chain::{ChainEndpoint, ChainRegistry};
use chainnft_core::error::TransportError;
use chainnft_core::transport::RpcTransport;
use chainnft_core::types::{ContractCall, LogFilter, RawLog};
use chainnft_http::{HttpClientConfig, HttpRpcClient};

use crate::error::ReaderError;

pub struct ChainRpc {
    registry: Arc<ChainRegistry>,
    transports: HashMap<u64, Arc<dyn RpcTransport>>,
}

impl ChainRpc {
    /// Build from explicit transports. Transports for chains missing from the
    /// registry are never used.
    pub fn from_transports(
        registry: Arc<ChainRegistry>,
        transports: impl IntoIterator<Item = (u64, Arc<dyn RpcTransport>)>,
    ) -> Self {
        Self {
            registry,
            transports: transports.into_iter().collect(),
        }
    }

    /// One [`HttpRpcClient`] per registered endpoint.
    pub fn connect(
        registry: Arc<ChainRegistry>,
        config: &HttpClientConfig,
    ) -> Result<Self, TransportError> {
        let mut transports: HashMap<u64, Arc<dyn RpcTransport>> = HashMap::new();
        for endpoint in registry.iter() {
            let client = HttpRpcClient::new(endpoint.rpc_url.clone(), config.clone())?;
            tracing::info!(chain_id = endpoint.chain_id, url = %endpoint.rpc_url, "registered RPC endpoint");
            transports.insert(endpoint.chain_id, Arc::new(client));
        }
        Ok(Self {
            registry,
            transports,
        })
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    /// Endpoint for `chain_id`, or `UnsupportedChain`.
    pub fn endpoint(&self, chain_id: u64) -> Result<&ChainEndpoint, ReaderError> {
        self.registry
            .get(chain_id)
            .ok_or(ReaderError::UnsupportedChain(chain_id))
    }

    /// Issue one JSON-RPC request and return its `result` member.
    pub async fn call(
        &self,
        chain_id: u64,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, ReaderError> {
        self.endpoint(chain_id)?;
        let transport = self
            .transports
            .get(&chain_id)
            .ok_or(ReaderError::UnsupportedChain(chain_id))?;
        let result = transport.request(method, params).await?;
        Ok(result)
    }

    /// `eth_call` against `latest`, returning the decoded return data.
    pub async fn eth_call(&self, chain_id: u64, call: &ContractCall) -> Result<Vec<u8>, ReaderError> {
        let result = self
            .call(chain_id, "eth_call", vec![call.to_json(), json!("latest")])
            .await?;
        let hex = result
            .as_str()
            .ok_or_else(|| ReaderError::Transport(format!("eth_call returned non-string result: {result}")))?;
        Ok(abi::decode_hex(hex)?)
    }

    /// Current head height.
    pub async fn block_number(&self, chain_id: u64) -> Result<u64, ReaderError> {
        let result = self.call(chain_id, "eth_blockNumber", vec![]).await?;
        let hex = result
            .as_str()
            .ok_or_else(|| ReaderError::Transport(format!("eth_blockNumber returned {result}")))?;
        Ok(abi::parse_quantity(hex)?)
    }

    /// `eth_getLogs` for one filter window. A `null` result is an empty list.
    pub async fn get_logs(&self, chain_id: u64, filter: &LogFilter) -> Result<Vec<RawLog>, ReaderError> {
        let result = self
            .call(chain_id, "eth_getLogs", vec![filter.to_json()])
            .await?;
        if result.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(result)
            .map_err(|e| ReaderError::Transport(format!("malformed eth_getLogs result: {e}")))
    }
}
