//! Scripted transports for tests.
//!
//! [`MockTransport`] answers each JSON-RPC request through a closure and
//! records what it was asked; [`StaticMetadataSource`] serves metadata
//! documents from a map.
//!
//! ```rust
//! use chainnft_core::mock::{MockReply, MockTransport};
//!
//! let transport = MockTransport::new(|req| match req.method.as_str() {
//!     "eth_blockNumber" => MockReply::result("0x10"),
//!     _ => MockReply::revert("execution reverted"),
//! });
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use alloy_primitives::U256;
use async_trait::async_trait;
use serde_json::Value;

use crate::abi::{self, Selector, WORD};
use crate::error::TransportError;
use crate::metadata::MetadataSource;
use crate::request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::transport::RpcTransport;

/// What the scripted node answers.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// `{"result": value}`
    Result(Value),
    /// `{"error": {code, message}}`
    Error { code: i64, message: String },
    /// The request never reaches a node.
    Fail(String),
}

impl MockReply {
    pub fn result(value: impl Into<Value>) -> Self {
        Self::Result(value.into())
    }

    /// The error object nodes return for a reverted `eth_call`.
    pub fn revert(message: impl Into<String>) -> Self {
        Self::Error {
            code: 3,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }

    /// A single `uint256` return word.
    pub fn uint(value: U256) -> Self {
        Self::Result(Value::String(abi::to_hex(&abi::encode_uint(value))))
    }

    /// A single ABI-encoded `string` return value.
    pub fn string(text: &str) -> Self {
        let mut buf = Vec::with_capacity(3 * WORD + text.len());
        buf.extend_from_slice(&abi::encode_uint(U256::from(WORD as u64)));
        buf.extend_from_slice(&abi::encode_uint(U256::from(text.len() as u64)));
        buf.extend_from_slice(text.as_bytes());
        let padded = buf.len().div_ceil(WORD) * WORD;
        buf.resize(padded, 0);
        Self::Result(Value::String(abi::to_hex(&buf)))
    }
}

type Handler = dyn Fn(&JsonRpcRequest) -> MockReply + Send + Sync;

/// A transport whose node is a closure.
pub struct MockTransport {
    url: String,
    handler: Box<Handler>,
    requests: Mutex<Vec<JsonRpcRequest>>,
}

impl MockTransport {
    pub fn new(handler: impl Fn(&JsonRpcRequest) -> MockReply + Send + Sync + 'static) -> Self {
        Self {
            url: "mock://node".into(),
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<JsonRpcRequest> {
        self.log().clone()
    }

    /// Number of requests received for `method`.
    pub fn count(&self, method: &str) -> usize {
        self.log().iter().filter(|r| r.method == method).count()
    }

    /// Number of `eth_call`s whose call data starts with `selector`.
    pub fn count_calls(&self, selector: Selector) -> usize {
        self.log()
            .iter()
            .filter_map(eth_call_data)
            .filter(|data| data.starts_with(&selector))
            .count()
    }

    fn log(&self) -> MutexGuard<'_, Vec<JsonRpcRequest>> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl RpcTransport for MockTransport {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        let reply = (self.handler)(&req);
        let id = req.id.clone();
        self.log().push(req);
        match reply {
            MockReply::Result(value) => Ok(JsonRpcResponse::success(id, value)),
            MockReply::Error { code, message } => Ok(JsonRpcResponse::failure(
                id,
                JsonRpcError {
                    code,
                    message,
                    data: None,
                },
            )),
            MockReply::Fail(message) => Err(TransportError::Http(message)),
        }
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// Decoded `data` of an `eth_call` request, if `req` is one.
pub fn eth_call_data(req: &JsonRpcRequest) -> Option<Vec<u8>> {
    if req.method != "eth_call" {
        return None;
    }
    let data = req.params.first()?.get("data")?.as_str()?;
    abi::decode_hex(data).ok()
}

/// Selector and first argument of an `eth_call` request.
pub fn decode_call(req: &JsonRpcRequest) -> Option<(Selector, Option<U256>)> {
    let data = eth_call_data(req)?;
    let selector: Selector = data.get(..4)?.try_into().ok()?;
    let arg = data.get(4..4 + WORD).map(U256::from_be_slice);
    Some((selector, arg))
}

/// Metadata documents served from memory; unknown URLs fail like a 404.
#[derive(Default)]
pub struct StaticMetadataSource {
    documents: HashMap<String, Vec<u8>>,
    fetched: Mutex<Vec<String>>,
}

impl StaticMetadataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.documents.insert(url.into(), body.into());
        self
    }

    /// URLs requested so far, in order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl MetadataSource for StaticMetadataSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.fetched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.to_string());
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::Http(format!("HTTP 404: {url}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::selectors;
    use crate::types::ContractCall;
    use alloy_primitives::Address;

    #[tokio::test]
    async fn scripted_replies_and_call_log() {
        let transport = MockTransport::new(|req| match decode_call(req) {
            Some((selectors::NAME, _)) => MockReply::string("Punks"),
            Some((selectors::TOKEN_BY_INDEX, Some(i))) => MockReply::uint(i + U256::from(100u64)),
            _ => MockReply::revert("execution reverted"),
        });

        let call = ContractCall::new(Address::ZERO, selectors::TOKEN_BY_INDEX, &[U256::from(2u64)]);
        let value = transport
            .request("eth_call", vec![call.to_json(), "latest".into()])
            .await
            .unwrap();
        let bytes = abi::decode_hex(value.as_str().unwrap()).unwrap();
        assert_eq!(abi::decode_uint(&bytes).unwrap(), U256::from(102u64));

        let err = transport.request("eth_blockNumber", vec![]).await.unwrap_err();
        assert!(err.is_execution_error());

        assert_eq!(transport.count("eth_call"), 1);
        assert_eq!(transport.count_calls(selectors::TOKEN_BY_INDEX), 1);
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn string_reply_decodes() {
        let MockReply::Result(Value::String(hex)) = MockReply::string("hello") else {
            panic!("expected a hex string");
        };
        let bytes = abi::decode_hex(&hex).unwrap();
        assert_eq!(bytes.len() % WORD, 0);
        assert_eq!(abi::decode_dynamic_string(&bytes), "hello");
    }

    #[tokio::test]
    async fn static_source_serves_known_urls() {
        let source = StaticMetadataSource::new().with("https://meta/1", b"{}".to_vec());
        assert_eq!(source.fetch("https://meta/1").await.unwrap(), b"{}");
        assert!(source.fetch("https://meta/2").await.is_err());
        assert_eq!(source.fetched().len(), 2);
    }
}
