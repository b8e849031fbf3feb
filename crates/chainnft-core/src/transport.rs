//! The `RpcTransport` trait: the core abstraction for JSON-RPC endpoints.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;
use crate::request::{JsonRpcRequest, JsonRpcResponse};

/// Request id used for every call. Requests are never batched, so the id
/// only has to be stable.
pub const REQUEST_ID: u64 = 1;

/// The async trait every RPC transport must implement.
///
/// Implementations must be `Send + Sync` so one instance can be shared as
/// `Arc<dyn RpcTransport>` across request handlers.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    /// Send a single JSON-RPC request and return the response.
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError>;

    /// Return the transport's identifier (URL or name).
    fn url(&self) -> &str;

    /// Convenience: call a method and unwrap the `result` member.
    ///
    /// An error object in the response becomes [`TransportError::Rpc`].
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError> {
        let req = JsonRpcRequest::new(REQUEST_ID, method, params);
        let resp = self.send(req).await?;
        resp.into_result().map_err(TransportError::Rpc)
    }
}
