//! Error types for collection reads.

use thiserror::Error;

use chainnft_core::{AbiError, TransportError};

/// Errors surfaced by the inspector, the enumerator and the resolver.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unsupported chainId: {0}")]
    UnsupportedChain(u64),

    /// The node answered with a JSON-RPC error object.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Connection, HTTP status, timeout or malformed response.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(#[from] AbiError),

    /// Aggregate failure of a collection read; nothing partial is returned.
    #[error("Failed to read contract {address}: {source}")]
    ContractRead {
        address: String,
        #[source]
        source: Box<ReaderError>,
    },

    /// Metadata could not be fetched or parsed. Callers fold this into
    /// "no metadata".
    #[error("Metadata unavailable: {0}")]
    MetadataUnavailable(String),
}

impl ReaderError {
    /// Returns `true` for errors caused by the request itself.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidAddress(_) | Self::UnsupportedChain(_))
    }

    pub(crate) fn contract_read(address: &str, source: ReaderError) -> Self {
        if source.is_client_error() {
            return source;
        }
        Self::ContractRead {
            address: address.to_string(),
            source: Box::new(source),
        }
    }
}

impl From<TransportError> for ReaderError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Rpc(err) if err.message.is_empty() => Self::Rpc("RPC Error".into()),
            TransportError::Rpc(err) => Self::Rpc(err.message),
            other => Self::Transport(other.to_string()),
        }
    }
}
