//! chainnft-http: reqwest-backed transports for ChainNFT.
//!
//! - [`HttpRpcClient`]: JSON-RPC over HTTP(S), one request per call, bounded timeout
//! - [`HttpMetadataSource`]: plain GET for token metadata documents

pub mod client;
pub mod gateway;

pub use client::{HttpClientConfig, HttpRpcClient};
pub use gateway::{GatewayConfig, HttpMetadataSource};

/// User agent sent with every outbound request.
pub const USER_AGENT: &str = concat!("chainnft/", env!("CARGO_PKG_VERSION"));
