//! chainnft-core: foundation types for ChainNFT.
//!
//! # Overview
//!
//! ChainNFT reads ERC-721 style collections straight from EVM JSON-RPC
//! endpoints. The core crate defines the pieces every other crate shares:
//!
//! - [`ChainRegistry`]: immutable chain id → RPC endpoint mapping
//! - [`abi`]: hand-rolled ABI codec (selectors, uint words, dynamic strings)
//! - [`JsonRpcRequest`] / [`JsonRpcResponse`]: wire types
//! - [`RpcTransport`]: the async trait every RPC transport implements
//! - [`MetadataSource`]: byte fetcher used for off-chain token metadata
//! - [`types`]: contract calls, log filters and response records
//! - [`mock`]: scripted transports for tests

pub mod abi;
pub mod chain;
pub mod error;
pub mod metadata;
pub mod mock;
pub mod request;
pub mod transport;
pub mod types;

pub use abi::AbiError;
pub use chain::{ChainEndpoint, ChainLabel, ChainRegistry};
pub use error::TransportError;
pub use metadata::MetadataSource;
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId, RpcPayload};
pub use transport::RpcTransport;
pub use types::{Attribute, CollectionInfo, ContractCall, LogFilter, RawLog, RecordKind, TokenRecord};

/// Re-exported so downstream crates agree on the integer type.
pub use alloy_primitives::{Address, U256};
