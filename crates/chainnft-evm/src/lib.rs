//! # chainnft-evm
//!
//! Read-only ERC-721 collection access over JSON-RPC.
//!
//! - [`CollectionInspector`]: name, symbol, total supply and the
//!   `tokenByIndex(0)` enumerability probe
//! - [`TokenEnumerator`]: paged listing by index, with a backward mint log
//!   scan for contracts that cannot be walked by index
//! - [`MetadataResolver`]: `ipfs://` and `data:` URI handling plus display
//!   field extraction
//! - [`CollectionReader`]: ties the above together for the HTTP layer

pub mod enumerator;
pub mod error;
pub mod inspector;
pub mod metadata;
pub mod reader;
pub mod rpc;

pub use enumerator::{Fallback, PageRequest, ScanConfig, TokenEnumerator, TokenPage};
pub use error::ReaderError;
pub use inspector::CollectionInspector;
pub use metadata::{MetadataResolver, TokenMetadata, DEFAULT_IPFS_GATEWAY};
pub use reader::{CollectionReader, ReaderConfig};
pub use rpc::ChainRpc;
