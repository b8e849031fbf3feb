//! The `MetadataSource` trait: fetches raw token metadata documents.

use async_trait::async_trait;

use crate::error::TransportError;

/// Fetches the body behind an already-normalized metadata URL.
///
/// Parsing and the "absent metadata is normal" policy live with the caller;
/// a source only reports whether bytes could be retrieved.
#[async_trait]
pub trait MetadataSource: Send + Sync + 'static {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}
