//! Token metadata: URI normalization, fetching and field extraction.
//!
//! Missing or malformed metadata is normal for on-chain collections, so
//! [`MetadataResolver::resolve`] folds every failure into `None` and the
//! caller builds a record without it.

use std::sync::Arc;

use alloy_primitives::U256;
use base64::Engine as _;
use serde_json::Value;

use chainnft_core::chain::ChainLabel;
use chainnft_core::metadata::MetadataSource;
use chainnft_core::types::{Attribute, RecordKind, TokenRecord};

use crate::error::ReaderError;

/// Public gateway used for `ipfs://` URIs unless configured otherwise.
pub const DEFAULT_IPFS_GATEWAY: &str = "https://ipfs.io/";

/// Rewrite `ipfs://` URIs onto `gateway`; other schemes pass through.
/// Returns `None` for an empty URI.
///
/// `ipfs://ipfs/<path>` and `ipfs://<path>` both map to
/// `<gateway>ipfs/<path>`.
pub fn normalize_uri(uri: &str, gateway: &str) -> Option<String> {
    let uri = uri.trim();
    if uri.is_empty() {
        return None;
    }
    let path = uri
        .strip_prefix("ipfs://ipfs/")
        .or_else(|| uri.strip_prefix("ipfs://"));
    Some(match path {
        Some(path) => format!("{gateway}ipfs/{path}"),
        None => uri.to_string(),
    })
}

/// Payload of a `data:` URI, or `None` if `uri` is not one or its base64
/// payload is malformed. Invalid percent escapes are kept as-is.
pub fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    let scheme = uri.get(..5)?;
    if !scheme.eq_ignore_ascii_case("data:") {
        return None;
    }
    let (header, payload) = uri[5..].split_once(',')?;
    if header.to_ascii_lowercase().ends_with(";base64") {
        let engine = base64::engine::general_purpose::STANDARD;
        let trimmed = payload.trim();
        return engine
            .decode(trimmed)
            .or_else(|_| base64::engine::general_purpose::STANDARD_NO_PAD.decode(trimmed))
            .ok();
    }
    Some(urlencoding::decode_binary(payload.as_bytes()).into_owned())
}

/// Display fields extracted from a metadata document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenMetadata {
    pub name: Option<String>,
    /// Already normalized.
    pub image: Option<String>,
    pub attributes: Vec<Attribute>,
}

impl TokenMetadata {
    /// Extract fields from a parsed document. Non-object documents yield
    /// empty metadata.
    pub fn from_json(doc: &Value, gateway: &str) -> Self {
        let name = doc
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let image = ["image", "image_url", "image_url_png"]
            .iter()
            .filter_map(|field| doc.get(*field).and_then(Value::as_str))
            .find(|s| !s.is_empty())
            .and_then(|s| normalize_uri(s, gateway));

        let attributes = match doc.get("attributes") {
            Some(Value::Array(entries)) => entries.iter().filter_map(attribute).collect(),
            _ => Vec::new(),
        };

        Self {
            name,
            image,
            attributes,
        }
    }
}

fn attribute(entry: &Value) -> Option<Attribute> {
    let obj = entry.as_object()?;
    let key = ["trait_type", "key", "name"]
        .iter()
        .filter_map(|field| obj.get(*field))
        .find(|v| !v.is_null())
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default();
    let value = obj.get("value").cloned().unwrap_or(Value::Null);
    Some(Attribute { key, value })
}

/// Build the listing record for one token. Without metadata the name falls
/// back to `#<id>` and there is no image.
pub fn token_record(
    token_id: U256,
    metadata: Option<TokenMetadata>,
    chain: ChainLabel,
    collection: &str,
) -> TokenRecord {
    let TokenMetadata {
        name,
        image,
        attributes,
    } = metadata.unwrap_or_default();
    TokenRecord {
        kind: RecordKind::Token,
        id: token_id,
        name: name.unwrap_or_else(|| format!("#{token_id}")),
        image,
        chain,
        verified: true,
        price_eth: None,
        collection: collection.to_string(),
        attributes,
    }
}

/// Fetches and parses token metadata through a [`MetadataSource`].
#[derive(Clone)]
pub struct MetadataResolver {
    source: Arc<dyn MetadataSource>,
    gateway: String,
}

impl MetadataResolver {
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self {
            source,
            gateway: DEFAULT_IPFS_GATEWAY.to_string(),
        }
    }

    /// Use `gateway` for `ipfs://` URIs. A trailing `/` is added if missing.
    pub fn with_gateway(mut self, gateway: impl Into<String>) -> Self {
        let mut gateway = gateway.into();
        if !gateway.ends_with('/') {
            gateway.push('/');
        }
        self.gateway = gateway;
        self
    }

    pub fn normalize(&self, uri: &str) -> Option<String> {
        normalize_uri(uri, &self.gateway)
    }

    /// Fetch and parse the document behind `uri`.
    pub async fn fetch(&self, uri: &str) -> Result<TokenMetadata, ReaderError> {
        let url = self
            .normalize(uri)
            .ok_or_else(|| ReaderError::MetadataUnavailable("empty token URI".into()))?;

        let body = match decode_data_uri(&url) {
            Some(bytes) => bytes,
            None if url.get(..5).is_some_and(|s| s.eq_ignore_ascii_case("data:")) => {
                return Err(ReaderError::MetadataUnavailable("malformed data URI".into()));
            }
            None => self
                .source
                .fetch(&url)
                .await
                .map_err(|e| ReaderError::MetadataUnavailable(format!("{url}: {e}")))?,
        };

        let doc: Value = serde_json::from_slice(&body)
            .map_err(|e| ReaderError::MetadataUnavailable(format!("{url}: {e}")))?;
        Ok(TokenMetadata::from_json(&doc, &self.gateway))
    }

    /// Like [`fetch`](Self::fetch), with every failure mapped to `None`.
    pub async fn resolve(&self, uri: &str) -> Option<TokenMetadata> {
        match self.fetch(uri).await {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::debug!(uri, error = %e, "no metadata");
                None
            }
        }
    }
}
