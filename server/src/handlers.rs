//! Handlers for the on-chain collection endpoints.
//!
//! Query parameters are parsed leniently: a missing or unparsable `start`,
//! `limit`, `window` or `maxBack` falls back to its default. Only the
//! address and the chain id are validated.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use chainnft_core::chain::ChainLabel;
use chainnft_core::types::CollectionInfo;
use chainnft_evm::{CollectionReader, PageRequest, ReaderError, ScanConfig, TokenPage};

use crate::proxy::Upstream;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub reader: CollectionReader,
    pub upstream: Arc<Upstream>,
}

impl AppState {
    pub fn new(reader: CollectionReader, upstream: Upstream) -> Self {
        Self {
            reader,
            upstream: Arc::new(upstream),
        }
    }
}

/// Query string of both collection endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionQuery {
    pub address: Option<String>,
    #[serde(rename = "chainId")]
    pub chain_id: Option<String>,
    pub start: Option<String>,
    pub limit: Option<String>,
    pub scan: Option<String>,
    pub window: Option<String>,
    #[serde(rename = "maxBack")]
    pub max_back: Option<String>,
}

impl CollectionQuery {
    /// Absent or empty → Ethereum mainnet.
    fn chain_id(&self) -> Result<u64, ApiError> {
        match self.chain_id.as_deref().map(str::trim) {
            None | Some("") => Ok(ChainLabel::ETHEREUM_ID),
            Some(text) => text.parse().map_err(|_| ApiError::unsupported_chain()),
        }
    }

    fn address(&self) -> &str {
        self.address.as_deref().unwrap_or("")
    }

    fn page(&self) -> PageRequest {
        let start = self
            .start
            .as_deref()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(0);
        let limit = self
            .limit
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .map(|l| l.max(0) as u64);
        PageRequest::new(start, limit).with_scan(self.scan.as_deref() == Some("1"))
    }

    fn scan_config(&self) -> ScanConfig {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<u64>().ok());
        ScanConfig::new(parse(&self.window), parse(&self.max_back))
    }
}

/// JSON error body `{"error": message}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: &'static str,
}

impl ApiError {
    fn unsupported_chain() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Unsupported chainId",
        }
    }

    /// Validation errors map to 400; anything else is a 500 with `failure`.
    fn from_reader(err: &ReaderError, failure: &'static str) -> Self {
        match err {
            ReaderError::UnsupportedChain(_) => Self::unsupported_chain(),
            ReaderError::InvalidAddress(_) => Self {
                status: StatusCode::BAD_REQUEST,
                message: "Invalid address",
            },
            _ => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: failure,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Plain-text error with `X-Content-Type-Options: nosniff`.
pub fn plain_error(status: StatusCode, message: &'static str) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8")),
            (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        ],
        message,
    )
        .into_response()
}

/// `GET /api/evm/collection/info`
pub async fn collection_info(
    State(state): State<AppState>,
    Query(query): Query<CollectionQuery>,
) -> Result<Json<CollectionInfo>, ApiError> {
    let chain_id = query.chain_id()?;
    state
        .reader
        .info(chain_id, query.address())
        .await
        .map(Json)
        .map_err(|e| {
            if !e.is_client_error() {
                tracing::warn!(chain_id, address = query.address(), error = %e, "collection info failed");
            }
            ApiError::from_reader(&e, "Failed to read contract")
        })
}

/// `GET /api/evm/collection/tokens`
pub async fn collection_tokens(
    State(state): State<AppState>,
    Query(query): Query<CollectionQuery>,
) -> Result<Json<TokenPage>, ApiError> {
    let chain_id = query.chain_id()?;
    let page = query.page();
    let scan = query.scan_config();
    tracing::debug!(chain_id, start = page.start, limit = page.limit, scan = page.scan, "listing tokens");
    state
        .reader
        .tokens(chain_id, query.address(), &page, &scan)
        .await
        .map(Json)
        .map_err(|e| {
            if !e.is_client_error() {
                tracing::warn!(chain_id, address = query.address(), error = %e, "token listing failed");
            }
            ApiError::from_reader(&e, "Failed to enumerate tokens")
        })
}

/// Any other `/api/evm/*` path.
pub async fn not_found() -> Response {
    plain_error(StatusCode::NOT_FOUND, "Not Found")
}
