//! Pass-through proxies for the Reservoir and CoinGecko APIs.
//!
//! Responses are streamed back with the upstream status and headers, minus
//! hop-by-hop headers. An unreachable upstream is a plain-text 502.

use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, RawQuery, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use url::{form_urlencoded, Url};

use crate::handlers::{plain_error, AppState};

/// CoinGecko paths that may be proxied.
pub const COINGECKO_ALLOWED: [&str; 2] = ["search", "nfts/markets"];

const X_API_KEY: HeaderName = HeaderName::from_static("x-api-key");
const X_CHAIN_ID: HeaderName = HeaderName::from_static("x-chain-id");

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub reservoir_api: String,
    pub reservoir_api_key: Option<String>,
    pub coingecko_api: String,
    pub timeout: Duration,
}

/// Shared HTTP client for proxied requests.
pub struct Upstream {
    http: reqwest::Client,
    config: UpstreamConfig,
}

impl Upstream {
    pub fn new(config: UpstreamConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(chainnft_http::USER_AGENT)
            .build()?;
        Ok(Self { http, config })
    }
}

/// `<base>/<path>?<query>`; `None` if the base is not a valid URL.
///
/// `path` arrives percent-decoded, so it is appended segment by segment and
/// re-escaped rather than spliced into the URL text.
fn target_url(base: &str, path: &str, query: Option<String>) -> Option<Url> {
    let mut url = Url::parse(base).ok()?;
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(path.split('/'));
    url.set_query(query.as_deref().filter(|q| !q.is_empty()));
    Some(url)
}

/// Split `chainId` out of a query string, keeping every other pair in order.
fn split_chain_id(query: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(query) = query else {
        return (None, None);
    };
    let mut chain_id = None;
    let mut rest = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if key == "chainId" {
            chain_id = Some(value.into_owned());
        } else {
            rest.append_pair(&key, &value);
        }
    }
    (chain_id.filter(|c| !c.is_empty()), Some(rest.finish()))
}

/// Stream an upstream response back, dropping hop-by-hop headers.
fn relay(resp: reqwest::Response, default_content_type: Option<HeaderValue>) -> Response {
    let status = resp.status();
    let mut headers = HeaderMap::new();
    if let Some(ct) = default_content_type {
        headers.insert(header::CONTENT_TYPE, ct);
    }
    for (name, value) in resp.headers() {
        if name == header::TRANSFER_ENCODING || name == header::CONNECTION {
            continue;
        }
        if name == header::CONTENT_TYPE {
            headers.insert(name.clone(), value.clone());
        } else {
            headers.append(name.clone(), value.clone());
        }
    }
    let mut response = Body::from_stream(resp.bytes_stream()).into_response();
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

fn upstream_error(upstream: &str, error: &dyn std::fmt::Display) -> Response {
    tracing::warn!(upstream, error = %error, "upstream request failed");
    plain_error(StatusCode::BAD_GATEWAY, "Upstream Error")
}

/// `GET|HEAD /api/reservoir/*path`
pub async fn reservoir(
    State(state): State<AppState>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let upstream = &state.upstream;
    let (chain_id, query) = split_chain_id(query.as_deref());
    let Some(url) = target_url(&upstream.config.reservoir_api, &path, query) else {
        return upstream_error("reservoir", &"invalid upstream URL");
    };

    let accept = headers
        .get(header::ACCEPT)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));
    let mut req = upstream
        .http
        .request(method, url)
        .header(header::ACCEPT, accept);
    if let Some(key) = &upstream.config.reservoir_api_key {
        req = req.header(X_API_KEY, key);
    }
    if let Some(chain_id) = chain_id {
        req = req.header(X_CHAIN_ID, chain_id);
    }

    match req.send().await {
        Ok(resp) => relay(resp, None),
        Err(e) => upstream_error("reservoir", &e),
    }
}

/// `GET /api/cg/*path`, limited to [`COINGECKO_ALLOWED`].
pub async fn coingecko(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    if !COINGECKO_ALLOWED.contains(&path.as_str()) {
        return plain_error(StatusCode::NOT_FOUND, "Not Found");
    }
    let upstream = &state.upstream;
    let Some(url) = target_url(&upstream.config.coingecko_api, &path, query) else {
        return upstream_error("coingecko", &"invalid upstream URL");
    };

    let req = upstream
        .http
        .get(url)
        .header(header::ACCEPT, "application/json");
    match req.send().await {
        Ok(resp) => relay(
            resp,
            Some(HeaderValue::from_static("application/json; charset=utf-8")),
        ),
        Err(e) => upstream_error("coingecko", &e),
    }
}
