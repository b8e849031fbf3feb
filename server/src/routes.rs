//! # Routes
//!
//! ```text
//! /api/evm
//! ├── /collection/info        GET  - name, symbol, totalSupply, enumerable
//! ├── /collection/tokens      GET  - paged token listing
//! └── /*                      404
//! /api/reservoir/*path        GET|HEAD - Reservoir proxy
//! /api/cg/*path               GET  - CoinGecko proxy (search, nfts/markets)
//! /*                          static files from PUBLIC_DIR
//! ```

use std::path::Path;

use axum::http::{header, HeaderValue};
use axum::middleware::map_response;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{self, AppState};
use crate::proxy;

/// Build the application router.
pub fn create_router(state: AppState, public_dir: impl AsRef<Path>) -> Router {
    let evm = Router::new()
        .route("/collection/info", get(handlers::collection_info))
        .route("/collection/tokens", get(handlers::collection_tokens))
        .fallback(handlers::not_found)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ));

    let proxies = Router::new()
        .route("/api/reservoir/*path", get(proxy::reservoir))
        .route("/api/cg/*path", get(proxy::coingecko));

    Router::new()
        .nest("/api/evm", evm)
        .merge(proxies)
        .fallback_service(static_files(public_dir.as_ref()))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `ServeDir` with `index.html` for directories and a cache policy by type.
fn static_files(public_dir: &Path) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(public_dir))
        .layer(map_response(static_cache_control))
}

/// HTML is revalidated on every load; other assets are cached for an hour.
async fn static_cache_control(mut res: Response) -> Response {
    if !res.status().is_success() || res.headers().contains_key(header::CACHE_CONTROL) {
        return res;
    }
    let is_html = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/html"));
    let policy = if is_html {
        "no-cache"
    } else {
        "public, max-age=3600"
    };
    res.headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static(policy));
    res
}
