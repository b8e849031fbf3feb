//! # chainnft-server
//!
//! axum application for ChainNFT: the on-chain collection endpoints, the
//! Reservoir and CoinGecko proxies and the static UI.

pub mod config;
pub mod handlers;
pub mod listener;
pub mod proxy;
pub mod routes;
pub mod telemetry;

pub use config::Config;
pub use handlers::AppState;
pub use routes::create_router;
