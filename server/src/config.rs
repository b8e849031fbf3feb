//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use chainnft_core::chain::{defaults, ChainRegistry};
use chainnft_evm::{ReaderConfig, DEFAULT_IPFS_GATEWAY};
use chainnft_http::{GatewayConfig, HttpClientConfig};

use crate::proxy::UpstreamConfig;
use crate::telemetry::LogConfig;

pub const DEFAULT_RESERVOIR_API: &str = "https://api.reservoir.tools";
pub const DEFAULT_COINGECKO_API: &str = "https://api.coingecko.com/api/v3";

#[derive(Debug, Clone, Parser)]
#[command(
    name = "chainnft",
    about = "On-chain NFT collection reader with API proxies and a static UI",
    long_about = "
Serves /api/evm/collection/{info,tokens} straight from JSON-RPC nodes,
proxies /api/reservoir/* and /api/cg/*, and serves PUBLIC_DIR for
everything else.

A .env file in the working directory is loaded unless NODE_ENV or APP_ENV
is 'production'. Variables already set in the environment win.
",
    version
)]
pub struct Config {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on; the next ports are tried if it is taken
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Directory served for non-API paths
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    pub public_dir: PathBuf,

    /// Ethereum mainnet JSON-RPC URL
    #[arg(long, env = "RPC_ETH", default_value = defaults::ETHEREUM_RPC)]
    pub rpc_eth: String,

    /// Base JSON-RPC URL
    #[arg(long, env = "RPC_BASE", default_value = defaults::BASE_RPC)]
    pub rpc_base: String,

    /// Polygon JSON-RPC URL
    #[arg(long, env = "RPC_POLYGON", default_value = defaults::POLYGON_RPC)]
    pub rpc_polygon: String,

    /// Reservoir API base URL
    #[arg(long, env = "RESERVOIR_API", default_value = DEFAULT_RESERVOIR_API)]
    pub reservoir_api: String,

    /// Reservoir API key, sent as x-api-key
    #[arg(long, env = "RESERVOIR_API_KEY", default_value = "", hide_env_values = true)]
    pub reservoir_api_key: String,

    /// CoinGecko API base URL
    #[arg(long, env = "COINGECKO_API", default_value = DEFAULT_COINGECKO_API)]
    pub coingecko_api: String,

    /// Gateway that ipfs:// URIs are rewritten onto
    #[arg(long, env = "IPFS_GATEWAY", default_value = DEFAULT_IPFS_GATEWAY)]
    pub ipfs_gateway: String,

    /// Timeout for each JSON-RPC request, in milliseconds
    #[arg(long, env = "RPC_TIMEOUT_MS", default_value_t = 15_000)]
    pub rpc_timeout_ms: u64,

    /// Timeout for each metadata fetch, in milliseconds
    #[arg(long, env = "METADATA_TIMEOUT_MS", default_value_t = 10_000)]
    pub metadata_timeout_ms: u64,

    /// Timeout for proxied upstream requests, in milliseconds
    #[arg(long, env = "PROXY_TIMEOUT_MS", default_value_t = 30_000)]
    pub proxy_timeout_ms: u64,

    /// Token resolutions in flight per listing request (1 = sequential)
    #[arg(long, env = "FETCH_CONCURRENCY", default_value_t = 1)]
    pub fetch_concurrency: usize,

    /// Log filter directive
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit JSON logs
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,
}

impl Config {
    pub fn registry(&self) -> ChainRegistry {
        ChainRegistry::from_urls(&self.rpc_eth, &self.rpc_base, &self.rpc_polygon)
    }

    pub fn reader_config(&self) -> ReaderConfig {
        ReaderConfig {
            rpc: HttpClientConfig {
                request_timeout: Duration::from_millis(self.rpc_timeout_ms),
            },
            metadata: GatewayConfig {
                request_timeout: Duration::from_millis(self.metadata_timeout_ms),
                ..GatewayConfig::default()
            },
            ipfs_gateway: self.ipfs_gateway.clone(),
            fetch_concurrency: self.fetch_concurrency.max(1),
        }
    }

    pub fn upstream_config(&self) -> UpstreamConfig {
        UpstreamConfig {
            reservoir_api: self.reservoir_api.clone(),
            reservoir_api_key: Some(self.reservoir_api_key.clone()).filter(|k| !k.is_empty()),
            coingecko_api: self.coingecko_api.clone(),
            timeout: Duration::from_millis(self.proxy_timeout_ms),
        }
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.log_level.clone(),
            json: self.log_json,
        }
    }
}

/// `true` when `NODE_ENV` or `APP_ENV` is `production`.
pub fn is_production() -> bool {
    ["NODE_ENV", "APP_ENV"]
        .iter()
        .any(|key| std::env::var(key).is_ok_and(|v| v.eq_ignore_ascii_case("production")))
}

/// Load `.env` outside production. Returns the loaded file, if any.
/// A missing file is not an error.
pub fn load_dotenv() -> anyhow::Result<Option<PathBuf>> {
    if is_production() {
        return Ok(None);
    }
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(anyhow::Error::new(e).context("failed to load .env")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_supported_chains() {
        let config = Config::try_parse_from(["chainnft"]).unwrap();
        let registry = config.registry();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get(1).unwrap().rpc_url, config.rpc_eth);

        let reader = config.reader_config();
        assert_eq!(reader.rpc.request_timeout, Duration::from_millis(config.rpc_timeout_ms));
        assert!(reader.fetch_concurrency >= 1);
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "chainnft",
            "--port",
            "8080",
            "--rpc-base",
            "https://base.example",
            "--reservoir-api-key",
            "secret",
            "--fetch-concurrency",
            "0",
            "--log-json",
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.registry().get(8453).unwrap().rpc_url, "https://base.example");
        assert_eq!(config.upstream_config().reservoir_api_key.as_deref(), Some("secret"));
        assert_eq!(config.reader_config().fetch_concurrency, 1);
        assert!(config.log_config().json);
    }
}
