//! `chainnft`: serves the collection reader API, the proxies and the UI.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use chainnft_evm::CollectionReader;
use chainnft_server::config::{self, Config};
use chainnft_server::listener::{bind_with_fallback, PORT_ATTEMPTS};
use chainnft_server::proxy::Upstream;
use chainnft_server::telemetry::init_tracing;
use chainnft_server::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = config::load_dotenv()?;
    let config = Config::parse();
    init_tracing(&config.log_config());
    if let Some(path) = dotenv {
        tracing::info!(path = %path.display(), "loaded environment file");
    }

    let registry = Arc::new(config.registry());
    let reader = CollectionReader::connect(registry, &config.reader_config())
        .context("failed to build RPC clients")?;
    tracing::info!(chains = reader.registry().len(), "collection reader ready");
    let upstream = Upstream::new(config.upstream_config()).context("failed to build proxy client")?;

    let app = create_router(AppState::new(reader, upstream), &config.public_dir);

    let listener = bind_with_fallback(&config.host, config.port, PORT_ATTEMPTS)
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, public_dir = %config.public_dir.display(), "chainnft listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
