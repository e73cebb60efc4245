use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use loadscope::config::{AppConfig, DEFAULT_CONFIG_PATH};
use loadscope::{server, store, AppState};

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_line_number(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Configuration ─────────────────────────────────────────
    let config_path =
        std::env::var("LOADSCOPE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("failed to load configuration from {config_path}"))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    init_tracing(&config.logging.level, config.logging.json);
    info!(version = env!("CARGO_PKG_VERSION"), config = %config_path, "starting loadscope");

    if config.ingest.accept_client_timestamp {
        warn!("client-supplied timestamps are trusted; ingestion time is no longer authoritative");
    }

    // ── 2. Sample store ──────────────────────────────────────────
    let store = store::open(&config.store)
        .await
        .context("failed to open sample store")?;

    // ── 3. Build shared state & router ───────────────────────────
    let state = Arc::new(AppState::new(store, &config));
    let app = server::create_router(state);

    // ── 4. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;

    info!(addr = %config.server.bind_addr, "ingest → POST /metrics, queries → GET /api/*");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited with error")?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
