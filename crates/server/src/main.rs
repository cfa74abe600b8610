use std::sync::Arc;

use anyhow::Context;
use mapgen_server::{AppState, ServerConfig, cors_layer, create_router};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    info!("starting mapgen server");
    let config = ServerConfig::load().context("failed to load server config")?;

    let state = Arc::new(AppState::from_config(&config).context("failed to initialize app state")?);
    let tracker = state.tracker.clone();
    info!(
        backend = %config.backend.base_url,
        templates = %state.templates.root().display(),
        artifacts = %state.artifacts.root().display(),
        "app state initialized"
    );

    let app = create_router(state).layer(cors_layer(&config.server.cors_allowed_origins)?);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_address))?;
    info!(address = %config.server.bind_address, "server is ready, press Ctrl+C to shut down");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracker.shutdown().await;
    info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received, stopping server");
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}
