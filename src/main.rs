// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use homepage_config_helper::application::config_service::ConfigService;
use homepage_config_helper::infrastructure::config::load_helper_config;
use homepage_config_helper::infrastructure::fs_store::FsConfigStore;
use homepage_config_helper::presentation::app_state::AppState;
use homepage_config_helper::presentation::handlers::{
    get_canonical, health_check, list_files, preview_canonical, publish,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_helper_config()?;

    // Storage (infrastructure layer)
    let store = Arc::new(FsConfigStore::new(config.config_dir.clone()));

    // Use cases (application layer)
    let config_service = ConfigService::new(store);

    let state = Arc::new(AppState { config_service });

    let router = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/files", get(list_files))
        .route("/api/config/canonical", get(get_canonical))
        .route("/api/config/preview", post(preview_canonical))
        .route("/api/publish", post(publish))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address: {}", config.bind_addr))?;
    tracing::info!(
        %addr,
        config_dir = %config.config_dir.display(),
        "Starting homepage-config-helper"
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
