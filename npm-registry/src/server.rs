//! HTTP server setup and the service-level routes.
//!
//! The router mounts the npm protocol handlers from [`crate::npm`] at the
//! root, so the server URL itself is the registry URL clients configure.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::AppResult;
use crate::{config::Config, npm, state::AppState, validation};

/// Build the full application router over `state`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_request_body_size_bytes();

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/-/v1/search", get(npm::search))
        .route("/-/all", get(npm::list_all))
        .route("/-/v1/login", post(npm::login))
        .route("/-/user/{user}", put(npm::user_login))
        .route("/-/whoami", get(npm::whoami))
        .route("/-/ping", get(npm::ping))
        .route(
            "/{package}",
            get(npm::package_metadata).put(npm::publish_package),
        )
        .route(
            "/{package}/-/{filename}",
            get(npm::download_tarball).put(npm::upload_tarball),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Validate the listen address, bind, and serve until Ctrl-C.
pub async fn run_server(config: Config) -> Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;

    validation::validate_hostname(&host).map_err(|e| {
        error!(host = %host, error = %e, "Invalid host parameter");
        anyhow::anyhow!("Invalid host parameter: {}", e)
    })?;
    validation::validate_port(port).map_err(|e| {
        error!(port = %port, error = %e, "Invalid port parameter");
        anyhow::anyhow!("Invalid port parameter: {}", e)
    })?;

    let data_dir = config.storage.data_dir.clone();
    tokio::fs::create_dir_all(&data_dir).await.map_err(|e| {
        error!(data_dir = %data_dir.display(), error = %e, "Failed to create data directory");
        anyhow::anyhow!("Failed to create data directory {}: {}", data_dir.display(), e)
    })?;
    info!(data_dir = %data_dir.display(), "Using data directory");

    let state = Arc::new(AppState::from_config(config));
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse().map_err(|e| {
        error!(host = %host, port = %port, error = %e, "Invalid socket address");
        anyhow::anyhow!("Invalid socket address {}:{}: {}", host, port, e)
    })?;

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        error!(addr = %addr, error = %e, "Failed to bind to address");
        anyhow::anyhow!("Failed to bind to {}:{}: {}", host, port, e)
    })?;

    info!("npm registry listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!(error = %e, "Server error");
            anyhow::anyhow!("Server error: {}", e)
        })?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn status_handler(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let packages = state.registry.package_count().await?;
    Ok(Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "data_directory": state.config.storage.data_dir.display().to_string(),
        "packages": packages,
    })))
}
