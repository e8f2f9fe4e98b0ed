//! Chat Relay Server Library
//!
//! HTTP adapter over `relay-core`: participants, heartbeats and messages,
//! plus the background eviction sweeper.

pub mod config;
pub mod ctx;
pub mod error;
pub mod handlers;

use axum::Router;
use std::net::SocketAddr;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{AppState, ServerConfig};

/// Build the application router with CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    handlers::router().with_state(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}

pub async fn run() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("relay_server=info,relay_core=info,tower_http=info"));
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        // Already set, ignore
    }

    info!("=== Chat Relay ===");
    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!("Failed to load .env: {}", e);
        }
    }

    let config = ServerConfig::from_env()?;
    let chat = config.build_service().await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = chat.sweeper().spawn(shutdown_rx);

    let app = build_router(AppState::new(chat));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let the sweeper finish the participant it is working on.
    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper.await {
        warn!("Sweeper task ended abnormally: {}", e);
    }

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
