// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::application::stream_service::{StreamService, STREAM_PERIOD};
use crate::infrastructure::config::load_settings;
use crate::infrastructure::novant_client::{build_http_client, NovantConnector};
use crate::presentation::app_state::AppState;
use crate::presentation::router::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let settings = load_settings()?;

    // Upstream connector (infrastructure layer), one pool for every instance key
    let http = build_http_client(settings.novant.timeout())?;
    let connector = Arc::new(NovantConnector::new(http, settings.novant.base_url.clone()));

    let shutdown = CancellationToken::new();
    let state = Arc::new(AppState {
        connector,
        default_api_key: settings.novant.api_key.clone(),
        query_deadline: settings.query.deadline(),
        health_deadline: settings.health.deadline(),
        stream_service: StreamService::new(),
        stream_period: STREAM_PERIOD,
        shutdown: shutdown.clone(),
    });

    // Start server
    let addr: SocketAddr = settings.server.listen_addr.parse()?;
    tracing::info!(%addr, upstream = %settings.novant.base_url, "starting novant datasource");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
