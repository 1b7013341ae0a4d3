use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod engine;
pub mod repository;
pub mod service;
pub mod store;

use config::ServerConfig;
use engine::RunEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agentrun_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting agent run server...");

    let config = ServerConfig::from_env()?;
    config.validate()?;

    let store = store::create_store();

    // Advance runs in the background
    RunEngine::new(store.clone(), config.tick_interval, config.action_timeout).spawn();

    if config.api_key.is_some() {
        tracing::info!("API key authentication enabled");
    }

    let addr = config.bind_addr.clone();
    let app = api::create_router(api::AppState {
        store,
        config: Arc::new(config),
    });

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
