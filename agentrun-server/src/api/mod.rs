//! API Module
//!
//! HTTP API layer of the run service.
//! Each submodule handles endpoints for a specific domain.

pub mod auth;
pub mod error;
pub mod file;
pub mod health;
pub mod run;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::store::Store;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Arc<ServerConfig>,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.config.max_file_bytes).unwrap_or(usize::MAX);

    let api = Router::new()
        // Run endpoints
        .route("/runs", post(run::submit_run).get(run::list_runs))
        .route("/runs/{id}", get(run::get_run))
        .route("/runs/{id}/tool-outputs", post(run::submit_tool_outputs))
        .route("/runs/{id}/cancel", post(run::cancel_run))
        .route("/runs/{id}/result", get(run::get_run_result))
        // File endpoints
        .route("/files", post(file::upload_file).get(file::list_files))
        .route("/files/{id}", get(file::get_file).delete(file::delete_file))
        .route("/files/{id}/content", get(file::download_file))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .nest("/api", api)
        // Add state and middleware
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}
