//! Health check
//!
//! Open endpoint reporting liveness and how much the store holds.

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::api::AppState;

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.read().await;
    let live = store
        .runs
        .values()
        .filter(|r| !r.run.status.is_terminal())
        .count();

    Json(json!({
        "status": "ok",
        "runs": store.runs.len(),
        "live_runs": live,
        "files": store.files.len(),
    }))
}
