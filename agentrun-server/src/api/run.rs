//! Run API Handlers
//!
//! HTTP endpoints for the run lifecycle.

use agentrun_core::domain::content::RunResult;
use agentrun_core::domain::run::Run;
use agentrun_core::dto::run::{RunSummary, SubmitRun, SubmitToolOutputs};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::ApiResult;
use crate::service::run_service;

/// POST /api/runs
/// Validate and queue a new run
pub async fn submit_run(
    State(state): State<AppState>,
    Json(req): Json<SubmitRun>,
) -> ApiResult<(StatusCode, Json<Run>)> {
    tracing::info!("Submitting run for agent: {}", req.agent);

    let run = run_service::submit_run(&state.store, req).await?;

    Ok((StatusCode::CREATED, Json(run)))
}

/// GET /api/runs
/// List all runs
pub async fn list_runs(State(state): State<AppState>) -> Json<Vec<RunSummary>> {
    tracing::debug!("Listing runs");

    Json(run_service::list_runs(&state.store).await)
}

/// GET /api/runs/{id}
/// Current state of a run
pub async fn get_run(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Run>> {
    tracing::debug!("Polling run: {}", id);

    let run = run_service::get_run(&state.store, id).await?;

    Ok(Json(run))
}

/// POST /api/runs/{id}/tool-outputs
/// Answer the pending tool calls of a run
pub async fn submit_tool_outputs(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitToolOutputs>,
) -> ApiResult<Json<Run>> {
    tracing::info!("Received {} tool output(s) for run: {}", req.tool_outputs.len(), id);

    let run = run_service::submit_tool_outputs(&state.store, id, req.tool_outputs).await?;

    Ok(Json(run))
}

/// POST /api/runs/{id}/cancel
/// Request cancellation of a run
pub async fn cancel_run(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Run>> {
    tracing::info!("Cancelling run: {}", id);

    let run = run_service::cancel_run(&state.store, id).await?;

    Ok(Json(run))
}

/// GET /api/runs/{id}/result
/// Output of a terminal run
pub async fn get_run_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RunResult>> {
    tracing::debug!("Fetching result of run: {}", id);

    let result = run_service::get_result(&state.store, id).await?;

    Ok(Json(result))
}
