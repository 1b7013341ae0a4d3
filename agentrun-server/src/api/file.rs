//! File API Handlers
//!
//! HTTP endpoints for file upload and download.

use agentrun_core::domain::file::FileObject;
use agentrun_core::dto::file::UploadFileQuery;
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::ApiResult;
use crate::service::file_service;

/// POST /api/files?filename=...
/// Store the raw request body as a file
pub async fn upload_file(
    State(state): State<AppState>,
    Query(query): Query<UploadFileQuery>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<FileObject>)> {
    tracing::info!("Uploading file: {} ({} bytes)", query.filename, body.len());

    let file = file_service::upload_file(
        &state.store,
        query.filename,
        body.to_vec(),
        state.config.max_file_bytes,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(file)))
}

/// GET /api/files
/// List all files
pub async fn list_files(State(state): State<AppState>) -> Json<Vec<FileObject>> {
    Json(file_service::list_files(&state.store).await)
}

/// GET /api/files/{id}
/// File metadata
pub async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<FileObject>> {
    let file = file_service::get_file(&state.store, id).await?;

    Ok(Json(file))
}

/// GET /api/files/{id}/content
/// Raw file content
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    tracing::debug!("Downloading file: {}", id);

    let (file, content) = file_service::download_file(&state.store, id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.filename),
            ),
        ],
        content,
    ))
}

/// DELETE /api/files/{id}
/// Delete a file
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    file_service::delete_file(&state.store, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
