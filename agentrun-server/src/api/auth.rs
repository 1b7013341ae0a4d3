//! API key check
//!
//! When a key is configured, `/api` requests must carry it as a bearer token.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::api::AppState;
use crate::api::error::ApiError;

/// Rejects requests without the configured bearer token
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.config.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if provided != Some(expected) {
        tracing::warn!("Rejected {} {}: bad API key", request.method(), request.uri());
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}
