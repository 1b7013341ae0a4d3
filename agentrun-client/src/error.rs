//! Error types for the agentrun client

use agentrun_core::domain::run::RunStatus;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the agentrun client
///
/// A run ending in `Failed`, `Cancelled` or `Expired` is not an error: those
/// are statuses and are returned as values.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The service rejected the request as malformed (400)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The service failed while handling the request (500)
    #[error("Internal error: {0}")]
    InternalError(String),

    /// The run did not settle before the poll deadline
    #[error("Run {run_id} did not settle within {waited:?}")]
    WaitTimedOut { run_id: Uuid, waited: Duration },

    /// The wait was cancelled by the caller
    #[error("Wait for run {0} was cancelled")]
    WaitCancelled(Uuid),

    /// The service reported a status that leaves a terminal state
    #[error("Run {run_id} regressed from terminal status {from} to {to}")]
    StatusRegressed {
        run_id: Uuid,
        from: RunStatus,
        to: RunStatus,
    },

    /// The run kept asking for tool outputs
    #[error("Run {run_id} still requires action after {rounds} tool round(s)")]
    ToolRoundsExceeded { run_id: Uuid, rounds: u32 },
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
            || matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::InternalError(_))
            || matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }

    /// Check if retrying the same request may succeed
    ///
    /// Connection failures, timeouts, throttling (429) and 5xx responses are
    /// transient. Everything else is a terminal error.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(err) => err.is_connect() || err.is_timeout(),
            Self::ApiError { status: 429, .. } => true,
            Self::ApiError { .. } | Self::InternalError(_) => self.is_server_error(),
            _ => false,
        }
    }
}
