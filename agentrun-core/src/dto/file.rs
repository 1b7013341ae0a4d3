//! File DTOs

use serde::{Deserialize, Serialize};

/// Query string of a file upload; the body carries the raw bytes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFileQuery {
    pub filename: String,
}
