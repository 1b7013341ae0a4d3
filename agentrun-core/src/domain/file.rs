//! File domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata of a file stored by the run service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileObject {
    pub id: Uuid,
    pub filename: String,
    /// Size of the content in bytes
    pub bytes: u64,
    pub created_at: DateTime<Utc>,
}
