//! Result payload of a finished run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::run::RunStatus;

/// One typed item of a run's output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text { text: String },
    /// A file produced by the run, downloadable through the files API
    File { file_id: Uuid, filename: String },
}

/// Output of a run, available once it reached a terminal status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub content: Vec<ContentItem>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl RunResult {
    /// All text segments joined by newlines
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|item| match item {
                ContentItem::Text { text } => Some(text.as_str()),
                ContentItem::File { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// File attachments as `(file_id, filename)` pairs
    pub fn files(&self) -> impl Iterator<Item = (Uuid, &str)> {
        self.content.iter().filter_map(|item| match item {
            ContentItem::File { file_id, filename } => Some((*file_id, filename.as_str())),
            ContentItem::Text { .. } => None,
        })
    }
}
