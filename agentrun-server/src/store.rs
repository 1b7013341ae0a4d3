//! In-memory storage
//!
//! Runs and files live in maps behind a single async lock shared by the HTTP
//! handlers and the run engine.

use agentrun_core::domain::content::ContentItem;
use agentrun_core::domain::file::FileObject;
use agentrun_core::domain::message::Message;
use agentrun_core::domain::run::{Run, RunFailure, RunStatus};
use agentrun_core::domain::tool::ToolOutput;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Shared handle to the store
pub type Store = Arc<RwLock<StoreState>>;

#[derive(Debug, Default)]
pub struct StoreState {
    pub runs: HashMap<Uuid, RunRecord>,
    pub files: HashMap<Uuid, FileRecord>,
}

/// A run together with the inputs and outputs the API doesn't expose on `Run`
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub run: Run,
    pub messages: Vec<Message>,
    pub tool_outputs: Vec<ToolOutput>,
    pub content: Vec<ContentItem>,
    /// When the run last entered `RequiresAction`
    pub action_since: Option<DateTime<Utc>>,
}

impl RunRecord {
    /// Moves the run to `next`, maintaining timestamps and the pending action
    ///
    /// Returns false, leaving the run untouched, when the transition is not
    /// allowed.
    pub fn transition(&mut self, next: RunStatus, now: DateTime<Utc>) -> bool {
        let current = self.run.status;
        if !current.can_transition_to(next) {
            return false;
        }
        if current == next {
            return true;
        }

        if next == RunStatus::InProgress && self.run.started_at.is_none() {
            self.run.started_at = Some(now);
        }

        if current == RunStatus::RequiresAction {
            self.run.required_action = None;
            self.action_since = None;
        }
        if next == RunStatus::RequiresAction {
            self.action_since = Some(now);
        }

        if next.is_terminal() {
            self.run.completed_at = Some(now);
        }

        self.run.status = next;
        true
    }

    /// Moves the run to a terminal failure status with a reason
    pub fn fail(&mut self, status: RunStatus, failure: RunFailure, now: DateTime<Utc>) -> bool {
        if !self.transition(status, now) {
            return false;
        }
        self.run.last_error = Some(failure);
        true
    }

    /// Content of the last user message
    pub fn last_user_message(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == agentrun_core::domain::message::Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// A stored file and its bytes
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub file: FileObject,
    pub content: Vec<u8>,
}

impl FileRecord {
    pub fn new(filename: String, content: Vec<u8>, now: DateTime<Utc>) -> Self {
        Self {
            file: FileObject {
                id: Uuid::new_v4(),
                filename,
                bytes: content.len() as u64,
                created_at: now,
            },
            content,
        }
    }
}

/// Create an empty store
pub fn create_store() -> Store {
    Arc::new(RwLock::new(StoreState::default()))
}
