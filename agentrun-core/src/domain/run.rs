//! Run domain types
//!
//! A run is one unit of work handed to an agent. The service drives its
//! status; clients only observe it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::tool::{ToolCall, ToolDefinition};

/// A run as reported by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: Uuid,
    pub agent: String,
    pub instructions: Option<String>,
    pub status: RunStatus,
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Present only while `status` is `RequiresAction`
    pub required_action: Option<RequiredAction>,
    pub last_error: Option<RunFailure>,
}

/// Run lifecycle status
///
/// `Completed`, `Failed`, `Cancelled` and `Expired` are terminal: once
/// reached, the status never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Completed,
    Failed,
    Expired,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired
        )
    }

    pub fn requires_action(self) -> bool {
        self == RunStatus::RequiresAction
    }

    /// Terminal or waiting on the caller: nothing changes until someone acts
    pub fn is_settled(self) -> bool {
        self.is_terminal() || self.requires_action()
    }

    /// Whether the service may move a run from `self` to `next`
    ///
    /// Staying in the same status is always allowed. Terminal statuses
    /// admit no other transition.
    pub fn can_transition_to(self, next: RunStatus) -> bool {
        use RunStatus::*;

        if self == next {
            return true;
        }

        match self {
            Queued => matches!(next, InProgress | Cancelling | Cancelled | Failed | Expired),
            InProgress => matches!(
                next,
                RequiresAction | Cancelling | Completed | Failed | Expired
            ),
            RequiresAction => matches!(next, InProgress | Cancelling | Failed | Expired),
            Cancelling => matches!(next, Cancelled | Failed),
            Cancelled | Completed | Failed | Expired => false,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Expired => "expired",
        };
        write!(f, "{}", s)
    }
}

/// Tool calls the service needs answered before the run can continue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredAction {
    pub tool_calls: Vec<ToolCall>,
}

/// Why a run ended in `Failed` or `Expired`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFailure {
    pub code: String,
    pub message: String,
}

impl std::fmt::Display for RunFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
