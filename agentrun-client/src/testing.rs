//! Scripted run service for unit tests

use agentrun_core::domain::content::{ContentItem, RunResult};
use agentrun_core::domain::run::{RequiredAction, Run, RunFailure, RunStatus};
use agentrun_core::domain::tool::{ToolCall, ToolOutput};
use agentrun_core::dto::run::SubmitRun;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use crate::error::{ClientError, Result};
use crate::service::RunService;

/// One scripted answer to a poll
#[derive(Debug, Clone)]
pub enum Step {
    Status(RunStatus),
    Action(Vec<ToolCall>),
    /// A 503 from the service
    Transient,
    /// A 400 from the service
    Rejected,
}

/// Answers polls from a script; once the script runs out every poll reports `InProgress`
pub struct ScriptedService {
    pub run_id: Uuid,
    steps: Mutex<VecDeque<Step>>,
    pub polls: AtomicUsize,
    pub submissions: AtomicUsize,
    pub tool_outputs: Mutex<Vec<Vec<ToolOutput>>>,
}

impl ScriptedService {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            steps: Mutex::new(steps.into()),
            polls: AtomicUsize::new(0),
            submissions: AtomicUsize::new(0),
            tool_outputs: Mutex::new(Vec::new()),
        }
    }

    pub fn from_statuses(statuses: &[RunStatus]) -> Self {
        Self::new(statuses.iter().copied().map(Step::Status).collect())
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn run(&self, status: RunStatus) -> Run {
        Run {
            id: self.run_id,
            agent: "scripted".to_string(),
            instructions: None,
            status,
            tools: Vec::new(),
            metadata: HashMap::new(),
            created_at: chrono::Utc::now(),
            started_at: None,
            completed_at: None,
            required_action: None,
            last_error: (status == RunStatus::Failed).then(|| RunFailure {
                code: "server_error".to_string(),
                message: "scripted failure".to_string(),
            }),
        }
    }
}

pub fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments,
    }
}

#[async_trait]
impl RunService for ScriptedService {
    async fn submit(&self, _spec: SubmitRun) -> Result<Run> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        Ok(self.run(RunStatus::Queued))
    }

    async fn poll(&self, _run_id: Uuid) -> Result<Run> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();

        match step {
            None => Ok(self.run(RunStatus::InProgress)),
            Some(Step::Status(status)) => Ok(self.run(status)),
            Some(Step::Action(tool_calls)) => {
                let mut run = self.run(RunStatus::RequiresAction);
                run.required_action = Some(RequiredAction { tool_calls });
                Ok(run)
            }
            Some(Step::Transient) => Err(ClientError::api_error(503, "unavailable")),
            Some(Step::Rejected) => Err(ClientError::api_error(400, "bad request")),
        }
    }

    async fn fetch(&self, run_id: Uuid) -> Result<RunResult> {
        Ok(RunResult {
            run_id,
            status: RunStatus::Completed,
            content: vec![ContentItem::Text {
                text: "done".to_string(),
            }],
            completed_at: Some(chrono::Utc::now()),
        })
    }

    async fn submit_tool_outputs(&self, _run_id: Uuid, outputs: Vec<ToolOutput>) -> Result<Run> {
        self.tool_outputs.lock().unwrap().push(outputs);
        Ok(self.run(RunStatus::InProgress))
    }

    async fn cancel(&self, _run_id: Uuid) -> Result<Run> {
        Ok(self.run(RunStatus::Cancelling))
    }
}
