//! Run service abstraction
//!
//! The poller and the session only talk to the remote service through this
//! trait, so they can be driven by a scripted service in tests.

use agentrun_core::domain::content::RunResult;
use agentrun_core::domain::run::Run;
use agentrun_core::domain::tool::ToolOutput;
use agentrun_core::dto::run::SubmitRun;
use async_trait::async_trait;
use uuid::Uuid;

use crate::AgentClient;
use crate::error::Result;

/// Operations of a remote run service
#[async_trait]
pub trait RunService: Send + Sync {
    /// Hands a unit of work to the service and returns the accepted run
    async fn submit(&self, spec: SubmitRun) -> Result<Run>;

    /// Queries the current state of a run once
    async fn poll(&self, run_id: Uuid) -> Result<Run>;

    /// Retrieves the output of a run that reached a terminal status
    async fn fetch(&self, run_id: Uuid) -> Result<RunResult>;

    /// Answers the pending tool calls of a run
    async fn submit_tool_outputs(&self, run_id: Uuid, outputs: Vec<ToolOutput>) -> Result<Run>;

    /// Requests cancellation of a run
    async fn cancel(&self, run_id: Uuid) -> Result<Run>;
}

#[async_trait]
impl RunService for AgentClient {
    async fn submit(&self, spec: SubmitRun) -> Result<Run> {
        self.submit_run(spec).await
    }

    async fn poll(&self, run_id: Uuid) -> Result<Run> {
        self.get_run(run_id).await
    }

    async fn fetch(&self, run_id: Uuid) -> Result<RunResult> {
        self.get_run_result(run_id).await
    }

    async fn submit_tool_outputs(&self, run_id: Uuid, outputs: Vec<ToolOutput>) -> Result<Run> {
        AgentClient::submit_tool_outputs(self, run_id, outputs).await
    }

    async fn cancel(&self, run_id: Uuid) -> Result<Run> {
        self.cancel_run(run_id).await
    }
}
