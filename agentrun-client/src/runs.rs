//! Run-related API endpoints

use agentrun_core::domain::content::RunResult;
use agentrun_core::domain::run::Run;
use agentrun_core::domain::tool::ToolOutput;
use agentrun_core::dto::run::{RunSummary, SubmitRun, SubmitToolOutputs};
use reqwest::Method;
use uuid::Uuid;

use crate::AgentClient;
use crate::error::Result;

impl AgentClient {
    // =============================================================================
    // Run Lifecycle
    // =============================================================================

    /// Submit a new run
    ///
    /// The service accepts the run in `Queued` status and processes it in
    /// the background.
    ///
    /// # Example
    /// ```no_run
    /// # use agentrun_client::AgentClient;
    /// # use agentrun_core::dto::run::SubmitRun;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = AgentClient::new("http://localhost:8080");
    /// let run = client.submit_run(SubmitRun::new("analyst", "hello")).await?;
    /// println!("submitted {}", run.id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit_run(&self, req: SubmitRun) -> Result<Run> {
        let url = format!("{}/api/runs", self.base_url);
        let response = self.request(Method::POST, &url).json(&req).send().await?;

        self.handle_response(response).await
    }

    /// Get the current state of a run
    pub async fn get_run(&self, run_id: Uuid) -> Result<Run> {
        let url = format!("{}/api/runs/{}", self.base_url, run_id);
        let response = self.request(Method::GET, &url).send().await?;

        self.handle_response(response).await
    }

    /// List every run known to the service, newest first
    pub async fn list_runs(&self) -> Result<Vec<RunSummary>> {
        let url = format!("{}/api/runs", self.base_url);
        let response = self.request(Method::GET, &url).send().await?;

        self.handle_response(response).await
    }

    /// Answer the tool calls of a run in `RequiresAction`
    ///
    /// # Arguments
    /// * `run_id` - The run waiting on tool outputs
    /// * `tool_outputs` - One output per pending tool call
    pub async fn submit_tool_outputs(
        &self,
        run_id: Uuid,
        tool_outputs: Vec<ToolOutput>,
    ) -> Result<Run> {
        let url = format!("{}/api/runs/{}/tool-outputs", self.base_url, run_id);
        let response = self
            .request(Method::POST, &url)
            .json(&SubmitToolOutputs { tool_outputs })
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Request cancellation of a run
    ///
    /// The run moves to `Cancelling` and later to `Cancelled`.
    pub async fn cancel_run(&self, run_id: Uuid) -> Result<Run> {
        let url = format!("{}/api/runs/{}/cancel", self.base_url, run_id);
        let response = self.request(Method::POST, &url).send().await?;

        self.handle_response(response).await
    }

    /// Get the output of a finished run
    ///
    /// The service answers 409 while the run is not terminal.
    pub async fn get_run_result(&self, run_id: Uuid) -> Result<RunResult> {
        let url = format!("{}/api/runs/{}/result", self.base_url, run_id);
        let response = self.request(Method::GET, &url).send().await?;

        self.handle_response(response).await
    }
}
