//! Run session
//!
//! Drives the submit → poll → fetch flow against a [`RunService`] and keeps
//! a process-local list of every handle it submitted, for later inspection.

use agentrun_core::domain::content::RunResult;
use agentrun_core::domain::run::{Run, RunStatus};
use agentrun_core::dto::run::SubmitRun;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ClientError, Result};
use crate::poller::{PollPolicy, RunPoller};
use crate::service::RunService;
use crate::tools::ToolRegistry;

const DEFAULT_MAX_TOOL_ROUNDS: u32 = 8;

/// Local view of a submitted run
///
/// The cached status can go stale between polls, but it never leaves a
/// terminal status once one was observed.
#[derive(Debug, Clone, PartialEq)]
pub struct RunHandle {
    pub id: Uuid,
    pub agent: String,
    pub submitted_at: DateTime<Utc>,
    status: RunStatus,
}

impl RunHandle {
    pub fn new(run: &Run) -> Self {
        Self {
            id: run.id,
            agent: run.agent.clone(),
            submitted_at: run.created_at,
            status: run.status,
        }
    }

    /// Last observed status
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Records a freshly observed status
    pub fn observe(&mut self, status: RunStatus) -> Result<()> {
        if self.status.is_terminal() && status != self.status {
            return Err(ClientError::StatusRegressed {
                run_id: self.id,
                from: self.status,
                to: status,
            });
        }

        self.status = status;
        Ok(())
    }
}

/// What a run ended with
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Final snapshot; its status is terminal
    pub run: Run,
    /// Output, fetched only for `Completed` runs
    pub result: Option<RunResult>,
    /// How many times tool outputs were submitted
    pub tool_rounds: u32,
}

/// Submits runs and follows them to completion
pub struct Session<S: ?Sized> {
    service: Arc<S>,
    poller: RunPoller<S>,
    tools: ToolRegistry,
    max_tool_rounds: u32,
    handles: Mutex<Vec<RunHandle>>,
}

impl<S: RunService + ?Sized> Session<S> {
    pub fn new(service: Arc<S>, policy: PollPolicy) -> Self {
        Self {
            poller: RunPoller::new(Arc::clone(&service), policy),
            service,
            tools: ToolRegistry::new(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Uses `tools` to answer tool calls in [`run_to_completion`](Self::run_to_completion)
    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: u32) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Submits a run and remembers its handle
    pub async fn submit(&self, spec: SubmitRun) -> Result<RunHandle> {
        let run = self.service.submit(spec).await?;
        info!("Submitted run {} to agent {}", run.id, run.agent);

        let handle = RunHandle::new(&run);
        self.handles_guard().push(handle.clone());

        Ok(handle)
    }

    /// Waits for the run to settle and refreshes the handle
    pub async fn wait(&self, handle: &mut RunHandle) -> Result<Run> {
        let run = self.poller.wait(handle.id).await?;
        self.observe(handle, run.status)?;
        Ok(run)
    }

    /// Like [`wait`](Self::wait), but stops when `token` fires
    pub async fn wait_with_cancel(
        &self,
        handle: &mut RunHandle,
        token: &CancellationToken,
    ) -> Result<Run> {
        let run = self.poller.wait_with_cancel(handle.id, token).await?;
        self.observe(handle, run.status)?;
        Ok(run)
    }

    /// Retrieves the output of a terminal run
    pub async fn fetch(&self, handle: &RunHandle) -> Result<RunResult> {
        self.service.fetch(handle.id).await
    }

    /// Asks the service to cancel the run
    pub async fn cancel(&self, handle: &mut RunHandle) -> Result<Run> {
        let run = self.service.cancel(handle.id).await?;
        self.observe(handle, run.status)?;
        Ok(run)
    }

    /// Submits `spec`, answers tool calls until the run is terminal, and
    /// fetches the result of a completed run
    pub async fn run_to_completion(&self, spec: SubmitRun) -> Result<RunOutcome> {
        let mut handle = self.submit(spec).await?;
        let mut rounds = 0;

        loop {
            let run = self.wait(&mut handle).await?;

            if run.status.requires_action() {
                if rounds >= self.max_tool_rounds {
                    return Err(ClientError::ToolRoundsExceeded {
                        run_id: run.id,
                        rounds,
                    });
                }
                rounds += 1;

                let calls = run
                    .required_action
                    .map(|action| action.tool_calls)
                    .unwrap_or_default();
                let outputs = self.tools.dispatch(&calls).await;
                info!(
                    "Submitting {} tool output(s) for run {} (round {})",
                    outputs.len(),
                    run.id,
                    rounds
                );

                let updated = self.service.submit_tool_outputs(run.id, outputs).await?;
                self.observe(&mut handle, updated.status)?;
                continue;
            }

            let result = if run.status == RunStatus::Completed {
                Some(self.fetch(&handle).await?)
            } else {
                match &run.last_error {
                    Some(failure) => warn!("Run {} ended {}: {}", run.id, run.status, failure),
                    None => warn!("Run {} ended {}", run.id, run.status),
                }
                None
            };

            return Ok(RunOutcome {
                run,
                result,
                tool_rounds: rounds,
            });
        }
    }

    /// Every handle submitted through this session, oldest first
    pub fn handles(&self) -> Vec<RunHandle> {
        self.handles_guard().clone()
    }

    fn observe(&self, handle: &mut RunHandle, status: RunStatus) -> Result<()> {
        handle.observe(status)?;

        if let Some(recorded) = self.handles_guard().iter_mut().find(|h| h.id == handle.id) {
            recorded.status = status;
        }

        Ok(())
    }

    fn handles_guard(&self) -> MutexGuard<'_, Vec<RunHandle>> {
        self.handles.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedService, Step, tool_call};
    use serde_json::json;
    use std::time::Duration;

    fn session(service: &Arc<ScriptedService>) -> Session<ScriptedService> {
        Session::new(Arc::clone(service), PollPolicy::fixed(Duration::ZERO))
            .with_tools(ToolRegistry::with_builtins())
    }

    #[tokio::test]
    async fn test_submit_records_handle() {
        let service = Arc::new(ScriptedService::new(vec![]));
        let session = session(&service);

        let handle = session
            .submit(SubmitRun::new("analyst", "hello"))
            .await
            .unwrap();

        assert_eq!(handle.status(), RunStatus::Queued);
        assert_eq!(session.handles(), vec![handle]);
    }

    #[tokio::test]
    async fn test_wait_refreshes_recorded_status() {
        let service = Arc::new(ScriptedService::from_statuses(&[
            RunStatus::InProgress,
            RunStatus::Completed,
        ]));
        let session = session(&service);

        let mut handle = session
            .submit(SubmitRun::new("analyst", "hello"))
            .await
            .unwrap();
        session.wait(&mut handle).await.unwrap();

        assert_eq!(handle.status(), RunStatus::Completed);
        assert_eq!(session.handles()[0].status(), RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_run_to_completion_answers_tool_calls() {
        let service = Arc::new(ScriptedService::new(vec![
            Step::Status(RunStatus::InProgress),
            Step::Action(vec![tool_call(
                "call_1",
                "foo",
                json!({ "Query": "status?", "CorrelationId": "c-9" }),
            )]),
            Step::Status(RunStatus::InProgress),
            Step::Status(RunStatus::Completed),
        ]));
        let session = session(&service);

        let outcome = session
            .run_to_completion(SubmitRun::new("analyst", "hello"))
            .await
            .unwrap();

        assert_eq!(outcome.run.status, RunStatus::Completed);
        assert_eq!(outcome.tool_rounds, 1);
        assert_eq!(outcome.result.unwrap().text(), "done");

        let submitted = service.tool_outputs.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0][0].tool_call_id, "call_1");
        assert!(submitted[0][0].output.contains("responding to: status?"));
        assert!(submitted[0][0].output.contains("c-9"));
    }

    #[tokio::test]
    async fn test_failed_run_has_no_result() {
        let service = Arc::new(ScriptedService::from_statuses(&[RunStatus::Failed]));
        let session = session(&service);

        let outcome = session
            .run_to_completion(SubmitRun::new("analyst", "hello"))
            .await
            .unwrap();

        assert_eq!(outcome.run.status, RunStatus::Failed);
        assert!(outcome.result.is_none());
        assert_eq!(outcome.run.last_error.unwrap().code, "server_error");
    }

    #[tokio::test]
    async fn test_tool_rounds_are_bounded() {
        let service = Arc::new(ScriptedService::new(vec![
            Step::Action(vec![tool_call("a", "foo", json!({}))]),
            Step::Action(vec![tool_call("b", "foo", json!({}))]),
            Step::Action(vec![tool_call("c", "foo", json!({}))]),
        ]));
        let session = session(&service).with_max_tool_rounds(2);

        let err = session
            .run_to_completion(SubmitRun::new("analyst", "hello"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ClientError::ToolRoundsExceeded { rounds: 2, .. }
        ));
        assert_eq!(service.tool_outputs.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_handle_accepts_skipped_intermediate_statuses() {
        let service = ScriptedService::new(vec![]);
        let mut handle = RunHandle::new(&service.run(RunStatus::Queued));

        handle.observe(RunStatus::RequiresAction).unwrap();
        handle.observe(RunStatus::Completed).unwrap();
        assert_eq!(handle.status(), RunStatus::Completed);
    }

    #[test]
    fn test_handle_rejects_regression_from_terminal() {
        let service = ScriptedService::new(vec![]);
        let mut handle = RunHandle::new(&service.run(RunStatus::InProgress));

        handle.observe(RunStatus::Completed).unwrap();
        handle.observe(RunStatus::Completed).unwrap();

        let err = handle.observe(RunStatus::InProgress).unwrap_err();
        assert!(matches!(
            err,
            ClientError::StatusRegressed {
                from: RunStatus::Completed,
                to: RunStatus::InProgress,
                ..
            }
        ));
        assert_eq!(handle.status(), RunStatus::Completed);
    }
}
