//! Run Service
//!
//! Business logic for run submission and lifecycle.

use agentrun_core::domain::content::RunResult;
use agentrun_core::domain::run::{Run, RunStatus};
use agentrun_core::domain::tool::ToolOutput;
use agentrun_core::dto::run::{RunSummary, SubmitRun};
use std::collections::HashSet;
use uuid::Uuid;

use crate::repository::run_repository;

/// Service error type
#[derive(Debug)]
pub enum RunError {
    NotFound(Uuid),
    InvalidState(String),
    ValidationError(String),
}

/// Validate and queue a new run
pub async fn submit_run(store: &crate::store::Store, req: SubmitRun) -> Result<Run, RunError> {
    validate_submission(&req)?;

    let run = run_repository::create(store, req).await.map_err(|id| {
        RunError::ValidationError(format!(
            "Attachment {} does not refer to an uploaded file",
            id
        ))
    })?;

    tracing::info!("Run queued: {} for agent: {}", run.id, run.agent);

    Ok(run)
}

/// Get a run by ID
pub async fn get_run(store: &crate::store::Store, id: Uuid) -> Result<Run, RunError> {
    run_repository::find_by_id(store, id)
        .await
        .ok_or(RunError::NotFound(id))
}

/// List all runs, newest first
pub async fn list_runs(store: &crate::store::Store) -> Vec<RunSummary> {
    run_repository::list_all(store)
        .await
        .into_iter()
        .map(RunSummary::from)
        .collect()
}

/// Record tool outputs and resume a run waiting on them
pub async fn submit_tool_outputs(
    store: &crate::store::Store,
    id: Uuid,
    outputs: Vec<ToolOutput>,
) -> Result<Run, RunError> {
    let now = chrono::Utc::now();

    run_repository::update(store, id, |record| {
        if record.run.status != RunStatus::RequiresAction {
            return Err(RunError::InvalidState(format!(
                "Run {} is {}, not waiting on tool outputs",
                id, record.run.status
            )));
        }

        let pending: HashSet<&str> = record
            .run
            .required_action
            .iter()
            .flat_map(|a| a.tool_calls.iter().map(|c| c.id.as_str()))
            .collect();
        validate_tool_outputs(&pending, &outputs)?;

        record.tool_outputs.extend(outputs);
        record.transition(RunStatus::InProgress, now);

        tracing::info!("Run {} resumed with tool outputs", id);

        Ok(record.run.clone())
    })
    .await
    .ok_or(RunError::NotFound(id))?
}

/// Request cancellation of a run
pub async fn cancel_run(store: &crate::store::Store, id: Uuid) -> Result<Run, RunError> {
    let now = chrono::Utc::now();

    run_repository::update(store, id, |record| {
        // Can only cancel runs that are not finished
        if !record.transition(RunStatus::Cancelling, now) {
            return Err(RunError::InvalidState(format!(
                "Cannot cancel run {} in status {}",
                id, record.run.status
            )));
        }

        tracing::info!("Run {} cancelling", id);

        Ok(record.run.clone())
    })
    .await
    .ok_or(RunError::NotFound(id))?
}

/// Get the output of a terminal run
pub async fn get_result(store: &crate::store::Store, id: Uuid) -> Result<RunResult, RunError> {
    let result = run_repository::find_result(store, id)
        .await
        .ok_or(RunError::NotFound(id))?;

    if !result.status.is_terminal() {
        return Err(RunError::InvalidState(format!(
            "Run {} is {}, result not available yet",
            id, result.status
        )));
    }

    Ok(result)
}

// =============================================================================
// Validation
// =============================================================================

fn validate_submission(req: &SubmitRun) -> Result<(), RunError> {
    if req.agent.trim().is_empty() {
        return Err(RunError::ValidationError("Agent cannot be empty".to_string()));
    }

    if req.messages.is_empty() {
        return Err(RunError::ValidationError(
            "A run needs at least one message".to_string(),
        ));
    }

    if req.messages.iter().any(|m| m.content.trim().is_empty()) {
        return Err(RunError::ValidationError(
            "Message content cannot be empty".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for name in req.tools.iter().filter_map(|t| t.function_name()) {
        if name.trim().is_empty() {
            return Err(RunError::ValidationError(
                "Function tool name cannot be empty".to_string(),
            ));
        }
        if !names.insert(name) {
            return Err(RunError::ValidationError(format!(
                "Function tool '{}' declared more than once",
                name
            )));
        }
    }

    Ok(())
}

fn validate_tool_outputs(pending: &HashSet<&str>, outputs: &[ToolOutput]) -> Result<(), RunError> {
    let submitted: HashSet<&str> = outputs.iter().map(|o| o.tool_call_id.as_str()).collect();

    if submitted.len() != outputs.len() {
        return Err(RunError::ValidationError(
            "Duplicate tool_call_id in tool outputs".to_string(),
        ));
    }

    if &submitted != pending {
        let mut missing: Vec<&str> = pending.difference(&submitted).copied().collect();
        let mut unknown: Vec<&str> = submitted.difference(pending).copied().collect();
        missing.sort_unstable();
        unknown.sort_unstable();
        return Err(RunError::ValidationError(format!(
            "Tool outputs must answer every pending call exactly once (missing: [{}], unknown: [{}])",
            missing.join(", "),
            unknown.join(", ")
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentrun_core::domain::message::Message;
    use agentrun_core::domain::run::RequiredAction;
    use agentrun_core::domain::tool::{ToolCall, ToolDefinition};
    use crate::store::create_store;

    fn output(id: &str) -> ToolOutput {
        ToolOutput {
            tool_call_id: id.to_string(),
            output: "ok".to_string(),
        }
    }

    #[test]
    fn test_validate_submission() {
        assert!(validate_submission(&SubmitRun::new("analyst", "hi")).is_ok());
        assert!(validate_submission(&SubmitRun::new(" ", "hi")).is_err());
        assert!(validate_submission(&SubmitRun::new("analyst", "  ")).is_err());

        let mut no_messages = SubmitRun::new("analyst", "hi");
        no_messages.messages.clear();
        assert!(validate_submission(&no_messages).is_err());

        let duplicated = SubmitRun::new("analyst", "hi")
            .with_tool(ToolDefinition::function("foo"))
            .with_tool(ToolDefinition::function("foo"));
        assert!(validate_submission(&duplicated).is_err());
    }

    #[test]
    fn test_validate_tool_outputs() {
        let pending: HashSet<&str> = ["a", "b"].into_iter().collect();

        assert!(validate_tool_outputs(&pending, &[output("a"), output("b")]).is_ok());
        assert!(validate_tool_outputs(&pending, &[output("a")]).is_err());
        assert!(validate_tool_outputs(&pending, &[output("a"), output("b"), output("c")]).is_err());
        assert!(validate_tool_outputs(&pending, &[output("a"), output("a"), output("b")]).is_err());
    }

    #[tokio::test]
    async fn test_unknown_attachment_rejected() {
        let store = create_store();
        let mut req = SubmitRun::new("analyst", "hi");
        req.messages = vec![Message::user("see file").with_attachment(Uuid::new_v4())];

        let err = submit_run(&store, req).await.unwrap_err();
        assert!(matches!(err, RunError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_tool_outputs_resume_run() {
        let store = create_store();
        let run = submit_run(&store, SubmitRun::new("analyst", "hi")).await.unwrap();

        // Not waiting on tools yet
        let err = submit_tool_outputs(&store, run.id, vec![output("call_1")])
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::InvalidState(_)));

        let now = chrono::Utc::now();
        run_repository::update(&store, run.id, |r| {
            r.transition(RunStatus::InProgress, now);
            r.transition(RunStatus::RequiresAction, now);
            r.run.required_action = Some(RequiredAction {
                tool_calls: vec![ToolCall {
                    id: "call_1".to_string(),
                    name: "foo".to_string(),
                    arguments: serde_json::json!({}),
                }],
            });
        })
        .await;

        let resumed = submit_tool_outputs(&store, run.id, vec![output("call_1")])
            .await
            .unwrap();
        assert_eq!(resumed.status, RunStatus::InProgress);
        assert!(resumed.required_action.is_none());
    }

    #[tokio::test]
    async fn test_cancel_and_result_rules() {
        let store = create_store();
        let run = submit_run(&store, SubmitRun::new("analyst", "hi")).await.unwrap();

        assert!(matches!(
            get_result(&store, run.id).await.unwrap_err(),
            RunError::InvalidState(_)
        ));

        let cancelling = cancel_run(&store, run.id).await.unwrap();
        assert_eq!(cancelling.status, RunStatus::Cancelling);

        run_repository::update(&store, run.id, |r| {
            r.transition(RunStatus::Cancelled, chrono::Utc::now());
        })
        .await;

        assert!(matches!(
            cancel_run(&store, run.id).await.unwrap_err(),
            RunError::InvalidState(_)
        ));
        let result = get_result(&store, run.id).await.unwrap();
        assert_eq!(result.status, RunStatus::Cancelled);
        assert!(result.content.is_empty());

        assert!(matches!(
            get_run(&store, Uuid::new_v4()).await.unwrap_err(),
            RunError::NotFound(_)
        ));
    }
}
