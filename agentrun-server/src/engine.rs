//! Run engine
//!
//! Stands in for the agent runtime: on every tick each live run moves one
//! step through its lifecycle. Model inference and tool execution are not
//! performed; completed runs echo their conversation back.

use agentrun_core::domain::content::ContentItem;
use agentrun_core::domain::run::{RequiredAction, RunFailure, RunStatus};
use agentrun_core::domain::tool::{ToolCall, ToolDefinition};
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;
use tokio::time;
use tracing::{debug, info};
use uuid::Uuid;

use crate::repository::run_repository;
use crate::store::{FileRecord, RunRecord, Store};

/// Metadata key/value that makes a run fail instead of completing
pub const SIMULATE_KEY: &str = "simulate";
pub const SIMULATE_FAIL: &str = "fail";

/// Periodically advances every live run
pub struct RunEngine {
    store: Store,
    tick_interval: Duration,
    action_timeout: TimeDelta,
}

impl RunEngine {
    pub fn new(store: Store, tick_interval: Duration, action_timeout: Duration) -> Self {
        Self {
            store,
            tick_interval,
            action_timeout: TimeDelta::from_std(action_timeout).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Runs the tick loop on a background task
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    /// Ticks forever
    pub async fn run(&self) {
        info!("Starting run engine (tick: {:?})", self.tick_interval);

        let mut interval = time::interval(self.tick_interval);

        loop {
            interval.tick().await;

            let changed = self.tick_once().await;
            if changed > 0 {
                debug!("Advanced {} run(s) this tick", changed);
            }
        }
    }

    /// Advances every live run by one step, returning how many changed
    pub async fn tick_once(&self) -> usize {
        let now = Utc::now();
        run_repository::advance_live(&self.store, |record| {
            advance(record, now, self.action_timeout)
        })
        .await
    }
}

/// Moves a run one step forward
///
/// Returns `None` when nothing changed, otherwise the file the step
/// produced, if any.
pub fn advance(
    record: &mut RunRecord,
    now: DateTime<Utc>,
    action_timeout: TimeDelta,
) -> Option<Option<FileRecord>> {
    let id = record.run.id;

    match record.run.status {
        RunStatus::Queued => {
            record.transition(RunStatus::InProgress, now);
            debug!("Run {} started", id);
            Some(None)
        }
        RunStatus::InProgress => {
            if record.run.metadata.get(SIMULATE_KEY).map(String::as_str) == Some(SIMULATE_FAIL) {
                record.fail(
                    RunStatus::Failed,
                    RunFailure {
                        code: "server_error".to_string(),
                        message: "Simulated failure requested through run metadata".to_string(),
                    },
                    now,
                );
                info!("Run {} failed (simulated)", id);
                return Some(None);
            }

            let calls = pending_tool_calls(record);
            if !calls.is_empty() {
                record.transition(RunStatus::RequiresAction, now);
                record.run.required_action = Some(RequiredAction { tool_calls: calls });
                info!("Run {} requires action", id);
                return Some(None);
            }

            let artifact = complete(record, now);
            info!("Run {} completed", id);
            Some(artifact)
        }
        RunStatus::RequiresAction => {
            let waiting_since = record.action_since.unwrap_or(now);
            if now - waiting_since <= action_timeout {
                return None;
            }

            record.fail(
                RunStatus::Expired,
                RunFailure {
                    code: "expired".to_string(),
                    message: "Tool outputs were not submitted in time".to_string(),
                },
                now,
            );
            info!("Run {} expired waiting for tool outputs", id);
            Some(None)
        }
        RunStatus::Cancelling => {
            record.transition(RunStatus::Cancelled, now);
            info!("Run {} cancelled", id);
            Some(None)
        }
        RunStatus::Cancelled | RunStatus::Completed | RunStatus::Failed | RunStatus::Expired => {
            None
        }
    }
}

/// One call per declared function tool, unless outputs were already submitted
fn pending_tool_calls(record: &RunRecord) -> Vec<ToolCall> {
    if !record.tool_outputs.is_empty() {
        return Vec::new();
    }

    let query = record.last_user_message();

    record
        .run
        .tools
        .iter()
        .filter_map(ToolDefinition::function_name)
        .map(|name| ToolCall {
            id: format!("call_{}", Uuid::new_v4().simple()),
            name: name.to_string(),
            arguments: serde_json::json!({
                "Query": query,
                "CorrelationId": Uuid::new_v4().to_string(),
            }),
        })
        .collect()
}

/// Builds the output of a completed run
fn complete(record: &mut RunRecord, now: DateTime<Utc>) -> Option<FileRecord> {
    let mut content = vec![ContentItem::Text {
        text: format!("{} received: {}", record.run.agent, record.last_user_message()),
    }];

    let attachments: usize = record.messages.iter().map(|m| m.attachments.len()).sum();
    if attachments > 0 {
        content.push(ContentItem::Text {
            text: format!("Received {} attachment(s).", attachments),
        });
    }

    for output in &record.tool_outputs {
        content.push(ContentItem::Text {
            text: format!("Tool output {}: {}", output.tool_call_id, output.output),
        });
    }

    if record.run.tools.contains(&ToolDefinition::WebSearch) {
        content.push(ContentItem::Text {
            text: "Web search grounding is unavailable here; answered from the conversation only."
                .to_string(),
        });
    }

    let artifact = record
        .run
        .tools
        .contains(&ToolDefinition::CodeInterpreter)
        .then(|| FileRecord::new(format!("{}.csv", record.run.id), message_stats_csv(record), now));

    if let Some(file) = &artifact {
        content.push(ContentItem::File {
            file_id: file.file.id,
            filename: file.file.filename.clone(),
        });
    }

    record.content = content;
    record.transition(RunStatus::Completed, now);

    artifact
}

/// Per-message statistics, the kind of table a code interpreter hands back
fn message_stats_csv(record: &RunRecord) -> Vec<u8> {
    let mut csv = String::from("index,role,characters,words\n");
    for (index, message) in record.messages.iter().enumerate() {
        let role = match message.role {
            agentrun_core::domain::message::Role::User => "user",
            agentrun_core::domain::message::Role::Assistant => "assistant",
        };
        csv.push_str(&format!(
            "{},{},{},{}\n",
            index,
            role,
            message.content.chars().count(),
            message.content.split_whitespace().count()
        ));
    }
    csv.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::create_store;
    use crate::store::tests::record;
    use agentrun_core::domain::tool::ToolOutput;

    fn timeout() -> TimeDelta {
        TimeDelta::minutes(10)
    }

    #[test]
    fn test_plain_run_lifecycle() {
        let mut rec = record(RunStatus::Queued);
        let now = Utc::now();

        assert!(advance(&mut rec, now, timeout()).is_some());
        assert_eq!(rec.run.status, RunStatus::InProgress);

        let artifact = advance(&mut rec, now, timeout()).unwrap();
        assert!(artifact.is_none());
        assert_eq!(rec.run.status, RunStatus::Completed);
        assert_eq!(
            rec.content,
            vec![ContentItem::Text {
                text: "analyst received: hello".to_string()
            }]
        );

        assert!(advance(&mut rec, now, timeout()).is_none());
    }

    #[test]
    fn test_function_tool_requires_action_once() {
        let mut rec = record(RunStatus::InProgress);
        rec.run.tools = vec![ToolDefinition::function("foo")];
        let now = Utc::now();

        advance(&mut rec, now, timeout());
        assert_eq!(rec.run.status, RunStatus::RequiresAction);
        let calls = rec.run.required_action.clone().unwrap().tool_calls;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "foo");
        assert_eq!(calls[0].arguments["Query"], "hello");

        // Waiting on the caller
        assert!(advance(&mut rec, now, timeout()).is_none());

        let call_id = calls[0].id.clone();
        rec.tool_outputs.push(ToolOutput {
            tool_call_id: call_id.clone(),
            output: "{\"FooReply\":\"hi\"}".to_string(),
        });
        rec.transition(RunStatus::InProgress, now);

        advance(&mut rec, now, timeout());
        assert_eq!(rec.run.status, RunStatus::Completed);
        assert!(rec.content.iter().any(|c| matches!(
            c,
            ContentItem::Text { text } if text.contains(&call_id)
        )));
    }

    #[test]
    fn test_requires_action_expires() {
        let mut rec = record(RunStatus::InProgress);
        rec.run.tools = vec![ToolDefinition::function("foo")];
        let start = Utc::now();

        advance(&mut rec, start, timeout());
        advance(&mut rec, start + TimeDelta::minutes(11), timeout());

        assert_eq!(rec.run.status, RunStatus::Expired);
        assert_eq!(rec.run.last_error.as_ref().unwrap().code, "expired");
        assert!(rec.run.required_action.is_none());
    }

    #[test]
    fn test_simulated_failure() {
        let mut rec = record(RunStatus::InProgress);
        rec.run
            .metadata
            .insert(SIMULATE_KEY.to_string(), SIMULATE_FAIL.to_string());

        advance(&mut rec, Utc::now(), timeout());
        assert_eq!(rec.run.status, RunStatus::Failed);
        assert_eq!(rec.run.last_error.as_ref().unwrap().code, "server_error");
        assert!(rec.run.completed_at.is_some());
    }

    #[test]
    fn test_code_interpreter_produces_csv() {
        let mut rec = record(RunStatus::InProgress);
        rec.run.tools = vec![ToolDefinition::CodeInterpreter];

        let file = advance(&mut rec, Utc::now(), timeout()).unwrap().unwrap();
        assert_eq!(file.file.filename, format!("{}.csv", rec.run.id));
        assert_eq!(
            String::from_utf8(file.content).unwrap(),
            "index,role,characters,words\n0,user,5,1\n"
        );
        assert!(rec.content.iter().any(|c| matches!(
            c,
            ContentItem::File { file_id, .. } if *file_id == file.file.id
        )));
    }

    #[test]
    fn test_cancelling_becomes_cancelled() {
        let mut rec = record(RunStatus::Cancelling);
        advance(&mut rec, Utc::now(), timeout());
        assert_eq!(rec.run.status, RunStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_tick_stores_generated_files() {
        let store = create_store();
        let mut req = agentrun_core::dto::run::SubmitRun::new("analyst", "numbers please");
        req.tools.push(ToolDefinition::CodeInterpreter);
        let run = run_repository::create(&store, req).await.unwrap();

        let engine = RunEngine::new(
            store.clone(),
            Duration::from_millis(10),
            Duration::from_secs(600),
        );
        assert_eq!(engine.tick_once().await, 1);
        assert_eq!(engine.tick_once().await, 1);
        assert_eq!(engine.tick_once().await, 0);

        let result = run_repository::find_result(&store, run.id).await.unwrap();
        assert_eq!(result.status, RunStatus::Completed);
        assert_eq!(store.read().await.files.len(), 1);
    }
}
