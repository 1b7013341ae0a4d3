//! Run DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::message::Message;
use crate::domain::run::{Run, RunStatus};
use crate::domain::tool::{ToolDefinition, ToolOutput};

/// Description of the work to submit: which agent, what to say, which tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRun {
    pub agent: String,
    #[serde(default)]
    pub instructions: Option<String>,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl SubmitRun {
    /// A run with a single user message and no tools
    pub fn new(agent: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            instructions: None,
            messages: vec![Message::user(prompt)],
            tools: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_tool(mut self, tool: ToolDefinition) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Answers to the tool calls of a run in `RequiresAction`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitToolOutputs {
    pub tool_outputs: Vec<ToolOutput>,
}

/// Compact listing entry for a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: Uuid,
    pub agent: String,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<Run> for RunSummary {
    fn from(run: Run) -> Self {
        RunSummary {
            id: run.id,
            agent: run.agent,
            status: run.status,
            created_at: run.created_at,
            completed_at: run.completed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_builder() {
        let req = SubmitRun::new("analyst", "hello")
            .with_instructions("be brief")
            .with_tool(ToolDefinition::CodeInterpreter)
            .with_metadata("simulate", "fail");

        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.messages[0].content, "hello");
        assert_eq!(req.instructions.as_deref(), Some("be brief"));
        assert_eq!(req.tools, vec![ToolDefinition::CodeInterpreter]);
        assert_eq!(req.metadata.get("simulate").map(String::as_str), Some("fail"));
    }

    #[test]
    fn test_submit_defaults_when_deserializing() {
        let req: SubmitRun = serde_json::from_value(serde_json::json!({
            "agent": "a",
            "messages": [{ "role": "user", "content": "hi" }]
        }))
        .unwrap();

        assert!(req.tools.is_empty());
        assert!(req.metadata.is_empty());
        assert!(req.instructions.is_none());
        assert!(req.messages[0].attachments.is_empty());
    }
}
