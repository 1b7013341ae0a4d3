//! Tool definitions and the calls/outputs exchanged while a run requires action

use serde::{Deserialize, Serialize};

/// A tool enabled for a run
///
/// `CodeInterpreter` and `WebSearch` are executed by the service itself.
/// `Function` tools are executed by the caller: the run stops in
/// `RequiresAction` until their outputs are submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolDefinition {
    CodeInterpreter,
    WebSearch,
    Function {
        name: String,
        #[serde(default)]
        description: Option<String>,
        /// JSON schema of the arguments
        #[serde(default)]
        parameters: serde_json::Value,
    },
}

impl ToolDefinition {
    /// Declares a function tool with no parameter schema
    pub fn function(name: impl Into<String>) -> Self {
        ToolDefinition::Function {
            name: name.into(),
            description: None,
            parameters: serde_json::Value::Null,
        }
    }

    /// Name of the function, if this is a function tool
    pub fn function_name(&self) -> Option<&str> {
        match self {
            ToolDefinition::Function { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl std::fmt::Display for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolDefinition::CodeInterpreter => write!(f, "code_interpreter"),
            ToolDefinition::WebSearch => write!(f, "web_search"),
            ToolDefinition::Function { name, .. } => write!(f, "function:{}", name),
        }
    }
}

impl std::str::FromStr for ToolDefinition {
    type Err = String;

    /// Parses `code_interpreter`, `web_search` or `function:<name>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code_interpreter" | "code-interpreter" => Ok(ToolDefinition::CodeInterpreter),
            "web_search" | "web-search" => Ok(ToolDefinition::WebSearch),
            other => match other.strip_prefix("function:") {
                Some(name) if !name.is_empty() => Ok(ToolDefinition::function(name)),
                _ => Err(format!(
                    "unknown tool '{}' (expected code_interpreter, web_search or function:<name>)",
                    s
                )),
            },
        }
    }
}

/// A function invocation the service is waiting on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// The caller's answer to a [`ToolCall`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}
