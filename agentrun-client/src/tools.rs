//! Local tool handlers
//!
//! When a run stops in `RequiresAction`, each pending tool call is routed to
//! the handler registered under its name and the answers are submitted back.

use agentrun_core::domain::tool::{ToolCall, ToolOutput};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// A function tool executed in this process
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Name the agent uses to call this tool
    fn name(&self) -> &str;

    /// Executes the tool and returns the output text handed back to the run
    async fn call(&self, arguments: &Value) -> anyhow::Result<String>;
}

/// Handlers by tool name
#[derive(Clone, Default)]
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in tool
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(FooReplyTool));
        registry
    }

    /// Adds a handler, replacing any previous one with the same name
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        self.handlers.insert(handler.name().to_string(), handler);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.handlers.get(name)
    }

    /// Registered tool names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Answers every call, in order
    ///
    /// Unknown tools and handler failures still produce an output of the
    /// form `{"error": "..."}` so the run can continue.
    pub async fn dispatch(&self, calls: &[ToolCall]) -> Vec<ToolOutput> {
        let mut outputs = Vec::with_capacity(calls.len());

        for call in calls {
            let output = match self.handlers.get(&call.name) {
                Some(handler) => match handler.call(&call.arguments).await {
                    Ok(output) => {
                        debug!("Tool {} answered call {}", call.name, call.id);
                        output
                    }
                    Err(e) => {
                        warn!("Tool {} failed on call {}: {:#}", call.name, call.id, e);
                        json!({ "error": format!("{:#}", e) }).to_string()
                    }
                },
                None => {
                    warn!("No handler registered for tool {}", call.name);
                    json!({ "error": format!("no handler registered for tool '{}'", call.name) })
                        .to_string()
                }
            };

            outputs.push(ToolOutput {
                tool_call_id: call.id.clone(),
                output,
            });
        }

        outputs
    }
}

/// Replies to a query on behalf of "Foo"
///
/// Input: `{"Query": "...", "CorrelationId": "..."}`, either as an object or
/// as a JSON-encoded string. Output echoes the correlation id.
pub struct FooReplyTool;

#[async_trait]
impl ToolHandler for FooReplyTool {
    fn name(&self) -> &str {
        "foo"
    }

    async fn call(&self, arguments: &Value) -> anyhow::Result<String> {
        let parsed;
        let arguments = match arguments {
            Value::String(raw) => {
                parsed = serde_json::from_str::<Value>(raw)?;
                &parsed
            }
            other => other,
        };

        let query = arguments.get("Query").and_then(Value::as_str).unwrap_or("");
        let correlation_id = arguments
            .get("CorrelationId")
            .and_then(Value::as_str)
            .unwrap_or("");

        let reply = json!({
            "FooReply": format!("This is Foo, responding to: {}! Stay strong 💪!", query),
            "CorrelationId": correlation_id,
        });

        Ok(reply.to_string())
    }
}
