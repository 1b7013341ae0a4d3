//! Ask command
//!
//! Runs the whole submit, poll, answer tool calls, fetch flow with the
//! built-in local tools.

use agentrun_client::{Session, ToolRegistry};
use agentrun_core::domain::tool::ToolDefinition;
use agentrun_core::dto::run::SubmitRun;
use anyhow::Result;
use colored::*;
use std::sync::Arc;

use super::run::{colorize_status, print_result};
use crate::config::Config;

pub async fn ask(
    config: &Config,
    agent: String,
    message: String,
    tools: Vec<ToolDefinition>,
    instructions: Option<String>,
) -> Result<()> {
    let registry = ToolRegistry::with_builtins();

    for name in tools.iter().filter_map(ToolDefinition::function_name) {
        if registry.get(name).is_none() {
            println!(
                "{}",
                format!(
                    "⚠ No local handler for '{}' (available: {})",
                    name,
                    registry.names().join(", ")
                )
                .yellow()
            );
        }
    }

    let mut spec = SubmitRun::new(agent, message);
    spec.instructions = instructions;
    spec.tools = tools;

    let session = Session::new(Arc::new(config.client()?), config.poll_policy()).with_tools(registry);
    let outcome = session.run_to_completion(spec).await?;

    println!(
        "Run {} {} after {} tool round(s)",
        outcome.run.id.to_string().cyan(),
        colorize_status(&outcome.run.status),
        outcome.tool_rounds
    );

    match outcome.result {
        Some(result) => {
            println!();
            print_result(&result);
        }
        None => {
            if let Some(error) = &outcome.run.last_error {
                println!("{}", error.to_string().red());
            }
        }
    }

    Ok(())
}
