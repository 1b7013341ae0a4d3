//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod ask;
mod file;
mod run;

pub use file::FileCommands;
pub use run::RunCommands;

use agentrun_core::domain::tool::ToolDefinition;
use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run management
    Run {
        #[command(subcommand)]
        command: RunCommands,
    },
    /// File management
    File {
        #[command(subcommand)]
        command: FileCommands,
    },
    /// Submit a run, answer its tool calls and print the result
    Ask {
        /// Agent that handles the run
        agent: String,

        /// User message
        message: String,

        /// Tools to enable (code_interpreter, web_search, function:<name>)
        #[arg(short, long)]
        tool: Vec<ToolDefinition>,

        /// Instructions overriding the agent's defaults
        #[arg(long)]
        instructions: Option<String>,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Run { command } => run::handle_run_command(command, config).await,
        Commands::File { command } => file::handle_file_command(command, config).await,
        Commands::Ask {
            agent,
            message,
            tool,
            instructions,
        } => ask::ask(config, agent, message, tool, instructions).await,
    }
}
