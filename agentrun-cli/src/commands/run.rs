//! Run command handlers
//!
//! Handles submitting runs, following them and fetching their output.

use agentrun_client::{AgentClient, PollPolicy, RunPoller};
use agentrun_core::domain::content::RunResult;
use agentrun_core::domain::message::Message;
use agentrun_core::domain::run::{Run, RunStatus};
use agentrun_core::domain::tool::ToolDefinition;
use agentrun_core::dto::run::SubmitRun;
use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::id_resolver::{resolve_file_id, resolve_run_id};
use crate::types::IdOrPrefix;

/// Run subcommands
#[derive(Subcommand)]
pub enum RunCommands {
    /// Submit a new run
    Submit {
        /// Agent that handles the run
        agent: String,

        /// User message
        message: String,

        /// Instructions overriding the agent's defaults
        #[arg(long)]
        instructions: Option<String>,

        /// Tools to enable (code_interpreter, web_search, function:<name>)
        #[arg(short, long)]
        tool: Vec<ToolDefinition>,

        /// Uploaded file IDs (or prefixes) to attach to the message
        #[arg(short, long)]
        attach: Vec<IdOrPrefix>,

        /// Metadata as key=value pairs
        #[arg(short, long, value_parser = parse_key_val)]
        meta: Vec<(String, String)>,

        /// Wait until the run settles
        #[arg(short, long)]
        wait: bool,
    },
    /// Show the current state of a run
    Status {
        /// Run ID or unambiguous prefix
        id: IdOrPrefix,
    },
    /// Poll a run until it settles
    Wait {
        /// Run ID or unambiguous prefix
        id: IdOrPrefix,

        /// Delay between polls in milliseconds
        #[arg(long)]
        interval: Option<u64>,

        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Multiply the delay by this factor after every poll
        #[arg(long)]
        backoff: Option<f64>,
    },
    /// Print the output of a finished run
    Fetch {
        /// Run ID or unambiguous prefix
        id: IdOrPrefix,

        /// Download file attachments into this directory
        #[arg(long)]
        save_dir: Option<PathBuf>,
    },
    /// Request cancellation of a run
    Cancel {
        /// Run ID or unambiguous prefix
        id: IdOrPrefix,
    },
    /// List all runs
    List,
}

/// Parse a single key=value pair
fn parse_key_val(s: &str) -> Result<(String, String)> {
    let pos = s
        .find('=')
        .ok_or_else(|| anyhow::anyhow!("invalid KEY=value: no `=` found in `{}`", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Handle run commands
pub async fn handle_run_command(command: RunCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        RunCommands::Submit {
            agent,
            message,
            instructions,
            tool,
            attach,
            meta,
            wait,
        } => {
            let mut message = Message::user(message);
            for id in &attach {
                message = message.with_attachment(resolve_file_id(&client, id).await?);
            }

            let req = SubmitRun {
                agent,
                instructions,
                messages: vec![message],
                tools: tool,
                metadata: meta.into_iter().collect(),
            };

            submit_run(client, req, wait.then(|| config.poll_policy())).await
        }
        RunCommands::Status { id } => show_run(&client, &id).await,
        RunCommands::Wait {
            id,
            interval,
            timeout,
            backoff,
        } => {
            let policy = wait_policy(config.poll_policy(), interval, timeout, backoff)?;
            wait_run(client, &id, policy).await
        }
        RunCommands::Fetch { id, save_dir } => fetch_run(&client, &id, save_dir.as_deref()).await,
        RunCommands::Cancel { id } => cancel_run(&client, &id).await,
        RunCommands::List => list_runs(&client).await,
    }
}

/// Applies the command-line overrides to the configured policy
fn wait_policy(
    mut policy: PollPolicy,
    interval: Option<u64>,
    timeout: Option<u64>,
    backoff: Option<f64>,
) -> Result<PollPolicy> {
    if let Some(ms) = interval {
        policy.interval = Duration::from_millis(ms);
    }
    if let Some(secs) = timeout {
        policy.max_wait = Some(Duration::from_secs(secs));
    }
    if let Some(factor) = backoff {
        policy.backoff_factor = factor;
    }

    policy.validate().context("Invalid wait options")?;
    Ok(policy)
}

/// Submit a run, optionally waiting for it
async fn submit_run(client: AgentClient, req: SubmitRun, wait: Option<PollPolicy>) -> Result<()> {
    let run = client.submit_run(req).await?;

    println!("{}", "✓ Run submitted".green().bold());
    println!("  ID:     {}", run.id.to_string().cyan());
    println!("  Agent:  {}", run.agent);
    println!("  Status: {}", colorize_status(&run.status));

    if let Some(policy) = wait {
        println!();
        let id = IdOrPrefix::Full(run.id);
        wait_run(client, &id, policy).await?;
    }

    Ok(())
}

/// Show a single run
async fn show_run(client: &AgentClient, id: &IdOrPrefix) -> Result<()> {
    let uuid = resolve_run_id(client, id).await?;
    let run = client.get_run(uuid).await?;

    print_run_details(&run);

    Ok(())
}

/// Poll until the run settles; Ctrl-C stops waiting without cancelling the run
async fn wait_run(client: AgentClient, id: &IdOrPrefix, policy: PollPolicy) -> Result<()> {
    let uuid = resolve_run_id(&client, id).await?;

    let token = CancellationToken::new();
    let interrupt = token.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    println!("{}", format!("Waiting for run {}...", uuid).dimmed());

    let poller = RunPoller::new(Arc::new(client), policy);
    let result = poller.wait_with_cancel(uuid, &token).await;
    watcher.abort();

    let run = result?;
    print_run_details(&run);

    if run.status.requires_action() {
        println!();
        println!(
            "{}",
            "Run is waiting on tool outputs; use `agentrun ask` to answer them locally.".yellow()
        );
    }

    Ok(())
}

/// Print the output of a terminal run
async fn fetch_run(client: &AgentClient, id: &IdOrPrefix, save_dir: Option<&Path>) -> Result<()> {
    let uuid = resolve_run_id(client, id).await?;
    let result = client.get_run_result(uuid).await?;

    print_result(&result);

    if let Some(dir) = save_dir {
        save_attachments(client, &result, dir).await?;
    }

    Ok(())
}

/// Download every file attachment of a result into `dir`
async fn save_attachments(client: &AgentClient, result: &RunResult, dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    for (file_id, filename) in result.files() {
        let content = client.download_file(file_id).await?;
        let name = Path::new(filename)
            .file_name()
            .map(|n| n.to_owned())
            .unwrap_or_else(|| file_id.to_string().into());
        let path = dir.join(name);

        tokio::fs::write(&path, &content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        println!(
            "{} {} ({} bytes)",
            "✓ Saved".green(),
            path.display(),
            content.len()
        );
    }

    Ok(())
}

/// Request cancellation
async fn cancel_run(client: &AgentClient, id: &IdOrPrefix) -> Result<()> {
    let uuid = resolve_run_id(client, id).await?;
    let run = client.cancel_run(uuid).await?;

    println!(
        "{} Run {} is {}",
        "✓".green(),
        run.id.to_string().cyan(),
        colorize_status(&run.status)
    );

    Ok(())
}

/// List all runs
async fn list_runs(client: &AgentClient) -> Result<()> {
    let runs = client.list_runs().await?;

    if runs.is_empty() {
        println!("{}", "No runs found.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} run(s):", runs.len()).bold());
    println!();
    for run in runs {
        println!("  {} Run {}", "▸".cyan(), run.id.to_string().dimmed());
        println!("    Agent:   {}", run.agent);
        println!("    Status:  {}", colorize_status(&run.status));
        println!(
            "    Created: {}",
            run.created_at
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
                .dimmed()
        );
        println!();
    }

    Ok(())
}

/// Print detailed run information
pub(crate) fn print_run_details(run: &Run) {
    println!("{}", "Run Details:".bold());
    println!("  ID:        {}", run.id.to_string().cyan());
    println!("  Agent:     {}", run.agent);
    println!("  Status:    {}", colorize_status(&run.status));
    println!("  Created:   {}", run.created_at.format("%Y-%m-%d %H:%M:%S"));

    if let Some(started) = run.started_at {
        println!("  Started:   {}", started.format("%Y-%m-%d %H:%M:%S"));
    }

    if let Some(completed) = run.completed_at {
        println!("  Completed: {}", completed.format("%Y-%m-%d %H:%M:%S"));

        if let Some(started) = run.started_at {
            let seconds = completed.signed_duration_since(started).num_seconds();
            println!("  Duration:  {}s", seconds);
        }
    }

    if !run.tools.is_empty() {
        let tools: Vec<String> = run.tools.iter().map(ToString::to_string).collect();
        println!("  Tools:     {}", tools.join(", "));
    }

    if !run.metadata.is_empty() {
        println!("\n{}", "Metadata:".bold());
        for (key, value) in &run.metadata {
            println!("  {} = {}", key.cyan(), value);
        }
    }

    if let Some(action) = &run.required_action {
        println!("\n{}", "Pending tool calls:".bold());
        for call in &action.tool_calls {
            println!("  {} {}({})", call.id.dimmed(), call.name.cyan(), call.arguments);
        }
    }

    if let Some(error) = &run.last_error {
        println!("\n{}", "Error:".bold());
        println!("{}", error.to_string().red());
    }
}

/// Print the content of a run result
pub(crate) fn print_result(result: &RunResult) {
    println!("{}", format!("Result of run {}:", result.run_id).bold());
    println!("{}", "─".repeat(80).dimmed());
    println!("{}", result.text());

    let files: Vec<_> = result.files().collect();
    if !files.is_empty() {
        println!();
        for (file_id, filename) in files {
            println!(
                "  {} {} {}",
                "📎".cyan(),
                filename,
                file_id.to_string().dimmed()
            );
        }
    }
    println!("{}", "─".repeat(80).dimmed());
}

/// Colorize run status for display
pub(crate) fn colorize_status(status: &RunStatus) -> ColoredString {
    let status_str = status.to_string();
    match status {
        RunStatus::Queued => status_str.yellow(),
        RunStatus::InProgress => status_str.cyan(),
        RunStatus::RequiresAction => status_str.magenta(),
        RunStatus::Cancelling => status_str.yellow(),
        RunStatus::Completed => status_str.green(),
        RunStatus::Failed | RunStatus::Expired => status_str.red(),
        RunStatus::Cancelled => status_str.dimmed(),
    }
}
