//! agentrun CLI
//!
//! Command-line interface for submitting agent runs and following them
//! to completion.

mod commands;
mod config;
mod id_resolver;
mod types;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "agentrun")]
#[command(about = "Submit, poll and fetch agent runs", long_about = None)]
struct Cli {
    /// Run service URL
    #[arg(long, env = "AGENTRUN_ENDPOINT", default_value = "http://localhost:8080")]
    endpoint: String,

    /// API key sent as a bearer token
    #[arg(long, env = "AGENTRUN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::load(cli.endpoint, cli.api_key)?;

    handle_command(cli.command, &config).await
}
