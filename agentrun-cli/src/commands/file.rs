//! File command handlers

use agentrun_client::AgentClient;
use agentrun_core::domain::file::FileObject;
use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::id_resolver::resolve_file_id;
use crate::types::IdOrPrefix;

/// File subcommands
#[derive(Subcommand)]
pub enum FileCommands {
    /// Upload a local file
    Upload {
        /// Path to the file
        path: PathBuf,
    },
    /// List uploaded and generated files
    List,
    /// Download a file
    Download {
        /// File ID or unambiguous prefix
        id: IdOrPrefix,

        /// Where to write the file (defaults to its stored name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a file
    Delete {
        /// File ID or unambiguous prefix
        id: IdOrPrefix,
    },
}

/// Handle file commands
pub async fn handle_file_command(command: FileCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        FileCommands::Upload { path } => upload_file(&client, &path).await,
        FileCommands::List => list_files(&client).await,
        FileCommands::Download { id, output } => download_file(&client, &id, output).await,
        FileCommands::Delete { id } => delete_file(&client, &id).await,
    }
}

async fn upload_file(client: &AgentClient, path: &Path) -> Result<()> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} has no usable file name", path.display()))?;

    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let file = client.upload_file(filename, content).await?;

    println!("{}", "✓ File uploaded".green().bold());
    print_file(&file);

    Ok(())
}

async fn list_files(client: &AgentClient) -> Result<()> {
    let files = client.list_files().await?;

    if files.is_empty() {
        println!("{}", "No files found.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} file(s):", files.len()).bold());
    println!();
    for file in files {
        print_file(&file);
        println!();
    }

    Ok(())
}

async fn download_file(client: &AgentClient, id: &IdOrPrefix, output: Option<PathBuf>) -> Result<()> {
    let uuid = resolve_file_id(client, id).await?;

    let path = match output {
        Some(path) => path,
        None => {
            let file = client.get_file(uuid).await?;
            Path::new(&file.filename)
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(uuid.to_string()))
        }
    };

    let content = client.download_file(uuid).await?;
    tokio::fs::write(&path, &content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "{} {} ({} bytes)",
        "✓ Saved".green(),
        path.display(),
        content.len()
    );

    Ok(())
}

async fn delete_file(client: &AgentClient, id: &IdOrPrefix) -> Result<()> {
    let uuid = resolve_file_id(client, id).await?;
    client.delete_file(uuid).await?;

    println!("{} File {} deleted", "✓".green(), uuid.to_string().cyan());

    Ok(())
}

fn print_file(file: &FileObject) {
    println!("  {} {}", "▸".cyan(), file.filename);
    println!("    ID:      {}", file.id.to_string().dimmed());
    println!("    Size:    {} bytes", file.bytes);
    println!(
        "    Created: {}",
        file.created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
}
