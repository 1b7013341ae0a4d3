//! ID resolver module
//!
//! Resolves UUID prefixes to full UUIDs by listing resources from the
//! service, so users can type short, unambiguous prefixes.

use agentrun_client::AgentClient;
use anyhow::{Context, Result, anyhow};
use uuid::Uuid;

use crate::types::IdOrPrefix;

/// Resolve a run ID or prefix to a full UUID
pub async fn resolve_run_id(client: &AgentClient, id: &IdOrPrefix) -> Result<Uuid> {
    if let IdOrPrefix::Full(uuid) = id {
        return Ok(*uuid);
    }

    let runs = client
        .list_runs()
        .await
        .context("Failed to fetch runs for ID resolution")?;

    resolve_among("run", id, runs.iter().map(|r| r.id))
}

/// Resolve a file ID or prefix to a full UUID
pub async fn resolve_file_id(client: &AgentClient, id: &IdOrPrefix) -> Result<Uuid> {
    if let IdOrPrefix::Full(uuid) = id {
        return Ok(*uuid);
    }

    let files = client
        .list_files()
        .await
        .context("Failed to fetch files for ID resolution")?;

    resolve_among("file", id, files.iter().map(|f| f.id))
}

/// Picks the single candidate `id` matches
///
/// # Errors
/// Returns an error if no candidate matches or the prefix is ambiguous.
fn resolve_among(
    kind: &str,
    id: &IdOrPrefix,
    candidates: impl Iterator<Item = Uuid>,
) -> Result<Uuid> {
    let matches: Vec<Uuid> = candidates.filter(|c| id.matches(c)).collect();

    match matches.as_slice() {
        [] => Err(anyhow!("No {} found with ID starting with '{}'", kind, id)),
        [single] => Ok(*single),
        _ => {
            let ids: Vec<String> = matches.iter().map(Uuid::to_string).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple {}s: {}",
                id,
                kind,
                ids.join(", ")
            ))
        }
    }
}
