//! Run Repository
//!
//! Handles all store operations related to runs.

use agentrun_core::domain::content::RunResult;
use agentrun_core::domain::run::{Run, RunStatus};
use agentrun_core::dto::run::SubmitRun;
use uuid::Uuid;

use crate::store::{FileRecord, RunRecord, Store};

/// Create a new queued run
///
/// Attachments are checked under the same write guard as the insert, so a
/// concurrent file delete can't leave the run pointing at a missing file.
/// Returns the first attachment that doesn't refer to a stored file.
pub async fn create(store: &Store, req: SubmitRun) -> Result<Run, Uuid> {
    let mut state = store.write().await;

    if let Some(missing) = req
        .messages
        .iter()
        .flat_map(|m| m.attachments.iter())
        .find(|id| !state.files.contains_key(id))
    {
        return Err(*missing);
    }

    let run = Run {
        id: Uuid::new_v4(),
        agent: req.agent,
        instructions: req.instructions,
        status: RunStatus::Queued,
        tools: req.tools,
        metadata: req.metadata,
        created_at: chrono::Utc::now(),
        started_at: None,
        completed_at: None,
        required_action: None,
        last_error: None,
    };

    let record = RunRecord {
        run: run.clone(),
        messages: req.messages,
        tool_outputs: Vec::new(),
        content: Vec::new(),
        action_since: None,
    };

    state.runs.insert(run.id, record);

    Ok(run)
}

/// Find a run by ID
pub async fn find_by_id(store: &Store, id: Uuid) -> Option<Run> {
    store.read().await.runs.get(&id).map(|r| r.run.clone())
}

/// List all runs, newest first
pub async fn list_all(store: &Store) -> Vec<Run> {
    let state = store.read().await;
    let mut runs: Vec<Run> = state.runs.values().map(|r| r.run.clone()).collect();
    runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    runs
}

/// Build the result payload of a run, whatever its status
pub async fn find_result(store: &Store, id: Uuid) -> Option<RunResult> {
    store.read().await.runs.get(&id).map(|r| RunResult {
        run_id: r.run.id,
        status: r.run.status,
        content: r.content.clone(),
        completed_at: r.run.completed_at,
    })
}

/// Apply `f` to a run under the write lock
///
/// Returns `None` when the run doesn't exist.
pub async fn update<R>(store: &Store, id: Uuid, f: impl FnOnce(&mut RunRecord) -> R) -> Option<R> {
    let mut state = store.write().await;
    state.runs.get_mut(&id).map(f)
}

/// Apply `step` to every run that is not terminal, storing any file it produces
///
/// Returns how many runs `step` reported as changed.
pub async fn advance_live<F>(store: &Store, mut step: F) -> usize
where
    F: FnMut(&mut RunRecord) -> Option<Option<FileRecord>>,
{
    let mut state = store.write().await;
    let crate::store::StoreState { runs, files } = &mut *state;

    let mut changed = 0;
    for record in runs.values_mut().filter(|r| !r.run.status.is_terminal()) {
        if let Some(artifact) = step(record) {
            changed += 1;
            if let Some(file) = artifact {
                files.insert(file.file.id, file);
            }
        }
    }

    changed
}
