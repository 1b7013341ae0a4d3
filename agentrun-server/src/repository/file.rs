//! File Repository
//!
//! Handles all store operations related to files.

use agentrun_core::domain::file::FileObject;
use uuid::Uuid;

use crate::store::{FileRecord, Store};

/// Store a new file
pub async fn create(store: &Store, filename: String, content: Vec<u8>) -> FileObject {
    let record = FileRecord::new(filename, content, chrono::Utc::now());
    let file = record.file.clone();

    store.write().await.files.insert(file.id, record);

    file
}

/// Find file metadata by ID
pub async fn find_by_id(store: &Store, id: Uuid) -> Option<FileObject> {
    store.read().await.files.get(&id).map(|f| f.file.clone())
}

/// Find file metadata and content by ID
pub async fn find_content(store: &Store, id: Uuid) -> Option<(FileObject, Vec<u8>)> {
    store
        .read()
        .await
        .files
        .get(&id)
        .map(|f| (f.file.clone(), f.content.clone()))
}

/// List all files, newest first
pub async fn list_all(store: &Store) -> Vec<FileObject> {
    let state = store.read().await;
    let mut files: Vec<FileObject> = state.files.values().map(|f| f.file.clone()).collect();
    files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    files
}

/// Delete a file, returning whether it existed
pub async fn delete(store: &Store, id: Uuid) -> bool {
    store.write().await.files.remove(&id).is_some()
}
