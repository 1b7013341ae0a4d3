//! File Service
//!
//! Business logic for file storage.

use agentrun_core::domain::file::FileObject;
use uuid::Uuid;

use crate::repository::file_repository;
use crate::store::Store;

/// Service error type
#[derive(Debug)]
pub enum FileError {
    NotFound(Uuid),
    ValidationError(String),
    TooLarge { limit: u64 },
}

/// Store an uploaded file
pub async fn upload_file(
    store: &Store,
    filename: String,
    content: Vec<u8>,
    max_bytes: u64,
) -> Result<FileObject, FileError> {
    validate_filename(&filename)?;

    if content.len() as u64 > max_bytes {
        return Err(FileError::TooLarge { limit: max_bytes });
    }

    let file = file_repository::create(store, filename, content).await;

    tracing::info!("File stored: {} ({} bytes)", file.id, file.bytes);

    Ok(file)
}

/// Get file metadata
pub async fn get_file(store: &Store, id: Uuid) -> Result<FileObject, FileError> {
    file_repository::find_by_id(store, id)
        .await
        .ok_or(FileError::NotFound(id))
}

/// Get file metadata and content
pub async fn download_file(store: &Store, id: Uuid) -> Result<(FileObject, Vec<u8>), FileError> {
    file_repository::find_content(store, id)
        .await
        .ok_or(FileError::NotFound(id))
}

/// List all files
pub async fn list_files(store: &Store) -> Vec<FileObject> {
    file_repository::list_all(store).await
}

/// Delete a file
pub async fn delete_file(store: &Store, id: Uuid) -> Result<(), FileError> {
    if !file_repository::delete(store, id).await {
        return Err(FileError::NotFound(id));
    }

    tracing::info!("File deleted: {}", id);

    Ok(())
}

fn validate_filename(filename: &str) -> Result<(), FileError> {
    if filename.trim().is_empty() {
        return Err(FileError::ValidationError(
            "Filename cannot be empty".to_string(),
        ));
    }

    if filename.contains(['/', '\\']) || filename == "." || filename == ".." {
        return Err(FileError::ValidationError(format!(
            "Filename '{}' must not contain path separators",
            filename
        )));
    }

    Ok(())
}
