//! File-related API endpoints

use agentrun_core::domain::file::FileObject;
use agentrun_core::dto::file::UploadFileQuery;
use reqwest::Method;
use uuid::Uuid;

use crate::AgentClient;
use crate::error::Result;

impl AgentClient {
    // =============================================================================
    // File Storage
    // =============================================================================

    /// Upload a file so runs can reference it as an attachment
    ///
    /// # Arguments
    /// * `filename` - Name the service stores the file under
    /// * `content` - Raw file bytes
    pub async fn upload_file(&self, filename: &str, content: Vec<u8>) -> Result<FileObject> {
        let url = format!("{}/api/files", self.base_url);
        let response = self
            .request(Method::POST, &url)
            .query(&UploadFileQuery {
                filename: filename.to_string(),
            })
            .body(content)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// List all stored files
    pub async fn list_files(&self) -> Result<Vec<FileObject>> {
        let url = format!("{}/api/files", self.base_url);
        let response = self.request(Method::GET, &url).send().await?;

        self.handle_response(response).await
    }

    /// Get file metadata
    pub async fn get_file(&self, file_id: Uuid) -> Result<FileObject> {
        let url = format!("{}/api/files/{}", self.base_url, file_id);
        let response = self.request(Method::GET, &url).send().await?;

        self.handle_response(response).await
    }

    /// Download file content
    pub async fn download_file(&self, file_id: Uuid) -> Result<Vec<u8>> {
        let url = format!("{}/api/files/{}/content", self.base_url, file_id);
        let response = self.request(Method::GET, &url).send().await?;

        self.handle_bytes_response(response).await
    }

    /// Delete a stored file
    pub async fn delete_file(&self, file_id: Uuid) -> Result<()> {
        let url = format!("{}/api/files/{}", self.base_url, file_id);
        let response = self.request(Method::DELETE, &url).send().await?;

        self.handle_empty_response(response).await
    }
}
