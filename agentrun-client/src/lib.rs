//! Agentrun HTTP Client
//!
//! A type-safe client for an agent run service, plus the polling flow built on
//! top of it: submit a run, wait for it to settle, answer tool calls, fetch
//! the result.
//!
//! # Example
//!
//! ```no_run
//! use agentrun_client::{AgentClient, PollPolicy, Session};
//! use agentrun_core::dto::run::SubmitRun;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Arc::new(AgentClient::new("http://localhost:8080"));
//!     let session = Session::new(client, PollPolicy::default());
//!
//!     let outcome = session
//!         .run_to_completion(SubmitRun::new("analyst", "Summarize last quarter"))
//!         .await?;
//!
//!     if let Some(result) = outcome.result {
//!         println!("{}", result.text());
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
mod files;
pub mod poller;
mod runs;
pub mod service;
pub mod session;
pub mod tools;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use poller::{PollPolicy, RunPoller};
pub use service::RunService;
pub use session::{RunHandle, RunOutcome, Session};
pub use tools::{FooReplyTool, ToolHandler, ToolRegistry};

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;

/// HTTP client for the agent run service API
///
/// Endpoints are grouped into:
/// - Run lifecycle (submit, poll, tool outputs, cancel, result)
/// - File storage (upload, list, download, delete)
#[derive(Debug, Clone)]
pub struct AgentClient {
    /// Base URL of the service (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Static key sent as a bearer token
    api_key: Option<String>,
}

impl AgentClient {
    /// Create a new client
    ///
    /// # Example
    /// ```
    /// use agentrun_client::AgentClient;
    ///
    /// let client = AgentClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            api_key: None,
        }
    }

    /// Create a client from a [`ClientConfig`], applying its request timeout and key
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        let client = Self::with_client(config.endpoint.clone(), http);

        Ok(match &config.api_key {
            Some(key) => client.with_api_key(key.clone()),
            None => client,
        })
    }

    /// Send `key` as `Authorization: Bearer <key>` on every request
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Get the base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the service answers its health endpoint
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self.request(Method::GET, &url).send().await?;

        self.handle_empty_response(response).await
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and deserialize the JSON body
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Check the status code of a response that carries no body
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        Self::check_status(response).await?;
        Ok(())
    }

    /// Check the status code and return the raw body
    async fn handle_bytes_response(&self, response: reqwest::Response) -> Result<Vec<u8>> {
        let response = Self::check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        // The service wraps messages as {"error": "..."}
        let message = serde_json::from_str::<serde_json::Value>(&error_text)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or(error_text);

        match status {
            reqwest::StatusCode::NOT_FOUND => Err(ClientError::NotFound(message)),
            reqwest::StatusCode::BAD_REQUEST => Err(ClientError::InvalidRequest(message)),
            reqwest::StatusCode::INTERNAL_SERVER_ERROR => Err(ClientError::InternalError(message)),
            _ => Err(ClientError::api_error(status.as_u16(), message)),
        }
    }
}
