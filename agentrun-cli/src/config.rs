//! Configuration module
//!
//! Combines the client settings from the environment with the global flags.

use agentrun_client::{AgentClient, ClientConfig, PollPolicy};
use anyhow::{Context, Result};

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Settings for the run service client
    pub client: ClientConfig,
}

impl Config {
    /// Loads poll settings from the environment, with the endpoint and key
    /// taken from the command line
    pub fn load(endpoint: String, api_key: Option<String>) -> Result<Self> {
        let mut client = ClientConfig::from_env().context("Invalid client configuration")?;

        client.endpoint = endpoint;
        if api_key.is_some() {
            client.api_key = api_key;
        }

        client.validate()?;

        Ok(Self { client })
    }

    /// Builds a client for the configured service
    pub fn client(&self) -> Result<AgentClient> {
        AgentClient::from_config(&self.client).context("Failed to build HTTP client")
    }

    /// Poll policy from the environment
    pub fn poll_policy(&self) -> PollPolicy {
        self.client.poll_policy()
    }
}
