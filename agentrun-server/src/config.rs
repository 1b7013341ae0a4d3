//! Server configuration
//!
//! Bind address, engine pacing, API key and upload limits, loaded from the
//! environment.

use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: String,

    /// How often the engine advances live runs
    pub tick_interval: Duration,

    /// How long a run may wait for tool outputs before it expires
    pub action_timeout: Duration,

    /// When set, every `/api` route requires `Authorization: Bearer <key>`
    pub api_key: Option<String>,

    /// Largest accepted upload
    pub max_file_bytes: u64,
}

impl ServerConfig {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - AGENTRUN_BIND_ADDR (optional, default: 0.0.0.0:8080)
    /// - AGENTRUN_TICK_MS (optional, default: 500)
    /// - AGENTRUN_ACTION_TIMEOUT_SECS (optional, default: 600)
    /// - AGENTRUN_API_KEY (optional)
    /// - AGENTRUN_MAX_FILE_BYTES (optional, default: 10485760)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = std::env::var("AGENTRUN_BIND_ADDR").unwrap_or(defaults.bind_addr);

        let tick_interval = env_u64("AGENTRUN_TICK_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.tick_interval);

        let action_timeout = env_u64("AGENTRUN_ACTION_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.action_timeout);

        let api_key = std::env::var("AGENTRUN_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        let max_file_bytes = env_u64("AGENTRUN_MAX_FILE_BYTES")?.unwrap_or(defaults.max_file_bytes);

        Ok(Self {
            bind_addr,
            tick_interval,
            action_timeout,
            api_key,
            max_file_bytes,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.tick_interval.is_zero() {
            anyhow::bail!("tick_interval must be greater than 0");
        }

        if self.action_timeout.is_zero() {
            anyhow::bail!("action_timeout must be greater than 0");
        }

        if self.max_file_bytes == 0 {
            anyhow::bail!("max_file_bytes must be greater than 0");
        }

        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            tick_interval: Duration::from_millis(500),
            action_timeout: Duration::from_secs(600),
            api_key: None,
            max_file_bytes: 10 * 1024 * 1024,
        }
    }
}

fn env_u64(name: &str) -> anyhow::Result<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("invalid value for {}: {}", name, e)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.tick_interval, Duration::from_millis(500));
        assert_eq!(config.action_timeout, Duration::from_secs(600));
        assert!(config.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ServerConfig::default();

        config.tick_interval = Duration::ZERO;
        assert!(config.validate().is_err());
        config.tick_interval = Duration::from_millis(100);

        config.max_file_bytes = 0;
        assert!(config.validate().is_err());
        config.max_file_bytes = 1;

        config.bind_addr = String::new();
        assert!(config.validate().is_err());
    }
}
