//! Client configuration
//!
//! Endpoint, credentials and poll pacing, loaded from the environment.

use std::time::Duration;

use crate::poller::PollPolicy;

/// Client configuration
///
/// Poll settings default to a fixed one-second interval with no deadline
/// and no retries.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base URL (e.g., "http://localhost:8080")
    pub endpoint: String,

    /// Static key sent as a bearer token
    pub api_key: Option<String>,

    /// Delay between status queries
    pub poll_interval: Duration,

    /// Multiplier applied to the delay after each unsettled poll
    pub poll_backoff: f64,

    /// Upper bound for the poll delay
    pub poll_max_interval: Duration,

    /// Give up waiting after this long (unbounded when unset)
    pub max_wait: Option<Duration>,

    /// Consecutive transient errors tolerated while polling
    pub transient_retries: u32,

    /// Timeout of a single HTTP request
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration with defaults for the given endpoint
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            api_key: None,
            poll_interval: Duration::from_millis(1000),
            poll_backoff: 1.0,
            poll_max_interval: Duration::from_millis(30_000),
            max_wait: None,
            transient_retries: 0,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - AGENTRUN_ENDPOINT (optional, default: http://localhost:8080)
    /// - AGENTRUN_API_KEY (optional)
    /// - AGENTRUN_POLL_INTERVAL_MS (optional, default: 1000)
    /// - AGENTRUN_POLL_BACKOFF (optional, default: 1.0)
    /// - AGENTRUN_POLL_MAX_INTERVAL_MS (optional, default: 30000)
    /// - AGENTRUN_MAX_WAIT_SECS (optional, unbounded when unset)
    /// - AGENTRUN_TRANSIENT_RETRIES (optional, default: 0)
    /// - AGENTRUN_REQUEST_TIMEOUT_SECS (optional, default: 30)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let endpoint = std::env::var("AGENTRUN_ENDPOINT").unwrap_or(defaults.endpoint);

        let api_key = std::env::var("AGENTRUN_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        let poll_interval = env_parse::<u64>("AGENTRUN_POLL_INTERVAL_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);

        let poll_backoff = env_parse::<f64>("AGENTRUN_POLL_BACKOFF")?.unwrap_or(defaults.poll_backoff);

        let poll_max_interval = env_parse::<u64>("AGENTRUN_POLL_MAX_INTERVAL_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_max_interval);

        let max_wait = env_parse::<u64>("AGENTRUN_MAX_WAIT_SECS")?.map(Duration::from_secs);

        let transient_retries =
            env_parse::<u32>("AGENTRUN_TRANSIENT_RETRIES")?.unwrap_or(defaults.transient_retries);

        let request_timeout = env_parse::<u64>("AGENTRUN_REQUEST_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        Ok(Self {
            endpoint,
            api_key,
            poll_interval,
            poll_backoff,
            poll_max_interval,
            max_wait,
            transient_retries,
            request_timeout,
        })
    }

    /// The poll policy described by this configuration
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: self.poll_interval,
            backoff_factor: self.poll_backoff,
            max_interval: self.poll_max_interval,
            max_wait: self.max_wait,
            transient_retries: self.transient_retries,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.endpoint.is_empty() {
            anyhow::bail!("endpoint cannot be empty");
        }

        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            anyhow::bail!("endpoint must start with http:// or https://");
        }

        self.poll_policy().validate()?;

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080".to_string())
    }
}

/// Reads and parses an optional environment variable
fn env_parse<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("invalid value for {}: {}", name, e)),
        _ => Ok(None),
    }
}
