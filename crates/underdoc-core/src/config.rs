use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, UnderDocError};

pub const DEFAULT_API_ENDPOINT: &str = "https://api.underdoc.io";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_BATCH_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

pub const ENV_API_KEY: &str = "UNDERDOC_API_KEY";
pub const ENV_API_ENDPOINT: &str = "UNDERDOC_API_ENDPOINT";
pub const ENV_TIMEOUT_SECS: &str = "UNDERDOC_TIMEOUT_SECS";
pub const ENV_BATCH_TIMEOUT_SECS: &str = "UNDERDOC_BATCH_TIMEOUT_SECS";
pub const ENV_MAX_CONCURRENCY: &str = "UNDERDOC_MAX_CONCURRENCY";

/// Connection settings for the extraction service. Immutable once built and
/// shared read-only by every batch worker.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub api_endpoint: String,
    /// Wall-clock bound for a single extraction call.
    pub timeout_secs: u64,
    /// Wall-clock bound for one extraction inside a batch.
    pub batch_timeout_secs: u64,
    pub max_concurrency: usize,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            batch_timeout_secs: DEFAULT_BATCH_TIMEOUT_SECS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Reads settings from the process environment. `UNDERDOC_API_KEY` is required.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`ClientConfig::from_env`], but with an explicit key that wins over
    /// `UNDERDOC_API_KEY`.
    pub fn from_env_with_key(api_key: Option<String>) -> Result<Self> {
        Self::from_lookup(|name| {
            if name == ENV_API_KEY {
                if let Some(key) = &api_key {
                    return Some(key.clone());
                }
            }
            std::env::var(name).ok()
        })
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ENV_API_KEY)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                UnderDocError::Config(format!(
                    "api_key is required. Either provide it explicitly or set the {ENV_API_KEY} environment variable."
                ))
            })?;

        let mut config = Self::new(api_key);
        if let Some(endpoint) = lookup(ENV_API_ENDPOINT).filter(|e| !e.trim().is_empty()) {
            config = config.with_endpoint(endpoint);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, ENV_TIMEOUT_SECS)? {
            config.timeout_secs = secs;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, ENV_BATCH_TIMEOUT_SECS)? {
            config.batch_timeout_secs = secs;
        }
        if let Some(n) = parse_var::<usize>(&lookup, ENV_MAX_CONCURRENCY)? {
            config = config.with_max_concurrency(n);
        }

        config.validate()?;
        debug!(
            api_endpoint = %config.api_endpoint,
            timeout_secs = config.timeout_secs,
            batch_timeout_secs = config.batch_timeout_secs,
            max_concurrency = config.max_concurrency,
            "Loaded client configuration"
        );
        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout_secs = timeout.as_secs();
        self
    }

    /// Zero is clamped to one worker.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(UnderDocError::Config("api_key must not be empty".into()));
        }
        if !(self.api_endpoint.starts_with("http://") || self.api_endpoint.starts_with("https://"))
        {
            return Err(UnderDocError::Config(format!(
                "api_endpoint must be an http(s) URL, got '{}'",
                self.api_endpoint
            )));
        }
        if self.timeout_secs == 0 || self.batch_timeout_secs == 0 {
            return Err(UnderDocError::Config("timeouts must be at least one second".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }

    pub fn extract_url(&self) -> String {
        format!("{}/expenses/extract", self.api_endpoint)
    }
}

// The API key never shows up in logs.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("api_endpoint", &self.api_endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .field("batch_timeout_secs", &self.batch_timeout_secs)
            .field("max_concurrency", &self.max_concurrency)
            .finish()
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| UnderDocError::Config(format!("{name} must be a number, got '{raw}'"))),
    }
}
