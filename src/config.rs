use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

/// Where the detector API listens when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Request timeout for classification calls, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. CLI flags
/// are applied on top with the `with_*` methods.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the phishing detector API (PHISHWATCH_API_URL).
    pub api_url: String,
    /// Per-request timeout (PHISHWATCH_TIMEOUT_SECS).
    pub timeout: Duration,
    /// User-Agent sent to the detector (PHISHWATCH_USER_AGENT).
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unset and empty variables both fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = get("PHISHWATCH_API_URL")
            .map(|v| normalize_api_url(&v))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout = match get("PHISHWATCH_TIMEOUT_SECS") {
            Some(raw) => parse_timeout(&raw).context("Invalid PHISHWATCH_TIMEOUT_SECS")?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let user_agent = get("PHISHWATCH_USER_AGENT").unwrap_or_else(default_user_agent);

        Ok(Self {
            api_url,
            timeout,
            user_agent,
        })
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = normalize_api_url(api_url);
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Result<Self> {
        if secs == 0 {
            anyhow::bail!("Timeout must be at least one second");
        }
        self.timeout = Duration::from_secs(secs);
        Ok(self)
    }
}

fn default_user_agent() -> String {
    format!("phishwatch/{}", env!("CARGO_PKG_VERSION"))
}

fn normalize_api_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("expected a whole number of seconds, got {raw:?}"))?;
    if secs == 0 {
        anyhow::bail!("timeout must be at least one second");
    }
    Ok(Duration::from_secs(secs))
}
