//! Environment-driven configuration of a [`Hook`].
//!
//! These are purely helpers; [`Hook::new`] stays decoupled from
//! environment access.

use crate::hook::Hook;
use reqwest::Client;
use std::time::Duration;
use tracing::Level;

/// Logical service name, sent as `service-name` and `belong_system`.
pub const LOG_HOOK_SERVICE_NAME_ENV: &str = "LOG_HOOK_SERVICE_NAME";

/// Collection endpoint URL, e.g. `http://logs.internal:8080/api/log`.
pub const LOG_HOOK_ENDPOINT_ENV: &str = "LOG_HOOK_ENDPOINT";

/// Comma-separated severities the hook handles. Defaults to `error`.
pub const LOG_HOOK_LEVELS_ENV: &str = "LOG_HOOK_LEVELS";

/// Optional HTTP client timeout in milliseconds. Unset means no timeout.
pub const LOG_HOOK_TIMEOUT_MS_ENV: &str = "LOG_HOOK_TIMEOUT_MS";

const DEFAULT_LEVELS: &str = "error";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Error type returned when reading or applying a [`HookConfig`].
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid log level: {0:?}")]
    InvalidLevel(String),

    #[error("invalid timeout: {0:?}")]
    InvalidTimeout(String),

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Everything needed to construct a [`Hook`].
#[derive(Clone, Debug)]
pub struct HookConfig {
    pub name: String,
    pub endpoint: String,
    pub levels: Vec<Level>,
    /// Applied to the HTTP client; the hook itself never times out.
    pub timeout: Option<Duration>,
}

impl HookConfig {
    /// Read the configuration from `LOG_HOOK_*` variables.
    ///
    /// **Returns**
    /// - `Err(ConfigError::MissingVar)` if the name or endpoint is unset.
    /// - `Err(..)` if levels or timeout do not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let name = std::env::var(LOG_HOOK_SERVICE_NAME_ENV)
            .map_err(|_| ConfigError::MissingVar(LOG_HOOK_SERVICE_NAME_ENV))?;
        let endpoint = std::env::var(LOG_HOOK_ENDPOINT_ENV)
            .map_err(|_| ConfigError::MissingVar(LOG_HOOK_ENDPOINT_ENV))?;
        let levels = parse_levels(&env_or(LOG_HOOK_LEVELS_ENV, DEFAULT_LEVELS))?;
        let timeout = match std::env::var(LOG_HOOK_TIMEOUT_MS_ENV) {
            Ok(raw) => Some(parse_timeout_ms(&raw)?),
            Err(_) => None,
        };

        Ok(HookConfig { name, endpoint, levels, timeout })
    }

    /// Build a [`Hook`] whose client honours `timeout`.
    pub fn build(self) -> Result<Hook, ConfigError> {
        let mut client = Client::builder();
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }
        let client = client.build()?;

        Ok(Hook::new(self.name, self.endpoint, self.levels).with_client(client))
    }
}

/// Parse a comma-separated level list such as `"error, warn"`.
///
/// Blank items are skipped; names are case-insensitive.
pub fn parse_levels(raw: &str) -> Result<Vec<Level>, ConfigError> {
    let mut levels = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let level = item
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLevel(item.to_string()))?;
        if !levels.contains(&level) {
            levels.push(level);
        }
    }
    Ok(levels)
}

/// All levels at least as severe as `threshold`, most severe first.
pub fn levels_up_to(threshold: Level) -> Vec<Level> {
    [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE]
        .into_iter()
        .filter(|level| *level <= threshold)
        .collect()
}

fn parse_timeout_ms(raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::InvalidTimeout(raw.to_string()))
}
