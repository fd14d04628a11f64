//! Server configuration.

use crate::error::{ServerError, ServerResult};
use hscode_core::DEFAULT_CACHE_TTL;
use std::time::Duration;

/// Environment variable holding the status-list admin token.
pub const ADMIN_TOKEN_VAR: &str = "HSCODE_ADMIN_TOKEN";
/// Environment variable holding the sync trigger token.
pub const SYNC_TOKEN_VAR: &str = "HSCODE_SYNC_TOKEN";
/// Environment variable overriding the cache TTL, in seconds.
pub const CACHE_TTL_VAR: &str = "HSCODE_CACHE_TTL_SECS";
/// Environment variable enabling scheduled sync, in seconds.
pub const SYNC_INTERVAL_VAR: &str = "HSCODE_SYNC_INTERVAL_SECS";

/// Configuration for the service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Lifetime of the cached code table.
    pub cache_ttl: Duration,
    /// Bearer token for status-list updates. `None` disables the endpoint.
    pub admin_token: Option<String>,
    /// Bearer token for manual sync triggers. `None` disables the endpoint.
    pub sync_token: Option<String>,
    /// Period of the scheduled sync, if any.
    pub sync_interval: Option<Duration>,
    /// Version reported by the service.
    pub version: String,
}

impl ServerConfig {
    /// Creates a configuration with defaults and no tokens.
    pub fn new() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            admin_token: None,
            sync_token: None,
            sync_interval: None,
            version: hscode_core::VERSION.to_string(),
        }
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> ServerResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through a variable lookup function.
    pub fn from_lookup<F>(lookup: F) -> ServerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let seconds = |name: &str| -> ServerResult<Option<Duration>> {
            non_empty(name)
                .map(|value| {
                    value
                        .trim()
                        .parse::<u64>()
                        .map(Duration::from_secs)
                        .map_err(|e| ServerError::Config(format!("{name}={value}: {e}")))
                })
                .transpose()
        };

        let mut config = Self::new();
        config.admin_token = non_empty(ADMIN_TOKEN_VAR);
        config.sync_token = non_empty(SYNC_TOKEN_VAR);
        if let Some(ttl) = seconds(CACHE_TTL_VAR)? {
            config.cache_ttl = ttl;
        }
        config.sync_interval = seconds(SYNC_INTERVAL_VAR)?.filter(|interval| !interval.is_zero());
        Ok(config)
    }

    /// Sets the cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Enables status-list updates with the given token.
    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    /// Enables manual sync triggers with the given token.
    pub fn with_sync_token(mut self, token: impl Into<String>) -> Self {
        self.sync_token = Some(token.into());
        self
    }

    /// Enables scheduled sync.
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = Some(interval);
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}
