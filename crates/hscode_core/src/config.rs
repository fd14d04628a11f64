//! Cache configuration.

use std::time::Duration;

/// Default lifetime of a cached code table.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Configuration for [`crate::TableCache`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a loaded table is served before the store is read again.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl CacheConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time-to-live.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ttl_is_five_minutes() {
        assert_eq!(CacheConfig::default().ttl, Duration::from_secs(300));
        let config = CacheConfig::new().with_ttl(Duration::from_secs(10));
        assert_eq!(config.ttl, Duration::from_secs(10));
    }
}
