//! Configuration for the sync engine.

use std::time::Duration;

/// Paginated nomenclature endpoint.
pub const DEFAULT_BASE_URL: &str =
    "https://ext-isztar4.mf.gov.pl/tariff/rest/goods-nomenclature/codes";

/// Number of pages the nomenclature is split into.
pub const DEFAULT_TOTAL_PAGES: u32 = 21;

/// Browser-like user agent; the upstream rejects unknown clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Configuration for sync runs.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Upstream endpoint, without the `page` query parameter.
    pub base_url: String,
    /// Number of pages fetched per run.
    pub total_pages: u32,
    /// Pause between two page requests.
    pub page_delay: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
    /// User agent sent upstream.
    pub user_agent: String,
    /// Version label written into metadata.
    pub version: String,
}

impl SyncConfig {
    /// Creates a configuration for the given endpoint.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            total_pages: DEFAULT_TOTAL_PAGES,
            page_delay: Duration::from_secs(2),
            timeout: Duration::from_secs(60),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            version: hscode_core::VERSION.to_string(),
        }
    }

    /// Sets the number of pages.
    pub fn with_total_pages(mut self, pages: u32) -> Self {
        self.total_pages = pages;
        self
    }

    /// Sets the delay between page requests.
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the metadata version label.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.total_pages, 21);
        assert_eq!(config.page_delay, Duration::from_secs(2));
        assert_eq!(config.version, hscode_core::VERSION);
    }

    #[test]
    fn sync_config_builder() {
        let config = SyncConfig::new("https://upstream.example.com/codes")
            .with_total_pages(3)
            .with_page_delay(Duration::ZERO)
            .with_timeout(Duration::from_secs(5))
            .with_version("test");

        assert_eq!(config.base_url, "https://upstream.example.com/codes");
        assert_eq!(config.total_pages, 3);
        assert_eq!(config.page_delay, Duration::ZERO);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.version, "test");
    }
}
