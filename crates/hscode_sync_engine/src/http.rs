//! HTTP upstream implementation.
//!
//! The HTTP client is abstracted via a trait so the upstream can be driven
//! by `reqwest` in production and by closures in tests.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::upstream::{TreeNode, UpstreamSource};
use parking_lot::RwLock;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER,
};
use tracing::debug;

/// Longest excerpt of an error body kept in messages.
const ERROR_BODY_EXCERPT: usize = 200;

/// HTTP client abstraction.
pub trait HttpClient: Send + Sync {
    /// Sends a GET request and returns the response body.
    ///
    /// Non-success statuses are errors.
    fn get(&self, url: &str) -> Result<Vec<u8>, String>;
}

impl<F> HttpClient for F
where
    F: Fn(&str) -> Result<Vec<u8>, String> + Send + Sync,
{
    fn get(&self, url: &str) -> Result<Vec<u8>, String> {
        self(url)
    }
}

/// Upstream source reading JSON pages over HTTP.
pub struct HttpUpstream<C: HttpClient> {
    base_url: String,
    total_pages: u32,
    client: C,
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpUpstream<C> {
    /// Creates an upstream for the configured endpoint.
    pub fn new(config: &SyncConfig, client: C) -> Self {
        Self {
            base_url: config.base_url.clone(),
            total_pages: config.total_pages,
            client,
            last_error: RwLock::new(None),
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the URL of a page.
    pub fn page_url(&self, page: u32) -> String {
        format!("{}?page={}", self.base_url, page)
    }

    /// Returns the last error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    fn record<T>(&self, result: SyncResult<T>) -> SyncResult<T> {
        match &result {
            Ok(_) => *self.last_error.write() = None,
            Err(e) => *self.last_error.write() = Some(e.to_string()),
        }
        result
    }
}

impl<C: HttpClient> UpstreamSource for HttpUpstream<C> {
    fn total_pages(&self) -> u32 {
        self.total_pages
    }

    fn fetch_page(&self, page: u32) -> SyncResult<TreeNode> {
        let url = self.page_url(page);
        debug!(%url, "fetching upstream page");

        let result = self
            .client
            .get(&url)
            .map_err(|message| SyncError::Fetch { page, message })
            .and_then(|body| {
                serde_json::from_slice(&body).map_err(|e| SyncError::Decode {
                    page,
                    message: e.to_string(),
                })
            });
        self.record(result)
    }
}

/// Blocking `reqwest` client with the headers the upstream expects.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Builds a client from the sync configuration.
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .default_headers(browser_headers(&config.base_url)?)
            .build()
            .map_err(|e| SyncError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, String> {
        let response = self.client.get(url).send().map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let excerpt: String = body.chars().take(ERROR_BODY_EXCERPT).collect();
            return Err(format!("HTTP {status}: {excerpt}"));
        }
        response
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|e| e.to_string())
    }
}

fn browser_headers(base_url: &str) -> SyncResult<HeaderMap> {
    let url = reqwest::Url::parse(base_url)
        .map_err(|e| SyncError::Client(format!("invalid base url {base_url}: {e}")))?;
    let origin = url.origin().ascii_serialization();
    let invalid = |e: reqwest::header::InvalidHeaderValue| SyncError::Client(e.to_string());

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("pl-PL,pl;q=0.9,en-US;q=0.8,en;q=0.7"),
    );
    headers.insert(ORIGIN, HeaderValue::from_str(&origin).map_err(invalid)?);
    headers.insert(
        REFERER,
        HeaderValue::from_str(&format!("{origin}/")).map_err(invalid)?,
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("empty"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("cors"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("same-origin"),
    );
    Ok(headers)
}
