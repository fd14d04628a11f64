//! Sync command implementation.

use super::{open_store, print_json, CommandResult, OutputFormat};
use hscode_server::SyncTriggerResponse;
use hscode_sync_engine::{
    HttpUpstream, PageOutcome, ReqwestClient, SyncConfig, SyncEngine, SyncReport,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Overrides of the default sync configuration.
#[derive(Debug, Default)]
pub struct SyncOptions {
    /// Number of pages.
    pub pages: Option<u32>,
    /// Delay between pages in milliseconds.
    pub delay_ms: Option<u64>,
    /// Upstream endpoint.
    pub base_url: Option<String>,
}

impl SyncOptions {
    fn config(self) -> SyncConfig {
        let mut config = match self.base_url {
            Some(url) => SyncConfig::new(url),
            None => SyncConfig::default(),
        };
        if let Some(pages) = self.pages {
            config = config.with_total_pages(pages);
        }
        if let Some(delay) = self.delay_ms {
            config = config.with_page_delay(Duration::from_millis(delay));
        }
        config
    }
}

/// Runs the sync command.
pub fn run(path: &Path, options: SyncOptions, format: OutputFormat) -> CommandResult {
    let store = open_store(path)?;
    let config = options.config();
    info!(url = %config.base_url, pages = config.total_pages, "syncing");

    let client = ReqwestClient::new(&config)?;
    let upstream = HttpUpstream::new(&config, client);
    let engine = SyncEngine::new(config, upstream, store);
    let report = engine.run()?;

    match format {
        OutputFormat::Json => print_json(&SyncTriggerResponse::from(&report))?,
        OutputFormat::Text => print!("{}", render(&report)),
    }
    Ok(())
}

fn render(report: &SyncReport) -> String {
    let mut out = String::new();
    if report.persisted {
        out.push_str("✓ Table updated\n");
    } else {
        out.push_str("✓ No changes upstream\n");
    }
    out.push_str(&format!("  Records:   {}\n", report.total_records));
    out.push_str(&format!("  Added:     {}\n", report.changes.added));
    out.push_str(&format!("  Updated:   {}\n", report.changes.updated));
    out.push_str(&format!("  Removed:   {}\n", report.changes.removed));
    out.push_str(&format!("  Unchanged: {}\n", report.changes.unchanged));
    out.push_str(&format!(
        "  Pages:     {} fetched, {} skipped\n",
        report.successful_pages, report.failed_pages
    ));
    for outcome in &report.pages {
        if let PageOutcome::Skipped { page, error } = outcome {
            out.push_str(&format!("    page {page}: {error}\n"));
        }
    }
    if report.backed_up {
        out.push_str("  Previous table kept for rollback\n");
    }
    out.push_str(&format!("  Duration:  {} ms\n", report.duration_ms()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hscode_sync_engine::DEFAULT_BASE_URL;

    #[test]
    fn options_override_defaults() {
        let config = SyncOptions {
            pages: Some(3),
            delay_ms: Some(0),
            base_url: Some("https://mirror.example.com/codes".into()),
        }
        .config();
        assert_eq!(config.total_pages, 3);
        assert_eq!(config.page_delay, Duration::ZERO);
        assert_eq!(config.base_url, "https://mirror.example.com/codes");

        let config = SyncOptions::default().config();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.total_pages, 21);
    }
}
