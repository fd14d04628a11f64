//! Metadata written next to the code table after each sync attempt.

use crate::table::ChangeSummary;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// What the last sync attempt did to the stored table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncType {
    /// A new table replaced the previous one.
    Delta,
    /// Upstream matched the stored table; nothing was rewritten.
    None,
    /// The attempt failed; the previous table was left in place.
    ErrorFallback,
    /// The backup table was restored into the current slot.
    Rollback,
}

impl fmt::Display for SyncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncType::Delta => "delta",
            SyncType::None => "none",
            SyncType::ErrorFallback => "error_fallback",
            SyncType::Rollback => "rollback",
        };
        f.write_str(s)
    }
}

/// Metadata of the last sync attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetadata {
    /// When the attempt finished.
    #[serde(with = "time::serde::rfc3339")]
    pub last_sync: OffsetDateTime,
    /// Number of codes in the stored table after the attempt.
    pub total_records: u64,
    /// Changes relative to the previous table.
    pub changes: ChangeSummary,
    /// Data format version label.
    pub version: String,
    /// Outcome of the attempt.
    pub sync_type: SyncType,
    /// Upstream pages fetched successfully.
    #[serde(default)]
    pub successful_pages: u32,
    /// Upstream pages skipped after a failed fetch.
    #[serde(default)]
    pub failed_pages: u32,
    /// Error text for failed attempts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncMetadata {
    /// Creates metadata for a successful attempt.
    pub fn new(
        last_sync: OffsetDateTime,
        total_records: u64,
        changes: ChangeSummary,
        version: impl Into<String>,
        sync_type: SyncType,
    ) -> Self {
        Self {
            last_sync,
            total_records,
            changes,
            version: version.into(),
            sync_type,
            successful_pages: 0,
            failed_pages: 0,
            error: None,
        }
    }

    /// Records how many upstream pages were fetched and skipped.
    #[must_use]
    pub fn with_pages(mut self, successful: u32, failed: u32) -> Self {
        self.successful_pages = successful;
        self.failed_pages = failed;
        self
    }

    /// Records the error of a failed attempt.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
