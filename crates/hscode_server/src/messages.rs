//! Request and response bodies.
//!
//! All bodies use camelCase JSON field names.

use hscode_core::{
    ChangeSummary, ListUpdateOutcome, MatchKind, MatchResult, Restriction, StatusKind, StatusList,
    SyncMetadata, SyncType,
};
use hscode_sync_engine::SyncReport;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Body of a verify request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    /// Free-form code as entered by the user.
    pub code: String,
}

/// Body of a verify response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    /// Resolved code.
    pub code: String,
    /// Cleaned query, when it differs from `code`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_code: Option<String>,
    /// Breadcrumb of the matched entry.
    pub description: Option<String>,
    /// Whether the code names a single, unrestricted entry.
    pub is_valid: bool,
    /// Whether anything in the table covers the query.
    pub found: bool,
    /// Whether the query is a heading with several completions.
    pub is_general_code: bool,
    /// For headings, whether the query itself is a table code.
    pub exact_match: bool,
    /// Whether the query was completed from its only subcode.
    pub is_single_subcode: bool,
    /// Whether the query extends a shorter table code.
    pub is_extended_from_prefix: bool,
    /// The table code a prefix extension matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_prefix: Option<String>,
    /// Preview of subcodes for headings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcodes: Vec<String>,
    /// Number of subcodes for headings.
    pub subcode_count: usize,
    /// A sanctioned prefix matched.
    pub is_sanctioned: bool,
    /// A sanitary-controlled prefix matched.
    pub is_sanepid: bool,
    /// The restriction surfaced to the user.
    pub special_status: Option<Restriction>,
    /// Warning text for `special_status`.
    pub special_message: Option<String>,
}

impl From<&MatchResult> for VerifyResponse {
    fn from(result: &MatchResult) -> Self {
        let (exact_match, subcode_count, subcodes) = match &result.kind {
            MatchKind::General {
                exact_match,
                subcode_count,
                preview,
            } => (*exact_match, *subcode_count, preview.clone()),
            _ => (false, 0, Vec::new()),
        };
        let matched_prefix = match &result.kind {
            MatchKind::PrefixExtension { matched_prefix } => Some(matched_prefix.clone()),
            _ => None,
        };

        Self {
            code: result.code.clone(),
            original_code: result.original_code().map(str::to_string),
            description: result.description.as_ref().map(|d| d.to_string()),
            is_valid: result.is_valid(),
            found: result.is_found(),
            is_general_code: result.is_general(),
            exact_match,
            is_single_subcode: result.kind == MatchKind::SingleSubcode,
            is_extended_from_prefix: matched_prefix.is_some(),
            matched_prefix,
            subcodes,
            subcode_count,
            is_sanctioned: result.overlay.sanctioned,
            is_sanepid: result.overlay.controlled,
            special_status: result.overlay.status(),
            special_message: result.overlay.message().map(str::to_string),
        }
    }
}

/// Liveness summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `"ok"` when the service answers.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Codes in the cached table.
    pub records: usize,
    /// Time of the answer.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Table and list statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Codes in the cached table.
    pub total_records: usize,
    /// When the last sync attempt finished.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_sync: Option<OffsetDateTime>,
    /// Outcome of the last sync attempt.
    pub sync_type: Option<SyncType>,
    /// Changes made by the last sync attempt.
    pub changes: Option<ChangeSummary>,
    /// Data version label.
    pub version: String,
    /// Sanctioned prefixes.
    pub sanctioned_count: usize,
    /// Sanitary-controlled prefixes.
    pub sanepid_count: usize,
}

/// One status list as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusListView {
    /// The prefixes, ascending.
    pub codes: Vec<String>,
    /// Number of prefixes.
    pub count: usize,
    /// When the list was last replaced.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_updated: Option<OffsetDateTime>,
}

impl From<&StatusList> for StatusListView {
    fn from(list: &StatusList) -> Self {
        Self {
            codes: list.codes.iter().cloned().collect(),
            count: list.len(),
            last_updated: list.last_updated,
        }
    }
}

/// Both status lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusListsResponse {
    /// Sanctioned prefixes.
    pub sanctions: StatusListView,
    /// Sanitary-controlled prefixes.
    pub sanepid: StatusListView,
}

/// Body of a status-list replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    /// New content of the list.
    pub codes: Vec<String>,
    /// Which list to replace.
    #[serde(rename = "type")]
    pub kind: StatusKind,
}

/// Result of a status-list replacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateResponse {
    /// Which list was replaced.
    #[serde(rename = "type")]
    pub kind: StatusKind,
    /// Distinct well-formed prefixes stored.
    pub accepted: usize,
    /// Codes in the request.
    pub submitted: usize,
    /// When the list was replaced.
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

impl StatusUpdateResponse {
    pub(crate) fn new(kind: StatusKind, outcome: ListUpdateOutcome, at: OffsetDateTime) -> Self {
        Self {
            kind,
            accepted: outcome.accepted,
            submitted: outcome.submitted,
            last_updated: at,
        }
    }
}

/// Result of a manual sync trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncTriggerResponse {
    /// Codes added.
    pub added: u64,
    /// Codes whose description changed.
    pub updated: u64,
    /// Codes removed.
    pub removed: u64,
    /// Codes left as they were.
    pub unchanged: u64,
    /// Codes in the new table.
    pub total_records: usize,
    /// Wall time of the run.
    pub duration_ms: u64,
    /// Pages fetched.
    pub successful_pages: u32,
    /// Pages skipped.
    pub failed_pages: u32,
    /// Whether the table was rewritten.
    pub persisted: bool,
}

impl From<&SyncReport> for SyncTriggerResponse {
    fn from(report: &SyncReport) -> Self {
        Self {
            added: report.changes.added,
            updated: report.changes.updated,
            removed: report.changes.removed,
            unchanged: report.changes.unchanged,
            total_records: report.total_records,
            duration_ms: u64::try_from(report.duration_ms()).unwrap_or(u64::MAX),
            successful_pages: report.successful_pages,
            failed_pages: report.failed_pages,
            persisted: report.persisted,
        }
    }
}

/// Sync status summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusResponse {
    /// Whether a run is in progress.
    pub running: bool,
    /// Metadata of the last attempt, if any.
    #[serde(flatten)]
    pub metadata: Option<SyncMetadata>,
}
