//! Update-list command implementation.

use super::{open_store, print_json, CommandResult, OutputFormat};
use hscode_core::{repository, ListUpdateOutcome, StatusKind, StatusList};
use hscode_server::StatusUpdateResponse;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::{info, warn};

/// Extracts candidate codes from a list file.
///
/// Lines are trimmed; blank lines and `#` comments are ignored. Everything
/// else is submitted and validated when the list is built.
pub fn parse_codes(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Reads every file and returns their candidate codes in file order.
///
/// Unreadable files are reported and skipped.
fn load_files(files: &[PathBuf]) -> Vec<String> {
    let mut codes = Vec::new();
    for file in files {
        match fs::read_to_string(file) {
            Ok(content) => {
                let parsed = parse_codes(&content);
                info!(file = %file.display(), lines = parsed.len(), "loaded list file");
                codes.extend(parsed);
            }
            Err(e) => warn!(file = %file.display(), error = %e, "skipping unreadable file"),
        }
    }
    codes
}

/// Builds the replacement list from the given files.
fn build_list(
    kind: StatusKind,
    files: &[PathBuf],
    now: OffsetDateTime,
) -> Result<(StatusList, ListUpdateOutcome), String> {
    let (list, outcome) = StatusList::replace(load_files(files), now);
    if outcome.accepted < outcome.submitted {
        warn!(
            accepted = outcome.accepted,
            submitted = outcome.submitted,
            "some lines were not valid four-digit codes or were duplicates"
        );
    }
    if list.is_empty() {
        return Err(format!("no valid codes found; refusing to clear the {kind} list"));
    }
    Ok((list, outcome))
}

/// Runs the update-list command.
pub fn run(
    path: &Path,
    kind: StatusKind,
    files: &[PathBuf],
    format: OutputFormat,
) -> CommandResult {
    let now = OffsetDateTime::now_utc();
    let (list, outcome) = build_list(kind, files, now)?;

    let store = open_store(path)?;
    repository::save_status_list(&store, kind, &list)?;

    match format {
        OutputFormat::Json => print_json(&StatusUpdateResponse {
            kind,
            accepted: outcome.accepted,
            submitted: outcome.submitted,
            last_updated: now,
        })?,
        OutputFormat::Text => {
            println!("✓ {kind} list replaced");
            println!(
                "  Codes: {} accepted of {} submitted",
                outcome.accepted, outcome.submitted
            );
        }
    }
    Ok(())
}
