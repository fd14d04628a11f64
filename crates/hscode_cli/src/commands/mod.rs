//! CLI command implementations.

pub mod lists;
pub mod resolve;
pub mod rollback;
pub mod status;
pub mod sync;
pub mod update_list;

use hscode_storage::FileStore;
use serde::Serialize;
use std::path::Path;
use time::format_description::well_known::Rfc3339;

/// Result type of every command.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// How command output is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Opens the store, creating its directory if needed.
pub fn open_store(path: &Path) -> Result<FileStore, Box<dyn std::error::Error>> {
    FileStore::open(path)
        .map_err(|e| format!("cannot open store at {}: {e}", path.display()).into())
}

/// Prints a value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Formats an optional timestamp for text output.
pub fn format_time(at: Option<time::OffsetDateTime>) -> String {
    at.and_then(|at| at.format(&Rfc3339).ok())
        .unwrap_or_else(|| "never".to_string())
}
