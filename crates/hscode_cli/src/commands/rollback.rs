//! Rollback command implementation.

use super::{open_store, print_json, CommandResult, OutputFormat};
use hscode_core::{repository, CoreError};
use serde_json::json;
use std::path::Path;
use time::OffsetDateTime;

/// Runs the rollback command.
pub fn run(path: &Path, format: OutputFormat) -> CommandResult {
    let store = open_store(path)?;
    let now = OffsetDateTime::now_utc();
    let restored = match repository::restore_backup(&store, hscode_core::VERSION, now) {
        Ok(restored) => restored,
        Err(CoreError::NoBackup) => {
            return Err("no backup table to restore; run a sync first".into())
        }
        Err(e) => return Err(e.into()),
    };

    match format {
        OutputFormat::Json => print_json(&json!({ "restored": restored }))?,
        OutputFormat::Text => println!("✓ Restored {restored} codes from the backup table"),
    }
    Ok(())
}
