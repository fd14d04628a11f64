//! Status command implementation.

use super::{format_time, open_store, print_json, CommandResult, OutputFormat};
use hscode_core::{repository, StatusRegistry};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    total_records: usize,
    has_backup: bool,
    metadata: Option<hscode_core::SyncMetadata>,
    sanctioned_count: usize,
    sanepid_count: usize,
}

/// Runs the status command.
pub fn run(path: &Path, format: OutputFormat) -> CommandResult {
    let store = open_store(path)?;
    let table = repository::load_table(&store)?.unwrap_or_default();
    let has_backup = repository::load_backup(&store)?.is_some();
    let metadata = repository::load_metadata(&store)?;
    let registry = StatusRegistry::load(&store);

    let report = StatusReport {
        total_records: table.len(),
        has_backup,
        metadata,
        sanctioned_count: registry.sanctioned.len(),
        sanepid_count: registry.controlled.len(),
    };

    if format == OutputFormat::Json {
        return print_json(&report);
    }

    println!("Store: {}", path.display());
    println!("  Records:    {}", report.total_records);
    println!("  Backup:     {}", if report.has_backup { "yes" } else { "no" });
    println!("  Sanctions:  {}", report.sanctioned_count);
    println!("  SANEPID:    {}", report.sanepid_count);
    match &report.metadata {
        Some(metadata) => {
            println!("  Last sync:  {}", format_time(Some(metadata.last_sync)));
            println!("  Sync type:  {}", metadata.sync_type);
            println!("  Version:    {}", metadata.version);
            println!(
                "  Changes:    +{} ~{} -{} ={}",
                metadata.changes.added,
                metadata.changes.updated,
                metadata.changes.removed,
                metadata.changes.unchanged
            );
            if let Some(error) = &metadata.error {
                println!("  Error:      {error}");
            }
        }
        None => println!("  Last sync:  never"),
    }
    Ok(())
}
