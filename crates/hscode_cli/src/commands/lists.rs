//! Lists command implementation.

use super::{format_time, open_store, print_json, CommandResult, OutputFormat};
use hscode_core::{StatusKind, StatusRegistry};
use hscode_server::{StatusListView, StatusListsResponse};
use std::path::Path;

/// Runs the lists command.
pub fn run(path: &Path, format: OutputFormat) -> CommandResult {
    let store = open_store(path)?;
    let registry = StatusRegistry::load(&store);

    if format == OutputFormat::Json {
        return print_json(&StatusListsResponse {
            sanctions: StatusListView::from(&registry.sanctioned),
            sanepid: StatusListView::from(&registry.controlled),
        });
    }

    for kind in StatusKind::ALL {
        let list = registry.list(kind);
        println!(
            "{kind} ({} codes, updated {})",
            list.len(),
            format_time(list.last_updated)
        );
        for (index, code) in list.codes.iter().enumerate() {
            println!("  {:>3}. {code}", index + 1);
        }
    }
    Ok(())
}
