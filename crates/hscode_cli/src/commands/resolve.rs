//! Resolve command implementation.

use super::{open_store, print_json, CommandResult, OutputFormat};
use hscode_core::{repository, resolve, MatchKind, MatchResult, StatusRegistry};
use hscode_server::VerifyResponse;
use std::path::Path;
use tracing::warn;

/// Runs the resolve command.
pub fn run(path: &Path, code: &str, format: OutputFormat) -> CommandResult {
    let store = open_store(path)?;
    let table = repository::load_table(&store)
        .unwrap_or_else(|e| {
            warn!(error = %e, "failed to read table, resolving against an empty one");
            None
        })
        .unwrap_or_default();
    let registry = StatusRegistry::load(&store);

    let result = resolve(code, &table, &registry)?;
    match format {
        OutputFormat::Json => print_json(&VerifyResponse::from(&result))?,
        OutputFormat::Text => print!("{}", render(&result)),
    }
    Ok(())
}

fn render(result: &MatchResult) -> String {
    let mut out = String::new();
    let verdict = if result.is_valid() { "✓" } else { "✗" };
    out.push_str(&format!("{verdict} {}\n", result.code));
    if let Some(original) = result.original_code() {
        out.push_str(&format!("  Query:       {original}\n"));
    }
    match &result.kind {
        MatchKind::NotFound => out.push_str("  Not found in the table\n"),
        MatchKind::ExactFinal => {}
        MatchKind::General {
            exact_match,
            subcode_count,
            preview,
        } => {
            let origin = if *exact_match { "table code" } else { "heading" };
            out.push_str(&format!(
                "  General code ({origin}) with {subcode_count} subcodes\n"
            ));
            for code in preview {
                out.push_str(&format!("    - {code}\n"));
            }
            if *subcode_count > preview.len() {
                out.push_str(&format!(
                    "    ... and {} more\n",
                    subcode_count - preview.len()
                ));
            }
        }
        MatchKind::SingleSubcode => out.push_str("  Completed from its only subcode\n"),
        MatchKind::PrefixExtension { matched_prefix } => {
            out.push_str(&format!("  Extends table code {matched_prefix}\n"))
        }
    }
    if let Some(description) = &result.description {
        out.push_str(&format!("  Description: {description}\n"));
    }
    if let Some(message) = result.overlay.message() {
        out.push_str(&format!("  ⚠ {message}\n"));
    }
    out
}
