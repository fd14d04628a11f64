//! HS Code CLI
//!
//! Command-line tools for the HS code verifier.
//!
//! # Commands
//!
//! - `resolve` - Resolve a code against the stored table
//! - `sync` - Synchronize the table with the upstream nomenclature
//! - `status` - Display table and sync metadata
//! - `lists` - Display the restriction lists
//! - `update-list` - Replace a restriction list from files
//! - `rollback` - Restore the table saved by the last sync

mod commands;

use clap::{Parser, Subcommand};
use commands::OutputFormat;
use hscode_core::StatusKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// HS code verifier tools.
#[derive(Parser)]
#[command(name = "hscode")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long, env = "HSCODE_STORE")]
    store: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Output format
    #[arg(global = true, short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a code against the stored table
    Resolve {
        /// Code as entered, separators allowed (e.g. "0101 21")
        code: String,
    },

    /// Synchronize the table with the upstream nomenclature
    Sync {
        /// Number of pages to fetch
        #[arg(long)]
        pages: Option<u32>,

        /// Delay between pages in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Upstream endpoint
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Display table and sync metadata
    Status,

    /// Display the restriction lists
    Lists,

    /// Replace a restriction list with the codes found in files
    UpdateList {
        /// List to replace (sanctions, sanepid)
        kind: StatusKind,

        /// Files with one 4-digit code per line; `#` starts a comment line
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Restore the table saved by the last sync
    Rollback,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store = || {
        cli.store
            .as_deref()
            .ok_or("store directory required (--store or HSCODE_STORE)")
    };

    match &cli.command {
        Commands::Resolve { code } => {
            commands::resolve::run(store()?, code, cli.format)?;
        }
        Commands::Sync {
            pages,
            delay_ms,
            base_url,
        } => {
            let options = commands::sync::SyncOptions {
                pages: *pages,
                delay_ms: *delay_ms,
                base_url: base_url.clone(),
            };
            commands::sync::run(store()?, options, cli.format)?;
        }
        Commands::Status => {
            commands::status::run(store()?, cli.format)?;
        }
        Commands::Lists => {
            commands::lists::run(store()?, cli.format)?;
        }
        Commands::UpdateList { kind, files } => {
            commands::update_list::run(store()?, *kind, files, cli.format)?;
        }
        Commands::Rollback => {
            commands::rollback::run(store()?, cli.format)?;
        }
        Commands::Version => {
            println!("HS Code CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("HS Code Core v{}", hscode_core::VERSION);
        }
    }

    Ok(())
}
