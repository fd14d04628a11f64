//! # HS Code Sync Engine
//!
//! Delta synchronization of the code table against the upstream
//! nomenclature.
//!
//! This crate provides:
//! - The [`UpstreamSource`] abstraction and an HTTP implementation
//! - Flattening of the nomenclature tree into code records
//! - Diffing of two code tables
//! - The sync state machine (idle → fetching → diffing → persisting)
//!
//! ## Run protocol
//!
//! 1. Read the stored table (absent means first sync)
//! 2. Fetch every page sequentially, skipping failed pages
//! 3. Fail without writing anything if no page could be fetched
//! 4. Diff the fetched table against the stored one
//! 5. On changes: back up the old table, write the new one, write metadata
//! 6. Without changes: refresh metadata only
//!
//! ## Key Invariants
//!
//! - The table slot is only ever replaced wholesale
//! - The backup is written before the table is overwritten
//! - A failed run leaves the stored table untouched
//! - At most one run is active per engine

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod diff;
mod error;
mod flatten;
mod http;
mod state;
mod upstream;

pub use config::{SyncConfig, DEFAULT_BASE_URL, DEFAULT_TOTAL_PAGES, DEFAULT_USER_AGENT};
pub use diff::diff;
pub use error::{SyncError, SyncResult};
pub use flatten::flatten;
pub use http::{HttpClient, HttpUpstream, ReqwestClient};
pub use state::{PageOutcome, SyncEngine, SyncReport, SyncState, SyncStats};
pub use upstream::{MockUpstream, TreeNode, UpstreamSource};
