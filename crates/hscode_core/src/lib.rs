//! # HS Code Core
//!
//! Resolution engine for hierarchical tariff (HS) codes.
//!
//! This crate provides:
//! - The flat [`CodeTable`] and its hierarchical [`Description`]s
//! - The two restriction lists and the overlay they put on a code
//! - [`resolve`], which classifies a user-entered code against a table
//! - [`TableCache`], a time-bounded cache in front of the durable store
//! - Typed access to the stored documents in [`repository`]
//!
//! ## Example
//!
//! ```rust
//! use hscode_core::{resolve, CodeTable, Description, MatchKind, StatusRegistry};
//!
//! let table: CodeTable = [("010121".to_string(), Description::single("Horses"))]
//!     .into_iter()
//!     .collect();
//!
//! let result = resolve("0101", &table, &StatusRegistry::default()).unwrap();
//! assert_eq!(result.kind, MatchKind::SingleSubcode);
//! assert_eq!(result.code, "0101210000");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used)]

mod cache;
mod config;
mod description;
mod error;
mod metadata;
pub mod repository;
mod resolver;
mod status;
mod table;

pub use cache::{Clock, ManualClock, SystemClock, TableCache};
pub use config::{CacheConfig, DEFAULT_CACHE_TTL};
pub use description::{Description, LEVEL_SEPARATOR};
pub use error::{CoreError, CoreResult, QueryError};
pub use metadata::{SyncMetadata, SyncType};
pub use resolver::{
    normalize, pad_to_full, resolve, MatchKind, MatchResult, FULL_CODE_DIGITS, MAX_CODE_DIGITS,
    MIN_CODE_DIGITS, SUBCODE_PREVIEW_LIMIT,
};
pub use status::{
    is_valid_prefix, ListUpdateOutcome, Restriction, RestrictionOverlay, StatusKind, StatusList,
    StatusRegistry, STATUS_PREFIX_LEN,
};
pub use table::{ChangeSummary, CodeRecord, CodeTable};

/// Version label written into sync metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
