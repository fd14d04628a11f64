//! # HS Code Server
//!
//! Transport-agnostic request handlers for the HS code verifier.
//!
//! This crate provides:
//! - Code verification against the cached table and the status lists
//! - Table and status-list statistics
//! - Authenticated status-list replacement
//! - Authenticated manual sync and an optional sync schedule
//!
//! # Authentication
//!
//! Two bearer tokens guard the write endpoints: the admin token for
//! status-list updates and the sync token for manual sync. An endpoint
//! whose token is not configured rejects every request.
//!
//! ```rust,ignore
//! let config = ServerConfig::from_env()?;
//! let service = HsCodeService::new(config, SyncConfig::default(), store, upstream);
//!
//! service.handle_status_update(
//!     Some("Bearer <admin token>"),
//!     StatusUpdateRequest { codes, kind: StatusKind::Sanctioned },
//! )?;
//! ```
//!
//! # Consistency
//!
//! Reads go through a time-bounded cache and may lag a sync by up to one
//! TTL, except on this service, where a successful sync invalidates the
//! cache. At most one sync runs at a time.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod auth;
mod config;
mod error;
mod handler;
mod messages;
mod server;

pub use auth::TokenValidator;
pub use config::{
    ServerConfig, ADMIN_TOKEN_VAR, CACHE_TTL_VAR, SYNC_INTERVAL_VAR, SYNC_TOKEN_VAR,
};
pub use error::{ServerError, ServerResult};
pub use handler::{HandlerContext, RequestHandler, SharedStore, SharedUpstream};
pub use messages::{
    HealthResponse, StatsResponse, StatusListView, StatusListsResponse, StatusUpdateRequest,
    StatusUpdateResponse, SyncStatusResponse, SyncTriggerResponse, VerifyRequest, VerifyResponse,
};
pub use server::HsCodeService;
