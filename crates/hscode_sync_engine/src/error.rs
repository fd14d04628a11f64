//! Error types for the sync engine.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A page request failed.
    #[error("failed to fetch page {page}: {message}")]
    Fetch {
        /// Page number, starting at 1.
        page: u32,
        /// Error message.
        message: String,
    },

    /// A page body was not a valid nomenclature tree.
    #[error("failed to decode page {page}: {message}")]
    Decode {
        /// Page number, starting at 1.
        page: u32,
        /// Error message.
        message: String,
    },

    /// Every page failed; nothing was written.
    #[error("upstream unavailable: 0 of {pages} pages fetched")]
    UpstreamUnavailable {
        /// Pages attempted.
        pages: u32,
    },

    /// Pages were fetched but contained no codes.
    #[error("upstream returned no codes")]
    EmptyDataset,

    /// Reading or writing the store failed.
    #[error("storage error: {0}")]
    Storage(#[from] hscode_core::CoreError),

    /// The HTTP client could not be built.
    #[error("http client error: {0}")]
    Client(String),

    /// A run was started while another was in progress.
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition {
        /// Current state.
        from: String,
        /// Attempted target state.
        to: String,
    },
}

impl SyncError {
    /// Returns true if a later run may succeed without intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::Fetch { .. } | SyncError::UpstreamUnavailable { .. }
        )
    }

    /// Returns true if the failure came from the upstream provider.
    pub fn is_upstream_failure(&self) -> bool {
        matches!(
            self,
            SyncError::Fetch { .. }
                | SyncError::Decode { .. }
                | SyncError::UpstreamUnavailable { .. }
                | SyncError::EmptyDataset
        )
    }
}
