//! Error types for the service.

use hscode_core::{CoreError, QueryError};
use hscode_sync_engine::SyncError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while handling a request.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Invalid request format.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Missing or malformed credentials.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Credentials were presented but rejected.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// A sync run is already in progress.
    #[error("a sync is already running")]
    Busy,

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] CoreError),

    /// Sync run failed.
    #[error("sync failed: {0}")]
    Sync(#[from] SyncError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<QueryError> for ServerError {
    fn from(err: QueryError) -> Self {
        ServerError::InvalidRequest(err.to_string())
    }
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServerError::InvalidRequest(_)
                | ServerError::AuthenticationFailed(_)
                | ServerError::NotAuthorized(_)
                | ServerError::Busy
        )
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// HTTP status code a transport should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::InvalidRequest(_) => 400,
            ServerError::AuthenticationFailed(_) => 401,
            ServerError::NotAuthorized(_) => 403,
            ServerError::Busy => 409,
            ServerError::Sync(e) if e.is_upstream_failure() => 502,
            ServerError::Storage(_)
            | ServerError::Sync(_)
            | ServerError::Config(_)
            | ServerError::Internal(_) => 500,
        }
    }
}
