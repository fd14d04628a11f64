//! Error types for the HS code core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] hscode_storage::StorageError),

    /// A stored document could not be encoded or decoded.
    #[error("codec error for {key}: {source}")]
    Codec {
        /// Storage key of the document.
        key: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A rollback was requested but no backup exists.
    #[error("no backup table to restore")]
    NoBackup,
}

/// A query that cannot be resolved because of its shape.
///
/// These are reported to the caller as-is and never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The cleaned query has too few or too many digits.
    #[error("HS code must have between {min} and {max} digits, got {len}")]
    InvalidLength {
        /// Number of digits after cleaning.
        len: usize,
        /// Minimum accepted digits.
        min: usize,
        /// Maximum accepted digits.
        max: usize,
    },

    /// The cleaned query still contains non-digit characters.
    #[error("HS code may only contain digits")]
    InvalidChars,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_error_display() {
        let err = QueryError::InvalidLength {
            len: 3,
            min: 4,
            max: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("4"));
        assert!(msg.contains("10"));
        assert!(msg.contains("3"));
    }

    #[test]
    fn storage_error_converts() {
        let err: CoreError = hscode_storage::StorageError::Unavailable("down".into()).into();
        assert!(matches!(err, CoreError::Storage(_)));
        assert!(err.to_string().contains("down"));
    }
}
