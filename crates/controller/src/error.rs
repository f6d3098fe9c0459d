//! Error types for the controller crate.

use thiserror::Error;

/// Result type alias for controller operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Object store error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No descriptor is stored under the key.
    #[error("source '{key}' not found")]
    NotFound { key: String },

    /// Compare-and-swap failed: someone else updated the status first.
    #[error("conflicting status update for '{key}': expected version {expected}, found {actual}")]
    Conflict {
        key: String,
        expected: u64,
        actual: u64,
    },

    /// Backend failure.
    #[error("store error: {reason}")]
    Internal { reason: String },
}

impl StoreError {
    /// Create a not-found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a conflict error.
    pub fn conflict(key: impl Into<String>, expected: u64, actual: u64) -> Self {
        Self::Conflict {
            key: key.into(),
            expected,
            actual,
        }
    }

    /// Create an internal error.
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }
}

/// Controller error types.
///
/// Pipeline-stage failures never appear here: they are reported through the
/// persisted condition and a requeue request. Only failures that would
/// otherwise be invisible (reading the descriptor, writing the status) cross
/// the scheduler boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Reading the descriptor from the object store failed.
    #[error("failed to read source: {0}")]
    Store(#[from] StoreError),

    /// Writing the status condition failed; the run must be retried.
    #[error("status report for '{key}' failed: {source}")]
    Report {
        key: String,
        #[source]
        source: StoreError,
    },

    /// Invalid controller configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The work queue was closed while enqueueing.
    #[error("controller loop stopped")]
    LoopStopped,
}

impl Error {
    /// Create a report error.
    pub fn report(key: impl Into<String>, source: StoreError) -> Self {
        Self::Report {
            key: key.into(),
            source,
        }
    }

    /// Create an invalid config error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_display() {
        let err = StoreError::conflict("team-a", 3, 5);
        assert!(err.to_string().contains("team-a"));
        assert!(err.to_string().contains('3'));
        assert!(err.to_string().contains('5'));
    }

    #[test]
    fn test_report_wraps_store_error() {
        let err = Error::report("team-a", StoreError::internal("disk on fire"));
        assert!(err.to_string().contains("team-a"));
    }
}
