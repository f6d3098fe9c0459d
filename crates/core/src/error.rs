//! Error taxonomy for the reconciliation pipeline.
//!
//! One error enum per stage, plus [`PipelineError`] as the uniform wrapper
//! the orchestrator folds stage errors into. Messages carry enough context
//! (status code, offending element, pattern) to diagnose a failed run from
//! the persisted condition alone, without log access.

use thiserror::Error;

use crate::descriptor::TransformerKind;

/// Errors from the fetch stage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, TLS, broken body).
    #[error("transport error fetching {url}: {reason}")]
    Transport { url: String, reason: String },

    /// The caller-supplied deadline elapsed before the body was read.
    #[error("fetch of {url} timed out after {deadline_ms}ms")]
    Timeout { url: String, deadline_ms: u64 },

    /// The remote answered with a non-200 status code.
    #[error("unexpected status code {code} fetching {url}")]
    UnexpectedStatus { url: String, code: u16 },
}

impl FetchError {
    /// Create a transport error.
    pub fn transport(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(url: impl Into<String>, deadline_ms: u64) -> Self {
        Self::Timeout {
            url: url.into(),
            deadline_ms,
        }
    }

    /// Create an unexpected status error.
    pub fn unexpected_status(url: impl Into<String>, code: u16) -> Self {
        Self::UnexpectedStatus {
            url: url.into(),
            code,
        }
    }
}

/// Errors from the parse stage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No parser is registered for the descriptor's format.
    #[error("unsupported source format '{format}'")]
    UnsupportedFormat { format: String },

    /// The document decoded but does not have the expected shape.
    #[error("schema mismatch: {reason}")]
    Schema { reason: String },

    /// The document could not be decoded at all.
    #[error("malformed document: {reason}")]
    Malformed { reason: String },
}

impl ParseError {
    /// Create an unsupported format error.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Create a schema mismatch error.
    pub fn schema(reason: impl Into<String>) -> Self {
        Self::Schema {
            reason: reason.into(),
        }
    }

    /// Create a malformed document error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}

/// Errors from the transformer chain.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// A pattern-based transformer was configured with an empty pattern.
    #[error("{kind} transformer pattern cannot be empty")]
    EmptyPattern { kind: TransformerKind },

    /// A pattern-based transformer was configured with a non-compiling pattern.
    #[error("{kind} transformer pattern '{pattern}' does not compile: {reason}")]
    BadPattern {
        kind: TransformerKind,
        pattern: String,
        reason: String,
    },

    /// The kind is declared in the schema but has no defined algorithm.
    #[error("transformer kind '{kind}' is not implemented")]
    Unimplemented { kind: TransformerKind },
}

impl TransformError {
    /// Create an empty pattern error.
    pub const fn empty_pattern(kind: TransformerKind) -> Self {
        Self::EmptyPattern { kind }
    }

    /// Create a bad pattern error.
    pub fn bad_pattern(
        kind: TransformerKind,
        pattern: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::BadPattern {
            kind,
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Create an unimplemented kind error.
    pub const fn unimplemented(kind: TransformerKind) -> Self {
        Self::Unimplemented { kind }
    }
}

/// Errors from the validation stage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidateError {
    /// Validation cannot be disabled by omitting the pattern.
    #[error("validation pattern cannot be empty")]
    EmptyPattern,

    /// The validation pattern does not compile.
    #[error("validation pattern '{pattern}' does not compile: {reason}")]
    BadPattern { pattern: String, reason: String },

    /// A subject failed to match the validation pattern.
    #[error("subject '{subject}' does not match validation pattern '{pattern}'")]
    NoMatch { subject: String, pattern: String },
}

impl ValidateError {
    /// Create a bad pattern error.
    pub fn bad_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BadPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Create a no-match error naming the offending subject.
    pub fn no_match(subject: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::NoMatch {
            subject: subject.into(),
            pattern: pattern.into(),
        }
    }
}

/// Errors from the membership sync stage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The membership backend rejected or failed the sync.
    #[error("membership backend failed for group '{group}': {reason}")]
    Backend { group: String, reason: String },
}

impl SyncError {
    /// Create a backend error.
    pub fn backend(group: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Backend {
            group: group.into(),
            reason: reason.into(),
        }
    }
}

/// Uniform wrapper over every stage error.
///
/// The orchestrator converts whichever stage error it hits into this type so
/// a `PipelineOutcome::Failure` can carry the cause without a generic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Validate(#[from] ValidateError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_names_status_code() {
        let err = FetchError::unexpected_status("https://example.com/users.txt", 500);
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("example.com"));
    }

    #[test]
    fn test_validate_error_names_offender() {
        let err = ValidateError::no_match("Bob", "^[a-z]+$");
        assert!(err.to_string().contains("Bob"));
        assert!(err.to_string().contains("^[a-z]+$"));
    }

    #[test]
    fn test_transform_error_names_kind() {
        let err = TransformError::unimplemented(TransformerKind::CamelCase);
        assert!(err.to_string().contains("camelCase"));
    }

    #[test]
    fn test_pipeline_error_is_transparent() {
        let inner = ParseError::schema("expected a JSON array of strings");
        let wrapped = PipelineError::from(inner.clone());
        assert_eq!(wrapped.to_string(), inner.to_string());
    }
}
