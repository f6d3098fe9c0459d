//! Pipeline outcome types.

use serde::{Deserialize, Serialize};

use crate::descriptor::SubjectList;
use crate::error::PipelineError;

/// One step of the reconciliation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Fetch,
    Parse,
    Transform,
    Validate,
    Sync,
}

impl Stage {
    /// Condition reason for a failure in this stage.
    ///
    /// These strings are part of the external status contract; observers
    /// alert on them.
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Fetch => "Fetching",
            Self::Parse => "Parsing",
            Self::Transform => "Transforming",
            Self::Validate => "Validate",
            Self::Sync => "Syncing",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch => f.write_str("fetch"),
            Self::Parse => f.write_str("parse"),
            Self::Transform => f.write_str("transform"),
            Self::Validate => f.write_str("validate"),
            Self::Sync => f.write_str("sync"),
        }
    }
}

/// Uniform result of one pipeline run.
///
/// Stage errors never escape the orchestrator; they are folded into a
/// `Failure` tagged with the stage that produced them.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// The full pipeline ran; carries the final validated subject list.
    Success(SubjectList),
    /// A stage failed and short-circuited the run.
    Failure {
        stage: Stage,
        cause: PipelineError,
    },
}

impl PipelineOutcome {
    /// Build a failure outcome from any stage error.
    pub fn failure(stage: Stage, cause: impl Into<PipelineError>) -> Self {
        Self::Failure {
            stage,
            cause: cause.into(),
        }
    }

    /// Check whether the run succeeded.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;

    #[test]
    fn test_stage_reasons() {
        assert_eq!(Stage::Fetch.reason(), "Fetching");
        assert_eq!(Stage::Parse.reason(), "Parsing");
        assert_eq!(Stage::Transform.reason(), "Transforming");
        assert_eq!(Stage::Validate.reason(), "Validate");
        assert_eq!(Stage::Sync.reason(), "Syncing");
    }

    #[test]
    fn test_failure_wraps_stage_error() {
        let outcome = PipelineOutcome::failure(
            Stage::Fetch,
            FetchError::unexpected_status("https://example.com", 500),
        );
        assert!(!outcome.is_success());
        match outcome {
            PipelineOutcome::Failure { stage, cause } => {
                assert_eq!(stage, Stage::Fetch);
                assert!(cause.to_string().contains("500"));
            }
            PipelineOutcome::Success(_) => unreachable!("constructed a failure"),
        }
    }
}
