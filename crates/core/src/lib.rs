//! Shared data model for the groupsync controller.
//!
//! This crate holds everything both the pipeline and the controller need to
//! agree on:
//!
//! - **Descriptor**: the declarative source configuration (`SourceDescriptor`,
//!   `TransformerSpec`) as persisted in the object store
//! - **Conditions**: the typed, timestamped status facts written back after
//!   each reconciliation (`Condition`, `Conditions`)
//! - **Outcome**: the uniform result of a pipeline run (`PipelineOutcome`,
//!   `Stage`)
//! - **Errors**: the per-stage error taxonomy (`FetchError`, `ParseError`,
//!   `TransformError`, `ValidateError`, `SyncError`)
//!
//! # Key Concepts
//!
//! ## Stages
//!
//! A reconciliation run walks Fetch → Parse → Transform → Validate → Sync.
//! Each stage has its own error type; the orchestrator folds any of them into
//! a `PipelineOutcome::Failure` tagged with the failing [`Stage`] so status
//! reporting never has to inspect error internals.
//!
//! ## Conditions
//!
//! Status is a set of conditions keyed by type, at most one record per type.
//! `last_transition_time` only moves when the boolean status actually flips,
//! so observers can tell "still failing" apart from "failing again".

pub mod condition;
pub mod descriptor;
pub mod error;
pub mod outcome;

// Re-export main types
pub use condition::{Condition, ConditionStatus, Conditions, READY_CONDITION};
pub use descriptor::{SourceDescriptor, SourceFormat, SubjectList, TransformerKind, TransformerSpec};
pub use error::{FetchError, ParseError, PipelineError, SyncError, TransformError, ValidateError};
pub use outcome::{PipelineOutcome, Stage};
