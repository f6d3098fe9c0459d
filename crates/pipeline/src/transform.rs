//! Ordered transformer chain.
//!
//! Every transformer kind maps to a pure stage function through
//! [`stage_for`]; the chain folds the descriptor's specs in order, each
//! stage consuming the previous stage's output and producing a fresh list.
//! The first failing stage aborts the chain, so callers only ever see the
//! pre-chain input or the fully transformed output, never a half-applied
//! list.

use regex::Regex;
use tracing::debug;

use groupsync_core::{SubjectList, TransformError, TransformerKind, TransformerSpec};

/// A pure transformer stage: `(subjects, value) -> subjects`.
type StageFn = fn(&[String], &str) -> Result<SubjectList, TransformError>;

/// Kind → stage-function table.
///
/// Kinds declared in the schema without a defined algorithm are rejected
/// here instead of silently no-oping.
fn stage_for(kind: TransformerKind) -> Result<StageFn, TransformError> {
    match kind {
        TransformerKind::Prefix => Ok(prefix),
        TransformerKind::Suffix => Ok(suffix),
        TransformerKind::RegexKeep => Ok(regex_keep),
        TransformerKind::RegexRemove => Ok(regex_remove),
        TransformerKind::RegexReplace
        | TransformerKind::CamelCase
        | TransformerKind::JsonPathExtract => Err(TransformError::unimplemented(kind)),
    }
}

/// Reject descriptors referencing unimplemented transformer kinds.
///
/// Called by the orchestrator before the fetch so a bad chain never wastes
/// a network call.
pub fn preflight(specs: &[TransformerSpec]) -> Result<(), TransformError> {
    for spec in specs {
        stage_for(spec.kind)?;
    }
    Ok(())
}

/// Apply the transformer chain in declared order.
///
/// The caller's list is never mutated; each stage returns a new list.
pub fn apply(subjects: &[String], specs: &[TransformerSpec]) -> Result<SubjectList, TransformError> {
    let mut current: SubjectList = subjects.to_vec();

    for spec in specs {
        let stage = stage_for(spec.kind)?;
        let before = current.len();
        current = stage(&current, &spec.value)?;
        debug!(
            kind = %spec.kind,
            before,
            after = current.len(),
            "Applied transformer"
        );
    }

    Ok(current)
}

fn prefix(subjects: &[String], value: &str) -> Result<SubjectList, TransformError> {
    Ok(subjects.iter().map(|s| format!("{value}{s}")).collect())
}

fn suffix(subjects: &[String], value: &str) -> Result<SubjectList, TransformError> {
    Ok(subjects.iter().map(|s| format!("{s}{value}")).collect())
}

fn regex_keep(subjects: &[String], value: &str) -> Result<SubjectList, TransformError> {
    let re = compile(TransformerKind::RegexKeep, value)?;
    Ok(subjects
        .iter()
        .filter(|s| re.is_match(s))
        .cloned()
        .collect())
}

fn regex_remove(subjects: &[String], value: &str) -> Result<SubjectList, TransformError> {
    let re = compile(TransformerKind::RegexRemove, value)?;
    Ok(subjects
        .iter()
        .filter(|s| !re.is_match(s))
        .cloned()
        .collect())
}

fn compile(kind: TransformerKind, pattern: &str) -> Result<Regex, TransformError> {
    if pattern.is_empty() {
        return Err(TransformError::empty_pattern(kind));
    }
    Regex::new(pattern).map_err(|e| TransformError::bad_pattern(kind, pattern, e.to_string()))
}
