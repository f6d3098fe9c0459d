//! Match-all validation gate.

use regex::Regex;

use groupsync_core::ValidateError;

/// Validate that every subject matches `pattern`.
///
/// Fail-fast: the first non-matching subject is returned and validation
/// stops (accumulate-all would be a behavior change for observers keying
/// off the condition message). An empty pattern always fails, even for an
/// empty list, so validation can never be disabled by omission. An empty
/// list with a compiling pattern is vacuously valid.
pub fn validate(subjects: &[String], pattern: &str) -> Result<(), ValidateError> {
    if pattern.is_empty() {
        return Err(ValidateError::EmptyPattern);
    }

    let re = Regex::new(pattern).map_err(|e| ValidateError::bad_pattern(pattern, e.to_string()))?;

    match subjects.iter().find(|s| !re.is_match(s)) {
        Some(offender) => Err(ValidateError::no_match(offender, pattern)),
        None => Ok(()),
    }
}
