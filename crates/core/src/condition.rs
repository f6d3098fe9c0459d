//! Status conditions.
//!
//! A condition is a typed, timestamped status fact. The persisted status is
//! a set of conditions keyed by type with at most one record per type;
//! `last_transition_time` only changes when the boolean status flips.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Condition type carrying the overall reconciliation outcome.
///
/// A single `Ready` condition replaces the original overloaded `Failed`
/// boolean: `status=True, reason=Synced` on success,
/// `status=False, reason=<stage>` on failure.
pub const READY_CONDITION: &str = "Ready";

/// Boolean-ish condition status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl std::fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::True => f.write_str("True"),
            Self::False => f.write_str("False"),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

/// A single persisted status fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type (unique key within a [`Conditions`] set).
    #[serde(rename = "type")]
    pub condition_type: String,
    /// Current status of the condition.
    pub status: ConditionStatus,
    /// Machine-readable reason for the current status.
    pub reason: String,
    /// Human-readable message with diagnostic context.
    pub message: String,
    /// When `status` last changed for this type.
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    /// Create a condition stamped with the current time.
    pub fn new(
        condition_type: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            condition_type: condition_type.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: Utc::now(),
        }
    }
}

/// A set of conditions keyed by type.
///
/// The set is a value: callers clone it, upsert, and commit the whole thing
/// back through the object store's compare-and-swap, so a stale writer can
/// never silently drop another writer's conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conditions {
    records: Vec<Condition>,
}

impl Conditions {
    /// Create an empty condition set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a condition, keyed by its type.
    ///
    /// If a record of the same type already exists and its status is
    /// unchanged, the existing `last_transition_time` is kept; reason and
    /// message are still refreshed.
    pub fn set(&mut self, mut condition: Condition) {
        if let Some(existing) = self
            .records
            .iter_mut()
            .find(|c| c.condition_type == condition.condition_type)
        {
            if existing.status == condition.status {
                condition.last_transition_time = existing.last_transition_time;
            }
            *existing = condition;
        } else {
            self.records.push(condition);
        }
    }

    /// Look up a condition by type.
    pub fn get(&self, condition_type: &str) -> Option<&Condition> {
        self.records
            .iter()
            .find(|c| c.condition_type == condition_type)
    }

    /// Number of condition records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the records.
    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn ready(status: ConditionStatus, reason: &str) -> Condition {
        Condition::new(READY_CONDITION, status, reason, "msg")
    }

    #[test]
    fn test_set_inserts_new_type() {
        let mut conditions = Conditions::new();
        conditions.set(ready(ConditionStatus::True, "Synced"));

        assert_eq!(conditions.len(), 1);
        assert_eq!(
            conditions.get(READY_CONDITION).unwrap().status,
            ConditionStatus::True
        );
    }

    #[test]
    fn test_at_most_one_record_per_type() {
        let mut conditions = Conditions::new();
        conditions.set(ready(ConditionStatus::True, "Synced"));
        conditions.set(ready(ConditionStatus::False, "Fetching"));

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions.get(READY_CONDITION).unwrap().reason, "Fetching");
    }

    #[test]
    fn test_transition_time_kept_when_status_unchanged() {
        let mut conditions = Conditions::new();
        conditions.set(ready(ConditionStatus::True, "Synced"));
        let first = conditions.get(READY_CONDITION).unwrap().last_transition_time;

        // Same status, refreshed message: transition time must not move.
        let mut later = ready(ConditionStatus::True, "Synced");
        later.last_transition_time = first + chrono::Duration::seconds(60);
        conditions.set(later);

        assert_eq!(
            conditions.get(READY_CONDITION).unwrap().last_transition_time,
            first
        );
    }

    #[test]
    fn test_transition_time_moves_on_status_flip() {
        let mut conditions = Conditions::new();
        conditions.set(ready(ConditionStatus::True, "Synced"));
        let first = conditions.get(READY_CONDITION).unwrap().last_transition_time;

        let mut flipped = ready(ConditionStatus::False, "Fetching");
        flipped.last_transition_time = first + chrono::Duration::seconds(60);
        conditions.set(flipped);

        assert_eq!(
            conditions.get(READY_CONDITION).unwrap().last_transition_time,
            first + chrono::Duration::seconds(60)
        );
    }

    #[test]
    fn test_independent_types_coexist() {
        let mut conditions = Conditions::new();
        conditions.set(ready(ConditionStatus::True, "Synced"));
        conditions.set(Condition::new(
            "Degraded",
            ConditionStatus::False,
            "Healthy",
            "msg",
        ));

        assert_eq!(conditions.len(), 2);
    }

    #[test]
    fn test_serde_shape() {
        let mut conditions = Conditions::new();
        conditions.set(ready(ConditionStatus::False, "Validate"));

        let json = serde_json::to_value(&conditions).unwrap();
        let record = &json[0];
        assert_eq!(record["type"], "Ready");
        assert_eq!(record["status"], "False");
        assert_eq!(record["reason"], "Validate");
        assert!(record["lastTransitionTime"].is_string());
    }
}
