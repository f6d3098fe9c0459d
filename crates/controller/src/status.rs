//! Status reporting.
//!
//! Maps a [`PipelineOutcome`] to an upsert of the `Ready` condition and
//! commits it through the object store's compare-and-swap. The update is
//! attempted exactly once per run; a failed write is surfaced to the
//! scheduler because a swallowed report would make the failure invisible.

use std::sync::Arc;

use tracing::debug;

use groupsync_core::{
    Condition, ConditionStatus, Conditions, PipelineOutcome, READY_CONDITION,
};

use crate::error::{Error, Result};
use crate::store::ObjectStore;

/// Writes pipeline outcomes back as status conditions.
pub struct StatusReporter {
    store: Arc<dyn ObjectStore>,
}

impl StatusReporter {
    /// Create a reporter over the given store.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Build the `Ready` condition for an outcome.
    pub fn condition_for(outcome: &PipelineOutcome) -> Condition {
        match outcome {
            PipelineOutcome::Success(subjects) => Condition::new(
                READY_CONDITION,
                ConditionStatus::True,
                "Synced",
                format!("{} subjects synced", subjects.len()),
            ),
            PipelineOutcome::Failure { stage, cause } => Condition::new(
                READY_CONDITION,
                ConditionStatus::False,
                stage.reason(),
                cause.to_string(),
            ),
        }
    }

    /// Commit the outcome's condition against the status read at the start
    /// of the run.
    ///
    /// `observed` is cloned and upserted copy-on-write; the CAS on
    /// `observed_version` rejects the write if another run got there first.
    pub async fn report(
        &self,
        key: &str,
        observed_version: u64,
        observed: &Conditions,
        outcome: &PipelineOutcome,
    ) -> Result<u64> {
        let condition = Self::condition_for(outcome);
        debug!(
            key,
            status = %condition.status,
            reason = %condition.reason,
            "Reporting run outcome"
        );

        let mut conditions = observed.clone();
        conditions.set(condition);

        self.store
            .update_status(key, observed_version, conditions)
            .await
            .map_err(|e| Error::report(key, e))
    }
}
