//! Pipeline orchestrator.
//!
//! One reconciliation run walks Fetching → Parsing → Transforming →
//! Validating → Syncing → Reporting. Each stage either produces the next
//! stage's input or a stage-tagged error that short-circuits straight to
//! reporting; no stage is retried inside a run. Retry is expressed solely
//! as a requeue delay handed back to the work loop.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use groupsync_core::{ParseError, PipelineOutcome, SourceDescriptor, Stage, SubjectList};
use groupsync_pipeline::{transform, validate, Fetcher, ParserRegistry};

use crate::error::{Error, Result};
use crate::status::StatusReporter;
use crate::store::ObjectStore;
use crate::sync::MembershipSync;

/// Configuration for the reconciler.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Deadline for the remote fetch, per run.
    pub fetch_deadline: Duration,
    /// Requeue delay requested after any pipeline failure.
    ///
    /// Fixed, not exponential: upstream blips are expected to clear on
    /// their own and the delay is long enough not to hammer the source.
    pub retry_delay: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            fetch_deadline: Duration::from_secs(30),
            retry_delay: Duration::from_secs(60),
        }
    }
}

/// What a finished run asks of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Re-invoke this key after the delay; `None` defers to periodic resync.
    pub requeue_after: Option<Duration>,
}

impl RunOutcome {
    /// No explicit requeue.
    pub const fn done() -> Self {
        Self {
            requeue_after: None,
        }
    }

    /// Requeue after a delay.
    pub const fn retry_after(delay: Duration) -> Self {
        Self {
            requeue_after: Some(delay),
        }
    }
}

/// Sequences the pipeline stages for one descriptor key.
pub struct Reconciler {
    fetcher: Arc<dyn Fetcher>,
    parsers: ParserRegistry,
    store: Arc<dyn ObjectStore>,
    membership: Arc<dyn MembershipSync>,
    reporter: StatusReporter,
    config: ReconcilerConfig,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Create a reconciler over the given collaborators.
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        parsers: ParserRegistry,
        store: Arc<dyn ObjectStore>,
        membership: Arc<dyn MembershipSync>,
        config: ReconcilerConfig,
    ) -> Self {
        let reporter = StatusReporter::new(store.clone());
        Self {
            fetcher,
            parsers,
            store,
            membership,
            reporter,
            config,
        }
    }

    /// Get the configuration.
    pub const fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Get the object store.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Run one full reconciliation for `key`.
    ///
    /// Pipeline failures are reported through the `Ready` condition plus a
    /// retry request; only descriptor-read and status-write failures return
    /// `Err`, since those would otherwise be invisible.
    pub async fn reconcile(&self, key: &str) -> Result<RunOutcome> {
        debug!(key, "Syncing source");

        let Some(stored) = self.store.get(key).await? else {
            // Deleted after being enqueued; nothing to converge or report.
            info!(key, "Source not found, ignoring");
            return Ok(RunOutcome::done());
        };

        let outcome = self.run_pipeline(key, &stored.descriptor).await;

        match &outcome {
            PipelineOutcome::Success(subjects) => {
                info!(key, subjects = subjects.len(), "Reconciliation succeeded");
            }
            PipelineOutcome::Failure { stage, cause } => {
                warn!(key, stage = %stage, error = %cause, "Pipeline failed");
            }
        }

        self.reporter
            .report(key, stored.version, &stored.conditions, &outcome)
            .await?;

        if outcome.is_success() {
            Ok(RunOutcome::done())
        } else {
            Ok(RunOutcome::retry_after(self.config.retry_delay))
        }
    }

    /// Walk the stages, converting the first stage error into a `Failure`.
    async fn run_pipeline(&self, key: &str, descriptor: &SourceDescriptor) -> PipelineOutcome {
        // Pre-flight: configuration errors fail before any network call.
        if !self.parsers.supports(descriptor.format) {
            return PipelineOutcome::failure(
                Stage::Parse,
                ParseError::unsupported_format(descriptor.format.as_str()),
            );
        }
        if let Err(e) = transform::preflight(&descriptor.transformers) {
            return PipelineOutcome::failure(Stage::Transform, e);
        }

        let body = match self
            .fetcher
            .fetch(&descriptor.source_url, self.config.fetch_deadline)
            .await
        {
            Ok(body) => body,
            Err(e) => return PipelineOutcome::failure(Stage::Fetch, e),
        };

        let parsed: SubjectList = match self.parsers.parse(descriptor.format, &body) {
            Ok(subjects) => subjects,
            Err(e) => return PipelineOutcome::failure(Stage::Parse, e),
        };
        debug!(key, subjects = parsed.len(), "Parsed subjects");

        let transformed = match transform::apply(&parsed, &descriptor.transformers) {
            Ok(subjects) => subjects,
            Err(e) => return PipelineOutcome::failure(Stage::Transform, e),
        };

        if let Err(e) = validate(&transformed, &descriptor.validation_regex) {
            return PipelineOutcome::failure(Stage::Validate, e);
        }

        if let Err(e) = self.membership.sync_membership(key, &transformed).await {
            return PipelineOutcome::failure(Stage::Sync, e);
        }

        PipelineOutcome::Success(transformed)
    }
}

/// Builder for [`Reconciler`].
pub struct ReconcilerBuilder {
    fetcher: Option<Arc<dyn Fetcher>>,
    parsers: ParserRegistry,
    store: Option<Arc<dyn ObjectStore>>,
    membership: Option<Arc<dyn MembershipSync>>,
    config: ReconcilerConfig,
}

impl ReconcilerBuilder {
    /// Create a new builder with the built-in parser registry.
    pub fn new() -> Self {
        Self {
            fetcher: None,
            parsers: ParserRegistry::default(),
            store: None,
            membership: None,
            config: ReconcilerConfig::default(),
        }
    }

    /// Set the fetcher.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Replace the parser registry.
    #[must_use]
    pub fn with_parsers(mut self, parsers: ParserRegistry) -> Self {
        self.parsers = parsers;
        self
    }

    /// Set the object store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the membership backend.
    #[must_use]
    pub fn with_membership(mut self, membership: Arc<dyn MembershipSync>) -> Self {
        self.membership = Some(membership);
        self
    }

    /// Set the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the reconciler.
    pub fn build(self) -> Result<Reconciler> {
        let fetcher = self
            .fetcher
            .ok_or_else(|| Error::invalid_config("fetcher is required"))?;
        let store = self
            .store
            .ok_or_else(|| Error::invalid_config("object store is required"))?;
        let membership = self
            .membership
            .ok_or_else(|| Error::invalid_config("membership backend is required"))?;

        if self.config.fetch_deadline.is_zero() {
            return Err(Error::invalid_config("fetch deadline must be non-zero"));
        }

        Ok(Reconciler::new(
            fetcher,
            self.parsers,
            store,
            membership,
            self.config,
        ))
    }
}

impl Default for ReconcilerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
