//! Reconciliation orchestrator for groupsync.
//!
//! This crate turns the pipeline stages from `groupsync-pipeline` into a
//! convergence controller:
//!
//! - **Reconciler**: sequences Fetch → Parse → Transform → Validate → Sync
//!   for one descriptor key and folds any stage error into a uniform
//!   outcome
//! - **Status Reporter**: writes the outcome back as the `Ready` condition
//!   through the object store's compare-and-swap
//! - **Reconciliation Loop**: single-worker queue that delivers keys,
//!   honors requeue delays, and periodically resyncs every known key
//! - **Collaborator traits**: [`ObjectStore`] and [`MembershipSync`], with
//!   in-memory implementations for tests and single-process deployments
//!
//! # Key Concepts
//!
//! ## Failure routing
//!
//! Pipeline failures are not errors at the scheduler boundary: they land in
//! the persisted `Ready` condition plus a fixed-delay requeue request. The
//! only error a run can return is a failed descriptor read or status write,
//! because those would otherwise be invisible.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use groupsync_controller::{
//!     InMemoryObjectStore, LogMembershipSync, LoopConfig, ReconcilerBuilder,
//!     ReconciliationLoop,
//! };
//! use groupsync_pipeline::HttpFetcher;
//!
//! let store = Arc::new(InMemoryObjectStore::new());
//! let reconciler = ReconcilerBuilder::new()
//!     .with_fetcher(Arc::new(HttpFetcher::new()?))
//!     .with_store(store)
//!     .with_membership(Arc::new(LogMembershipSync::new()))
//!     .build()?;
//!
//! let (runner, handle) = ReconciliationLoop::new(Arc::new(reconciler), LoopConfig::default());
//! tokio::spawn(runner.run());
//! handle.enqueue("team-a").await?;
//! ```

pub mod error;
pub mod r#loop;
pub mod reconciler;
pub mod status;
pub mod store;
pub mod sync;

// Re-export main types
pub use error::{Error, Result, StoreError};
pub use r#loop::{LoopConfig, LoopHandle, ReconciliationLoop};
pub use reconciler::{Reconciler, ReconcilerBuilder, ReconcilerConfig, RunOutcome};
pub use status::StatusReporter;
pub use store::{InMemoryObjectStore, ObjectStore, StoredSource};
pub use sync::{LogMembershipSync, MembershipSync};
