//! Single-worker reconciliation loop.
//!
//! The loop is the scheduler collaborator from the controller's point of
//! view: it delivers descriptor keys to the reconciler one at a time,
//! honors requested requeue delays, and periodically re-enqueues every
//! known key. One in-flight run at a time linearizes runs per key, which
//! the status compare-and-swap alone would not guarantee.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, warn};

use crate::error::{Error, Result};
use crate::reconciler::Reconciler;

/// Configuration for the reconciliation loop.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Re-enqueue every known key at this interval. `None` disables resync.
    pub resync_interval: Option<Duration>,
    /// Depth of the work queue.
    pub queue_depth: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            resync_interval: Some(Duration::from_secs(300)),
            queue_depth: 64,
        }
    }
}

/// Handle for feeding and stopping a running loop.
#[derive(Debug, Clone)]
pub struct LoopHandle {
    tx: mpsc::Sender<String>,
    stop_tx: watch::Sender<bool>,
}

impl LoopHandle {
    /// Enqueue a descriptor key for reconciliation.
    pub async fn enqueue(&self, key: impl Into<String>) -> Result<()> {
        self.tx
            .send(key.into())
            .await
            .map_err(|_| Error::LoopStopped)
    }

    /// Ask the loop to stop after the in-flight run.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }
}

/// Single-worker loop driving a [`Reconciler`].
pub struct ReconciliationLoop {
    reconciler: Arc<Reconciler>,
    rx: mpsc::Receiver<String>,
    tx: mpsc::Sender<String>,
    stop_rx: watch::Receiver<bool>,
    config: LoopConfig,
}

impl ReconciliationLoop {
    /// Create a loop and its handle.
    pub fn new(reconciler: Arc<Reconciler>, config: LoopConfig) -> (Self, LoopHandle) {
        let (tx, rx) = mpsc::channel(config.queue_depth.max(1));
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = LoopHandle {
            tx: tx.clone(),
            stop_tx,
        };
        let runner = Self {
            reconciler,
            rx,
            tx,
            stop_rx,
            config,
        };
        (runner, handle)
    }

    /// Run until stopped. Consumes the loop.
    pub async fn run(mut self) {
        // The ticker exists even when resync is disabled; the select guard
        // keeps it from ever firing in that case.
        let period = self
            .config
            .resync_interval
            .unwrap_or(Duration::from_secs(3600));
        let mut resync = tokio::time::interval(period);
        resync.set_missed_tick_behavior(MissedTickBehavior::Delay);
        resync.tick().await; // consume the immediate first tick

        loop {
            tokio::select! {
                changed = self.stop_rx.changed() => {
                    if changed.is_err() || *self.stop_rx.borrow() {
                        debug!("Reconciliation loop stopping");
                        break;
                    }
                }
                maybe_key = self.rx.recv() => {
                    match maybe_key {
                        Some(key) => self.process(key).await,
                        None => break,
                    }
                }
                _ = resync.tick(), if self.config.resync_interval.is_some() => {
                    self.resync().await;
                }
            }
        }
    }

    /// Run one key and schedule any requested requeue.
    async fn process(&self, key: String) {
        let requeue_after = match self.reconciler.reconcile(&key).await {
            Ok(outcome) => outcome.requeue_after,
            Err(e) => {
                // Status write failed; the condition does not reflect this
                // run, so retry the whole run.
                error!(key = %key, error = %e, "Reconciliation errored");
                Some(self.reconciler.config().retry_delay)
            }
        };

        if let Some(delay) = requeue_after {
            debug!(key = %key, delay_secs = delay.as_secs(), "Requeueing");
            let tx = self.tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if tx.send(key).await.is_err() {
                    debug!("Loop stopped before requeue fired");
                }
            });
        }
    }

    /// Re-enqueue every known key.
    async fn resync(&self) {
        let keys = match self.reconciler.store().list_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Resync could not list sources");
                return;
            }
        };

        debug!(sources = keys.len(), "Periodic resync");
        for key in keys {
            if self.tx.try_send(key).is_err() {
                warn!("Work queue full during resync, dropping key until next resync");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use url::Url;

    use groupsync_core::{ConditionStatus, FetchError, SourceDescriptor, SourceFormat, READY_CONDITION};
    use groupsync_pipeline::Fetcher;

    use crate::reconciler::{ReconcilerBuilder, ReconcilerConfig};
    use crate::store::{InMemoryObjectStore, ObjectStore};
    use crate::sync::LogMembershipSync;

    struct StubFetcher {
        response: std::result::Result<Vec<u8>, FetchError>,
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(
            &self,
            _url: &Url,
            _deadline: Duration,
        ) -> std::result::Result<Vec<u8>, FetchError> {
            self.response.clone()
        }
    }

    fn descriptor() -> SourceDescriptor {
        SourceDescriptor::new(
            Url::parse("https://example.com/users.txt").unwrap(),
            SourceFormat::Plaintext,
            "^[a-z]+$",
        )
    }

    async fn wait_for<F, Fut>(mut probe: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        for _ in 0..100 {
            if probe().await {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_loop_processes_enqueued_key() {
        let store = Arc::new(InMemoryObjectStore::new());
        store.insert("team-a", descriptor()).await;

        let reconciler = ReconcilerBuilder::new()
            .with_fetcher(Arc::new(StubFetcher {
                response: Ok(b"alice\nbob\n".to_vec()),
            }))
            .with_store(store.clone())
            .with_membership(Arc::new(LogMembershipSync::new()))
            .build()
            .unwrap();

        let (runner, handle) = ReconciliationLoop::new(
            Arc::new(reconciler),
            LoopConfig {
                resync_interval: None,
                ..Default::default()
            },
        );
        let join = tokio::spawn(runner.run());

        handle.enqueue("team-a").await.unwrap();

        let converged = wait_for(|| {
            let store = store.clone();
            async move {
                store
                    .get("team-a")
                    .await
                    .unwrap()
                    .and_then(|s| s.conditions.get(READY_CONDITION).cloned())
                    .is_some_and(|c| c.status == ConditionStatus::True)
            }
        })
        .await;
        assert!(converged, "Ready=True never appeared");

        handle.stop();
        join.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failed_run_is_requeued() {
        let store = Arc::new(InMemoryObjectStore::new());
        store.insert("team-a", descriptor()).await;

        let reconciler = ReconcilerBuilder::new()
            .with_fetcher(Arc::new(StubFetcher {
                response: Err(FetchError::unexpected_status(
                    "https://example.com/users.txt",
                    500,
                )),
            }))
            .with_store(store.clone())
            .with_membership(Arc::new(LogMembershipSync::new()))
            .with_config(ReconcilerConfig {
                retry_delay: Duration::from_millis(20),
                ..Default::default()
            })
            .build()
            .unwrap();

        let (runner, handle) = ReconciliationLoop::new(
            Arc::new(reconciler),
            LoopConfig {
                resync_interval: None,
                ..Default::default()
            },
        );
        let join = tokio::spawn(runner.run());

        handle.enqueue("team-a").await.unwrap();

        // Two status writes prove the key came around at least twice.
        let requeued = wait_for(|| {
            let store = store.clone();
            async move { store.get("team-a").await.unwrap().unwrap().version >= 2 }
        })
        .await;
        assert!(requeued, "key was never requeued after failure");

        handle.stop();
        join.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_resync_enqueues_known_keys() {
        let store = Arc::new(InMemoryObjectStore::new());
        store.insert("team-a", descriptor()).await;

        let reconciler = ReconcilerBuilder::new()
            .with_fetcher(Arc::new(StubFetcher {
                response: Ok(b"alice\n".to_vec()),
            }))
            .with_store(store.clone())
            .with_membership(Arc::new(LogMembershipSync::new()))
            .build()
            .unwrap();

        let (runner, handle) = ReconciliationLoop::new(
            Arc::new(reconciler),
            LoopConfig {
                resync_interval: Some(Duration::from_millis(20)),
                ..Default::default()
            },
        );
        let join = tokio::spawn(runner.run());

        // No explicit enqueue: resync alone must drive convergence.
        let converged = wait_for(|| {
            let store = store.clone();
            async move {
                store
                    .get("team-a")
                    .await
                    .unwrap()
                    .unwrap()
                    .conditions
                    .get(READY_CONDITION)
                    .is_some()
            }
        })
        .await;
        assert!(converged, "resync never reconciled the key");

        handle.stop();
        join.await.unwrap();
    }
}
