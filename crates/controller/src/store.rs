//! Object store boundary.
//!
//! The store owns descriptor persistence and the versioned status
//! sub-document. Status writes go through compare-and-swap on a version
//! counter so a run working from a stale read can never overwrite a newer
//! status wholesale.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use groupsync_core::{Conditions, SourceDescriptor};

use crate::error::StoreError;

/// A stored source: descriptor plus its current status snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSource {
    /// The externally owned descriptor; read-only to the controller.
    pub descriptor: SourceDescriptor,
    /// Persisted status conditions.
    pub conditions: Conditions,
    /// Version of the status sub-document, bumped on every write.
    pub version: u64,
}

impl StoredSource {
    /// Wrap a descriptor with empty status at version zero.
    pub fn new(descriptor: SourceDescriptor) -> Self {
        Self {
            descriptor,
            conditions: Conditions::new(),
            version: 0,
        }
    }
}

/// Persistence boundary for descriptors and their status.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read a source by key. `None` means the descriptor was deleted.
    async fn get(&self, key: &str) -> Result<Option<StoredSource>, StoreError>;

    /// Compare-and-swap the status conditions.
    ///
    /// Succeeds only when `expected_version` matches the stored version;
    /// returns the new version. A mismatch is [`StoreError::Conflict`].
    async fn update_status(
        &self,
        key: &str,
        expected_version: u64,
        conditions: Conditions,
    ) -> Result<u64, StoreError>;

    /// List every known descriptor key, for periodic resync.
    async fn list_keys(&self) -> Result<Vec<String>, StoreError>;
}

/// In-memory [`ObjectStore`] for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    sources: RwLock<HashMap<String, StoredSource>>,
}

impl InMemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with descriptors.
    pub fn with_sources(sources: impl IntoIterator<Item = (String, SourceDescriptor)>) -> Self {
        let sources = sources
            .into_iter()
            .map(|(key, descriptor)| (key, StoredSource::new(descriptor)))
            .collect();
        Self {
            sources: RwLock::new(sources),
        }
    }

    /// Insert or replace a descriptor, resetting its status.
    pub async fn insert(&self, key: impl Into<String>, descriptor: SourceDescriptor) {
        self.sources
            .write()
            .await
            .insert(key.into(), StoredSource::new(descriptor));
    }

    /// Delete a descriptor.
    pub async fn remove(&self, key: &str) {
        self.sources.write().await.remove(key);
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get(&self, key: &str) -> Result<Option<StoredSource>, StoreError> {
        Ok(self.sources.read().await.get(key).cloned())
    }

    async fn update_status(
        &self,
        key: &str,
        expected_version: u64,
        conditions: Conditions,
    ) -> Result<u64, StoreError> {
        let mut sources = self.sources.write().await;
        let stored = sources
            .get_mut(key)
            .ok_or_else(|| StoreError::not_found(key))?;

        if stored.version != expected_version {
            return Err(StoreError::conflict(key, expected_version, stored.version));
        }

        stored.conditions = conditions;
        stored.version += 1;
        Ok(stored.version)
    }

    async fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.sources.read().await.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use groupsync_core::{Condition, ConditionStatus, SourceFormat, READY_CONDITION};
    use url::Url;

    fn descriptor() -> SourceDescriptor {
        SourceDescriptor::new(
            Url::parse("https://example.com/users.txt").unwrap(),
            SourceFormat::Plaintext,
            "^[a-z]+$",
        )
    }

    fn ready_conditions() -> Conditions {
        let mut conditions = Conditions::new();
        conditions.set(Condition::new(
            READY_CONDITION,
            ConditionStatus::True,
            "Synced",
            "2 subjects synced",
        ));
        conditions
    }

    #[tokio::test]
    async fn test_get_missing_key_is_none() {
        let store = InMemoryObjectStore::new();
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_status_bumps_version() {
        let store = InMemoryObjectStore::new();
        store.insert("team-a", descriptor()).await;

        let version = store
            .update_status("team-a", 0, ready_conditions())
            .await
            .unwrap();
        assert_eq!(version, 1);

        let stored = store.get("team-a").await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
        assert!(stored.conditions.get(READY_CONDITION).is_some());
    }

    #[tokio::test]
    async fn test_stale_update_is_conflict() {
        let store = InMemoryObjectStore::new();
        store.insert("team-a", descriptor()).await;
        store
            .update_status("team-a", 0, ready_conditions())
            .await
            .unwrap();

        let err = store
            .update_status("team-a", 0, Conditions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { actual: 1, .. }));
    }

    #[tokio::test]
    async fn test_update_status_of_deleted_key_is_not_found() {
        let store = InMemoryObjectStore::new();
        let err = store
            .update_status("gone", 0, Conditions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
