//! Membership backend boundary.
//!
//! The real group/membership backend is not designed yet; this trait pins
//! the interface the pipeline converges into. [`LogMembershipSync`] stands
//! in for it: it records the last converged list per group and logs it.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use groupsync_core::SyncError;

/// Capability to converge a group's membership to a subject list.
#[async_trait]
pub trait MembershipSync: Send + Sync {
    /// Make the membership of `group_key` equal to `subjects`.
    ///
    /// Must be idempotent: syncing the same list twice is a no-op for the
    /// backend.
    async fn sync_membership(&self, group_key: &str, subjects: &[String])
        -> Result<(), SyncError>;
}

/// [`MembershipSync`] that records and logs the converged list.
#[derive(Debug, Default)]
pub struct LogMembershipSync {
    groups: RwLock<HashMap<String, Vec<String>>>,
}

impl LogMembershipSync {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last synced membership for a group, if any.
    pub async fn membership(&self, group_key: &str) -> Option<Vec<String>> {
        self.groups.read().await.get(group_key).cloned()
    }
}

#[async_trait]
impl MembershipSync for LogMembershipSync {
    async fn sync_membership(
        &self,
        group_key: &str,
        subjects: &[String],
    ) -> Result<(), SyncError> {
        info!(group = group_key, subjects = subjects.len(), "Syncing group membership");
        self.groups
            .write()
            .await
            .insert(group_key.to_owned(), subjects.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn test_sync_replaces_membership() {
        let backend = LogMembershipSync::new();

        backend
            .sync_membership("team-a", &["alice".into(), "bob".into()])
            .await
            .unwrap();
        backend
            .sync_membership("team-a", &["carol".into()])
            .await
            .unwrap();

        assert_eq!(
            backend.membership("team-a").await,
            Some(vec!["carol".to_owned()])
        );
        assert_eq!(backend.membership("team-b").await, None);
    }
}
