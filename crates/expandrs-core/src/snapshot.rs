// Expandrs Snapshot Cache
// Read-only abbreviation snapshot, refreshed on store push notifications

use std::sync::Arc;

use log::{debug, warn};
use parking_lot::RwLock;

use crate::abbreviation::Abbreviation;
use crate::store::AbbreviationStore;

/// Shared, read-only snapshot of the abbreviation list.
///
/// The expansion path reads the snapshot on every keystroke; refreshes
/// happen only on store change notifications, never by polling. A failed
/// refresh keeps the stale snapshot so expansion keeps working.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    inner: RwLock<Arc<Vec<Abbreviation>>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// The current snapshot. Cheap to clone, safe to hold across awaits.
    pub fn load(&self) -> Arc<Vec<Abbreviation>> {
        self.inner.read().clone()
    }

    /// Replace the snapshot from the store. On failure the previous
    /// snapshot stays in place.
    pub async fn refresh(&self, store: &dyn AbbreviationStore) {
        match store.all_abbreviations().await {
            Ok(list) => {
                debug!("snapshot refreshed: {} abbreviation(s)", list.len());
                *self.inner.write() = Arc::new(list);
            }
            Err(e) => {
                warn!("snapshot refresh failed, keeping stale data: {e}");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abbreviation::ChoiceConfig;
    use crate::store::{MemoryStore, StoreError};
    use async_trait::async_trait;

    struct FailingStore;

    #[async_trait]
    impl AbbreviationStore for FailingStore {
        async fn all_abbreviations(&self) -> Result<Vec<Abbreviation>, StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        async fn increment_usage(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        async fn choice_config(&self, _id: u32) -> Result<Option<ChoiceConfig>, StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_refresh_loads_store_contents() {
        let store = MemoryStore::new();
        store
            .add_abbreviation(Abbreviation::new("sig", "Regards"))
            .unwrap();
        let cache = SnapshotCache::new();
        assert!(cache.is_empty());
        cache.refresh(&store).await;
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.load()[0].key(), "sig");
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_snapshot() {
        let store = MemoryStore::new();
        store
            .add_abbreviation(Abbreviation::new("sig", "Regards"))
            .unwrap();
        let cache = SnapshotCache::new();
        cache.refresh(&store).await;
        cache.refresh(&FailingStore).await;
        assert_eq!(cache.len(), 1);
    }
}
