//! In-memory snapshot store.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{SnapshotStore, StoreError};
use crate::domain::pricing::PriceSnapshot;

/// In-memory implementation of `SnapshotStore`.
///
/// Append-only and unbounded. History is lost on restart.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    snapshots: RwLock<Vec<Arc<PriceSnapshot>>>,
}

impl InMemorySnapshotStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of snapshots in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.read().len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.read().is_empty()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn append(&self, snapshot: PriceSnapshot) -> Result<Arc<PriceSnapshot>, StoreError> {
        let mut snapshots = self.snapshots.write();
        let sequence = snapshots.len() as u64;
        let stored = Arc::new(snapshot.with_sequence(sequence));
        snapshots.push(Arc::clone(&stored));
        Ok(stored)
    }

    async fn latest(&self) -> Result<Option<Arc<PriceSnapshot>>, StoreError> {
        Ok(self.snapshots.read().last().cloned())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.len())
    }
}
