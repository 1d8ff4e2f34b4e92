//! Snapshot Store Port (Driven Port)
//!
//! Interface for the append-only price snapshot history.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::pricing::PriceSnapshot;

/// Snapshot store error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Backend could not be reached or read.
    #[error("snapshot store unavailable: {0}")]
    Unavailable(String),
}

/// Port for storing and reading price snapshots.
///
/// Snapshots are never updated or removed. The store assigns each appended
/// snapshot its insertion position as sequence number.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Append a snapshot and return it with its sequence number set.
    async fn append(&self, snapshot: PriceSnapshot) -> Result<Arc<PriceSnapshot>, StoreError>;

    /// The most recently appended snapshot, if any.
    async fn latest(&self) -> Result<Option<Arc<PriceSnapshot>>, StoreError>;

    /// Number of snapshots stored.
    async fn count(&self) -> Result<usize, StoreError>;
}
