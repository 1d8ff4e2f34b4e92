//! Snapshot Refresher
//!
//! Captures the managed symbols' prices against the pivot and appends them
//! to the snapshot store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::application::ports::{JobError, PriceFeedPort, RecurringJob, SnapshotStore, UpstreamError};
use crate::domain::pricing::{PIVOT_SYMBOL, PriceSnapshot};
use crate::domain::symbols::SymbolRegistry;

/// Periodically records a full price snapshot of the managed symbols.
pub struct SnapshotRefresher {
    registry: Arc<SymbolRegistry>,
    feed: Arc<dyn PriceFeedPort>,
    store: Arc<dyn SnapshotStore>,
}

impl SnapshotRefresher {
    /// Create a new snapshot refresher.
    #[must_use]
    pub fn new(
        registry: Arc<SymbolRegistry>,
        feed: Arc<dyn PriceFeedPort>,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            registry,
            feed,
            store,
        }
    }

    /// Fetch one quote and store it as a snapshot.
    ///
    /// A quote that misses any managed symbol is discarded, so every stored
    /// snapshot prices the whole managed set.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Upstream`] when the fetch fails or the quote is
    /// incomplete, [`JobError::Store`] when the append fails.
    pub async fn capture(&self) -> Result<Arc<PriceSnapshot>, JobError> {
        let managed = self.registry.managed();
        let quotes = self
            .feed
            .price_single(PIVOT_SYMBOL, managed.as_slice())
            .await?;

        let snapshot =
            PriceSnapshot::capture(managed, &quotes, Utc::now()).map_err(UpstreamError::from)?;
        let stored = self.store.append(snapshot).await?;

        tracing::debug!(
            sequence = stored.sequence(),
            symbols = stored.prices().len(),
            "Price snapshot stored"
        );

        Ok(stored)
    }
}

#[async_trait]
impl RecurringJob for SnapshotRefresher {
    fn name(&self) -> &'static str {
        "coin_data"
    }

    async fn run_once(&self) -> Result<(), JobError> {
        self.capture().await?;
        Ok(())
    }
}
