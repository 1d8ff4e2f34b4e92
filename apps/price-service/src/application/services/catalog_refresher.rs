//! Catalog Refresher
//!
//! Keeps the registry's supported set in line with upstream's coin list.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::{JobError, PriceFeedPort, RecurringJob, UpstreamError};
use crate::domain::symbols::SymbolRegistry;

/// Fetches the upstream coin list and swaps it into the registry.
pub struct CatalogRefresher {
    registry: Arc<SymbolRegistry>,
    feed: Arc<dyn PriceFeedPort>,
}

impl CatalogRefresher {
    /// Create a new catalog refresher.
    #[must_use]
    pub fn new(registry: Arc<SymbolRegistry>, feed: Arc<dyn PriceFeedPort>) -> Self {
        Self { registry, feed }
    }

    /// Fetch the coin list once and replace the supported set.
    ///
    /// On failure the previous set stays in place. Returns the size of the
    /// new set.
    ///
    /// # Errors
    ///
    /// Returns the upstream error, or [`UpstreamError::Malformed`] when
    /// upstream lists no coins at all.
    pub async fn refresh(&self) -> Result<usize, UpstreamError> {
        let supported = self.feed.coin_list().await?;

        if supported.is_empty() {
            return Err(UpstreamError::Malformed("coin list is empty".to_string()));
        }

        let count = supported.len();
        self.registry.replace_supported(supported);

        let eligible = self.registry.eligible_symbols();
        tracing::info!(
            supported = count,
            eligible = eligible.len(),
            managed = self.registry.managed().len(),
            "Coin list refreshed"
        );

        let unsupported: Vec<&str> = self
            .registry
            .managed()
            .iter()
            .filter(|s| !eligible.contains(*s))
            .map(String::as_str)
            .collect();
        if !unsupported.is_empty() {
            tracing::warn!(
                symbols = %unsupported.join(","),
                "Managed symbols not listed upstream"
            );
        }

        Ok(count)
    }
}

#[async_trait]
impl RecurringJob for CatalogRefresher {
    fn name(&self) -> &'static str {
        "coin_list"
    }

    async fn run_once(&self) -> Result<(), JobError> {
        self.refresh().await?;
        Ok(())
    }
}
