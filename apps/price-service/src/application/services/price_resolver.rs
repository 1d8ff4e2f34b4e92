//! Price Resolution Service
//!
//! Orchestrates a price query: eligibility filter, live upstream lookup,
//! and snapshot fallback when upstream is unavailable.

use std::sync::Arc;

use crate::application::ports::{PriceFeedPort, SnapshotStore, StoreError};
use crate::domain::pricing::{RateTable, SynthesisError, synthesize};
use crate::domain::symbols::{Symbol, SymbolRegistry};

/// Where a resolved rate table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    /// Upstream multi-price endpoint, returned as-is.
    Live,
    /// Synthesized from the snapshot with this sequence number.
    Fallback {
        /// Sequence number of the snapshot used.
        sequence: u64,
    },
}

impl PriceSource {
    /// Short label for logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Fallback { .. } => "fallback",
        }
    }
}

/// A successfully resolved rate table.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The `fsym -> tsym -> rate` table.
    pub table: RateTable,
    /// Which path produced it.
    pub source: PriceSource,
}

/// Reasons a price query cannot be answered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// No requested symbol is eligible on the from side or the to side.
    #[error("coin not handled")]
    NoCoinsHandled,

    /// Live data failed and no usable snapshot exists.
    #[error("price data unavailable: {0}")]
    StaleDataUnavailable(String),
}

impl From<SynthesisError> for ResolveError {
    fn from(err: SynthesisError) -> Self {
        Self::StaleDataUnavailable(err.to_string())
    }
}

impl From<StoreError> for ResolveError {
    fn from(err: StoreError) -> Self {
        Self::StaleDataUnavailable(err.to_string())
    }
}

/// Resolves exchange rates for eligible symbols.
///
/// Stateless apart from its shared handles; every call recomputes.
pub struct PriceResolver {
    registry: Arc<SymbolRegistry>,
    feed: Arc<dyn PriceFeedPort>,
    store: Arc<dyn SnapshotStore>,
}

impl PriceResolver {
    /// Create a new resolver.
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

    /// Resolve rates, preferring live upstream data.
    ///
    /// # Errors
    ///
    /// [`ResolveError::NoCoinsHandled`] if either side has no eligible
    /// symbol; [`ResolveError::StaleDataUnavailable`] if upstream failed
    /// and the snapshot fallback failed too.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn resolve(
        &self,
        fsyms: &[Symbol],
        tsyms: &[Symbol],
    ) -> Result<Resolution, ResolveError> {
        let (fsyms, tsyms) = self.handled(fsyms, tsyms)?;

        match self.feed.price_multi(&fsyms, &tsyms).await {
            Ok(table) => Ok(Resolution {
                table,
                source: PriceSource::Live,
            }),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    fsyms = %fsyms.join(","),
                    tsyms = %tsyms.join(","),
                    "Live price unavailable, falling back to snapshot"
                );
                self.from_snapshot(&fsyms, &tsyms).await
            }
        }
    }

    /// Resolve rates from the latest snapshot only, never calling upstream.
    ///
    /// # Errors
    ///
    /// Same as [`PriceResolver::resolve`] minus the live path.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn resolve_local(
        &self,
        fsyms: &[Symbol],
        tsyms: &[Symbol],
    ) -> Result<Resolution, ResolveError> {
        let (fsyms, tsyms) = self.handled(fsyms, tsyms)?;
        self.from_snapshot(&fsyms, &tsyms).await
    }

    fn handled(
        &self,
        fsyms: &[Symbol],
        tsyms: &[Symbol],
    ) -> Result<(Vec<Symbol>, Vec<Symbol>), ResolveError> {
        let handled_fsyms = self.registry.filter_eligible(fsyms);
        let handled_tsyms = self.registry.filter_eligible(tsyms);

        if handled_fsyms.is_empty() || handled_tsyms.is_empty() {
            return Err(ResolveError::NoCoinsHandled);
        }

        Ok((handled_fsyms, handled_tsyms))
    }

    async fn from_snapshot(
        &self,
        fsyms: &[Symbol],
        tsyms: &[Symbol],
    ) -> Result<Resolution, ResolveError> {
        let Some(snapshot) = self.store.latest().await? else {
            return Err(SynthesisError::NoSnapshot.into());
        };

        let table = synthesize(fsyms, tsyms, Some(&snapshot))?;

        Ok(Resolution {
            table,
            source: PriceSource::Fallback {
                sequence: snapshot.sequence(),
            },
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashSet};

    use chrono::Utc;

    use super::*;
    use crate::application::ports::{MockPriceFeedPort, MockSnapshotStore, UpstreamError};
    use crate::domain::pricing::PriceSnapshot;
    use crate::domain::symbols::ManagedSymbols;
    use crate::infrastructure::persistence::InMemorySnapshotStore;

    fn symbols(list: &[&str]) -> Vec<Symbol> {
        list.iter().map(ToString::to_string).collect()
    }

    fn same(actual: &[Symbol], expected: &[&str]) -> bool {
        actual.iter().map(String::as_str).eq(expected.iter().copied())
    }

    fn registry() -> Arc<SymbolRegistry> {
        let registry = SymbolRegistry::new(ManagedSymbols::new(["BTC", "ETH", "USD"]));
        registry.replace_supported(
            ["BTC", "ETH", "USD", "XYZ"]
                .iter()
                .map(ToString::to_string)
                .collect::<HashSet<_>>(),
        );
        Arc::new(registry)
    }

    async fn seeded_store() -> Arc<InMemorySnapshotStore> {
        let store = Arc::new(InMemorySnapshotStore::new());
        let managed = ManagedSymbols::new(["BTC", "ETH", "USD"]);
        let quotes = BTreeMap::from([
            ("BTC".to_string(), 50_000.0),
            ("ETH".to_string(), 3_000.0),
            ("USD".to_string(), 1.0),
        ]);
        let snapshot = PriceSnapshot::capture(&managed, &quotes, Utc::now()).unwrap();
        store.append(snapshot).await.unwrap();
        store
    }

    fn failing_feed() -> MockPriceFeedPort {
        let mut feed = MockPriceFeedPort::new();
        feed.expect_price_multi()
            .returning(|_, _| Err(UpstreamError::Network("connection refused".into())));
        feed
    }

    #[tokio::test]
    async fn live_result_is_returned_untouched() {
        let live = BTreeMap::from([(
            "BTC".to_string(),
            BTreeMap::from([("ETH".to_string(), 16.5)]),
        )]);
        let expected = live.clone();

        let mut feed = MockPriceFeedPort::new();
        feed.expect_price_multi()
            .withf(|fsyms, tsyms| same(fsyms, &["BTC"]) && same(tsyms, &["ETH"]))
            .times(1)
            .returning(move |_, _| Ok(live.clone()));

        let mut store = MockSnapshotStore::new();
        store.expect_latest().never();

        let resolver = PriceResolver::new(registry(), Arc::new(feed), Arc::new(store));
        let resolution = resolver
            .resolve(&symbols(&["BTC"]), &symbols(&["ETH"]))
            .await
            .unwrap();

        assert_eq!(resolution.source, PriceSource::Live);
        assert_eq!(resolution.table, expected);
    }

    #[tokio::test]
    async fn only_eligible_symbols_reach_upstream() {
        let mut feed = MockPriceFeedPort::new();
        feed.expect_price_multi()
            .withf(|fsyms, tsyms| same(fsyms, &["BTC", "ETH"]) && same(tsyms, &["USD"]))
            .times(1)
            .returning(|_, _| Ok(RateTable::new()));

        let resolver = PriceResolver::new(
            registry(),
            Arc::new(feed),
            Arc::new(InMemorySnapshotStore::new()),
        );
        resolver
            .resolve(&symbols(&["BTC", "XYZ", "ETH", "DOGE"]), &symbols(&["USD", "XYZ"]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn fallback_reference_scenario() {
        let resolver = PriceResolver::new(registry(), Arc::new(failing_feed()), seeded_store().await);

        let resolution = resolver
            .resolve(&symbols(&["BTC"]), &symbols(&["ETH"]))
            .await
            .unwrap();

        assert_eq!(resolution.source, PriceSource::Fallback { sequence: 0 });
        assert_eq!(resolution.table["BTC"]["ETH"], 3_000.0 / 50_000.0);
        assert!((resolution.table["BTC"]["ETH"] - 0.06).abs() < 1e-12);
    }

    #[tokio::test]
    async fn fallback_uses_latest_snapshot() {
        let store = seeded_store().await;
        let managed = ManagedSymbols::new(["BTC", "ETH", "USD"]);
        let quotes = BTreeMap::from([
            ("BTC".to_string(), 40_000.0),
            ("ETH".to_string(), 4_000.0),
            ("USD".to_string(), 1.0),
        ]);
        store
            .append(PriceSnapshot::capture(&managed, &quotes, Utc::now()).unwrap())
            .await
            .unwrap();

        let resolver = PriceResolver::new(registry(), Arc::new(failing_feed()), store);
        let resolution = resolver
            .resolve(&symbols(&["BTC"]), &symbols(&["ETH", "USD"]))
            .await
            .unwrap();

        assert_eq!(resolution.source, PriceSource::Fallback { sequence: 1 });
        assert_eq!(resolution.table["BTC"]["ETH"], 4_000.0 / 40_000.0);
        assert_eq!(resolution.table["BTC"]["USD"], 1.0 / 40_000.0);
    }

    #[tokio::test]
    async fn unmanaged_symbol_is_not_handled() {
        let mut feed = MockPriceFeedPort::new();
        feed.expect_price_multi().never();

        let resolver = PriceResolver::new(registry(), Arc::new(feed), seeded_store().await);

        let live = resolver
            .resolve(&symbols(&["XYZ"]), &symbols(&["BTC"]))
            .await;
        let local = resolver
            .resolve_local(&symbols(&["XYZ"]), &symbols(&["BTC"]))
            .await;

        assert_eq!(live, Err(ResolveError::NoCoinsHandled));
        assert_eq!(local, Err(ResolveError::NoCoinsHandled));
    }

    #[tokio::test]
    async fn empty_request_is_not_handled() {
        let resolver = PriceResolver::new(
            registry(),
            Arc::new(MockPriceFeedPort::new()),
            seeded_store().await,
        );

        let result = resolver.resolve(&[], &symbols(&["BTC"])).await;
        assert_eq!(result, Err(ResolveError::NoCoinsHandled));

        let result = resolver.resolve(&symbols(&["BTC"]), &[]).await;
        assert_eq!(result, Err(ResolveError::NoCoinsHandled));
    }

    #[tokio::test]
    async fn empty_store_is_stale_data() {
        let resolver = PriceResolver::new(
            registry(),
            Arc::new(failing_feed()),
            Arc::new(InMemorySnapshotStore::new()),
        );

        let result = resolver
            .resolve(&symbols(&["BTC"]), &symbols(&["ETH"]))
            .await;

        assert!(matches!(result, Err(ResolveError::StaleDataUnavailable(_))));
    }

    #[tokio::test]
    async fn unreadable_store_is_stale_data() {
        let mut store = MockSnapshotStore::new();
        store
            .expect_latest()
            .returning(|| Err(StoreError::Unavailable("disk gone".into())));

        let resolver = PriceResolver::new(registry(), Arc::new(failing_feed()), Arc::new(store));
        let result = resolver
            .resolve(&symbols(&["BTC"]), &symbols(&["ETH"]))
            .await;

        assert_eq!(
            result,
            Err(ResolveError::StaleDataUnavailable(
                "snapshot store unavailable: disk gone".into()
            ))
        );
    }

    #[tokio::test]
    async fn resolve_local_never_calls_upstream() {
        let mut feed = MockPriceFeedPort::new();
        feed.expect_price_multi().never();

        let resolver = PriceResolver::new(registry(), Arc::new(feed), seeded_store().await);
        let resolution = resolver
            .resolve_local(&symbols(&["ETH"]), &symbols(&["BTC"]))
            .await
            .unwrap();

        assert_eq!(resolution.source, PriceSource::Fallback { sequence: 0 });
        assert_eq!(resolution.table["ETH"]["BTC"], 50_000.0 / 3_000.0);
    }
}
