//! Pricing Types
//!
//! Snapshots of pivot-denominated prices and the cross-rate synthesis used
//! when live upstream data is unavailable.
//!
//! # Cross-rate formula
//!
//! For a snapshot `s` and a pair `(fsym, tsym)` the synthesized rate is
//! `s[tsym] / s[fsym]`. Snapshots are captured by asking upstream for the
//! price of one `USD` in every managed symbol, so each entry is "units of
//! symbol per USD" and the ratio reads "units of tsym per unit of fsym".

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::symbols::{ManagedSymbols, Symbol};

/// Pivot currency every snapshot is quoted against.
pub const PIVOT_SYMBOL: &str = "USD";

/// Nested `fsym -> tsym -> rate` mapping returned to clients.
pub type RateTable = BTreeMap<Symbol, BTreeMap<Symbol, f64>>;

// =============================================================================
// Price Snapshot
// =============================================================================

/// A point-in-time capture of pivot prices for every managed symbol.
///
/// Built only through [`PriceSnapshot::capture`], which rejects partial or
/// unusable quotes, so a stored snapshot always covers the full managed set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSnapshot {
    sequence: u64,
    captured_at: DateTime<Utc>,
    prices: BTreeMap<Symbol, f64>,
}

impl PriceSnapshot {
    /// Build a snapshot from an upstream quote map.
    ///
    /// Only managed symbols are kept. The sequence number is zero until the
    /// snapshot store assigns one on append.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::MissingSymbols`] if any managed symbol is
    /// absent from `quotes`, or [`SnapshotError::InvalidPrice`] if a quote is
    /// not a finite positive number.
    pub fn capture(
        managed: &ManagedSymbols,
        quotes: &BTreeMap<Symbol, f64>,
        captured_at: DateTime<Utc>,
    ) -> Result<Self, SnapshotError> {
        let missing: Vec<Symbol> = managed
            .iter()
            .filter(|symbol| !quotes.contains_key(*symbol))
            .cloned()
            .collect();

        if !missing.is_empty() {
            return Err(SnapshotError::MissingSymbols(missing));
        }

        let mut prices = BTreeMap::new();
        for (symbol, &price) in quotes.iter().filter(|(s, _)| managed.contains(s)) {
            if !price.is_finite() || price <= 0.0 {
                return Err(SnapshotError::InvalidPrice {
                    symbol: symbol.clone(),
                    price,
                });
            }
            prices.insert(symbol.clone(), price);
        }

        Ok(Self {
            sequence: 0,
            captured_at,
            prices,
        })
    }

    /// Return the snapshot with its insertion position set.
    #[must_use]
    pub(crate) fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Insertion position in the snapshot store (0-based).
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// When the quotes were fetched.
    #[must_use]
    pub const fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Pivot price for a symbol, if captured.
    #[must_use]
    pub fn price(&self, symbol: &str) -> Option<f64> {
        self.prices.get(symbol).copied()
    }

    /// All captured prices.
    #[must_use]
    pub const fn prices(&self) -> &BTreeMap<Symbol, f64> {
        &self.prices
    }
}

/// Reasons an upstream quote map cannot become a snapshot.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SnapshotError {
    /// Upstream omitted some managed symbols.
    #[error("quote is missing managed symbols: {}", .0.join(","))]
    MissingSymbols(Vec<Symbol>),

    /// Upstream returned a price that cannot be divided by.
    #[error("invalid price {price} for {symbol}")]
    InvalidPrice {
        /// Offending symbol.
        symbol: Symbol,
        /// Value received.
        price: f64,
    },
}

// =============================================================================
// Cross-Rate Synthesis
// =============================================================================

/// Derive a rate table for every `(fsym, tsym)` pair from a snapshot.
///
/// Pure: the same inputs always give the same table.
///
/// # Errors
///
/// Returns [`SynthesisError::NoSnapshot`] when `snapshot` is `None` and
/// [`SynthesisError::MissingSymbol`] when a requested symbol was not
/// captured.
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeMap;
/// use chrono::Utc;
/// use price_service::domain::pricing::{PriceSnapshot, synthesize};
/// use price_service::domain::symbols::ManagedSymbols;
///
/// let managed = ManagedSymbols::new(["BTC", "ETH"]);
/// let quotes = BTreeMap::from([("BTC".to_string(), 50_000.0), ("ETH".to_string(), 3_000.0)]);
/// let snapshot = PriceSnapshot::capture(&managed, &quotes, Utc::now()).unwrap();
///
/// let table = synthesize(&["BTC".to_string()], &["ETH".to_string()], Some(&snapshot)).unwrap();
/// assert_eq!(table["BTC"]["ETH"], 3_000.0 / 50_000.0);
/// ```
pub fn synthesize(
    fsyms: &[Symbol],
    tsyms: &[Symbol],
    snapshot: Option<&PriceSnapshot>,
) -> Result<RateTable, SynthesisError> {
    let snapshot = snapshot.ok_or(SynthesisError::NoSnapshot)?;
    let lookup = |symbol: &Symbol| {
        snapshot
            .price(symbol)
            .ok_or_else(|| SynthesisError::MissingSymbol {
                symbol: symbol.clone(),
                sequence: snapshot.sequence(),
            })
    };

    let mut table = RateTable::new();
    for fsym in fsyms {
        let from_price = lookup(fsym)?;
        let row = table.entry(fsym.clone()).or_default();
        for tsym in tsyms {
            row.insert(tsym.clone(), lookup(tsym)? / from_price);
        }
    }

    Ok(table)
}

/// Reasons a fallback rate table cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    /// Nothing has been captured yet.
    #[error("no price snapshot captured yet")]
    NoSnapshot,

    /// The latest snapshot lacks a requested symbol.
    #[error("snapshot {sequence} has no price for {symbol}")]
    MissingSymbol {
        /// Symbol without a price.
        symbol: Symbol,
        /// Snapshot that was consulted.
        sequence: u64,
    },
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn quotes(entries: &[(&str, f64)]) -> BTreeMap<Symbol, f64> {
        entries.iter().map(|(s, p)| ((*s).to_string(), *p)).collect()
    }

    fn symbols(list: &[&str]) -> Vec<Symbol> {
        list.iter().map(ToString::to_string).collect()
    }

    fn reference_snapshot() -> PriceSnapshot {
        let managed = ManagedSymbols::new(["BTC", "ETH", "USD"]);
        PriceSnapshot::capture(
            &managed,
            &quotes(&[("BTC", 50_000.0), ("ETH", 3_000.0), ("USD", 1.0)]),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn capture_keeps_only_managed_symbols() {
        let managed = ManagedSymbols::new(["BTC", "ETH"]);
        let snapshot = PriceSnapshot::capture(
            &managed,
            &quotes(&[("BTC", 2.0), ("ETH", 30.0), ("DOGE", 9.0)]),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(snapshot.prices().len(), 2);
        assert_eq!(snapshot.price("DOGE"), None);
        assert_eq!(snapshot.sequence(), 0);
    }

    #[test]
    fn capture_rejects_partial_quote() {
        let managed = ManagedSymbols::new(["BTC", "ETH", "LTC"]);
        let err = PriceSnapshot::capture(&managed, &quotes(&[("ETH", 30.0)]), Utc::now())
            .unwrap_err();

        assert_eq!(
            err,
            SnapshotError::MissingSymbols(symbols(&["BTC", "LTC"]))
        );
    }

    #[test]
    fn capture_rejects_unusable_prices() {
        let managed = ManagedSymbols::new(["BTC"]);
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = PriceSnapshot::capture(&managed, &quotes(&[("BTC", bad)]), Utc::now());
            assert!(matches!(result, Err(SnapshotError::InvalidPrice { .. })));
        }
    }

    #[test]
    fn synthesize_reference_scenario() {
        let snapshot = reference_snapshot();
        let table = synthesize(&symbols(&["BTC"]), &symbols(&["ETH"]), Some(&snapshot)).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table["BTC"].len(), 1);
        assert_eq!(table["BTC"]["ETH"], 3_000.0 / 50_000.0);
        assert!((table["BTC"]["ETH"] - 0.06).abs() < 1e-12);
    }

    #[test]
    fn synthesize_full_matrix() {
        let snapshot = reference_snapshot();
        let all = symbols(&["BTC", "ETH", "USD"]);
        let table = synthesize(&all, &all, Some(&snapshot)).unwrap();

        for fsym in &all {
            for tsym in &all {
                let expected = snapshot.price(tsym).unwrap() / snapshot.price(fsym).unwrap();
                assert_eq!(table[fsym][tsym], expected);
            }
            assert_eq!(table[fsym][fsym], 1.0);
        }
    }

    #[test]
    fn synthesize_without_snapshot() {
        let result = synthesize(&symbols(&["BTC"]), &symbols(&["ETH"]), None);
        assert_eq!(result, Err(SynthesisError::NoSnapshot));
    }

    #[test]
    fn synthesize_reports_missing_symbol() {
        let managed = ManagedSymbols::new(["BTC"]);
        let snapshot =
            PriceSnapshot::capture(&managed, &quotes(&[("BTC", 1.0)]), Utc::now()).unwrap();

        let result = synthesize(&symbols(&["BTC"]), &symbols(&["ETH"]), Some(&snapshot));
        assert_eq!(
            result,
            Err(SynthesisError::MissingSymbol {
                symbol: "ETH".to_string(),
                sequence: 0,
            })
        );
    }

    proptest! {
        #[test]
        fn synthesize_is_idempotent_and_matches_formula(
            prices in proptest::collection::btree_map("[A-Z]{2,5}", 1e-6f64..1e6, 1..8),
        ) {
            let managed = ManagedSymbols::new(prices.keys());
            let snapshot = PriceSnapshot::capture(&managed, &prices, Utc::now()).unwrap();
            let all: Vec<Symbol> = prices.keys().cloned().collect();

            let first = synthesize(&all, &all, Some(&snapshot)).unwrap();
            let second = synthesize(&all, &all, Some(&snapshot)).unwrap();
            prop_assert_eq!(&first, &second);

            for fsym in &all {
                for tsym in &all {
                    prop_assert_eq!(first[fsym][tsym], prices[tsym] / prices[fsym]);
                }
            }
        }
    }
}
