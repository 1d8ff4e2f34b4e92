//! Symbol Registry Types
//!
//! Domain types for deciding which symbols the service answers for.
//!
//! # Design
//!
//! Two sets decide eligibility:
//! - the managed symbols, fixed at startup from configuration
//! - the supported symbols, replaced wholesale whenever the upstream
//!   coin catalog is refreshed
//!
//! A symbol is eligible iff it is in both. The supported set is held as an
//! `Arc<HashSet<_>>` behind a lock and swapped in one step, so readers
//! always see either the old set or the new one.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;

// =============================================================================
// Types
// =============================================================================

/// A currency or coin code (e.g. "BTC", "ETH", "USD").
pub type Symbol = String;

/// Parse a comma-separated symbol list from a query string or config value.
///
/// Items are trimmed, empty items are dropped, and repeated symbols are kept
/// once in first-seen order. A missing value parses to an empty list.
#[must_use]
pub fn parse_symbol_list(raw: Option<&str>) -> Vec<Symbol> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(*s))
        .map(ToString::to_string)
        .collect()
}

// =============================================================================
// Managed Symbols
// =============================================================================

/// The statically configured symbols this service handles.
///
/// Immutable after construction. Keeps the configured order, which is also
/// the order used when requesting snapshot prices upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedSymbols {
    ordered: Vec<Symbol>,
    lookup: HashSet<Symbol>,
}

impl ManagedSymbols {
    /// Build the managed set, dropping blanks and duplicates.
    #[must_use]
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ordered = Vec::new();
        let mut lookup = HashSet::new();

        for symbol in symbols {
            let symbol = symbol.as_ref().trim();
            if symbol.is_empty() {
                continue;
            }
            if lookup.insert(symbol.to_string()) {
                ordered.push(symbol.to_string());
            }
        }

        Self { ordered, lookup }
    }

    /// Check whether a symbol is managed.
    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        self.lookup.contains(symbol)
    }

    /// Managed symbols in configured order.
    #[must_use]
    pub fn as_slice(&self) -> &[Symbol] {
        &self.ordered
    }

    /// Iterate managed symbols in configured order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.ordered.iter()
    }

    /// Number of managed symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Whether no symbol is managed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

// =============================================================================
// Symbol Registry
// =============================================================================

/// Holds the managed set and the latest upstream-supported set.
///
/// The supported set starts empty: until the first catalog refresh lands,
/// nothing is eligible. Only the catalog refresher calls
/// [`SymbolRegistry::replace_supported`]; every query path only reads.
///
/// # Example
///
/// ```rust
/// use price_service::domain::symbols::{ManagedSymbols, SymbolRegistry};
///
/// let registry = SymbolRegistry::new(ManagedSymbols::new(["BTC", "ETH"]));
/// assert!(!registry.is_eligible("BTC"));
///
/// registry.replace_supported(["BTC", "DOGE"].map(String::from).into_iter().collect());
/// assert!(registry.is_eligible("BTC"));
/// assert!(!registry.is_eligible("ETH"));  // managed, not supported
/// assert!(!registry.is_eligible("DOGE")); // supported, not managed
/// ```
#[derive(Debug)]
pub struct SymbolRegistry {
    managed: ManagedSymbols,
    supported: RwLock<Arc<HashSet<Symbol>>>,
}

impl SymbolRegistry {
    /// Create a registry with an empty supported set.
    #[must_use]
    pub fn new(managed: ManagedSymbols) -> Self {
        Self {
            managed,
            supported: RwLock::new(Arc::new(HashSet::new())),
        }
    }

    /// The managed symbols.
    #[must_use]
    pub const fn managed(&self) -> &ManagedSymbols {
        &self.managed
    }

    /// Swap in a freshly fetched supported set.
    pub fn replace_supported(&self, supported: HashSet<Symbol>) {
        let supported = Arc::new(supported);
        *self.supported.write() = supported;
    }

    /// Current supported set.
    #[must_use]
    pub fn supported(&self) -> Arc<HashSet<Symbol>> {
        Arc::clone(&self.supported.read())
    }

    /// Number of symbols upstream currently reports as tradable.
    #[must_use]
    pub fn supported_count(&self) -> usize {
        self.supported.read().len()
    }

    /// Whether a symbol is both managed and currently supported upstream.
    #[must_use]
    pub fn is_eligible(&self, symbol: &str) -> bool {
        self.managed.contains(symbol) && self.supported.read().contains(symbol)
    }

    /// Keep the eligible symbols of a request, in request order.
    ///
    /// Reads one supported set for the whole request so a concurrent
    /// refresh cannot split the decision.
    #[must_use]
    pub fn filter_eligible(&self, requested: &[Symbol]) -> Vec<Symbol> {
        let supported = self.supported();
        let mut eligible: Vec<Symbol> = Vec::with_capacity(requested.len());

        for symbol in requested {
            if self.managed.contains(symbol)
                && supported.contains(symbol)
                && !eligible.contains(symbol)
            {
                eligible.push(symbol.clone());
            }
        }

        eligible
    }

    /// Managed symbols that are currently eligible, in configured order.
    #[must_use]
    pub fn eligible_symbols(&self) -> Vec<Symbol> {
        self.filter_eligible(self.managed.as_slice())
    }
}

// =============================================================================
// Tests
// =============================================================================
