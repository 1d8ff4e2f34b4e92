#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Price Service - Crypto Exchange Rates With Snapshot Fallback
//!
//! An HTTP service that answers exchange-rate queries between a configured
//! set of crypto and fiat symbols. Rates come live from CryptoCompare; when
//! upstream is unavailable they are synthesized from the latest USD-pivoted
//! price snapshot.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Core pricing logic and data types
//!   - `symbols`: Managed/supported symbol sets and eligibility
//!   - `pricing`: Snapshots, rate tables and cross-rate synthesis
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Interfaces for the price feed, snapshot store, recurring jobs
//!   - `services`: Price resolution, coin list and snapshot refreshers
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `cryptocompare`: reqwest client for the CryptoCompare API
//!   - `persistence`: In-memory snapshot store
//!   - `scheduler`: Recurring background tasks
//!   - `http`: Price query API and server
//!   - `config`, `health`, `metrics`, `telemetry`
//!
//! # Data Flow
//!
//! ```text
//!                  ┌──────────────┐  coin list   ┌──────────────┐
//!                  │  Catalog     │─────────────►│   Symbol     │
//!                  │  Refresher   │              │   Registry   │
//! CryptoCompare ──►├──────────────┤              └──────┬───────┘
//!                  │  Snapshot    │  snapshots   ┌──────▼───────┐
//!                  │  Refresher   │─────────────►│    Price     │──► HTTP clients
//!                  └──────────────┘              │   Resolver   │
//! CryptoCompare ◄──────── live rates ───────────│              │
//!                                                └──────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core pricing types with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

/// Startup errors.
pub mod error;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::pricing::{PIVOT_SYMBOL, PriceSnapshot, RateTable, SynthesisError, synthesize};
pub use domain::symbols::{ManagedSymbols, Symbol, SymbolRegistry, parse_symbol_list};

// Application
pub use application::ports::{
    JobError, PriceFeedPort, RecurringJob, SnapshotStore, StoreError, UpstreamError,
};
pub use application::services::{
    CatalogRefresher, PriceResolver, PriceSource, Resolution, ResolveError, SnapshotRefresher,
};

// Infrastructure config
pub use infrastructure::config::{
    ApiKey, ConfigError, ScheduleSettings, ServerSettings, ServiceConfig, UpstreamSettings,
};

// Adapters
pub use infrastructure::cryptocompare::CryptoCompareClient;
pub use infrastructure::health::HealthState;
pub use infrastructure::http::{HttpServer, HttpServerError, create_router};
pub use infrastructure::persistence::InMemorySnapshotStore;
pub use infrastructure::scheduler::{FirstRun, RecurringTask};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};

pub use error::StartupError;
