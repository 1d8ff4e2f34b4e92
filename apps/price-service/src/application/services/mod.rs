//! Application Services
//!
//! Services that orchestrate domain logic and coordinate between ports.
//!
//! - `PriceResolver`: Answers price queries, live first then from snapshots
//! - `CatalogRefresher`: Keeps the supported symbol set current
//! - `SnapshotRefresher`: Records pivot price snapshots

mod catalog_refresher;
mod price_resolver;
mod snapshot_refresher;

pub use catalog_refresher::CatalogRefresher;
pub use price_resolver::{PriceResolver, PriceSource, Resolution, ResolveError};
pub use snapshot_refresher::SnapshotRefresher;
