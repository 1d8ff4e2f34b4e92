//! Port Interfaces
//!
//! Defines the interfaces (ports) for external systems following
//! the Hexagonal Architecture pattern. These are the contracts that
//! infrastructure adapters must implement.
//!
//! ## Driven Ports (Outbound)
//!
//! - `PriceFeedPort`: Upstream coin catalog and price endpoints
//! - `SnapshotStore`: Append-only history of captured price snapshots
//!
//! ## Driver Ports (Inbound)
//!
//! - `RecurringJob`: Work the scheduler runs on a fixed interval

mod price_feed_port;
mod recurring_job;
mod snapshot_store_port;

pub use price_feed_port::{PriceFeedPort, UpstreamError};
pub use recurring_job::{JobError, RecurringJob};
pub use snapshot_store_port::{SnapshotStore, StoreError};

#[cfg(test)]
pub use price_feed_port::MockPriceFeedPort;
#[cfg(test)]
pub use snapshot_store_port::MockSnapshotStore;
