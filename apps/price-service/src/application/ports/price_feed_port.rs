//! Price Feed Port (Driven Port)
//!
//! Interface for the upstream price provider.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;

use crate::domain::pricing::{RateTable, SnapshotError};
use crate::domain::symbols::Symbol;

/// Upstream is unavailable for this call.
///
/// Every variant means the same thing to callers: the request did not
/// produce usable data. The variants only exist for logs and metrics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    /// Connection, TLS or timeout failure.
    #[error("upstream request failed: {0}")]
    Network(String),

    /// Upstream answered with a non-success status.
    #[error("upstream returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Upstream answered 200 with an in-band error body.
    #[error("upstream API error: {0}")]
    Api(String),

    /// Body could not be decoded into the expected shape.
    #[error("malformed upstream payload: {0}")]
    Malformed(String),

    /// Body decoded but lacked data the caller requires.
    #[error("incomplete upstream payload: {0}")]
    Incomplete(String),
}

impl UpstreamError {
    /// Short label for metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Status { .. } => "status",
            Self::Api(_) => "api",
            Self::Malformed(_) => "malformed",
            Self::Incomplete(_) => "incomplete",
        }
    }
}

impl From<SnapshotError> for UpstreamError {
    fn from(err: SnapshotError) -> Self {
        Self::Incomplete(err.to_string())
    }
}

/// Port for querying the upstream price provider.
///
/// Implementations perform exactly one request per call, with no retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceFeedPort: Send + Sync {
    /// Fetch every symbol upstream currently lists as tradable.
    async fn coin_list(&self) -> Result<HashSet<Symbol>, UpstreamError>;

    /// Fetch the `fsym -> tsym -> rate` table for the given sets.
    async fn price_multi(
        &self,
        fsyms: &[Symbol],
        tsyms: &[Symbol],
    ) -> Result<RateTable, UpstreamError>;

    /// Fetch the price of one `fsym` in each of `tsyms`.
    async fn price_single(
        &self,
        fsym: &str,
        tsyms: &[Symbol],
    ) -> Result<BTreeMap<Symbol, f64>, UpstreamError>;
}
