//! Recurring Job Port (Driver Port)
//!
//! Work units the scheduler triggers on a fixed interval.

use async_trait::async_trait;

use super::{StoreError, UpstreamError};

/// A failed job run. The scheduler logs it and waits for the next tick.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    /// Upstream call failed or returned unusable data.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Snapshot store rejected the write.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A job run repeatedly for the life of the process.
#[async_trait]
pub trait RecurringJob: Send + Sync {
    /// Stable name used in logs and metric labels.
    fn name(&self) -> &'static str;

    /// Run the job once.
    async fn run_once(&self) -> Result<(), JobError>;
}
