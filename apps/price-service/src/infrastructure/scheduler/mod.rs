//! Recurring Task Scheduler
//!
//! Runs a [`RecurringJob`] on a fixed period until cancelled. A failed run
//! is logged and counted; the task keeps ticking.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::application::ports::RecurringJob;
use crate::infrastructure::metrics;

/// When the first run happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstRun {
    /// Run as soon as the task starts.
    Immediately,
    /// Wait one full period first.
    AfterPeriod,
}

/// A job bound to a period and a cancellation token.
pub struct RecurringTask {
    job: Arc<dyn RecurringJob>,
    period: Duration,
    first_run: FirstRun,
    cancel: CancellationToken,
}

impl RecurringTask {
    /// Create a new recurring task.
    #[must_use]
    pub fn new(
        job: Arc<dyn RecurringJob>,
        period: Duration,
        first_run: FirstRun,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            job,
            period,
            first_run,
            cancel,
        }
    }

    /// Spawn the task onto the runtime.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run the loop until cancelled.
    pub async fn run(self) {
        let start = match self.first_run {
            FirstRun::Immediately => Instant::now(),
            FirstRun::AfterPeriod => Instant::now() + self.period,
        };
        let mut interval = tokio::time::interval_at(start, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let job = self.job.name();
        tracing::info!(job, period_ms = self.period.as_millis(), "Recurring task started");

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::info!(job, "Recurring task stopped");
                    break;
                }
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    async fn tick(&self) {
        let job = self.job.name();
        match self.job.run_once().await {
            Ok(()) => {
                metrics::record_job_run(job, true);
                tracing::debug!(job, "Job run completed");
            }
            Err(e) => {
                metrics::record_job_run(job, false);
                tracing::warn!(job, error = %e, "Job run failed, waiting for next period");
            }
        }
    }
}
