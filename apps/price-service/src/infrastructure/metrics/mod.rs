//! Prometheus Metrics Module
//!
//! Exposes service metrics in Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Requests**: Price queries by endpoint and outcome
//! - **Upstream**: CryptoCompare call latency and failures
//! - **Jobs**: Coin list and snapshot refresh runs
//! - **State**: Supported/eligible symbol counts and stored snapshots
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the service port.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Calling it again returns the handle installed by the first call.
///
/// # Errors
///
/// Returns an error if the recorder cannot be installed, for example when
/// another global recorder is already set.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();

    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    // Request counters
    describe_counter!(
        "price_service_requests_total",
        "Price queries by endpoint and outcome"
    );

    // Upstream
    describe_counter!(
        "price_service_upstream_errors_total",
        "Failed CryptoCompare calls by operation and error kind"
    );
    describe_histogram!(
        "price_service_upstream_request_seconds",
        "CryptoCompare request latency by operation"
    );

    // Jobs
    describe_counter!(
        "price_service_job_runs_total",
        "Recurring job runs by job and result"
    );

    // State gauges
    describe_gauge!(
        "price_service_supported_symbols",
        "Symbols upstream currently lists as tradable"
    );
    describe_gauge!(
        "price_service_eligible_symbols",
        "Managed symbols that are currently supported"
    );
    describe_gauge!(
        "price_service_snapshots_stored",
        "Price snapshots held in the store"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Price query endpoint label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `/service/price`, live first.
    Price,
    /// `/service/localprice`, snapshots only.
    LocalPrice,
}

impl Endpoint {
    /// Label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::LocalPrice => "localprice",
        }
    }
}

/// Record a completed price query.
///
/// `outcome` is one of `live`, `fallback`, `not_handled`, `unavailable`.
pub fn record_request(endpoint: Endpoint, outcome: &'static str) {
    counter!(
        "price_service_requests_total",
        "endpoint" => endpoint.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record the latency of one upstream call.
pub fn record_upstream_duration(operation: &'static str, duration: Duration) {
    histogram!(
        "price_service_upstream_request_seconds",
        "operation" => operation
    )
    .record(duration.as_secs_f64());
}

/// Record a failed upstream call.
pub fn record_upstream_error(operation: &'static str, kind: &'static str) {
    counter!(
        "price_service_upstream_errors_total",
        "operation" => operation,
        "kind" => kind
    )
    .increment(1);
}

/// Record one recurring job run.
pub fn record_job_run(job: &'static str, success: bool) {
    counter!(
        "price_service_job_runs_total",
        "job" => job,
        "result" => if success { "ok" } else { "error" }
    )
    .increment(1);
}

/// Update the symbol count gauges.
#[allow(clippy::cast_precision_loss)]
pub fn set_symbol_counts(supported: usize, eligible: usize) {
    gauge!("price_service_supported_symbols").set(supported as f64);
    gauge!("price_service_eligible_symbols").set(eligible as f64);
}

/// Update the stored snapshot gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_snapshots_stored(count: usize) {
    gauge!("price_service_snapshots_stored").set(count as f64);
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_as_str() {
        assert_eq!(Endpoint::Price.as_str(), "price");
        assert_eq!(Endpoint::LocalPrice.as_str(), "localprice");
    }

    #[test]
    fn recording_without_recorder_is_noop() {
        record_request(Endpoint::Price, "live");
        record_upstream_error("coin_list", "network");
        record_job_run("coin_data", false);
        set_symbol_counts(10, 3);
        set_snapshots_stored(1);
    }
}
