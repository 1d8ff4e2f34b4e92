//! Health Check and Metrics Endpoint
//!
//! HTTP routes for health checks, symbol and snapshot status reporting, and
//! Prometheus metrics. Used by container orchestrators, load balancers, and
//! monitoring systems.
//!
//! # Endpoints
//!
//! - `GET /health` - Returns JSON health status
//! - `GET /healthz` - Kubernetes liveness probe (simple OK)
//! - `GET /readyz` - Kubernetes readiness probe (checks eligible symbols)
//! - `GET /metrics` - Prometheus metrics in text format

use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::ports::SnapshotStore;
use crate::domain::symbols::SymbolRegistry;
use crate::infrastructure::metrics::{get_metrics_handle, set_snapshots_stored, set_symbol_counts};

// =============================================================================
// Health Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy", "degraded", or "unhealthy".
    pub status: HealthStatus,
    /// Service version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Symbol set sizes.
    pub symbols: SymbolStatus,
    /// Snapshot store status.
    pub snapshots: SnapshotStatus,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Live and fallback paths both usable.
    Healthy,
    /// Live path only; no snapshot to fall back on yet.
    Degraded,
    /// No eligible symbols; every query is rejected.
    Unhealthy,
}

/// Symbol set sizes.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolStatus {
    /// Configured symbols.
    pub managed: usize,
    /// Symbols upstream lists as tradable.
    pub supported: usize,
    /// Managed symbols that are supported.
    pub eligible: usize,
}

/// Snapshot store status.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotStatus {
    /// Snapshots held.
    pub stored: usize,
    /// Sequence number of the latest snapshot.
    pub latest_sequence: Option<u64>,
    /// Capture time of the latest snapshot.
    pub latest_captured_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Health State
// =============================================================================

/// Shared state for the health routes.
pub struct HealthState {
    version: String,
    started_at: Instant,
    registry: Arc<SymbolRegistry>,
    store: Arc<dyn SnapshotStore>,
}

impl HealthState {
    /// Create new health state.
    #[must_use]
    pub fn new(
        version: String,
        registry: Arc<SymbolRegistry>,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            version,
            started_at: Instant::now(),
            registry,
            store,
        }
    }
}

/// Health, readiness and metrics routes.
#[must_use]
pub fn routes(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/readyz", get(readiness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

// =============================================================================
// HTTP Handlers
// =============================================================================

async fn health_handler(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let response = build_health_response(&state).await;
    let status_code = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(response))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness_handler(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    if state.registry.eligible_symbols().is_empty() {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    } else {
        (StatusCode::OK, "READY")
    }
}

async fn metrics_handler(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let Some(handle) = get_metrics_handle() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            [("content-type", "text/plain")],
            "Metrics not initialized".to_string(),
        );
    };

    set_symbol_counts(
        state.registry.supported_count(),
        state.registry.eligible_symbols().len(),
    );
    if let Ok(stored) = state.store.count().await {
        set_snapshots_stored(stored);
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        handle.render(),
    )
}

async fn build_health_response(state: &HealthState) -> HealthResponse {
    let eligible = state.registry.eligible_symbols().len();
    let symbols = SymbolStatus {
        managed: state.registry.managed().len(),
        supported: state.registry.supported_count(),
        eligible,
    };

    let latest = match state.store.latest().await {
        Ok(latest) => latest,
        Err(e) => {
            tracing::warn!(error = %e, "Snapshot store unreadable during health check");
            None
        }
    };
    let snapshots = SnapshotStatus {
        stored: state.store.count().await.unwrap_or(0),
        latest_sequence: latest.as_ref().map(|s| s.sequence()),
        latest_captured_at: latest.as_ref().map(|s| s.captured_at()),
    };

    HealthResponse {
        status: determine_health_status(eligible, latest.is_some()),
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        symbols,
        snapshots,
    }
}

const fn determine_health_status(eligible: usize, has_snapshot: bool) -> HealthStatus {
    match (eligible, has_snapshot) {
        (0, _) => HealthStatus::Unhealthy,
        (_, false) => HealthStatus::Degraded,
        (_, true) => HealthStatus::Healthy,
    }
}

// =============================================================================
// Tests
// =============================================================================
