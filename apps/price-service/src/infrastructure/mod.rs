//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer.

/// CryptoCompare HTTP client adapter.
pub mod cryptocompare;

/// Snapshot store adapters.
pub mod persistence;

/// Recurring background tasks.
pub mod scheduler;

/// Price query HTTP API and server.
pub mod http;

/// Configuration loading.
pub mod config;

/// Health check HTTP routes.
pub mod health;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// OpenTelemetry tracing integration.
pub mod telemetry;
