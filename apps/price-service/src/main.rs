//! Price Service Binary
//!
//! Starts the crypto price service.
//!
//! # Usage
//!
//! ```bash
//! MANAGED_COINS=BTC,ETH,USD,EUR cargo run --bin price-service
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `MANAGED_COINS`: Comma-separated symbols to quote, or
//! - `MANAGED_COINS_FILE`: Path to a JSON array of symbols
//!
//! ## Optional
//! - `PRICE_SERVICE_PORT`: HTTP port (default: 3000)
//! - `PRICE_SERVICE_BIND_ADDR`: HTTP listen address (default: 0.0.0.0)
//! - `COIN_LIST_FETCH_INTERVAL_MS`: Coin list refresh period (default: 3600000)
//! - `COIN_DATA_FETCH_INTERVAL_MS`: Snapshot period (default: 60000)
//! - `CRYPTOCOMPARE_BASE_URL`: API root (default: <https://min-api.cryptocompare.com>)
//! - `CRYPTOCOMPARE_API_KEY`: API key
//! - `UPSTREAM_TIMEOUT_MS`: Upstream request timeout (default: 10000)
//! - `OTEL_ENABLED`: Enable OpenTelemetry export (default: false)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: price-service)
//! - `RUST_LOG`: Log level (default: info)

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use price_service::infrastructure::telemetry;
use price_service::{
    CatalogRefresher, CryptoCompareClient, FirstRun, HealthState, HttpServer,
    InMemorySnapshotStore, PriceFeedPort, PriceResolver, RecurringTask, ServiceConfig,
    SnapshotRefresher, SnapshotStore, StartupError, SymbolRegistry, create_router, init_metrics,
};
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();

    // Initialize telemetry (OpenTelemetry + tracing)
    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting price service");

    match run().await {
        Ok(()) => {
            tracing::info!("Price service stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Price service failed to start");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    // Initialize Prometheus metrics
    if let Err(e) = init_metrics() {
        tracing::warn!(error = %e, "Prometheus recorder not installed, /metrics disabled");
    }

    let config = ServiceConfig::from_env()?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    let feed: Arc<dyn PriceFeedPort> = Arc::new(CryptoCompareClient::new(&config.upstream)?);

    // Nothing is eligible until the first coin list arrives
    let registry = Arc::new(SymbolRegistry::new(config.managed_coins.clone()));
    let catalog = Arc::new(CatalogRefresher::new(
        Arc::clone(&registry),
        Arc::clone(&feed),
    ));
    catalog
        .refresh()
        .await
        .map_err(StartupError::InitialRefresh)?;

    let store: Arc<dyn SnapshotStore> = Arc::new(InMemorySnapshotStore::new());

    let resolver = Arc::new(PriceResolver::new(
        Arc::clone(&registry),
        Arc::clone(&feed),
        Arc::clone(&store),
    ));
    let health_state = Arc::new(HealthState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        Arc::clone(&registry),
        Arc::clone(&store),
    ));

    let addr = SocketAddr::new(config.server.bind_addr, config.server.port);
    let server = HttpServer::bind(
        addr,
        create_router(resolver, health_state),
        shutdown_token.clone(),
    )
    .await?;

    // Spawn HTTP server
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            tracing::error!(error = %e, "HTTP server error");
        }
    });

    // Spawn recurring refreshes
    let snapshot_job = Arc::new(SnapshotRefresher::new(
        Arc::clone(&registry),
        Arc::clone(&feed),
        Arc::clone(&store),
    ));
    let snapshot_handle = RecurringTask::new(
        snapshot_job,
        config.schedule.coin_data_interval,
        FirstRun::Immediately,
        shutdown_token.clone(),
    )
    .spawn();

    let catalog_handle = RecurringTask::new(
        catalog,
        config.schedule.coin_list_interval,
        FirstRun::AfterPeriod,
        shutdown_token.clone(),
    )
    .spawn();

    tracing::info!("Price service ready");

    await_shutdown(shutdown_token).await;

    drain([server_handle, snapshot_handle, catalog_handle]).await;
    Ok(())
}

/// Wait for background tasks to finish, up to the shutdown timeout.
async fn drain(handles: [JoinHandle<()>; 3]) {
    let all = async {
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Background task panicked");
            }
        }
    };

    if tokio::time::timeout(SHUTDOWN_TIMEOUT, all).await.is_err() {
        tracing::warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Shutdown timed out with tasks still running"
        );
    }
}

/// Log the parsed configuration.
fn log_config(config: &ServiceConfig) {
    tracing::info!(
        bind_addr = %config.server.bind_addr,
        port = config.server.port,
        managed_coins = config.managed_coins.len(),
        coin_list_interval_ms = config.schedule.coin_list_interval.as_millis(),
        coin_data_interval_ms = config.schedule.coin_data_interval.as_millis(),
        "Configuration loaded"
    );
    tracing::debug!(
        base_url = %config.upstream.base_url,
        api_key = config.upstream.api_key.is_some(),
        timeout_ms = config.upstream.timeout.as_millis(),
        "Upstream settings"
    );
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
