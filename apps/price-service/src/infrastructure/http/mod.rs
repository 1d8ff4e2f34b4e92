//! HTTP/JSON price API.
//!
//! # Endpoints
//!
//! - `GET /service/price?fsyms=&tsyms=` - live rates, snapshot fallback
//! - `GET /service/localprice?fsyms=&tsyms=` - snapshot rates only
//!
//! Health and metrics routes are merged in from the health module.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::application::services::{PriceResolver, Resolution, ResolveError};
use crate::domain::pricing::RateTable;
use crate::domain::symbols::parse_symbol_list;
use crate::infrastructure::health::{self, HealthState};
use crate::infrastructure::metrics::{self, Endpoint};

/// Query string of both price endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PriceQuery {
    /// Comma-separated source symbols.
    pub fsyms: Option<String>,
    /// Comma-separated target symbols.
    pub tsyms: Option<String>,
}

/// Successful price response.
#[derive(Debug, Serialize)]
pub struct PriceData {
    /// The `fsym -> tsym -> rate` table.
    pub data: RateTable,
}

/// Error payload, `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Error message.
    pub error: &'static str,
}

/// API error type.
#[derive(Debug)]
pub struct ApiError(ResolveError);

impl From<ResolveError> for ApiError {
    fn from(error: ResolveError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        // Existing clients expect 200 for unhandled coins.
        let (status, error) = match self.0 {
            ResolveError::NoCoinsHandled => (StatusCode::OK, "coin not handled"),
            ResolveError::StaleDataUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "price data unavailable")
            }
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}

/// Create the Axum router with the price and health endpoints.
#[must_use]
pub fn create_router(resolver: Arc<PriceResolver>, health: Arc<HealthState>) -> Router {
    Router::new()
        .route("/service/price", get(price))
        .route("/service/localprice", get(local_price))
        .with_state(resolver)
        .merge(health::routes(health))
}

async fn price(
    State(resolver): State<Arc<PriceResolver>>,
    Query(query): Query<PriceQuery>,
) -> Result<Json<PriceData>, ApiError> {
    let fsyms = parse_symbol_list(query.fsyms.as_deref());
    let tsyms = parse_symbol_list(query.tsyms.as_deref());

    let result = resolver.resolve(&fsyms, &tsyms).await;
    respond(Endpoint::Price, result)
}

async fn local_price(
    State(resolver): State<Arc<PriceResolver>>,
    Query(query): Query<PriceQuery>,
) -> Result<Json<PriceData>, ApiError> {
    let fsyms = parse_symbol_list(query.fsyms.as_deref());
    let tsyms = parse_symbol_list(query.tsyms.as_deref());

    let result = resolver.resolve_local(&fsyms, &tsyms).await;
    respond(Endpoint::LocalPrice, result)
}

fn respond(
    endpoint: Endpoint,
    result: Result<Resolution, ResolveError>,
) -> Result<Json<PriceData>, ApiError> {
    match result {
        Ok(resolution) => {
            metrics::record_request(endpoint, resolution.source.as_str());
            Ok(Json(PriceData {
                data: resolution.table,
            }))
        }
        Err(e) => {
            let outcome = match &e {
                ResolveError::NoCoinsHandled => "not_handled",
                ResolveError::StaleDataUnavailable(reason) => {
                    tracing::warn!(
                        endpoint = endpoint.as_str(),
                        reason = %reason,
                        "Price data unavailable"
                    );
                    "unavailable"
                }
            };
            metrics::record_request(endpoint, outcome);
            Err(e.into())
        }
    }
}

// =============================================================================
// Server
// =============================================================================

/// HTTP server bound to its listener.
pub struct HttpServer {
    listener: TcpListener,
    router: Router,
    cancel: CancellationToken,
}

impl HttpServer {
    /// Bind the listener.
    ///
    /// # Errors
    ///
    /// Returns `HttpServerError::BindFailed` if the address cannot be bound.
    pub async fn bind(
        addr: SocketAddr,
        router: Router,
        cancel: CancellationToken,
    ) -> Result<Self, HttpServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HttpServerError::BindFailed(addr, e.to_string()))?;

        Ok(Self {
            listener,
            router,
            cancel,
        })
    }

    /// Address actually bound, useful when binding port 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be read.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until cancelled, then drain in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns `HttpServerError::ServerFailed` on a fatal server error.
    pub async fn run(self) -> Result<(), HttpServerError> {
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!(%addr, "HTTP server listening");
        }

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HttpServerError::ServerFailed(e.to_string()))?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// HTTP server errors.
#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    /// Failed to bind the listen address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(SocketAddr, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_handled_is_200_with_error_body() {
        let (status, json) = body_json(ResolveError::NoCoinsHandled.into()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({ "error": "coin not handled" }));
    }

    #[tokio::test]
    async fn stale_data_is_503_without_internal_detail() {
        let (status, json) =
            body_json(ResolveError::StaleDataUnavailable("no snapshot".into()).into()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json, serde_json::json!({ "error": "price data unavailable" }));
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let cancel = CancellationToken::new();
        let first = HttpServer::bind(([127, 0, 0, 1], 0).into(), Router::new(), cancel.clone())
            .await
            .unwrap();
        let taken = first.local_addr().unwrap();

        let second = HttpServer::bind(taken, Router::new(), cancel).await;
        assert!(matches!(second, Err(HttpServerError::BindFailed(addr, _)) if addr == taken));
    }
}
