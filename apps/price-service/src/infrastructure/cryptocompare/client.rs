//! CryptoCompare HTTP client.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::Value;

use crate::application::ports::{PriceFeedPort, UpstreamError};
use crate::domain::pricing::RateTable;
use crate::domain::symbols::Symbol;
use crate::infrastructure::config::{ApiKey, UpstreamSettings};
use crate::infrastructure::metrics;

const COIN_LIST_PATH: &str = "/data/all/coinlist";
const PRICE_MULTI_PATH: &str = "/data/pricemulti";
const PRICE_PATH: &str = "/data/price";

/// Client for the CryptoCompare min-api.
///
/// Implements `PriceFeedPort`. One HTTP request per call, no retries.
#[derive(Debug, Clone)]
pub struct CryptoCompareClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<ApiKey>,
}

#[derive(Debug, Deserialize)]
struct CoinListResponse {
    #[serde(rename = "Data")]
    data: HashMap<Symbol, IgnoredAny>,
}

impl CryptoCompareClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(settings: &UpstreamSettings) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }

    /// GET a JSON document and decode it, recording latency and failures.
    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, UpstreamError> {
        let started = Instant::now();
        let result = self.fetch(path, query).await;
        metrics::record_upstream_duration(operation, started.elapsed());

        if let Err(e) = &result {
            metrics::record_upstream_error(operation, e.kind());
            tracing::debug!(operation, error = %e, "CryptoCompare request failed");
        }

        result
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self.http.get(&url).query(query);
        if let Some(key) = &self.api_key {
            request = request.header(
                reqwest::header::AUTHORIZATION,
                format!("Apikey {}", key.expose()),
            );
        }

        let response = request
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        let value: Value =
            serde_json::from_slice(&body).map_err(|e| UpstreamError::Malformed(e.to_string()))?;

        // Errors come back as 200 with {"Response":"Error","Message":...}
        if value.get("Response").and_then(Value::as_str) == Some("Error") {
            let message = value
                .get("Message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(UpstreamError::Api(message.to_string()));
        }

        serde_json::from_value(value).map_err(|e| UpstreamError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl PriceFeedPort for CryptoCompareClient {
    async fn coin_list(&self) -> Result<HashSet<Symbol>, UpstreamError> {
        let response: CoinListResponse = self.get_json("coin_list", COIN_LIST_PATH, &[]).await?;
        Ok(response.data.into_keys().collect())
    }

    async fn price_multi(
        &self,
        fsyms: &[Symbol],
        tsyms: &[Symbol],
    ) -> Result<RateTable, UpstreamError> {
        self.get_json(
            "price_multi",
            PRICE_MULTI_PATH,
            &[("fsyms", fsyms.join(",")), ("tsyms", tsyms.join(","))],
        )
        .await
    }

    async fn price_single(
        &self,
        fsym: &str,
        tsyms: &[Symbol],
    ) -> Result<BTreeMap<Symbol, f64>, UpstreamError> {
        self.get_json(
            "price",
            PRICE_PATH,
            &[("fsym", fsym.to_string()), ("tsyms", tsyms.join(","))],
        )
        .await
    }
}
