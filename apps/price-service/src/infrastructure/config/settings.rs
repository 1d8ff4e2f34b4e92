//! Service Configuration Settings
//!
//! Configuration types for the price service, loaded from environment variables.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::symbols::{ManagedSymbols, parse_symbol_list};

/// Default CryptoCompare API root.
pub const DEFAULT_CRYPTOCOMPARE_BASE_URL: &str = "https://min-api.cryptocompare.com";

/// CryptoCompare API key.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a raw key.
    #[must_use]
    pub const fn new(key: String) -> Self {
        Self(key)
    }

    /// The raw key.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Listen port.
    pub port: u16,
    /// Listen address.
    pub bind_addr: IpAddr,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 3000,
            bind_addr: IpAddr::from([0, 0, 0, 0]),
        }
    }
}

/// Background refresh intervals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSettings {
    /// How often the upstream coin list is refetched.
    pub coin_list_interval: Duration,
    /// How often a price snapshot is captured.
    pub coin_data_interval: Duration,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            coin_list_interval: Duration::from_secs(60 * 60),
            coin_data_interval: Duration::from_secs(60),
        }
    }
}

/// Upstream API settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamSettings {
    /// API root, without trailing slash.
    pub base_url: String,
    /// Optional API key.
    pub api_key: Option<ApiKey>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CRYPTOCOMPARE_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// HTTP listener settings.
    pub server: ServerSettings,
    /// Refresh intervals.
    pub schedule: ScheduleSettings,
    /// Upstream API settings.
    pub upstream: UpstreamSettings,
    /// Symbols this service quotes.
    pub managed_coins: ManagedSymbols,
}

impl ServiceConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the managed coins are missing or a value is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ServiceConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = ServerSettings::default();
        let server = ServerSettings {
            port: parse_or(&lookup, "PRICE_SERVICE_PORT", defaults.port),
            bind_addr: match lookup("PRICE_SERVICE_BIND_ADDR") {
                Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "PRICE_SERVICE_BIND_ADDR".to_string(),
                    reason: format!("'{raw}' is not an IP address"),
                })?,
                None => defaults.bind_addr,
            },
        };

        let defaults = ScheduleSettings::default();
        let schedule = ScheduleSettings {
            coin_list_interval: parse_interval(
                &lookup,
                "COIN_LIST_FETCH_INTERVAL_MS",
                defaults.coin_list_interval,
            )?,
            coin_data_interval: parse_interval(
                &lookup,
                "COIN_DATA_FETCH_INTERVAL_MS",
                defaults.coin_data_interval,
            )?,
        };

        let defaults = UpstreamSettings::default();
        let upstream = UpstreamSettings {
            base_url: lookup("CRYPTOCOMPARE_BASE_URL")
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or(defaults.base_url),
            api_key: lookup("CRYPTOCOMPARE_API_KEY")
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty())
                .map(ApiKey::new),
            timeout: parse_interval(&lookup, "UPSTREAM_TIMEOUT_MS", defaults.timeout)?,
        };

        let managed_coins = load_managed_coins(&lookup)?;

        Ok(Self {
            server,
            schedule,
            upstream,
            managed_coins,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),

    /// Environment variable cannot be used.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Managed coins file cannot be read or parsed.
    #[error("cannot load managed coins from {}: {reason}", .path.display())]
    CoinsFile {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        reason: String,
    },
}

fn load_managed_coins(
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<ManagedSymbols, ConfigError> {
    let (source, symbols) = if let Some(csv) = lookup("MANAGED_COINS") {
        ("MANAGED_COINS", parse_symbol_list(Some(&csv)))
    } else if let Some(path) = lookup("MANAGED_COINS_FILE") {
        ("MANAGED_COINS_FILE", read_coins_file(PathBuf::from(path))?)
    } else {
        return Err(ConfigError::MissingEnvVar("MANAGED_COINS".to_string()));
    };

    let managed = ManagedSymbols::new(symbols);
    if managed.is_empty() {
        return Err(ConfigError::EmptyValue(source.to_string()));
    }

    Ok(managed)
}

fn read_coins_file(path: PathBuf) -> Result<Vec<String>, ConfigError> {
    let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::CoinsFile {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    serde_json::from_str(&raw).map_err(|e| ConfigError::CoinsFile {
        path,
        reason: e.to_string(),
    })
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_interval(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match parse_or(lookup, key, u64::try_from(default.as_millis()).unwrap_or(u64::MAX)) {
        0 => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            reason: "interval must be greater than zero".to_string(),
        }),
        millis => Ok(Duration::from_millis(millis)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write as _;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_with_managed_coins() {
        let config = config(&[("MANAGED_COINS", "BTC,ETH,USD")]).unwrap();

        assert_eq!(config.server, ServerSettings::default());
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.schedule.coin_list_interval, Duration::from_millis(3_600_000));
        assert_eq!(config.schedule.coin_data_interval, Duration::from_millis(60_000));
        assert_eq!(config.upstream.base_url, DEFAULT_CRYPTOCOMPARE_BASE_URL);
        assert_eq!(config.upstream.api_key, None);
        assert_eq!(config.upstream.timeout, Duration::from_secs(10));
        assert_eq!(config.managed_coins.as_slice(), ["BTC", "ETH", "USD"]);
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("MANAGED_COINS", " BTC , ETH,,BTC "),
            ("PRICE_SERVICE_PORT", "8080"),
            ("PRICE_SERVICE_BIND_ADDR", "127.0.0.1"),
            ("COIN_LIST_FETCH_INTERVAL_MS", "5000"),
            ("COIN_DATA_FETCH_INTERVAL_MS", "250"),
            ("CRYPTOCOMPARE_BASE_URL", "http://localhost:9999/"),
            ("CRYPTOCOMPARE_API_KEY", "secret"),
            ("UPSTREAM_TIMEOUT_MS", "1500"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind_addr, IpAddr::from([127, 0, 0, 1]));
        assert_eq!(config.schedule.coin_list_interval, Duration::from_secs(5));
        assert_eq!(config.schedule.coin_data_interval, Duration::from_millis(250));
        assert_eq!(config.upstream.base_url, "http://localhost:9999");
        assert_eq!(
            config.upstream.api_key.as_ref().map(ApiKey::expose),
            Some("secret")
        );
        assert_eq!(config.upstream.timeout, Duration::from_millis(1500));
        assert_eq!(config.managed_coins.as_slice(), ["BTC", "ETH"]);
    }

    #[test]
    fn unparsable_numbers_fall_back_to_defaults() {
        let config = config(&[
            ("MANAGED_COINS", "BTC"),
            ("PRICE_SERVICE_PORT", "eighty"),
            ("COIN_DATA_FETCH_INTERVAL_MS", "-5"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.schedule.coin_data_interval, Duration::from_secs(60));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = config(&[("MANAGED_COINS", "BTC"), ("COIN_LIST_FETCH_INTERVAL_MS", "0")])
            .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, .. } if key == "COIN_LIST_FETCH_INTERVAL_MS"
        ));
    }

    #[test]
    fn invalid_bind_addr_is_rejected() {
        let err = config(&[("MANAGED_COINS", "BTC"), ("PRICE_SERVICE_BIND_ADDR", "localhost")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn missing_managed_coins() {
        let err = config(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "MANAGED_COINS"));
    }

    #[test]
    fn blank_managed_coins() {
        let err = config(&[("MANAGED_COINS", " , ,")]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyValue(_)));
    }

    #[test]
    fn managed_coins_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["BTC", "LTC", "USD"]"#).unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let config = config(&[("MANAGED_COINS_FILE", path.as_str())]).unwrap();
        assert_eq!(config.managed_coins.as_slice(), ["BTC", "LTC", "USD"]);
    }

    #[test]
    fn csv_takes_precedence_over_file() {
        let config = config(&[
            ("MANAGED_COINS", "ETH"),
            ("MANAGED_COINS_FILE", "/nonexistent/coins.json"),
        ])
        .unwrap();
        assert_eq!(config.managed_coins.as_slice(), ["ETH"]);
    }

    #[test]
    fn unreadable_coins_file() {
        let err = config(&[("MANAGED_COINS_FILE", "/nonexistent/coins.json")]).unwrap_err();
        assert!(matches!(err, ConfigError::CoinsFile { .. }));
    }

    #[test]
    fn malformed_coins_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "BTC,ETH").unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let err = config(&[("MANAGED_COINS_FILE", path.as_str())]).unwrap_err();
        assert!(matches!(err, ConfigError::CoinsFile { .. }));
    }

    #[test]
    fn api_key_redacted_debug() {
        let config = config(&[("MANAGED_COINS", "BTC"), ("CRYPTOCOMPARE_API_KEY", "key123")])
            .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("key123"));
        assert!(debug.contains("[REDACTED]"));
    }
}
