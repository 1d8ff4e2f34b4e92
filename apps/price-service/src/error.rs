//! Startup errors.
//!
//! Anything that goes wrong here stops the process with a non-zero exit
//! code. Failures after startup are handled where they happen.

use crate::application::ports::UpstreamError;
use crate::infrastructure::config::ConfigError;
use crate::infrastructure::http::HttpServerError;

/// Fatal error while bringing the service up.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Configuration is missing or invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The upstream HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The first coin list fetch failed, so no symbol would be eligible.
    #[error("initial coin list refresh failed: {0}")]
    InitialRefresh(#[source] UpstreamError),

    /// The listener could not be bound.
    #[error(transparent)]
    Server(#[from] HttpServerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_cause() {
        let err = StartupError::from(ConfigError::MissingEnvVar("MANAGED_COINS".into()));
        assert_eq!(
            err.to_string(),
            "invalid configuration: missing required environment variable: MANAGED_COINS"
        );

        let err = StartupError::InitialRefresh(UpstreamError::Status { status: 503 });
        assert_eq!(
            err.to_string(),
            "initial coin list refresh failed: upstream returned HTTP 503"
        );
    }
}
