//! Unified error types for credgate.
//!
//! [`ConfigError`] covers the startup-fatal configuration failures,
//! [`GatewayError`] is the crate-level error returned by the subcommands,
//! and [`ProxyError`] is the per-request forwarding failure that is turned
//! into a 5xx response instead of propagating.

use std::path::PathBuf;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error(
        "Malformed credential: expected 'name{separator}value' with exactly one '{separator}', found {occurrences}"
    )]
    MalformedCredential { separator: char, occurrences: usize },

    #[error("Invalid upstream address '{address}': {reason}")]
    InvalidUpstream { address: String, reason: String },

    #[error("Incomplete gate credentials: {0}")]
    IncompleteAuth(String),
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Settings file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("Settings parse error in {path}:\n  {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Unsupported settings format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Health check failed with status {0}")]
    HealthCheckFailed(hyper::StatusCode),
}

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("could not build upstream URI: {0}")]
    InvalidUri(#[from] http::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl ProxyError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::InvalidUri(_) | Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        self.status().into_response()
    }
}
