//! Startup configuration.
//!
//! [`Settings`] collects raw values from CLI flags, environment variables
//! and an optional settings file. [`GatewayConfig::resolve`] turns them into
//! the immutable configuration every component reads. All failures here are
//! startup-fatal: nothing is served from a config that did not resolve.

mod credential;
pub mod model;
pub mod sources;
pub mod validation;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub use credential::{Credential, CREDENTIAL_SEPARATOR};
pub use model::{AuthSettings, Settings};

use crate::error::ConfigError;
use crate::proxy::target::UpstreamTarget;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_UPSTREAM: &str = "https://demo.slashdb.com";
pub const DEFAULT_NAMESPACE: &str = "timesheet";
pub const DEFAULT_CREDENTIAL: &str = "apikey:timesheet-api-key";

#[derive(Clone, PartialEq, Eq)]
pub enum GateSettings {
    Open,
    Basic { username: String, password: String },
}

impl fmt::Debug for GateSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("Open"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub listen_host: String,
    pub listen_port: u16,
    pub upstream: UpstreamTarget,
    /// Database name on the upstream. Informational only.
    pub namespace: String,
    pub credential: Credential,
    pub tls_verify: bool,
    pub upstream_timeout: Option<Duration>,
    pub max_body: Option<usize>,
    pub assets_dir: Option<PathBuf>,
    pub gate: GateSettings,
}

impl GatewayConfig {
    pub fn resolve(settings: Settings) -> Result<Self, ConfigError> {
        let separator = settings.credential_separator.unwrap_or(CREDENTIAL_SEPARATOR);
        let credential = Credential::parse(
            settings.credential.as_deref().unwrap_or(DEFAULT_CREDENTIAL),
            separator,
        )?;

        let upstream =
            UpstreamTarget::resolve(settings.upstream.as_deref().unwrap_or(DEFAULT_UPSTREAM))?;

        let gate = validation::gate_settings(settings.auth)?;

        Ok(Self {
            listen_host: settings.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            listen_port: settings.port.unwrap_or(DEFAULT_PORT),
            upstream,
            namespace: settings
                .namespace
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            credential,
            tls_verify: !settings.insecure_skip_verify.unwrap_or(false),
            upstream_timeout: settings.upstream_timeout_ms.map(Duration::from_millis),
            max_body: settings.max_body,
            assets_dir: settings.assets_dir,
            gate,
        })
    }

    /// `host:port` string accepted by `TcpListener::bind` (host names resolve).
    #[must_use]
    pub fn listen_addr(&self) -> String {
        if self.listen_host.contains(':') && !self.listen_host.starts_with('[') {
            format!("[{}]:{}", self.listen_host, self.listen_port)
        } else {
            format!("{}:{}", self.listen_host, self.listen_port)
        }
    }

    /// Log the startup warnings for risky but permitted settings.
    pub fn warn_risky_settings(&self) {
        if !self.tls_verify {
            tracing::warn!(
                upstream = %self.upstream.url(),
                "upstream TLS certificate verification is DISABLED; any certificate will be accepted"
            );
        }
        if self.gate == GateSettings::Open {
            tracing::warn!("no gate credentials configured; proxy accepts unauthenticated requests");
        }
        if self.credential.name.is_empty() {
            tracing::warn!("credential parameter name is empty");
        }
        if self.upstream.has_base_path() {
            tracing::warn!(
                upstream = %self.upstream.url(),
                "upstream address path is ignored; requests keep their own path"
            );
        }
    }
}
