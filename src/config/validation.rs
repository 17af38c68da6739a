//! Gate settings validation and the human-readable config report.

use super::model::AuthSettings;
use super::{GateSettings, GatewayConfig};
use crate::error::ConfigError;

/// Username and password must be given together and be non-empty.
/// Neither given selects the open gate.
pub fn gate_settings(auth: AuthSettings) -> Result<GateSettings, ConfigError> {
    match (auth.username, auth.password) {
        (None, None) => Ok(GateSettings::Open),
        (Some(u), Some(p)) => {
            if u.is_empty() {
                Err(ConfigError::IncompleteAuth(
                    "username cannot be empty when auth is configured".into(),
                ))
            } else if p.is_empty() {
                Err(ConfigError::IncompleteAuth(
                    "password cannot be empty when auth is configured".into(),
                ))
            } else {
                Ok(GateSettings::Basic {
                    username: u,
                    password: p,
                })
            }
        }
        (Some(_), None) => Err(ConfigError::IncompleteAuth(
            "password is required when username is set".into(),
        )),
        (None, Some(_)) => Err(ConfigError::IncompleteAuth(
            "username is required when password is set".into(),
        )),
    }
}

#[must_use]
pub fn format_report(config: &GatewayConfig) -> String {
    let gate = match &config.gate {
        GateSettings::Open => "open (no authentication)".to_string(),
        GateSettings::Basic { username, .. } => format!("basic auth (user '{username}')"),
    };
    let timeout = config
        .upstream_timeout
        .map_or_else(|| "none".to_string(), |t| format!("{}ms", t.as_millis()));
    let max_body = config
        .max_body
        .map_or_else(|| "unlimited".to_string(), |b| format!("{b} bytes"));
    let assets = config
        .assets_dir
        .as_ref()
        .map_or_else(|| "disabled".to_string(), |d| d.display().to_string());

    let lines = [
        format!("  listen:      {}", config.listen_addr()),
        format!("  upstream:    {}", config.upstream.url()),
        format!("  namespace:   {}", config.namespace),
        format!("  credential:  {}=<redacted>", config.credential.name),
        format!(
            "  tls verify:  {}",
            if config.tls_verify { "on" } else { "OFF (insecure)" }
        ),
        format!("  timeout:     {timeout}"),
        format!("  max body:    {max_body}"),
        format!("  assets:      {assets}"),
        format!("  gate:        {gate}"),
    ];

    format!("configuration is valid\n{}", lines.join("\n"))
}
