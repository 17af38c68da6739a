//! Serde data structures for the optional settings file.
//!
//! Every field is optional so the same [`Settings`] type can carry values
//! from the file, from CLI flags, or from both merged together. Unknown
//! fields are rejected.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_separator: Option<char>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure_skip_verify: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_timeout_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_body: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "AuthSettings::is_default")]
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl AuthSettings {
    fn is_default(&self) -> bool {
        self.username.is_none() && self.password.is_none()
    }
}

impl Settings {
    /// Overlay `overrides` on top of `self`; any value set in `overrides` wins.
    #[must_use]
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            host: overrides.host.or(self.host),
            port: overrides.port.or(self.port),
            upstream: overrides.upstream.or(self.upstream),
            namespace: overrides.namespace.or(self.namespace),
            credential: overrides.credential.or(self.credential),
            credential_separator: overrides.credential_separator.or(self.credential_separator),
            insecure_skip_verify: overrides.insecure_skip_verify.or(self.insecure_skip_verify),
            upstream_timeout_ms: overrides.upstream_timeout_ms.or(self.upstream_timeout_ms),
            max_body: overrides.max_body.or(self.max_body),
            assets_dir: overrides.assets_dir.or(self.assets_dir),
            auth: AuthSettings {
                username: overrides.auth.username.or(self.auth.username),
                password: overrides.auth.password.or(self.auth.password),
            },
        }
    }
}
