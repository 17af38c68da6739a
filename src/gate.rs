//! Authorization gate in front of the proxy chain.
//!
//! [`AuthorizationGate`] is the pluggable decision point. [`authorize`] is
//! the axum middleware that consults it: on [`Decision::Allow`] the proxy
//! chain runs, on [`Decision::Deny`] the gate's response is returned and
//! nothing is forwarded.
//!
//! Two policies ship with the crate: [`OpenGate`] lets everything through
//! and [`BasicAuthGate`] enforces HTTP Basic credentials.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::config::GateSettings;
use crate::server::AppState;

pub enum Decision {
    Allow,
    Deny(Response),
}

// async_trait is required here because the gate is held as Arc<dyn AuthorizationGate>
// and native async fn in traits does not support dyn dispatch.
#[async_trait]
pub trait AuthorizationGate: Send + Sync {
    fn name(&self) -> &'static str;
    async fn authorize(&self, parts: &Parts) -> Decision;
}

#[must_use]
pub fn from_settings(settings: &GateSettings) -> Arc<dyn AuthorizationGate> {
    match settings {
        GateSettings::Open => Arc::new(OpenGate),
        GateSettings::Basic { username, password } => {
            Arc::new(BasicAuthGate::new(username, password))
        }
    }
}

pub async fn authorize(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();

    match state.gate.authorize(&parts).await {
        Decision::Allow => next.run(Request::from_parts(parts, body)).await,
        Decision::Deny(response) => {
            state.stats.denied.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                gate = state.gate.name(),
                method = %parts.method,
                path = %parts.uri.path(),
                status = response.status().as_u16(),
                "request denied"
            );
            response
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGate;

#[async_trait]
impl AuthorizationGate for OpenGate {
    fn name(&self) -> &'static str {
        "open"
    }

    async fn authorize(&self, _parts: &Parts) -> Decision {
        Decision::Allow
    }
}

/// HTTP Basic auth (RFC 7617) against a single configured account.
///
/// Only SHA-256 digests of the expected credentials are kept.
pub struct BasicAuthGate {
    username_digest: [u8; 32],
    password_digest: [u8; 32],
}

impl BasicAuthGate {
    #[must_use]
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username_digest: digest(username),
            password_digest: digest(password),
        }
    }

    fn check(&self, parts: &Parts) -> bool {
        let Some((user, pass)) = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().split_once(' '))
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("basic"))
            .and_then(|(_, encoded)| STANDARD.decode(encoded.trim()).ok())
            .and_then(|decoded| String::from_utf8(decoded).ok())
            .and_then(|decoded| {
                decoded
                    .split_once(':')
                    .map(|(u, p)| (u.to_string(), p.to_string()))
            })
        else {
            return false;
        };

        // Evaluate both comparisons so a wrong username costs the same as a wrong password.
        let user_ok = digest(&user) == self.username_digest;
        let pass_ok = digest(&pass) == self.password_digest;
        user_ok & pass_ok
    }
}

#[async_trait]
impl AuthorizationGate for BasicAuthGate {
    fn name(&self) -> &'static str {
        "basic"
    }

    async fn authorize(&self, parts: &Parts) -> Decision {
        if self.check(parts) {
            Decision::Allow
        } else {
            Decision::Deny(
                (
                    StatusCode::UNAUTHORIZED,
                    [(header::WWW_AUTHENTICATE, "Basic realm=\"credgate\"")],
                )
                    .into_response(),
            )
        }
    }
}

fn digest(input: &str) -> [u8; 32] {
    Sha256::digest(input.as_bytes()).into()
}
