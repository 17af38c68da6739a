//! Core HTTP forwarding handler.
//!
//! [`forward_handler`] runs behind the authorization gate for every path
//! not served locally. It injects the credential ([`rewrite`]), points the
//! request at the upstream ([`target`]), prepares headers ([`headers`]) and
//! streams the exchange through [`transport`]. CORS headers are added by
//! [`cors`] as a response layer around this handler.

pub mod cors;
pub mod headers;
pub mod rewrite;
pub mod target;
pub mod transport;

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};

use crate::error::ProxyError;
use crate::server::AppState;

pub async fn forward_handler(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let (mut parts, body) = request.into_parts();

    let correlation_id = parts
        .headers
        .get(headers::CORRELATION_ID)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);
    let method = parts.method.clone();
    let path = parts.uri.path().to_string();

    tracing::info!(
        correlation_id = %correlation_id,
        method = %method,
        path = %path,
        "request received"
    );

    if let Err(e) = prepare(&state, &mut parts, &correlation_id) {
        return fail(&state, &correlation_id, &e);
    }

    let request = Request::from_parts(parts, body);
    match transport::forward(&state.http_client, request, state.config.upstream_timeout).await {
        Ok(mut response) => {
            state.stats.forwarded.fetch_add(1, Ordering::Relaxed);
            tracing::info!(
                correlation_id = %correlation_id,
                method = %method,
                path = %path,
                status = response.status().as_u16(),
                "upstream responded"
            );
            headers::strip_hop_by_hop(response.headers_mut());
            if let Ok(val) = HeaderValue::from_str(&correlation_id) {
                response.headers_mut().insert(headers::CORRELATION_ID, val);
            }
            response
        }
        Err(e) => fail(&state, &correlation_id, &e),
    }
}

/// Rewrite the request in place: credential, upstream URI, headers.
fn prepare(state: &AppState, parts: &mut Parts, correlation_id: &str) -> Result<(), ProxyError> {
    let config = &state.config;

    let with_credential = rewrite::inject_credential(&parts.uri, &config.credential)?;
    parts.uri = config.upstream.rewrite_uri(&with_credential)?;

    let client_ip = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());
    headers::prepare_request_headers(
        &mut parts.headers,
        client_ip.as_deref(),
        &config.upstream,
        correlation_id,
    );
    Ok(())
}

fn fail(state: &AppState, correlation_id: &str, error: &ProxyError) -> Response {
    state.stats.failed.fetch_add(1, Ordering::Relaxed);
    tracing::error!(
        correlation_id = %correlation_id,
        error = %error,
        "forwarding failed"
    );
    let mut response = error.status().into_response();
    if let Ok(val) = HeaderValue::from_str(correlation_id) {
        response.headers_mut().insert(headers::CORRELATION_ID, val);
    }
    response
}
