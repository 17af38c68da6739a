//! Request and response header handling for the forwarded hop.
//!
//! [`prepare_request_headers`] strips hop-by-hop headers, rewrites `Host`
//! to the upstream authority, and adds proxy metadata (`X-Forwarded-For`,
//! `X-Forwarded-Host`, `X-Forwarded-Proto`, `X-Correlation-Id`).
//! [`strip_hop_by_hop`] is applied to upstream responses before they are
//! streamed back.

use std::sync::LazyLock;

use axum::http::header::{CONNECTION, HOST};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

use super::target::UpstreamTarget;

pub const CORRELATION_ID: &str = "x-correlation-id";

static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "connection",
        "keep-alive",
        "transfer-encoding",
        "te",
        "trailer",
        "upgrade",
        "proxy-authorization",
        "proxy-authenticate",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

/// Remove hop-by-hop headers, including any named by `Connection`.
///
/// `content-length` is kept: bodies are streamed, not re-collected.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| name.trim().parse::<HeaderName>().ok())
        .collect();
    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

pub fn prepare_request_headers(
    headers: &mut HeaderMap,
    client_ip: Option<&str>,
    target: &UpstreamTarget,
    correlation_id: &str,
) {
    let original_host = headers.get(HOST).cloned();

    strip_hop_by_hop(headers);

    if let Ok(val) = HeaderValue::from_str(target.authority().as_str()) {
        headers.insert(HOST, val);
    }

    // X-Forwarded-For: append to chain
    if let Some(client_ip) = client_ip {
        let xff = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .map_or_else(
                || client_ip.to_string(),
                |existing| format!("{existing}, {client_ip}"),
            );
        if let Ok(val) = HeaderValue::from_str(&xff) {
            headers.insert("x-forwarded-for", val);
        }
    }

    // X-Forwarded-Host (original Host the client targeted)
    if let Some(host) = original_host {
        headers.insert("x-forwarded-host", host);
    }

    // The gateway itself only listens on plain HTTP.
    headers.insert("x-forwarded-proto", HeaderValue::from_static("http"));

    if let Ok(val) = HeaderValue::from_str(correlation_id) {
        headers.insert(CORRELATION_ID, val);
    }
}
