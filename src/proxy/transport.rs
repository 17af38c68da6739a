//! One round trip to the upstream.
//!
//! The response body is handed back as a live stream. Dropping it (for
//! example when the inbound client disconnects) closes the upstream
//! connection instead of returning it to the pool.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};

use crate::error::ProxyError;
use crate::server::HttpClient;

/// Send `request` once. No retry is attempted on failure.
pub async fn forward(
    client: &HttpClient,
    request: Request<Body>,
    timeout: Option<Duration>,
) -> Result<Response<Body>, ProxyError> {
    let pending = client.request(request);
    let response = match timeout {
        Some(limit) => tokio::time::timeout(limit, pending)
            .await
            .map_err(|_| ProxyError::Timeout(limit))??,
        None => pending.await?,
    };
    Ok(response.map(Body::new))
}
