//! The `credgate health` subcommand: probe a running instance.
//!
//! Sends a `GET /health` request to the specified URL and displays
//! the response as formatted text or raw JSON.

use std::time::Duration;

use axum::body::Body;
use http_body_util::BodyExt;

use crate::cli::HealthArgs;
use crate::error::GatewayError;
use crate::health::HealthResponse;
use crate::server::build_http_client;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn execute(args: HealthArgs) -> Result<(), GatewayError> {
    let url = format!("{}/health", args.url.trim_end_matches('/'));
    let uri: hyper::Uri = url.parse().map_err(|e: hyper::http::uri::InvalidUri| {
        GatewayError::UriParse {
            source: Box::new(e),
        }
    })?;

    let http_error =
        |e: Box<dyn std::error::Error + Send + Sync>| GatewayError::HttpRequest { source: e };

    let req = hyper::Request::builder()
        .uri(uri)
        .body(Body::empty())
        .map_err(|e| http_error(Box::new(e)))?;

    let client = build_http_client(true);
    let response = tokio::time::timeout(PROBE_TIMEOUT, client.request(req))
        .await
        .map_err(|_| http_error("health check timed out after 10s".into()))?
        .map_err(|e| http_error(Box::new(e)))?;

    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| http_error(Box::new(e)))?
        .to_bytes();

    if !status.is_success() {
        return Err(GatewayError::HealthCheckFailed(status));
    }

    if args.json {
        println!("{}", String::from_utf8_lossy(&body));
        return Ok(());
    }

    let body_str = String::from_utf8_lossy(&body);
    match serde_json::from_str::<HealthResponse>(&body_str) {
        Ok(health) => {
            let uptime = format_uptime(health.uptime_seconds);
            println!("\u{2713} credgate is healthy ({})", args.url);
            println!("  version:   {} ({})", health.version, health.git);
            println!("  uptime:    {uptime}");
            println!(
                "  upstream:  {} (namespace {}, tls verify {})",
                health.upstream.address,
                health.upstream.namespace,
                if health.upstream.tls_verify { "on" } else { "OFF" }
            );
            println!("  gate:      {}", health.upstream.gate);
            println!(
                "  requests:  {} forwarded, {} failed, {} denied",
                health.stats.requests_forwarded,
                health.stats.requests_failed,
                health.stats.requests_denied
            );
        }
        Err(e) => {
            eprintln!("Failed to parse health response: {e}");
            println!("{}", String::from_utf8_lossy(&body));
        }
    }

    Ok(())
}

fn format_uptime(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}
