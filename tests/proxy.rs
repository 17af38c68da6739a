//! End-to-end tests for the gated forwarding pipeline against a local upstream.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;

use credgate::config::{AuthSettings, GatewayConfig, Settings};
use credgate::server::{self, AppState};

const ALLOW_HEADERS: &str = "Accept, Origin, Content-Type, Content-Length, X-Requested-With, Accept-Encoding, X-CSRF-Token, Authorization";

#[derive(Clone, Default)]
struct Upstream {
    hits: Arc<AtomicUsize>,
}

async fn echo(State(upstream): State<Upstream>, request: Request) -> Response {
    upstream.hits.fetch_add(1, Ordering::SeqCst);
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let host = parts
        .headers
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let mut response = axum::Json(json!({
        "method": parts.method.as_str(),
        "path": parts.uri.path(),
        "query": parts.uri.query().unwrap_or_default(),
        "host": host,
        "forwarded_for": parts.headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()),
        "body": String::from_utf8_lossy(&body),
    }))
    .into_response();
    response.headers_mut().insert(
        "access-control-allow-origin",
        HeaderValue::from_static("https://upstream.example"),
    );
    response
}

async fn failing(State(upstream): State<Upstream>) -> Response {
    upstream.hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [("access-control-allow-methods", "GET")],
        "database unavailable",
    )
        .into_response()
}

async fn slow(State(upstream): State<Upstream>) -> &'static str {
    upstream.hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(2)).await;
    "late"
}

async fn start_upstream() -> (SocketAddr, Upstream) {
    let upstream = Upstream::default();
    let router = Router::new()
        .route("/error", get(failing))
        .route("/slow", get(slow))
        .fallback(echo)
        .with_state(upstream.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (addr, upstream)
}

/// An upstream that accepts connections and drops them immediately.
async fn start_dropping_upstream() -> (SocketAddr, Arc<AtomicUsize>) {
    let accepted = Arc::new(AtomicUsize::new(0));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let counter = accepted.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            drop(socket);
        }
    });
    (addr, accepted)
}

/// An upstream that streams a chunked body until a write fails, then
/// reports on `closed`.
async fn start_streaming_upstream() -> (SocketAddr, mpsc::UnboundedReceiver<()>) {
    let (closed_tx, closed_rx) = mpsc::unbounded_channel();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let closed = closed_tx.clone();
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                let header = "HTTP/1.1 200 OK\r\ncontent-type: text/csv\r\ntransfer-encoding: chunked\r\n\r\n";
                if socket.write_all(header.as_bytes()).await.is_err() {
                    return;
                }
                loop {
                    if socket.write_all(b"5\r\nrow,\n\r\n").await.is_err()
                        || socket.flush().await.is_err()
                    {
                        let _ = closed.send(());
                        return;
                    }
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
            });
        }
    });
    (addr, closed_rx)
}

fn settings_for(upstream: &str) -> Settings {
    Settings {
        upstream: Some(upstream.to_string()),
        credential: Some("apikey:secret-key".into()),
        ..Settings::default()
    }
}

async fn start_gateway(settings: Settings) -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let config = GatewayConfig::resolve(settings).unwrap();
    let state = Arc::new(AppState::new(config));
    let router = server::build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .await
        .unwrap();
    });

    (addr, shutdown_tx)
}

fn query_values(query: &str, name: &str) -> Vec<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
        .collect()
}

fn assert_cors(response: &reqwest::Response) {
    let headers = response.headers();
    assert_eq!(
        headers.get_all("access-control-allow-origin").iter().count(),
        1
    );
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
    assert_eq!(
        headers.get("access-control-allow-methods").unwrap(),
        "POST, GET, OPTIONS, PUT, DELETE"
    );
    assert_eq!(
        headers.get("access-control-allow-headers").unwrap(),
        ALLOW_HEADERS
    );
}

#[tokio::test]
async fn injects_credential_and_overrides_spoofed_value() {
    let (upstream_addr, upstream) = start_upstream().await;
    let (addr, shutdown) = start_gateway(settings_for(&format!("http://{upstream_addr}"))).await;

    let url = format!("http://{addr}/db/timesheet.json?apikey=spoofed&limit=5&apikey=again");
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.headers().get("x-correlation-id").is_some());

    let echoed: Value = resp.json().await.unwrap();
    let query = echoed["query"].as_str().unwrap();
    assert_eq!(query_values(query, "apikey"), ["secret-key"]);
    assert_eq!(query_values(query, "limit"), ["5"]);
    assert_eq!(echoed["path"], "/db/timesheet.json");
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 1);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn rewrites_origin_and_keeps_request_path() {
    let (upstream_addr, _upstream) = start_upstream().await;
    let (addr, shutdown) = start_gateway(settings_for(&format!(
        "http://{upstream_addr}/db/timesheet"
    )))
    .await;

    let resp = reqwest::get(format!("http://{addr}/foo/bar?x=1"))
        .await
        .unwrap();
    let echoed: Value = resp.json().await.unwrap();

    assert_eq!(echoed["path"], "/foo/bar");
    assert_eq!(echoed["host"], upstream_addr.to_string());
    let query = echoed["query"].as_str().unwrap();
    assert_eq!(query_values(query, "x"), ["1"]);
    assert_eq!(query_values(query, "apikey"), ["secret-key"]);
    assert_eq!(echoed["forwarded_for"], "127.0.0.1");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn forwards_method_and_body() {
    let (upstream_addr, _upstream) = start_upstream().await;
    let (addr, shutdown) = start_gateway(settings_for(&format!("http://{upstream_addr}"))).await;

    let client = reqwest::Client::new();
    let resp = client
        .put(format!("http://{addr}/db/timesheet/Project/1.json"))
        .body(r#"{"name":"renamed"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_cors(&resp);

    let echoed: Value = resp.json().await.unwrap();
    assert_eq!(echoed["method"], "PUT");
    assert_eq!(echoed["body"], r#"{"name":"renamed"}"#);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn cors_headers_overwrite_upstream_values() {
    let (upstream_addr, _upstream) = start_upstream().await;
    let (addr, shutdown) = start_gateway(settings_for(&format!("http://{upstream_addr}"))).await;

    let resp = reqwest::get(format!("http://{addr}/db.json")).await.unwrap();
    assert_cors(&resp);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn cors_headers_present_on_upstream_errors() {
    let (upstream_addr, upstream) = start_upstream().await;
    let (addr, shutdown) = start_gateway(settings_for(&format!("http://{upstream_addr}"))).await;

    let resp = reqwest::get(format!("http://{addr}/error")).await.unwrap();
    assert_eq!(resp.status(), 500);
    assert_cors(&resp);
    assert_eq!(resp.text().await.unwrap(), "database unavailable");
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 1);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn preflight_is_forwarded_and_annotated() {
    let (upstream_addr, upstream) = start_upstream().await;
    let (addr, shutdown) = start_gateway(settings_for(&format!("http://{upstream_addr}"))).await;

    let client = reqwest::Client::new();
    let resp = client
        .request(reqwest::Method::OPTIONS, format!("http://{addr}/db.json"))
        .header("origin", "https://app.example")
        .send()
        .await
        .unwrap();
    assert_cors(&resp);
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 1);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn denied_requests_never_reach_upstream() {
    let (upstream_addr, upstream) = start_upstream().await;
    let mut settings = settings_for(&format!("http://{upstream_addr}"));
    settings.auth = AuthSettings {
        username: Some("admin".into()),
        password: Some("s3cret".into()),
    };
    let (addr, shutdown) = start_gateway(settings).await;
    let client = reqwest::Client::new();

    let denied = client
        .get(format!("http://{addr}/db.json"))
        .send()
        .await
        .unwrap();
    assert_eq!(denied.status(), 401);
    assert!(denied.headers().get("access-control-allow-origin").is_none());

    let wrong = client
        .get(format!("http://{addr}/db.json"))
        .basic_auth("admin", Some("nope"))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), 401);
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 0);

    let allowed = client
        .get(format!("http://{addr}/db.json"))
        .basic_auth("admin", Some("s3cret"))
        .send()
        .await
        .unwrap();
    assert_eq!(allowed.status(), 200);
    assert_cors(&allowed);
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 1);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn failing_upstream_gets_one_attempt_and_one_error() {
    let (upstream_addr, accepted) = start_dropping_upstream().await;
    let (addr, shutdown) = start_gateway(settings_for(&format!("http://{upstream_addr}"))).await;

    let resp = reqwest::get(format!("http://{addr}/db.json")).await.unwrap();
    assert_eq!(resp.status(), 502);
    assert_cors(&resp);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(accepted.load(Ordering::SeqCst), 1);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn unreachable_upstream_returns_bad_gateway() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = listener.local_addr().unwrap();
    drop(listener);

    let (addr, shutdown) = start_gateway(settings_for(&format!("http://{dead_addr}"))).await;

    let resp = reqwest::get(format!("http://{addr}/db.json")).await.unwrap();
    assert_eq!(resp.status(), 502);

    // The gateway keeps serving after a failure.
    let health = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(health.status(), 200);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn configured_timeout_returns_gateway_timeout() {
    let (upstream_addr, upstream) = start_upstream().await;
    let mut settings = settings_for(&format!("http://{upstream_addr}"));
    settings.upstream_timeout_ms = Some(200);
    let (addr, shutdown) = start_gateway(settings).await;

    let resp = reqwest::get(format!("http://{addr}/slow")).await.unwrap();
    assert_eq!(resp.status(), 504);
    assert_cors(&resp);
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 1);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn large_bodies_pass_through() {
    let (upstream_addr, _upstream) = start_upstream().await;
    let (addr, shutdown) = start_gateway(settings_for(&format!("http://{upstream_addr}"))).await;

    let payload = "x".repeat(256 * 1024);
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/db/upload.json"))
        .body(payload.clone())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let echoed: Value = resp.json().await.unwrap();
    assert_eq!(echoed["body"].as_str().unwrap().len(), payload.len());

    let _ = shutdown.send(());
}

#[tokio::test]
async fn caller_query_bytes_are_forwarded_unchanged() {
    let (upstream_addr, _upstream) = start_upstream().await;
    let (addr, shutdown) = start_gateway(settings_for(&format!("http://{upstream_addr}"))).await;

    let resp = reqwest::get(format!("http://{addr}/db/search?q=%FF%FE&x=1"))
        .await
        .unwrap();
    let echoed: Value = resp.json().await.unwrap();
    assert_eq!(echoed["query"], "q=%FF%FE&x=1&apikey=secret-key");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn configured_body_limit_rejects_oversized_requests() {
    let (upstream_addr, upstream) = start_upstream().await;
    let mut settings = settings_for(&format!("http://{upstream_addr}"));
    settings.max_body = Some(1024);
    let (addr, shutdown) = start_gateway(settings).await;
    let client = reqwest::Client::new();

    let rejected = client
        .post(format!("http://{addr}/db/upload.json"))
        .body("x".repeat(4096))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), 413);
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 0);

    let accepted = client
        .post(format!("http://{addr}/db/upload.json"))
        .body("x".repeat(512))
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status(), 200);
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 1);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn client_disconnect_closes_upstream_stream() {
    let (upstream_addr, mut closed) = start_streaming_upstream().await;
    let (addr, shutdown) = start_gateway(settings_for(&format!("http://{upstream_addr}"))).await;

    let mut resp = reqwest::get(format!("http://{addr}/db/export.csv"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let first = resp.chunk().await.unwrap().unwrap();
    assert!(!first.is_empty());
    drop(resp);

    let observed = tokio::time::timeout(Duration::from_secs(5), closed.recv()).await;
    assert!(
        matches!(observed, Ok(Some(()))),
        "upstream kept streaming after the client went away"
    );

    let _ = shutdown.send(());
}
