//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared state holding the resolved
//! config, HTTP client, authorization gate, and counters), [`build_router`]
//! for composing the route table and middleware chain,
//! [`build_http_client`] for the connection-pooled hyper client, and
//! [`shutdown_signal`] for SIGTERM / Ctrl+C handling.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::assets;
use crate::config::GatewayConfig;
use crate::gate::{self, AuthorizationGate};
use crate::health::health_handler;
use crate::proxy::{self, cors};
use crate::tls;

#[derive(Debug)]
pub struct Stats {
    pub forwarded: AtomicU64,
    pub failed: AtomicU64,
    pub denied: AtomicU64,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            forwarded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            denied: AtomicU64::new(0),
        }
    }
}

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, Body>;

pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub http_client: HttpClient,
    pub gate: Arc<dyn AuthorizationGate>,
    pub start_time: Instant,
    pub stats: Stats,
}

impl AppState {
    /// Build the state for `config`, with its HTTP client and gate.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        let http_client = build_http_client(config.tls_verify);
        let gate = gate::from_settings(&config.gate);
        Self {
            config: Arc::new(config),
            http_client,
            gate,
            start_time: Instant::now(),
            stats: Stats::new(),
        }
    }
}

#[must_use]
pub fn build_http_client(tls_verify: bool) -> HttpClient {
    // When multiple rustls crypto providers are compiled in, rustls cannot
    // auto-detect which one to use. Explicitly install `ring`.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let builder = hyper_rustls::HttpsConnectorBuilder::new();
    let builder = if tls_verify {
        builder.with_webpki_roots()
    } else {
        builder.with_tls_config(tls::insecure_client_config())
    };
    let https = builder.https_or_http().enable_http1().build();

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(30))
        .retry_canceled_requests(false)
        .build(https)
}

/// Compose the route table.
///
/// `/health` and the bundled front-end are served locally. Everything else
/// goes through the gate, then the CORS injector, then the forwarder. A
/// denial from the gate is returned as-is, without CORS headers.
pub fn build_router(state: Arc<AppState>) -> Router {
    let proxy_service = Router::new()
        .fallback(proxy::forward_handler)
        .layer(middleware::map_response(cors::annotate_response))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::authorize,
        ))
        .with_state(state.clone());

    let mut router = Router::new().route("/health", get(health_handler));

    if let Some(dir) = state.config.assets_dir.as_deref() {
        router = router
            .route("/app", get(assets::index_handler))
            .route("/app/", get(assets::index_handler))
            .nest_service("/app/static", ServeDir::new(dir.join("static")));
    }

    let max_body = state.config.max_body;
    let router = router.fallback_service(proxy_service).with_state(state);

    match max_body {
        Some(limit) => router.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(limit)),
        ),
        None => router.layer(TraceLayer::new_for_http()),
    }
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
