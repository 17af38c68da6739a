//! The `credgate run` subcommand: start the gateway.
//!
//! Resolves configuration first so that a malformed credential or upstream
//! address aborts before any socket is bound, then serves the Axum router
//! with graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::cli::RunArgs;
use crate::error::GatewayError;
use crate::logging;
use crate::server::{self, AppState};

pub async fn execute(args: RunArgs) -> Result<(), GatewayError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let config = super::resolve_config(&args.settings).await?;
    config.warn_risky_settings();

    let listen_addr = config.listen_addr();
    let state = Arc::new(AppState::new(config));
    let router = server::build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        addr = %local_addr,
        upstream = %state.config.upstream.url(),
        namespace = %state.config.namespace,
        gate = state.gate.name(),
        tls_verify = state.config.tls_verify,
        "credgate started"
    );
    if state.config.assets_dir.is_some() {
        tracing::info!("front-end available at http://{local_addr}/app/");
    }

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(server::shutdown_signal())
    .await?;

    tracing::info!("credgate stopped");
    Ok(())
}
