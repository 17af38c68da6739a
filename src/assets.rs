//! Bundled front-end served under `/app/`.
//!
//! `index.html` is read from the configured assets directory on each
//! request and a few display placeholders are filled in. Static files
//! under `/app/static/` are served by `tower_http::services::ServeDir`
//! (wired in [`build_router`](crate::server::build_router)).

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::config::GatewayConfig;
use crate::server::AppState;

pub async fn index_handler(State(state): State<Arc<AppState>>) -> Response {
    let Some(dir) = state.config.assets_dir.as_deref() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let path = dir.join("index.html");

    match tokio::fs::read_to_string(&path).await {
        Ok(template) => Html(render_index(&template, &state.config)).into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "index.html not found");
            StatusCode::NOT_FOUND.into_response()
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to read index.html");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Fill `{{upstream}}`, `{{namespace}}` and `{{listen}}`. The credential is
/// never exposed to the page.
#[must_use]
pub fn render_index(template: &str, config: &GatewayConfig) -> String {
    template
        .replace("{{upstream}}", config.upstream.url().as_str())
        .replace("{{namespace}}", &config.namespace)
        .replace("{{listen}}", &config.listen_addr())
}
