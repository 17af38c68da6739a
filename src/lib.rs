//! credgate is a credential-injecting CORS gateway.
//!
//! It sits in front of a single REST database upstream, adds the configured
//! credential as a query parameter to every forwarded request, and stamps
//! permissive CORS headers on the responses so a browser front-end hosted
//! elsewhere can call it. An authorization gate runs before anything is
//! forwarded.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, check, health).
//! - [`config`] -- Settings merging and resolution into the immutable
//!   [`GatewayConfig`](config::GatewayConfig).
//! - [`error`] -- Startup, crate-level and per-request error types.
//! - [`gate`] -- The [`AuthorizationGate`](gate::AuthorizationGate) trait,
//!   built-in policies, and the middleware that applies them.
//! - [`proxy`] -- Credential injection, CORS headers, header preparation, and
//!   the streaming forwarder.
//! - [`assets`] -- Optional bundled front-end under `/app/`.
//! - [`health`] -- `GET /health` endpoint handler.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`server`] -- Axum router composition, shared state, HTTP client, and
//!   graceful shutdown.
//! - [`tls`] -- Upstream TLS trust policy.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML settings file support _(enabled by default)_ |
//! | `json` | JSON settings file support |
//! | `toml` | TOML settings file support |
//! | `file-backends` | All settings file formats |

// Public items exist for the binary and the integration tests.
#![allow(clippy::missing_errors_doc)]

pub mod assets;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod gate;
pub mod health;
pub mod logging;
pub mod proxy;
pub mod server;
pub mod tls;
