//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (run, check, health), and their argument structs. Gateway
//! settings live in [`SettingsArgs`], shared by `run` and `check`. Every
//! settings flag has an environment variable equivalent and, when set,
//! overrides the same value from the settings file.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{AuthSettings, Settings};

#[derive(Parser)]
#[command(
    name = "credgate",
    version,
    about = "Credential-injecting CORS gateway for REST database APIs",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        credgate run                                        Proxy the demo upstream on localhost:8000\n  \
        credgate run --upstream https://db.example.com \\\n      \
        --credential apikey:secret                     Proxy your own instance\n  \
        credgate check -c credgate.yaml                      Validate settings without serving"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gateway
    Run(Box<RunArgs>),

    /// Resolve and validate settings without starting
    Check(CheckArgs),

    /// Check health of a running instance
    Health(HealthArgs),
}

#[derive(Args, Default)]
pub struct SettingsArgs {
    /// Settings file path (.yaml, .json, .toml)
    #[arg(short, long, env = "CREDGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen interface [default: localhost]
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Listen port [default: 8000]
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Upstream base address [default: https://demo.slashdb.com]
    #[arg(short, long, env = "CREDGATE_UPSTREAM")]
    pub upstream: Option<String>,

    /// Upstream database name, for display only [default: timesheet]
    #[arg(short, long, env = "CREDGATE_NAMESPACE")]
    pub namespace: Option<String>,

    /// Upstream credential as `name:value`, sent as a query parameter
    /// [default: apikey:timesheet-api-key]
    #[arg(long, env = "CREDGATE_CREDENTIAL", hide_env_values = true)]
    pub credential: Option<String>,

    /// Character separating credential name and value [default: ':']
    #[arg(long, env = "CREDGATE_CREDENTIAL_SEPARATOR")]
    pub credential_separator: Option<char>,

    // -- Upstream --
    /// Accept any upstream TLS certificate (DANGEROUS: disables verification)
    #[arg(long, env = "CREDGATE_INSECURE_SKIP_VERIFY", help_heading = "Upstream")]
    pub insecure_skip_verify: bool,

    /// Upstream response timeout in milliseconds [default: none]
    #[arg(long, env = "CREDGATE_UPSTREAM_TIMEOUT_MS", help_heading = "Upstream")]
    pub upstream_timeout_ms: Option<u64>,

    /// Max request body size in bytes [default: unlimited]
    #[arg(long, env = "MAX_BODY_SIZE", help_heading = "Upstream")]
    pub max_body: Option<usize>,

    // -- Front-end --
    /// Directory holding index.html and static/ for the bundled front-end
    #[arg(long, env = "CREDGATE_ASSETS_DIR", help_heading = "Front-end")]
    pub assets_dir: Option<PathBuf>,

    // -- Gate --
    /// Basic auth username required for proxied requests
    #[arg(long, env = "CREDGATE_AUTH_USERNAME", help_heading = "Gate")]
    pub auth_username: Option<String>,

    /// Basic auth password required for proxied requests
    #[arg(
        long,
        env = "CREDGATE_AUTH_PASSWORD",
        hide_env_values = true,
        help_heading = "Gate"
    )]
    pub auth_password: Option<String>,
}

impl SettingsArgs {
    /// The values given on the command line or in the environment.
    #[must_use]
    pub fn to_settings(&self) -> Settings {
        Settings {
            host: self.host.clone(),
            port: self.port,
            upstream: self.upstream.clone(),
            namespace: self.namespace.clone(),
            credential: self.credential.clone(),
            credential_separator: self.credential_separator,
            insecure_skip_verify: self.insecure_skip_verify.then_some(true),
            upstream_timeout_ms: self.upstream_timeout_ms,
            max_body: self.max_body,
            assets_dir: self.assets_dir.clone(),
            auth: AuthSettings {
                username: self.auth_username.clone(),
                password: self.auth_password.clone(),
            },
        }
    }
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        credgate run                                     Demo upstream, localhost:8000\n  \
        credgate run -c credgate.yaml --pretty            Settings file, local dev logs\n  \
        credgate run --host 0.0.0.0 -p 8080 \\\n      \
        --auth-username admin --auth-password pw      Expose with basic auth")]
pub struct RunArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: CheckFormat,
}

#[derive(Args)]
pub struct HealthArgs {
    /// URL of the running instance
    #[arg(default_value = "http://localhost:8000")]
    pub url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum CheckFormat {
    Text,
    Json,
}
