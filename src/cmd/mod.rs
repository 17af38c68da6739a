//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`], [`check`], or [`health`]. Each handler
//! lives in its own submodule.

pub mod check;
pub mod health;
pub mod run;

use crate::cli::{Cli, Commands, SettingsArgs};
use crate::config::{sources, GatewayConfig, Settings};
use crate::error::GatewayError;

pub async fn dispatch(cli: Cli) -> Result<(), GatewayError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Check(ref args)) => check::execute(args).await,
        Some(Commands::Health(args)) => health::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

/// Merge the settings file (if any) with CLI/env values and resolve them.
pub async fn resolve_config(args: &SettingsArgs) -> Result<GatewayConfig, GatewayError> {
    let file = match args.config.as_deref() {
        Some(path) => sources::load_file(path).await?,
        None => Settings::default(),
    };
    let settings = file.merge(args.to_settings());
    Ok(GatewayConfig::resolve(settings)?)
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  credgate v{version}: credential-injecting CORS gateway\n\n  \
         No command provided. To get started:\n\n    \
         credgate run                              Proxy the demo upstream on localhost:8000\n    \
         credgate run -c credgate.yaml             Start with a settings file\n    \
         credgate check --credential apikey:KEY    Validate settings without serving\n    \
         credgate --help                           See all commands and options\n"
    );
}
