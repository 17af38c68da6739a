//! The `credgate check` subcommand: resolve settings and report them without serving.
//!
//! Reports results in either human-readable text or machine-readable JSON.
//! Secrets are never printed.

use std::time::Duration;

use crate::cli::{CheckArgs, CheckFormat};
use crate::config::{validation, GateSettings};
use crate::error::GatewayError;

pub async fn execute(args: &CheckArgs) -> Result<(), GatewayError> {
    let config = match super::resolve_config(&args.settings).await {
        Ok(config) => config,
        Err(e) => {
            match args.format {
                CheckFormat::Text => eprintln!("\u{2717} {e}"),
                CheckFormat::Json => println!(
                    "{}",
                    serde_json::json!({
                        "valid": false,
                        "error": e.to_string(),
                    })
                ),
            }
            return Err(e);
        }
    };

    match args.format {
        CheckFormat::Text => {
            println!("\u{2713} {}", validation::format_report(&config));
        }
        CheckFormat::Json => {
            let gate = match config.gate {
                GateSettings::Open => "open",
                GateSettings::Basic { .. } => "basic",
            };
            println!(
                "{}",
                serde_json::json!({
                    "valid": true,
                    "listen": config.listen_addr(),
                    "upstream": config.upstream.url().as_str(),
                    "namespace": config.namespace,
                    "credential_name": config.credential.name,
                    "tls_verify": config.tls_verify,
                    "upstream_timeout_ms": config.upstream_timeout.map(timeout_millis),
                    "gate": gate,
                })
            );
        }
    }

    Ok(())
}

fn timeout_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}
