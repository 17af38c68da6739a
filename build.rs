//! Embeds the short git revision as `CREDGATE_GIT_SHORT`.
//!
//! `CREDGATE_GIT_SHORT_OVERRIDE` takes precedence so container builds
//! without `.git` can still report a revision. Otherwise `"unknown"`.

use std::process::Command;

const OVERRIDE: &str = "CREDGATE_GIT_SHORT_OVERRIDE";

fn from_override() -> Option<String> {
    std::env::var(OVERRIDE)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "unknown")
}

fn from_git() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let rev = String::from_utf8(output.stdout).ok()?;
    let rev = rev.trim();
    (!rev.is_empty()).then(|| rev.to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");
    println!("cargo:rerun-if-env-changed={OVERRIDE}");

    let rev = from_override()
        .or_else(from_git)
        .unwrap_or_else(|| "unknown".into());
    println!("cargo:rustc-env=CREDGATE_GIT_SHORT={rev}");
}
