//! Build script for jobdeck
//!
//! Exports GIT_HASH and BUILD_TIME for `utils::version_info`. Either may be
//! pinned from the environment for reproducible builds.

use std::env;
use std::process::Command;

use chrono::Utc;

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn main() {
    let git_hash = env::var("JOBDECK_GIT_HASH")
        .ok()
        .or_else(git_short_hash)
        .unwrap_or_else(|| "unknown".to_string());

    let build_time = env::var("JOBDECK_BUILD_TIME")
        .unwrap_or_else(|_| Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=BUILD_TIME={}", build_time);

    println!("cargo:rerun-if-env-changed=JOBDECK_GIT_HASH");
    println!("cargo:rerun-if-env-changed=JOBDECK_BUILD_TIME");
    println!("cargo:rerun-if-changed=../.git/HEAD");
}
