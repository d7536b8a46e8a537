//! Build script for fuzzy-signal
//!
//! Embeds the package version and target triple for the CLI.

use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=FUZZY_SIGNAL_VERSION={}", version);

    let target = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=FUZZY_SIGNAL_TARGET={}", target);
}
