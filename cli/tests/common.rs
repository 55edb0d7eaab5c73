//! # runcmd Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//! Author: runcmd contributors
//!
//! ## Overview
//!
//! Shared helpers for the integration tests in `cli/tests/`. Each `.rs` file
//! in that directory is compiled as its own test crate and pulls this module in
//! with `mod common;`.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::path::Path;

/// # Get runcmd Command (`runcmd_cmd`)
///
/// Creates an `assert_cmd::Command` for the compiled `runcmd` binary.
///
/// ## Panics
/// Panics if the `runcmd` binary cannot be found via `Command::cargo_bin`.
pub fn runcmd_cmd() -> Command {
    Command::cargo_bin("runcmd").expect("Failed to find runcmd binary for testing")
}

/// `runcmd` running inside `dir`, with the user config directory pointed at
/// `dir` as well so a developer's own settings cannot leak into assertions.
pub fn runcmd_cmd_in(dir: &Path) -> Command {
    let mut cmd = runcmd_cmd();
    cmd.current_dir(dir)
        .env("XDG_CONFIG_HOME", dir)
        .env("HOME", dir)
        .env_remove("RUST_LOG");
    cmd
}

/// Whether `program` can be found on `PATH`.
pub fn on_path(program: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}
