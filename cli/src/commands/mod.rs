//! # runcmd Command Modules
//!
//! File: cli/src/commands/mod.rs
//! Author: runcmd contributors
//!
//! ## Overview
//!
//! This module aggregates the subcommands of the `runcmd` binary and makes
//! them accessible to the main application entry point (`main.rs`).
//!
//! ## Commands
//!
//! - `run`: Run one command line through `RunCommand` and relay its output and exit code
//! - `config`: Show the run defaults resolved from configuration files
//!
//! Each command defines its own arguments structure and handler function.
//!
use runcmd::core::config::{load_config, load_config_file, Config};
use runcmd::core::error::Result;
use std::path::Path;
use tracing::debug;

/// Implements `runcmd config`.
pub mod config;
/// Implements `runcmd run`.
pub mod run;

/// Loads the configuration for a command.
///
/// An explicit `--config` file replaces discovery; `--no-config` skips files
/// entirely and uses built-in defaults.
pub(crate) fn resolve_config(explicit: Option<&Path>, no_config: bool) -> Result<Config> {
    if no_config {
        debug!("Configuration files disabled, using defaults.");
        return Ok(Config::default());
    }
    match explicit {
        Some(path) => load_config_file(path),
        None => load_config(),
    }
}
