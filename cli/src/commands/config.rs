//! # runcmd Config Command Handler
//!
//! File: cli/src/commands/config.rs
//! Author: runcmd contributors
//!
//! ## Overview
//!
//! Implements `runcmd config`, which prints the run defaults that `runcmd run`
//! would start from after loading and merging the configuration files. Useful
//! to check which `.runcmd.toml` is in effect and whether it parses.
//!
//! ## Usage
//!
//! ```bash
//! runcmd config
//! runcmd config --config ./ci.runcmd.toml
//! ```
//!
use super::resolve_config;
use anyhow::Context;
use clap::Parser;
use runcmd::common::process::{EnvSetting, PlatformOptions, RunOptions, TraceSink};
use runcmd::core::error::Result;
use std::path::PathBuf;
use tracing::{debug, info};

/// # Config Arguments (`ConfigArgs`)
#[derive(Parser, Debug)]
#[command(about = "Show the effective run defaults from configuration files")]
pub struct ConfigArgs {
    /// Use this configuration file instead of searching for one.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// # Handle Config Command (`handle_config`)
///
/// Loads the configuration exactly like `runcmd run` does and prints the
/// resulting options, one `key: value` per line.
pub fn handle_config(args: ConfigArgs) -> Result<()> {
    info!("Handling config command...");
    debug!("Config args: {:?}", args);

    let cfg = resolve_config(args.config.as_deref(), false)
        .context("Failed to load runcmd configuration")?;
    let options = cfg
        .to_run_options()
        .context("Invalid runcmd configuration")?;
    for line in describe_options(&options) {
        println!("{line}");
    }
    Ok(())
}

/// Renders `options` as `key: value` lines.
fn describe_options(options: &RunOptions) -> Vec<String> {
    let trace = if !options.trace.enabled {
        "off".to_string()
    } else {
        let sink = match options.trace.sink {
            TraceSink::Stderr => "stderr",
            TraceSink::LogInfo => "log (info)",
            TraceSink::LogDebug => "log (debug)",
        };
        if options.trace.timestamp {
            format!("{sink}, timestamped")
        } else {
            sink.to_string()
        }
    };
    let env = match &options.env {
        EnvSetting::Inherit => "inherit".to_string(),
        EnvSetting::Extend(vars) => format!("inherit + {}", join_keys(vars.keys())),
        EnvSetting::Replace(vars) => format!("only {}", join_keys(vars.keys())),
    };
    let platform = match &options.platform {
        None => "none".to_string(),
        Some(PlatformOptions::Posix(posix)) => format!("{posix:?}"),
        Some(PlatformOptions::Windows(windows)) => format!("{windows:?}"),
    };

    vec![
        format!("shell: {}", options.use_shell),
        format!(
            "timeout: {}",
            options
                .timeout
                .map(|t| format!("{}s", t.as_secs_f64()))
                .unwrap_or_else(|| "none".to_string())
        ),
        format!("trace: {trace}"),
        format!("exit_on_error: {}", options.exit_on_error),
        format!("encoding: {}", options.output_mode),
        format!("close_fds: {}", options.close_fds),
        format!(
            "cwd: {}",
            options
                .cwd
                .as_ref()
                .map(|dir| dir.display().to_string())
                .unwrap_or_else(|| ".".to_string())
        ),
        format!("env: {env}"),
        format!("platform: {platform}"),
    ]
}

fn join_keys<'a>(keys: impl Iterator<Item = &'a String>) -> String {
    let keys: Vec<&str> = keys.map(String::as_str).collect();
    if keys.is_empty() {
        "(nothing)".to_string()
    } else {
        keys.join(", ")
    }
}
