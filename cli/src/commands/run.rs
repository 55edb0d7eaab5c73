//! # runcmd Run Command Handler
//!
//! File: cli/src/commands/run.rs
//! Author: runcmd contributors
//!
//! ## Overview
//!
//! This module implements `runcmd run`. It runs a single command line through
//! `RunCommand`, writes the captured stdout and stderr to its own stdout and
//! stderr, and exits with the child's exit code.
//!
//! ## Architecture
//!
//! 1. Parse `RunArgs` with `clap`.
//! 2. Resolve configuration (`.runcmd.toml`, user config, `--config`, or `--no-config`).
//! 3. Layer the command-line flags over the configured `RunOptions`.
//! 4. Read the input (`--input` text or `--input-file` bytes), if any.
//! 5. Run the command and relay output.
//!
//! `RunError::CommandFailed` (exit-on-error) and `RunError::Timeout` are returned
//! as errors; `main` prints them and exits with status 1.
//!
//! ## Usage
//!
//! ```bash
//! # Split and run directly, trace with timestamps
//! runcmd run --trace timestamp "git ls-files"
//!
//! # Through the shell, abort on failure
//! runcmd run --shell --exit-on-error 'find . -name "*.rs" | wc -l'
//!
//! # Binary round trip, hex output
//! runcmd run --binary --hex --input-file secret.bin "openssl enc -e -aes-256-cbc -pbkdf2 -pass pass:x"
//! ```
//!
use super::resolve_config;
use anyhow::{anyhow, Context};
use clap::Parser;
use runcmd::common::process::{
    Captured, EnvSetting, OutputMode, PlatformOptions, PosixOptions, ProcessInput, RunCommand,
    RunOptions, TraceFlag, TraceOptions,
};
use runcmd::core::error::{Result, RuncmdError};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, info};

/// # Run Arguments (`RunArgs`)
///
/// Command-line arguments of `runcmd run`. Every flag overrides the
/// corresponding configuration file setting.
#[derive(Parser, Debug)]
#[command(
    about = "Run a command line and relay its output and exit code",
    long_about = "Splits the command line with shell quoting rules (or hands it to the platform shell with --shell), \
                  runs it, prints the captured stdout and stderr, and exits with the command's exit code."
)]
pub struct RunArgs {
    /// Pass the command line to the platform shell (`sh -c` / `cmd /C`).
    #[arg(long)]
    shell: bool,

    /// Kill the command and fail after this many seconds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<f64>,

    /// Trace flag: on, timestamp, log-info or log-debug. Repeatable.
    #[arg(long = "trace", value_name = "FLAG")]
    trace: Vec<TraceFlag>,

    /// Decode output as utf-8, utf-8-lossy, latin1, or keep it binary.
    #[arg(long, value_name = "ENCODING", conflicts_with = "binary")]
    encoding: Option<OutputMode>,

    /// Keep output as raw bytes (same as `--encoding binary`).
    #[arg(long)]
    binary: bool,

    /// Print captured output hex-encoded.
    #[arg(long)]
    hex: bool,

    /// Fail with exit status 1 when the command exits non-zero.
    #[arg(long)]
    exit_on_error: bool,

    /// Unix: do not let the command inherit open descriptors beyond stdio.
    #[arg(long)]
    close_fds: bool,

    /// Set an environment variable for the command. Repeatable.
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    env: Vec<(String, String)>,

    /// Start from an empty environment (plus `--env` values).
    #[arg(long)]
    clear_env: bool,

    /// Working directory for the command.
    #[arg(long, value_name = "DIR")]
    cwd: Option<PathBuf>,

    /// Text written to the command's stdin.
    #[arg(long, value_name = "TEXT", conflicts_with = "input_file")]
    input: Option<String>,

    /// File whose bytes are written to the command's stdin.
    #[arg(long, value_name = "PATH")]
    input_file: Option<PathBuf>,

    /// Unix: keep this descriptor open in the command. Repeatable.
    #[arg(long = "pass-fd", value_name = "FD")]
    pass_fds: Vec<i32>,

    /// Unix: run the command in a new session.
    #[arg(long)]
    new_session: bool,

    /// Use this configuration file instead of searching for one.
    #[arg(long, value_name = "PATH", conflicts_with = "no_config")]
    config: Option<PathBuf>,

    /// Ignore configuration files.
    #[arg(long)]
    no_config: bool,

    /// The command line to run, as a single argument.
    #[arg(required = true)]
    command_line: String,
}

/// # Handle Run Command (`handle_run`)
///
/// Runs the command described by `args` and returns the exit code the
/// `runcmd` process should exit with.
///
/// ## Returns
///
/// * `Ok(code)`: the command ran (or was not found); `code` is its exit code.
/// * `Err`: configuration problems, unreadable input, a bad command line, a
///   timeout, or a non-zero exit with `--exit-on-error`.
pub fn handle_run(args: RunArgs) -> Result<i32> {
    info!("Handling run command...");
    debug!("Run args: {:?}", args);

    let cfg = resolve_config(args.config.as_deref(), args.no_config)
        .context("Failed to load runcmd configuration")?;
    let options = build_options(
        cfg.to_run_options()
            .context("Invalid runcmd configuration")?,
        &args,
    )?;
    let hex_output = args.hex;
    let input = read_input(&args)?;

    let mut cmd = RunCommand::new(options);
    let exit_code = match input {
        Some(input) => cmd.run_with_input(&args.command_line, input)?,
        None => cmd.run(&args.command_line)?,
    };

    if let Some(stdout) = cmd.output() {
        relay(&mut io::stdout().lock(), stdout, hex_output)
            .context("Failed to write captured stdout")?;
    }
    if let Some(stderr) = cmd.error_out() {
        relay(&mut io::stderr().lock(), stderr, hex_output)
            .context("Failed to write captured stderr")?;
    }
    info!("Command finished with exit code {}", exit_code);
    Ok(exit_code)
}

/// Layers the command-line flags over `base` (the configured options).
fn build_options(base: RunOptions, args: &RunArgs) -> Result<RunOptions> {
    let mut options = base;
    if args.shell {
        options = options.use_shell(true);
    }
    if let Some(secs) = args.timeout {
        options = options.timeout_secs(secs).ok_or_else(|| {
            anyhow!(RuncmdError::ArgumentParsing(format!(
                "--timeout must be a non-negative number of seconds, got {secs}"
            )))
        })?;
    }
    if !args.trace.is_empty() {
        options = options.trace(TraceOptions::from_flags(args.trace.iter().copied()));
    }
    if args.binary {
        options = options.output_mode(OutputMode::Binary);
    } else if let Some(mode) = args.encoding {
        options = options.output_mode(mode);
    }
    if args.exit_on_error {
        options = options.exit_on_error(true);
    }
    if args.close_fds {
        options = options.close_fds(true);
    }
    if let Some(cwd) = &args.cwd {
        options = options.cwd(cwd);
    }
    options.env = merge_env(std::mem::take(&mut options.env), &args.env, args.clear_env);

    if !args.pass_fds.is_empty() || args.new_session {
        let mut posix = match options.platform.take() {
            Some(PlatformOptions::Posix(posix)) => posix,
            None => PosixOptions::default(),
            Some(PlatformOptions::Windows(_)) => {
                return Err(anyhow!(RuncmdError::ArgumentParsing(
                    "--pass-fd and --new-session cannot be combined with [platform.windows]"
                        .to_string()
                )))
            }
        };
        posix.pass_fds.extend(&args.pass_fds);
        posix.start_new_session |= args.new_session;
        options = options.platform(posix);
    }
    Ok(options)
}

fn merge_env(base: EnvSetting, extra: &[(String, String)], clear_env: bool) -> EnvSetting {
    let (mut vars, replace) = match base {
        EnvSetting::Inherit => (BTreeMap::new(), false),
        EnvSetting::Extend(vars) => (vars, false),
        EnvSetting::Replace(vars) => (vars, true),
    };
    vars.extend(extra.iter().cloned());
    if replace || clear_env {
        EnvSetting::Replace(vars)
    } else if vars.is_empty() {
        EnvSetting::Inherit
    } else {
        EnvSetting::Extend(vars)
    }
}

fn read_input(args: &RunArgs) -> Result<Option<ProcessInput>> {
    if let Some(text) = &args.input {
        return Ok(Some(ProcessInput::Text(text.clone())));
    }
    match &args.input_file {
        Some(path) => {
            let bytes = fs::read(path)
                .with_context(|| format!("Failed to read input file: {}", path.display()))?;
            Ok(Some(ProcessInput::Bytes(bytes)))
        }
        None => Ok(None),
    }
}

fn relay(out: &mut impl Write, captured: &Captured, hex_output: bool) -> io::Result<()> {
    if captured.is_empty() {
        return Ok(());
    }
    if hex_output {
        writeln!(out, "{}", hex::encode(captured.as_bytes()))?;
    } else {
        out.write_all(captured.as_bytes())?;
    }
    out.flush()
}

/// Parses `KEY=VALUE`.
fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}
