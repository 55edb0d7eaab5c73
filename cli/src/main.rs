//! # runcmd Main Entry Point
//!
//! File: cli/src/main.rs
//! Author: runcmd contributors
//!
//! ## Overview
//!
//! This file serves as the main entry point for the `runcmd` binary.
//! It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to the command handlers
//! - Turning the outcome into the process exit status
//!
//! ## Exit Status
//!
//! - `runcmd run` exits with the exit code of the command it ran. A command
//!   killed by signal N yields 128 + N, like a POSIX shell reports it.
//! - Any error (bad configuration, timeout, non-zero exit with
//!   `--exit-on-error`, ...) prints `Error: <message>` and exits with 1.
//!
//! ## Examples
//!
//! ```bash
//! # Get help
//! runcmd --help
//!
//! # Run a command with increased verbosity
//! runcmd -vv run "git status --short"
//! ```
//!
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

// Subcommand handlers; the process machinery lives in the `runcmd` library.
mod commands;

/// Defines the top-level command-line arguments structure using Clap's derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "runcmd",
    about = "Run external commands, capture their output, trace what happened.",
    long_about = "Runs a command line, captures stdout and stderr as text or bytes, \
                  optionally feeds it input, enforces a timeout, and traces each step.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// Enum defining all available top-level commands.
#[derive(Parser, Debug)]
enum Commands {
    #[command(alias = "r")]
    Run(commands::run::RunArgs),
    Config(commands::config::ConfigArgs),
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = match cli.command {
        Commands::Run(args) => commands::run::handle_run(args),
        Commands::Config(args) => commands::config::handle_config(args).map(|()| 0),
    };

    match command_result {
        Ok(code) => std::process::exit(exit_status(code)),
        Err(e) => {
            tracing::error!("Command execution failed: {:?}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Maps a child's exit code to our own exit status.
fn exit_status(code: i32) -> i32 {
    if code < 0 {
        128 - code
    } else {
        code
    }
}
