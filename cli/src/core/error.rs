//! # runcmd Error Types
//!
//! File: cli/src/core/error.rs
//! Author: runcmd contributors
//!
//! ## Overview
//!
//! This module defines the error types used throughout runcmd. There are two
//! layers:
//!
//! - `RunError`: the typed error returned by `RunCommand::run`. Callers match on
//!   it to tell a timeout apart from a command that violated the exit-on-error
//!   policy, a bad command line, or a spawn failure.
//! - `RuncmdError` plus `Result<T>` (an alias for `anyhow::Result<T>`): used by the
//!   configuration loader and the CLI commands, where adding context matters more
//!   than matching on variants.
//!
//! ## Examples
//!
//! ```rust
//! use runcmd::common::process::{RunCommand, RunOptions};
//! use runcmd::core::error::RunError;
//! use std::time::Duration;
//!
//! let mut cmd = RunCommand::new(RunOptions::default().timeout(Duration::from_millis(100)));
//! match cmd.run("sleep 5") {
//!     Err(RunError::Timeout { .. }) => println!("too slow"),
//!     Err(e) => println!("failed: {e}"),
//!     Ok(code) => println!("exit code {code}"),
//! }
//! ```
//!
//! Executables that cannot be found are *not* an error: `run` reports exit code 1
//! and a `"file not found"` stderr marker instead.
//!
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by `RunCommand::run`.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Failed to split command line '{command_line}': {source}")]
    Tokenize {
        command_line: String,
        #[source]
        source: shell_words::ParseError,
    },

    #[error("Command line is empty.")]
    EmptyCommand,

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("{options} platform options cannot be used on this platform.")]
    UnsupportedPlatform { options: &'static str },

    #[error("Failed to start '{command_line}': {source}")]
    Spawn {
        command_line: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error while talking to '{command_line}': {source}")]
    Io {
        command_line: String,
        #[source]
        source: io::Error,
    },

    #[error("Output of '{command_line}' is not valid {encoding}.")]
    Decode {
        command_line: String,
        encoding: &'static str,
    },

    #[error("Command '{command_line}' timed out after {} seconds.", timeout.as_secs_f64())]
    Timeout {
        command_line: String,
        timeout: Duration,
    },

    /// The exit-on-error policy was enabled and the command exited non-zero.
    /// `message` is the composed report (command line, exit status, stderr).
    #[error("{message}")]
    CommandFailed {
        command_line: String,
        exit_code: i32,
        message: String,
    },
}

/// Application-level errors for configuration and argument handling.
#[derive(Error, Debug)]
pub enum RuncmdError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Argument parsing error: {0}")]
    ArgumentParsing(String),
}

/// Type alias for Result using anyhow::Error for the application layer.
pub type Result<T> = anyhow::Result<T>;
