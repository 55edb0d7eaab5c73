//! # runcmd Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//! Author: runcmd contributors
//!
//! ## Overview
//!
//! This module is the organizational entry point for the reusable parts of
//! runcmd, kept apart from the CLI command handlers (`commands::`) and the core
//! infrastructure (`core::`).
//!
//! - **`process`**: Executing external commands, capturing their output and
//!   tracing what happened (`RunCommand`).
//!
//! ```rust
//! use runcmd::common::process::{RunCommand, RunOptions};
//!
//! let cmd = RunCommand::new(RunOptions::default());
//! assert_eq!(cmd.exit_code(), 0);
//! ```
//!

/// Utilities for executing and managing external processes.
pub mod process;
