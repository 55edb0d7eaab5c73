//! # runcmd Library
//!
//! File: cli/src/lib.rs
//! Author: runcmd contributors
//!
//! ## Overview
//!
//! runcmd makes scripting external tools from Rust less tedious: build a
//! `RunCommand` from `RunOptions`, run command lines, and get back exit codes
//! and captured output as text or bytes, with optional tracing and an
//! exit-on-error policy.
//!
//! - `common::process`: `RunCommand` and everything it needs
//! - `core`: configuration loading and error types
//!
//! The `runcmd` binary (src/main.rs) is a thin command-line front end over the
//! same types.
//!
pub mod common;
pub mod core;
