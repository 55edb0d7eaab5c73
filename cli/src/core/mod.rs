//! # runcmd Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//! Author: runcmd contributors
//!
//! ## Overview
//!
//! This module aggregates the infrastructure shared by the library and the
//! `runcmd` binary.
//!
//! ## Architecture
//!
//! - `config`: Configuration loading, merging, and validation
//! - `error`: Error types and error handling utilities
//!
//! ## Usage
//!
//! ```rust
//! use runcmd::core::config; // For loading configuration
//! use runcmd::core::error::{Result, RunError}; // For error handling
//! ```
//!
pub mod config;
pub mod error;
