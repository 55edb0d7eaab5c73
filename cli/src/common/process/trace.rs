//! # runcmd Command Tracing (`common::process::trace`)
//!
//! File: cli/src/common/process/trace.rs
//! Author: runcmd contributors
//!
//! ## Overview
//!
//! Formats and emits the trace lines `RunCommand` writes around each command:
//! the command line before it runs, and a block with the exit code and captured
//! output after it finishes.
//!
//! ## Architecture
//!
//! `TraceOptions` combines three independent settings:
//! - `enabled`: whether anything is traced at all.
//! - `timestamp`: prefix every trace message with the local time and UTC offset.
//! - `sink`: where messages go. `TraceSink::Stderr` prints to standard error,
//!   `TraceSink::LogInfo` / `TraceSink::LogDebug` route through `tracing` with
//!   the `runcmd::trace` target.
//!
//! The older numeric flags (`TRACE_ON`, `TRACE_WITH_TIMESTAMP`, ...) can still be
//! converted with `TraceOptions::from_bits`.
//!
//! ## Examples
//!
//! ```rust
//! use runcmd::common::process::{TraceOptions, TraceSink};
//!
//! let plain = TraceOptions::on();
//! assert_eq!(plain.prefix(), "> ");
//!
//! let logged = TraceOptions::on().with_timestamp().with_sink(TraceSink::LogInfo);
//! assert!(logged.prefix().ends_with("> "));
//! assert_eq!(TraceOptions::from_bits(TraceOptions::TRACE_LOG_INFO).sink, TraceSink::LogInfo);
//! ```
//!
use super::output::Captured;
use chrono::Local;
use std::str::FromStr;
use tracing::{debug, info};

/// Target used when trace messages are routed through `tracing`.
pub const TRACE_TARGET: &str = "runcmd::trace";

/// Destination of trace messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TraceSink {
    #[default]
    Stderr,
    LogInfo,
    LogDebug,
}

/// Trace configuration for a `RunCommand`. Defaults to tracing off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceOptions {
    pub enabled: bool,
    pub timestamp: bool,
    pub sink: TraceSink,
}

impl TraceOptions {
    pub const NO_TRACE: u8 = 0;
    pub const TRACE_ON: u8 = 2;
    pub const TRACE_WITH_TIMESTAMP: u8 = 4;
    pub const TRACE_LOG_INFO: u8 = 8;
    pub const TRACE_LOG_DEBUG: u8 = 16;

    /// No tracing.
    pub fn off() -> Self {
        Self::default()
    }

    /// Plain tracing to standard error.
    pub fn on() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Enables tracing and adds a timestamp prefix to every message.
    pub fn with_timestamp(mut self) -> Self {
        self.enabled = true;
        self.timestamp = true;
        self
    }

    /// Enables tracing and selects where messages are written.
    pub fn with_sink(mut self, sink: TraceSink) -> Self {
        self.enabled = true;
        self.sink = sink;
        self
    }

    /// Converts the numeric flag combination used by older scripts.
    ///
    /// Any non-zero value enables tracing. When both log bits are set, info wins.
    pub fn from_bits(bits: u8) -> Self {
        let sink = if bits & Self::TRACE_LOG_INFO != 0 {
            TraceSink::LogInfo
        } else if bits & Self::TRACE_LOG_DEBUG != 0 {
            TraceSink::LogDebug
        } else {
            TraceSink::Stderr
        };
        Self {
            enabled: bits != Self::NO_TRACE,
            timestamp: bits & Self::TRACE_WITH_TIMESTAMP != 0,
            sink,
        }
    }

    /// Builds options from a list of flags (`on`, `timestamp`, `log-info`, `log-debug`).
    pub fn from_flags<I>(flags: I) -> Self
    where
        I: IntoIterator<Item = TraceFlag>,
    {
        flags
            .into_iter()
            .fold(Self::off(), |options, flag| match flag {
                TraceFlag::On => Self {
                    enabled: true,
                    ..options
                },
                TraceFlag::Timestamp => options.with_timestamp(),
                // info takes precedence over debug, whatever the order.
                TraceFlag::LogInfo => options.with_sink(TraceSink::LogInfo),
                TraceFlag::LogDebug if options.sink == TraceSink::LogInfo => options,
                TraceFlag::LogDebug => options.with_sink(TraceSink::LogDebug),
            })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Prefix placed in front of every trace message.
    ///
    /// Timestamped traces get `<time> <offset>> `, plain stderr traces get `> `,
    /// and traces routed to the logger get nothing (the logger adds its own).
    pub fn prefix(&self) -> String {
        if self.timestamp {
            Local::now()
                .format("%Y-%b-%d %H:%M:%S%.6f %:z> ")
                .to_string()
        } else if self.sink == TraceSink::Stderr {
            "> ".to_string()
        } else {
            String::new()
        }
    }

    /// Writes `message` to the configured sink. Does nothing when tracing is off.
    pub fn emit(&self, message: &str) {
        if !self.enabled {
            return;
        }
        match self.sink {
            TraceSink::Stderr => eprintln!("{message}"),
            TraceSink::LogInfo => info!(target: TRACE_TARGET, "{message}"),
            TraceSink::LogDebug => debug!(target: TRACE_TARGET, "{message}"),
        }
    }

    pub(crate) fn command(&self, command_line: &str) {
        self.emit(&format!("{}{}", self.prefix(), command_line));
    }

    pub(crate) fn outcome(&self, exit_code: i32, stdout: &Captured, stderr: &Captured) {
        if self.enabled {
            self.emit(&format_outcome(&self.prefix(), exit_code, stdout, stderr));
        }
    }

    pub(crate) fn note(&self, message: &str) {
        if self.enabled {
            self.emit(&format!("{}{}", self.prefix(), message));
        }
    }
}

/// Formats the post-run trace block. Empty streams are left out.
pub fn format_outcome(prefix: &str, exit_code: i32, stdout: &Captured, stderr: &Captured) -> String {
    let mut msg = format!("{prefix}exit_code: {exit_code}");
    if !stdout.is_empty() {
        msg.push_str("\n  stdout:\n");
        msg.push_str(&stdout.display());
    }
    if !stderr.is_empty() {
        msg.push_str("\n  stderr:\n");
        msg.push_str(&stderr.display());
    }
    msg
}

/// A single trace setting as written in config files and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceFlag {
    On,
    Timestamp,
    LogInfo,
    LogDebug,
}

impl FromStr for TraceFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "on" => Ok(TraceFlag::On),
            "timestamp" => Ok(TraceFlag::Timestamp),
            "log-info" | "info" => Ok(TraceFlag::LogInfo),
            "log-debug" | "debug" => Ok(TraceFlag::LogDebug),
            other => Err(format!(
                "unknown trace flag '{other}' (expected on, timestamp, log-info or log-debug)"
            )),
        }
    }
}
