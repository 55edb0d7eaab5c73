//! # runcmd Run Options (`common::process::options`)
//!
//! File: cli/src/common/process/options.rs
//! Author: runcmd contributors
//!
//! ## Overview
//!
//! `RunOptions` is the single configuration structure a `RunCommand` is built
//! from. Every field has a documented default (see `RunOptions::default`), and
//! every field has a builder-style setter so options read naturally at the call
//! site:
//!
//! ```rust
//! use runcmd::common::process::{OutputMode, RunOptions, TraceOptions};
//! use std::time::Duration;
//!
//! let options = RunOptions::default()
//!     .trace(TraceOptions::on())
//!     .timeout(Duration::from_secs(30))
//!     .output_mode(OutputMode::Binary)
//!     .exit_on_error(true);
//! assert!(options.exit_on_error);
//! ```
//!
use super::platform::PlatformOptions;
use super::trace::TraceOptions;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Charset used to decode captured stdout/stderr in text mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
    /// Strict UTF-8; invalid data makes `run` fail with `RunError::Decode`.
    #[default]
    Utf8,
    /// UTF-8 with invalid sequences replaced by U+FFFD.
    Utf8Lossy,
    /// ISO-8859-1, each byte becomes one character.
    Latin1,
}

impl TextEncoding {
    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf8Lossy => "utf-8-lossy",
            TextEncoding::Latin1 => "latin1",
        }
    }
}

/// How captured output is handed back: decoded text or raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text(TextEncoding),
    Binary,
}

impl OutputMode {
    pub fn label(self) -> &'static str {
        match self {
            OutputMode::Text(encoding) => encoding.label(),
            OutputMode::Binary => "binary",
        }
    }
}

impl Default for OutputMode {
    fn default() -> Self {
        OutputMode::Text(TextEncoding::default())
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "binary" | "bytes" => Ok(OutputMode::Binary),
            "utf-8" | "utf8" => Ok(OutputMode::Text(TextEncoding::Utf8)),
            "utf-8-lossy" | "utf8-lossy" => Ok(OutputMode::Text(TextEncoding::Utf8Lossy)),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(OutputMode::Text(TextEncoding::Latin1)),
            other => Err(format!(
                "unknown encoding '{other}' (expected utf-8, utf-8-lossy, latin1 or binary)"
            )),
        }
    }
}

/// Environment given to the child.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EnvSetting {
    /// Inherit the caller's environment unchanged.
    #[default]
    Inherit,
    /// Start from an empty environment containing only these variables.
    Replace(BTreeMap<String, String>),
    /// Inherit, then set or override these variables.
    Extend(BTreeMap<String, String>),
}

/// Configuration of a `RunCommand`.
///
/// Defaults: inherit the environment, no shell, no timeout, tracing off,
/// exit-on-error off, strict UTF-8 text output, descriptors left as they are,
/// current working directory, no platform options.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub env: EnvSetting,
    /// Pass the command line to the platform shell instead of splitting it.
    pub use_shell: bool,
    pub timeout: Option<Duration>,
    pub trace: TraceOptions,
    /// Turn a non-zero exit code into `RunError::CommandFailed`.
    pub exit_on_error: bool,
    pub output_mode: OutputMode,
    /// Unix: mark every inherited descriptor above stderr close-on-exec.
    pub close_fds: bool,
    pub cwd: Option<PathBuf>,
    pub platform: Option<PlatformOptions>,
}

impl RunOptions {
    pub fn env(mut self, env: EnvSetting) -> Self {
        self.env = env;
        self
    }

    pub fn use_shell(mut self, use_shell: bool) -> Self {
        self.use_shell = use_shell;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Timeout given in (fractional) seconds, as in config files and on the CLI.
    ///
    /// Returns `None` for negative or non-finite values.
    pub fn timeout_secs(self, seconds: f64) -> Option<Self> {
        Duration::try_from_secs_f64(seconds)
            .ok()
            .map(|timeout| self.timeout(timeout))
    }

    pub fn trace(mut self, trace: TraceOptions) -> Self {
        self.trace = trace;
        self
    }

    pub fn exit_on_error(mut self, exit_on_error: bool) -> Self {
        self.exit_on_error = exit_on_error;
        self
    }

    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    pub fn close_fds(mut self, close_fds: bool) -> Self {
        self.close_fds = close_fds;
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn platform(mut self, platform: impl Into<PlatformOptions>) -> Self {
        self.platform = Some(platform.into());
        self
    }
}
