//! # runcmd `RunCommand` (`common::process::command`)
//!
//! File: cli/src/common/process/command.rs
//! Author: runcmd contributors
//!
//! ## Overview
//!
//! `RunCommand` runs one command line at a time and remembers the outcome of
//! the most recent run: exit code, command line, captured stdout and stderr.
//! The same instance can be reused for any number of sequential runs; each
//! run overwrites the previous result.
//!
//! ## Outcomes
//!
//! - Normal exit: the exit code is stored and returned, output is decoded per
//!   `RunOptions::output_mode`.
//! - Executable not found: reported as exit code 1 with the `"file not found"`
//!   stderr marker and empty stdout. Not an error.
//! - Timeout: the child is killed and `RunError::Timeout` is returned, whatever
//!   the exit-on-error setting says.
//! - Output that cannot be decoded: `RunError::Decode`; like a timeout it leaves
//!   no result behind (exit code 0, no captured output).
//! - Non-zero exit with `exit_on_error`: the result is stored, then
//!   `RunError::CommandFailed` is returned carrying the composed error message.
//!   The `runcmd` binary turns that into exit status 1.
//!
//! ## Examples
//!
//! ```rust
//! use runcmd::common::process::{RunCommand, RunOptions};
//!
//! # #[cfg(unix)]
//! # fn main() -> Result<(), runcmd::core::error::RunError> {
//! let mut cmd = RunCommand::new(RunOptions::default());
//! let code = cmd.run("echo hello")?;
//! assert_eq!(code, 0);
//!
//! cmd.run_with_input("tr a-z A-Z", "shout")?;
//! assert_eq!(cmd.output().and_then(|out| out.as_text()), Some("SHOUT"));
//! # Ok(())
//! # }
//! # #[cfg(not(unix))]
//! # fn main() {}
//! ```
//!
use super::options::RunOptions;
use super::output::{Captured, ProcessInput, FILE_NOT_FOUND};
use super::spawn::{self, Completion};
use crate::core::error::RunError;
use std::io;
use tracing::debug;

/// Runs external commands and keeps the result of the last run.
#[derive(Debug)]
pub struct RunCommand {
    options: RunOptions,
    exit_code: i32,
    command_line: String,
    output: Option<Captured>,
    error_out: Option<Captured>,
}

impl RunCommand {
    pub fn new(options: RunOptions) -> Self {
        Self {
            options,
            exit_code: 0,
            command_line: String::new(),
            output: None,
            error_out: None,
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Runs `command_line` with stdin inherited from the caller.
    ///
    /// Returns the child's exit code. See the module docs for how missing
    /// executables, timeouts and the exit-on-error policy are reported.
    pub fn run(&mut self, command_line: &str) -> Result<i32, RunError> {
        self.execute(command_line, None)
    }

    /// Runs `command_line` and writes `input` to its stdin, then closes it.
    pub fn run_with_input(
        &mut self,
        command_line: &str,
        input: impl Into<ProcessInput>,
    ) -> Result<i32, RunError> {
        self.execute(command_line, Some(input.into()))
    }

    /// Exit code and captured stdout of the most recent run.
    pub fn result(&self) -> (i32, Option<&Captured>) {
        (self.exit_code, self.output.as_ref())
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Command line of the most recent run; empty before the first run.
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    pub fn output(&self) -> Option<&Captured> {
        self.output.as_ref()
    }

    pub fn error_out(&self) -> Option<&Captured> {
        self.error_out.as_ref()
    }

    fn execute(&mut self, command_line: &str, input: Option<ProcessInput>) -> Result<i32, RunError> {
        let trace = self.options.trace;
        trace.command(command_line);

        let mut command = spawn::build_command(command_line, &self.options)?;
        // Timeouts and decode failures leave this state: exit code 0, no output.
        self.command_line = command_line.to_string();
        self.exit_code = 0;
        self.output = None;
        self.error_out = None;
        debug!("Running command: {:?}", command);

        let child = match spawn::spawn(&mut command, input.is_some()) {
            Ok(child) => child,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(self.record_not_found());
            }
            Err(source) => {
                return Err(RunError::Spawn {
                    command_line: command_line.to_string(),
                    source,
                })
            }
        };

        let completion = spawn::communicate(
            child,
            input.map(ProcessInput::into_bytes),
            self.options.timeout,
        )
        .map_err(|source| RunError::Io {
            command_line: command_line.to_string(),
            source,
        })?;

        let raw = match completion {
            Completion::Exited(raw) => raw,
            Completion::TimedOut => {
                let err = RunError::Timeout {
                    command_line: command_line.to_string(),
                    timeout: self.options.timeout.unwrap_or_default(),
                };
                trace.note(&format!("Timeout exception: {err}"));
                return Err(err);
            }
        };

        let exit_code = spawn::exit_code(raw.status);
        let mode = self.options.output_mode;
        let decode_error = || RunError::Decode {
            command_line: command_line.to_string(),
            encoding: mode.label(),
        };
        let output = Captured::decode(raw.stdout, mode).ok_or_else(decode_error)?;
        let error_out = Captured::decode(raw.stderr, mode).ok_or_else(decode_error)?;
        trace.outcome(exit_code, &output, &error_out);
        self.exit_code = exit_code;
        self.output = Some(output);
        self.error_out = Some(error_out);

        if self.options.exit_on_error && self.exit_code != 0 {
            let message = self.error_message();
            trace.note(&message);
            return Err(RunError::CommandFailed {
                command_line: self.command_line.clone(),
                exit_code: self.exit_code,
                message,
            });
        }
        debug!(
            "Command '{}' finished with exit code {}",
            command_line, self.exit_code
        );
        Ok(self.exit_code)
    }

    fn record_not_found(&mut self) -> i32 {
        let mode = self.options.output_mode;
        self.exit_code = 1;
        self.output = Some(Captured::empty(mode));
        self.error_out = Some(Captured::marker(FILE_NOT_FOUND, mode));
        self.options.trace.note("file not found error");
        debug!("Executable for '{}' not found", self.command_line);
        self.exit_code
    }

    /// Composed report for a failed command: command line, exit status and
    /// stderr (hex-encoded in binary mode).
    fn error_message(&self) -> String {
        let mut message = format!(
            "command line: {}. exit status: {}.",
            self.command_line, self.exit_code
        );
        if let Some(stderr) = self.error_out.as_ref().filter(|err| !err.is_empty()) {
            message.push(' ');
            message.push_str(stderr.display().trim_end());
        }
        message
    }
}
