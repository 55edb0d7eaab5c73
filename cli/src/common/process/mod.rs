//! # runcmd Process Execution (`common::process`)
//!
//! File: cli/src/common/process/mod.rs
//! Author: runcmd contributors
//!
//! ## Overview
//!
//! Utilities for **executing external commands** and capturing what they
//! produce. The central type is `RunCommand`: build it once from `RunOptions`,
//! then call `run` / `run_with_input` as often as needed. Each call splits the
//! command line (or hands it to the platform shell), spawns the child, feeds
//! it input, captures stdout and stderr, waits with an optional timeout, and
//! records the exit code.
//!
//! ## Architecture
//!
//! - **`command`**: `RunCommand`, the run/capture/report cycle and result state.
//! - **`options`**: `RunOptions` with its defaults, `OutputMode`, `TextEncoding`, `EnvSetting`.
//! - **`output`**: `ProcessInput` (text or bytes fed to stdin) and `Captured` (decoded or raw output).
//! - **`platform`**: `PlatformOptions` with the `PosixOptions` and `WindowsOptions` option bags.
//! - **`spawn`**: command construction, helper threads for the pipes, waiting with a deadline.
//! - **`trace`**: `TraceOptions` and the formatting of trace messages.
//!
//! ## Usage
//!
//! ```rust
//! use runcmd::common::process::{OutputMode, RunCommand, RunOptions, TraceOptions};
//!
//! # #[cfg(unix)]
//! # fn main() -> Result<(), runcmd::core::error::RunError> {
//! let mut cmd = RunCommand::new(
//!     RunOptions::default()
//!         .trace(TraceOptions::on())
//!         .output_mode(OutputMode::Binary),
//! );
//! cmd.run_with_input("cat", vec![0u8, 159, 146, 150])?;
//! let (code, stdout) = cmd.result();
//! assert_eq!(code, 0);
//! assert_eq!(stdout.map(|out| out.as_bytes()), Some(&[0u8, 159, 146, 150][..]));
//! # Ok(())
//! # }
//! # #[cfg(not(unix))]
//! # fn main() {}
//! ```
//!

/// `RunCommand` and its result state.
pub mod command;
/// Run configuration and its defaults.
pub mod options;
/// Process input and captured output representations.
pub mod output;
/// Platform-specific spawn parameters.
pub mod platform;
/// Command construction and child supervision.
mod spawn;
/// Trace configuration and formatting.
pub mod trace;

pub use command::RunCommand;
pub use options::{EnvSetting, OutputMode, RunOptions, TextEncoding};
pub use output::{Captured, ProcessInput, FILE_NOT_FOUND};
pub use platform::{PlatformOptions, PosixOptions, StartupInfo, WindowsOptions};
pub use trace::{TraceFlag, TraceOptions, TraceSink};
