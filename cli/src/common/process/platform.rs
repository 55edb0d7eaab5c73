//! # runcmd Platform Option Bags (`common::process::platform`)
//!
//! File: cli/src/common/process/platform.rs
//! Author: runcmd contributors
//!
//! ## Overview
//!
//! OS-specific spawn parameters. `PlatformOptions` is a closed enum with one
//! variant per platform, so a `RunOptions` can only ever carry one of the two
//! recognized option bags:
//!
//! - `PosixOptions`: descriptors to keep open, SIGPIPE disposition, new session,
//!   group and user ids.
//! - `WindowsOptions`: startup info and process creation flags.
//!
//! The structs are checked at compile time when built in code. When they come
//! from a configuration file, deserialization rejects unknown parameter names
//! and wrongly typed values (`deny_unknown_fields`), so a typo never gets
//! silently dropped.
//!
//! ## Architecture
//!
//! `apply` runs while the `std::process::Command` is being built and before
//! anything is spawned. On Unix it installs a single `pre_exec` hook that
//! only calls async-signal-safe libc functions (`setsid`, `signal`, `fcntl`).
//! Options for the other platform fail with `RunError::UnsupportedPlatform`.
//!
use crate::core::error::RunError;
use serde::Deserialize;
use std::process::Command;

/// Parameters for spawning on Unix-like systems.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PosixOptions {
    /// Descriptors that stay open in the child. Passing any descriptor also
    /// marks all other inheritable descriptors close-on-exec.
    #[serde(default)]
    pub pass_fds: Vec<i32>,
    /// `false` leaves SIGPIPE ignored in the child, as it is in Rust programs.
    #[serde(default = "default_restore_signals")]
    pub restore_signals: bool,
    /// Run the child in a new session (`setsid`).
    #[serde(default)]
    pub start_new_session: bool,
    /// Group id for the child.
    #[serde(default)]
    pub group: Option<u32>,
    /// User id for the child.
    #[serde(default)]
    pub user: Option<u32>,
}

fn default_restore_signals() -> bool {
    true
}

impl Default for PosixOptions {
    fn default() -> Self {
        Self {
            pass_fds: Vec::new(),
            restore_signals: default_restore_signals(),
            start_new_session: false,
            group: None,
            user: None,
        }
    }
}

/// Subset of the Win32 `STARTUPINFO` the standard library lets us express.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StartupInfo {
    /// Do not show a console window for the child.
    #[serde(default)]
    pub hide_window: bool,
}

/// Parameters for spawning on Windows.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WindowsOptions {
    #[serde(default)]
    pub startup_info: Option<StartupInfo>,
    /// Raw `dwCreationFlags` passed to `CreateProcess`.
    #[serde(default)]
    pub creation_flags: Option<u32>,
}

/// `CREATE_NO_WINDOW` process creation flag.
pub const CREATE_NO_WINDOW: u32 = 0x0800_0000;

impl WindowsOptions {
    /// Creation flags including the ones implied by `startup_info`.
    pub fn effective_creation_flags(&self) -> u32 {
        let hide = self
            .startup_info
            .as_ref()
            .is_some_and(|info| info.hide_window);
        self.creation_flags.unwrap_or(0) | if hide { CREATE_NO_WINDOW } else { 0 }
    }
}

/// One of the two recognized platform option bags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformOptions {
    Posix(PosixOptions),
    Windows(WindowsOptions),
}

impl PlatformOptions {
    pub fn name(&self) -> &'static str {
        match self {
            PlatformOptions::Posix(_) => "POSIX",
            PlatformOptions::Windows(_) => "Windows",
        }
    }

    /// Checks values that types alone cannot rule out.
    pub fn validate(&self) -> Result<(), RunError> {
        if let PlatformOptions::Posix(posix) = self {
            if let Some(fd) = posix.pass_fds.iter().find(|fd| **fd < 0) {
                return Err(RunError::InvalidOption(format!(
                    "pass_fds contains negative descriptor {fd}"
                )));
            }
        }
        Ok(())
    }
}

impl From<PosixOptions> for PlatformOptions {
    fn from(options: PosixOptions) -> Self {
        PlatformOptions::Posix(options)
    }
}

impl From<WindowsOptions> for PlatformOptions {
    fn from(options: WindowsOptions) -> Self {
        PlatformOptions::Windows(options)
    }
}

/// Applies the platform options and the descriptor policy to `command`.
pub(crate) fn apply(
    command: &mut Command,
    platform: Option<&PlatformOptions>,
    close_fds: bool,
) -> Result<(), RunError> {
    if let Some(options) = platform {
        options.validate()?;
    }
    match platform {
        Some(PlatformOptions::Posix(posix)) => apply_posix(command, Some(posix), close_fds),
        Some(PlatformOptions::Windows(windows)) => apply_windows(command, windows),
        None => apply_posix_default(command, close_fds),
    }
}

#[cfg(unix)]
fn apply_posix_default(command: &mut Command, close_fds: bool) -> Result<(), RunError> {
    if close_fds {
        apply_posix(command, None, close_fds)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn apply_posix_default(_command: &mut Command, _close_fds: bool) -> Result<(), RunError> {
    Ok(())
}

#[cfg(unix)]
fn apply_posix(
    command: &mut Command,
    posix: Option<&PosixOptions>,
    close_fds: bool,
) -> Result<(), RunError> {
    use std::os::unix::process::CommandExt;

    let defaults = PosixOptions::default();
    let posix = posix.unwrap_or(&defaults);
    if let Some(gid) = posix.group {
        command.gid(gid);
    }
    if let Some(uid) = posix.user {
        command.uid(uid);
    }

    let hook = unix::ChildHook {
        pass_fds: posix.pass_fds.clone(),
        close_fds: close_fds || !posix.pass_fds.is_empty(),
        restore_signals: posix.restore_signals,
        start_new_session: posix.start_new_session,
        fd_limit: unix::open_fd_limit(),
    };
    if hook.is_noop() {
        return Ok(());
    }
    // SAFETY: the hook runs between fork and exec and only calls
    // async-signal-safe libc functions; it does not allocate.
    unsafe {
        command.pre_exec(move || hook.run());
    }
    Ok(())
}

#[cfg(not(unix))]
fn apply_posix(
    _command: &mut Command,
    _posix: Option<&PosixOptions>,
    _close_fds: bool,
) -> Result<(), RunError> {
    Err(RunError::UnsupportedPlatform { options: "POSIX" })
}

#[cfg(windows)]
fn apply_windows(command: &mut Command, windows: &WindowsOptions) -> Result<(), RunError> {
    use std::os::windows::process::CommandExt;

    let flags = windows.effective_creation_flags();
    if flags != 0 {
        command.creation_flags(flags);
    }
    Ok(())
}

#[cfg(not(windows))]
fn apply_windows(_command: &mut Command, _windows: &WindowsOptions) -> Result<(), RunError> {
    Err(RunError::UnsupportedPlatform { options: "Windows" })
}

#[cfg(unix)]
mod unix {
    use std::io;
    use std::os::unix::io::RawFd;

    /// Upper bound for the close-on-exec sweep.
    const MAX_SWEEP_FD: RawFd = 65_536;

    pub(super) struct ChildHook {
        pub pass_fds: Vec<RawFd>,
        pub close_fds: bool,
        pub restore_signals: bool,
        pub start_new_session: bool,
        pub fd_limit: RawFd,
    }

    impl ChildHook {
        pub fn is_noop(&self) -> bool {
            self.pass_fds.is_empty()
                && !self.close_fds
                && self.restore_signals
                && !self.start_new_session
        }

        /// Runs in the forked child right before exec.
        pub fn run(&self) -> io::Result<()> {
            if self.start_new_session && unsafe { libc::setsid() } == -1 {
                return Err(io::Error::last_os_error());
            }
            if !self.restore_signals {
                unsafe {
                    libc::signal(libc::SIGPIPE, libc::SIG_IGN);
                }
            }
            if self.close_fds {
                for fd in 3..self.fd_limit {
                    if !self.pass_fds.contains(&fd) {
                        // EBADF for descriptors that are not open.
                        let _ = set_cloexec(fd, true);
                    }
                }
            }
            for &fd in &self.pass_fds {
                set_cloexec(fd, false)?;
            }
            Ok(())
        }
    }

    fn set_cloexec(fd: RawFd, on: bool) -> io::Result<()> {
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
        if flags == -1 {
            return Err(io::Error::last_os_error());
        }
        let wanted = if on {
            flags | libc::FD_CLOEXEC
        } else {
            flags & !libc::FD_CLOEXEC
        };
        if wanted != flags && unsafe { libc::fcntl(fd, libc::F_SETFD, wanted) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub(super) fn open_fd_limit() -> RawFd {
        let limit = unsafe { libc::sysconf(libc::_SC_OPEN_MAX) };
        if limit <= 0 {
            1024
        } else {
            limit.min(MAX_SWEEP_FD as libc::c_long) as RawFd
        }
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posix_options_from_toml() {
        let options: PosixOptions = toml::from_str(
            r#"
            pass_fds = [3, 4]
            start_new_session = true
            user = 1000
            "#,
        )
        .expect("valid posix options");
        assert_eq!(options.pass_fds, vec![3, 4]);
        assert!(options.start_new_session);
        assert!(options.restore_signals); // Default
        assert_eq!(options.user, Some(1000));
        assert_eq!(options.group, None);
    }

    #[test]
    fn test_posix_options_reject_unknown_name() {
        let result: Result<PosixOptions, _> = toml::from_str("preexec_fn = \"setup\"");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("preexec_fn"), "unexpected error: {err}");
    }

    #[test]
    fn test_posix_options_reject_wrong_type() {
        let result: Result<PosixOptions, _> = toml::from_str("start_new_session = \"yes\"");
        assert!(result.is_err());
        let result: Result<PosixOptions, _> = toml::from_str("pass_fds = 3");
        assert!(result.is_err());
    }

    #[test]
    fn test_windows_options_validation() {
        let options: WindowsOptions = toml::from_str(
            r#"
            creation_flags = 512
            startup_info = { hide_window = true }
            "#,
        )
        .expect("valid windows options");
        assert_eq!(options.effective_creation_flags(), 512 | CREATE_NO_WINDOW);

        let result: Result<WindowsOptions, _> = toml::from_str("creation_flags = \"512\"");
        assert!(result.is_err());
        let result: Result<WindowsOptions, _> = toml::from_str("startupinfo = {}");
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_descriptor_is_rejected() {
        let options = PlatformOptions::Posix(PosixOptions {
            pass_fds: vec![3, -1],
            ..Default::default()
        });
        let err = options.validate().unwrap_err();
        assert!(matches!(err, RunError::InvalidOption(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_windows_options_unsupported_on_unix() {
        let mut command = Command::new("true");
        let options = PlatformOptions::Windows(WindowsOptions::default());
        let err = apply(&mut command, Some(&options), false).unwrap_err();
        assert!(matches!(err, RunError::UnsupportedPlatform { options: "Windows" }));
    }

    #[cfg(unix)]
    #[test]
    fn test_hook_skipped_for_defaults() {
        let hook = unix::ChildHook {
            pass_fds: Vec::new(),
            close_fds: false,
            restore_signals: true,
            start_new_session: false,
            fd_limit: unix::open_fd_limit(),
        };
        assert!(hook.is_noop());
        assert!(hook.fd_limit > 3);
    }
}
