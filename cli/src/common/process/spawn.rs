//! # runcmd Spawn and Wait Plumbing (`common::process::spawn`)
//!
//! File: cli/src/common/process/spawn.rs
//! Author: runcmd contributors
//!
//! ## Overview
//!
//! Turns a command line plus `RunOptions` into a `std::process::Command`, and
//! drives a spawned child to completion: feed stdin, drain stdout/stderr, wait
//! with an optional deadline.
//!
//! ## Architecture
//!
//! Stdin is written and both output pipes are read on helper threads while the
//! calling thread waits, so a child producing more output than a pipe buffer
//! holds cannot deadlock against us. Waiting with a deadline uses
//! `wait_timeout::ChildExt`; the helpers report back over a channel that is
//! read with the same deadline. When the deadline passes the child is killed
//! and reaped, and the helper threads are detached because grandchildren that
//! inherited the pipes may keep them open for a while.
//!
use super::options::{EnvSetting, RunOptions};
use super::platform;
use crate::core::error::RunError;
use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Raw result of a child that exited on its own.
#[derive(Debug)]
pub(crate) struct RawOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Result reported by one of the pipe helper threads.
enum Piped {
    Stdin(io::Result<()>),
    Stdout(io::Result<Vec<u8>>),
    Stderr(io::Result<Vec<u8>>),
}

#[derive(Debug)]
pub(crate) enum Completion {
    Exited(RawOutput),
    TimedOut,
}

/// Builds the `Command` for `command_line` without spawning it.
pub(crate) fn build_command(command_line: &str, options: &RunOptions) -> Result<Command, RunError> {
    let mut command = if options.use_shell {
        shell_command(command_line)
    } else {
        let argv = shell_words::split(command_line).map_err(|source| RunError::Tokenize {
            command_line: command_line.to_string(),
            source,
        })?;
        let (program, args) = argv.split_first().ok_or(RunError::EmptyCommand)?;
        let mut command = Command::new(program);
        command.args(args);
        command
    };

    match &options.env {
        EnvSetting::Inherit => {}
        EnvSetting::Replace(vars) => {
            command.env_clear().envs(vars);
        }
        EnvSetting::Extend(vars) => {
            command.envs(vars);
        }
    }
    if let Some(dir) = &options.cwd {
        command.current_dir(dir);
    }
    platform::apply(&mut command, options.platform.as_ref(), options.close_fds)?;

    command.stdout(Stdio::piped()).stderr(Stdio::piped());
    Ok(command)
}

#[cfg(unix)]
fn shell_command(command_line: &str) -> Command {
    let mut command = Command::new("/bin/sh");
    command.arg("-c").arg(command_line);
    command
}

#[cfg(windows)]
fn shell_command(command_line: &str) -> Command {
    use std::os::windows::process::CommandExt;

    let shell = std::env::var_os("COMSPEC").unwrap_or_else(|| "cmd.exe".into());
    let mut command = Command::new(shell);
    command.arg("/C").raw_arg(command_line);
    command
}

/// Spawns `command`; stdin is a pipe only when there is input to write.
pub(crate) fn spawn(command: &mut Command, with_input: bool) -> io::Result<Child> {
    if with_input {
        command.stdin(Stdio::piped());
    } else {
        command.stdin(Stdio::inherit());
    }
    let child = command.spawn()?;
    debug!("Spawned child process {}", child.id());
    Ok(child)
}

/// Feeds `input`, collects all output and waits for `child` to exit or for
/// `timeout` to pass.
///
/// The deadline covers draining the pipes too: a background process that
/// inherited stdout or stderr and keeps it open past the deadline makes the
/// run time out even though the direct child already exited.
pub(crate) fn communicate(
    mut child: Child,
    input: Option<Vec<u8>>,
    timeout: Option<Duration>,
) -> io::Result<Completion> {
    let deadline = timeout.map(|limit| Instant::now() + limit);
    let (tx, rx) = mpsc::channel();
    let mut pending = 2;
    if let (Some(stdin), Some(data)) = (child.stdin.take(), input) {
        let tx = tx.clone();
        pending += 1;
        thread::spawn(move || {
            let _ = tx.send(Piped::Stdin(feed(stdin, data)));
        });
    }
    let stdout = child.stdout.take();
    let stdout_tx = tx.clone();
    thread::spawn(move || {
        let _ = stdout_tx.send(Piped::Stdout(drain(stdout)));
    });
    let stderr = child.stderr.take();
    thread::spawn(move || {
        let _ = tx.send(Piped::Stderr(drain(stderr)));
    });

    let waited = match deadline {
        Some(deadline) => child.wait_timeout(remaining(deadline)),
        None => child.wait().map(Some),
    };
    let status = match waited {
        Ok(Some(status)) => status,
        Ok(None) => {
            debug!("Deadline passed, killing child process {}", child.id());
            terminate(&mut child);
            return Ok(Completion::TimedOut);
        }
        Err(err) => {
            terminate(&mut child);
            return Err(err);
        }
    };

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    while pending > 0 {
        let piped = match deadline {
            Some(deadline) => match rx.recv_timeout(remaining(deadline)) {
                Ok(piped) => piped,
                Err(RecvTimeoutError::Timeout) => {
                    // The child is already reaped; whoever holds the pipes is not ours to wait for.
                    debug!("Deadline passed while output pipes were still open");
                    return Ok(Completion::TimedOut);
                }
                Err(RecvTimeoutError::Disconnected) => return Err(helper_panicked()),
            },
            None => rx.recv().map_err(|_| helper_panicked())?,
        };
        match piped {
            Piped::Stdin(result) => result?,
            Piped::Stdout(result) => stdout = result?,
            Piped::Stderr(result) => stderr = result?,
        }
        pending -= 1;
    }
    Ok(Completion::Exited(RawOutput {
        status,
        stdout,
        stderr,
    }))
}

/// Exit code for `status`: the code itself, the negated signal number when
/// the child was killed by a signal, `-1` otherwise.
pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

fn feed(mut stdin: ChildStdin, data: Vec<u8>) -> io::Result<()> {
    match stdin.write_all(&data) {
        // The child may exit without reading everything.
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
    // `stdin` drops here, which closes the pipe.
}

fn drain<R: Read>(pipe: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf)?;
    }
    Ok(buf)
}

fn terminate(child: &mut Child) {
    if let Err(err) = child.kill() {
        warn!("Failed to kill child process {}: {}", child.id(), err);
    }
    if let Err(err) = child.wait() {
        warn!("Failed to reap child process {}: {}", child.id(), err);
    }
}

/// Time left until `deadline`, zero once it has passed.
fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}

fn helper_panicked() -> io::Error {
    io::Error::other("pipe helper thread panicked")
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::process::options::RunOptions;
    use std::collections::BTreeMap;

    fn args_of(command: &Command) -> Vec<String> {
        command
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_build_command_splits_words() {
        let command =
            build_command(r#"grep -c "two words" 'file name.txt'"#, &RunOptions::default())
                .unwrap();
        assert_eq!(command.get_program(), "grep");
        assert_eq!(args_of(&command), vec!["-c", "two words", "file name.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_build_command_shell_mode_passes_line_unmodified() {
        let line = r#"find . -name "*.rs" | wc -l"#;
        let command = build_command(line, &RunOptions::default().use_shell(true)).unwrap();
        assert_eq!(command.get_program(), "/bin/sh");
        assert_eq!(args_of(&command), vec!["-c", line]);
    }

    #[test]
    fn test_build_command_rejects_empty_and_unbalanced() {
        let err = build_command("   ", &RunOptions::default()).unwrap_err();
        assert!(matches!(err, RunError::EmptyCommand));
        let err = build_command("echo \"open", &RunOptions::default()).unwrap_err();
        assert!(matches!(err, RunError::Tokenize { .. }));
    }

    #[test]
    fn test_build_command_environment() {
        let vars = BTreeMap::from([("ONLY".to_string(), "this".to_string())]);
        let command = build_command(
            "env",
            &RunOptions::default().env(EnvSetting::Replace(vars)).cwd("/tmp"),
        )
        .unwrap();
        let envs: Vec<_> = command.get_envs().collect();
        assert_eq!(envs.len(), 1);
        assert_eq!(envs[0].0, "ONLY");
        assert_eq!(command.get_current_dir(), Some(std::path::Path::new("/tmp")));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_code_reports_signal() {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(exit_code(ExitStatus::from_raw(3 << 8)), 3);
        assert_eq!(exit_code(ExitStatus::from_raw(9)), -9);
    }

    #[cfg(unix)]
    #[test]
    fn test_communicate_large_output_does_not_block() {
        let mut command =
            build_command("head -c 1000000 /dev/zero", &RunOptions::default()).unwrap();
        let child = spawn(&mut command, false).unwrap();
        match communicate(child, None, Some(Duration::from_secs(30))).unwrap() {
            Completion::Exited(raw) => {
                assert!(raw.status.success());
                assert_eq!(raw.stdout.len(), 1_000_000);
            }
            Completion::TimedOut => panic!("head should not time out"),
        }
    }
}
