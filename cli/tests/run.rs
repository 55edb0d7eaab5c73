//! # runcmd CLI Run Integration Tests
//!
//! File: cli/tests/run.rs
//! Author: runcmd contributors
//!
//! ## Overview
//!
//! Integration tests for `runcmd run` and `runcmd config`, driving the compiled
//! binary. Every test runs inside a fresh temporary directory so project and
//! user configuration files are fully controlled.
//!
//! Most tests need POSIX tools (`sh`, `cat`, `sleep`) and are Unix-only.
//!

mod common;
use common::*;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[cfg(unix)]
mod unix {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_run_relays_stdout_and_exit_code() {
        let dir = tempdir().unwrap();
        runcmd_cmd_in(dir.path())
            .args(["run", "echo hello world"])
            .assert()
            .success()
            .stdout("hello world\n");

        runcmd_cmd_in(dir.path())
            .args(["run", "sh -c 'echo oops >&2; exit 3'"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("oops"));
    }

    #[test]
    fn test_run_exit_on_error_fails_with_report() {
        let dir = tempdir().unwrap();
        runcmd_cmd_in(dir.path())
            .args([
                "run",
                "--exit-on-error",
                "sh -c 'echo broken >&2; exit 3'",
            ])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("exit status: 3."))
            .stderr(predicate::str::contains("broken"));
    }

    #[test]
    fn test_run_missing_executable() {
        let dir = tempdir().unwrap();
        runcmd_cmd_in(dir.path())
            .args(["run", "definitely-not-a-real-program-4711 --flag"])
            .assert()
            .code(1)
            .stdout("")
            .stderr(predicate::str::contains("file not found"));
    }

    #[test]
    fn test_run_timeout_kills_command() {
        let dir = tempdir().unwrap();
        let started = Instant::now();
        runcmd_cmd_in(dir.path())
            .args(["run", "--timeout", "0.5", "sleep 10"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("timed out after 0.5 seconds"));
        assert!(started.elapsed() < Duration::from_secs(8));
    }

    #[test]
    fn test_run_shell_mode_pipeline() {
        let dir = tempdir().unwrap();
        runcmd_cmd_in(dir.path())
            .args(["run", "--shell", "printf 'a\\nb\\nc\\n' | wc -l | tr -d ' '"])
            .assert()
            .success()
            .stdout("3\n");
    }

    #[test]
    fn test_run_feeds_input_text() {
        let dir = tempdir().unwrap();
        runcmd_cmd_in(dir.path())
            .args(["run", "--input", "piped text", "cat"])
            .assert()
            .success()
            .stdout("piped text");
    }

    #[test]
    fn test_run_binary_input_file_with_hex_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.bin");
        fs::write(&input, [0x00u8, 0xff, 0x10, 0x80]).unwrap();
        runcmd_cmd_in(dir.path())
            .args(["run", "--binary", "--hex", "--input-file"])
            .arg(&input)
            .arg("cat")
            .assert()
            .success()
            .stdout("00ff1080\n");
    }

    #[test]
    fn test_run_strict_utf8_rejects_invalid_output() {
        let dir = tempdir().unwrap();
        runcmd_cmd_in(dir.path())
            .args(["run", "--shell", "printf '\\377'"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("not valid utf-8"));

        runcmd_cmd_in(dir.path())
            .args(["run", "--encoding", "latin1", "--shell", "printf '\\377'"])
            .assert()
            .success()
            .stdout("\u{ff}");
    }

    #[test]
    fn test_run_env_and_cwd() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        runcmd_cmd_in(dir.path())
            .args(["run", "--env", "GREETING=hi there", "--cwd", "sub"])
            .arg("sh -c 'echo \"$GREETING\"; basename \"$PWD\"'")
            .assert()
            .success()
            .stdout("hi there\nsub\n");
    }

    #[test]
    fn test_run_clear_env() {
        let dir = tempdir().unwrap();
        runcmd_cmd_in(dir.path())
            .env("RUNCMD_TEST_LEAK", "1")
            .args(["run", "--clear-env", "--env", "ONLY=1"])
            .arg("/usr/bin/env")
            .assert()
            .success()
            .stdout("ONLY=1\n");
    }

    #[test]
    fn test_run_trace_on_stderr() {
        let dir = tempdir().unwrap();
        runcmd_cmd_in(dir.path())
            .args(["run", "--trace", "on", "echo traced"])
            .assert()
            .success()
            .stdout("traced\n")
            .stderr(predicate::str::contains("> echo traced"))
            .stderr(predicate::str::contains("> exit_code: 0"))
            .stderr(predicate::str::contains("  stdout:\ntraced"));
    }

    #[test]
    fn test_run_uses_project_config() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(".runcmd.toml"),
            "[run]\nexit_on_error = true\ntrace = [\"on\"]\n",
        )
        .unwrap();
        runcmd_cmd_in(dir.path())
            .args(["run", "sh -c 'exit 4'"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("> sh -c 'exit 4'"));

        // --no-config ignores the project file.
        runcmd_cmd_in(dir.path())
            .args(["run", "--no-config", "sh -c 'exit 4'"])
            .assert()
            .code(4);
    }

    #[test]
    fn test_run_project_config_found_from_subdirectory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".runcmd.toml"), "[run]\nshell = true\n").unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        runcmd_cmd_in(&nested)
            .args(["run", "echo one | tr o 0"])
            .assert()
            .success()
            .stdout("0ne\n");
    }

    #[test]
    fn test_run_explicit_config_file() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("ci.toml");
        fs::write(&config, "[run]\nenv = { FROM_FILE = \"yes\" }\n").unwrap();
        runcmd_cmd_in(dir.path())
            .args(["run", "--config"])
            .arg(&config)
            .arg("sh -c 'echo $FROM_FILE'")
            .assert()
            .success()
            .stdout("yes\n");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_run_new_session() {
        let dir = tempdir().unwrap();
        // Field 6 of /proc/<pid>/stat is the session id; a session leader's equals its pid.
        let check = "test \"$(cut -d' ' -f6 /proc/$$/stat)\" = \"$$\"";
        runcmd_cmd_in(dir.path())
            .args(["run", "--new-session", "--shell", check])
            .assert()
            .success();
        runcmd_cmd_in(dir.path())
            .args(["run", "--shell", check])
            .assert()
            .code(1);
    }
}

#[test]
fn test_run_rejects_unknown_config_key() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".runcmd.toml"), "[run]\ntimeout = 5\n").unwrap();
    runcmd_cmd_in(dir.path())
        .args(["run", "echo never"])
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("Failed to load runcmd configuration"));
}

#[test]
fn test_run_rejects_unknown_platform_option() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join(".runcmd.toml"),
        "[platform.posix]\npreexec_fn = \"x\"\n",
    )
    .unwrap();
    runcmd_cmd_in(dir.path())
        .args(["run", "echo never"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_run_rejects_empty_command_line() {
    let dir = tempdir().unwrap();
    runcmd_cmd_in(dir.path())
        .args(["run", "   "])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Command line is empty."));
}

#[test]
fn test_run_rejects_unbalanced_quotes() {
    let dir = tempdir().unwrap();
    runcmd_cmd_in(dir.path())
        .args(["run", "echo 'unterminated"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to split command line"));
}

#[test]
fn test_run_rejects_negative_timeout() {
    let dir = tempdir().unwrap();
    runcmd_cmd_in(dir.path())
        .args(["run", "--timeout=-1", "echo hi"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--timeout"));
}

#[test]
fn test_config_shows_defaults() {
    let dir = tempdir().unwrap();
    runcmd_cmd_in(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("shell: false"))
        .stdout(predicate::str::contains("timeout: none"))
        .stdout(predicate::str::contains("encoding: utf-8"));
}

#[test]
fn test_config_merges_user_and_project_files() {
    let dir = tempdir().unwrap();
    // User file under $XDG_CONFIG_HOME/runcmd/config.toml.
    let user_dir = dir.path().join("runcmd");
    fs::create_dir(&user_dir).unwrap();
    fs::write(
        user_dir.join("config.toml"),
        "[run]\ntimeout_secs = 9\nencoding = \"latin1\"\n",
    )
    .unwrap();
    let project = dir.path().join("project");
    fs::create_dir(&project).unwrap();
    fs::write(project.join(".runcmd.toml"), "[run]\ntimeout_secs = 2.5\n").unwrap();

    let assert = runcmd_cmd_in(&project).arg("config").assert().success();
    if cfg!(target_os = "linux") {
        assert
            .stdout(predicate::str::contains("timeout: 2.5s"))
            .stdout(predicate::str::contains("encoding: latin1"));
    }
}
