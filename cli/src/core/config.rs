//! # runcmd Configuration System
//!
//! File: cli/src/core/config.rs
//! Author: runcmd contributors
//!
//! ## Overview
//!
//! Loads the defaults the `runcmd` binary uses to build its `RunOptions`. A
//! project can pin settings such as a timeout or a trace style in a
//! `.runcmd.toml`, and a user can keep personal defaults in their config
//! directory. Command-line flags override both.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. Project-specific `.runcmd.toml` in the current directory or an ancestor
//!    (the search stops at a directory containing `.git`)
//! 2. User-specific `<config dir>/runcmd/config.toml`
//! 3. Default values of `RunOptions`
//!
//! Every table is deserialized with `deny_unknown_fields`, so misspelled keys and
//! wrongly typed values are reported instead of being ignored. Paths are expanded
//! (`~` to the home directory) and the merged result is validated before use.
//!
//! ## Examples
//!
//! ```toml
//! [run]
//! timeout_secs = 30
//! trace = ["on", "timestamp"]
//! encoding = "utf-8-lossy"
//! env = { LC_ALL = "C" }
//!
//! [platform.posix]
//! start_new_session = true
//! ```
//!
use crate::common::process::{
    EnvSetting, OutputMode, PlatformOptions, PosixOptions, RunOptions, TraceFlag, TraceOptions,
    WindowsOptions,
};
use crate::core::error::{Result, RuncmdError};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
}

/// Defaults for `RunOptions`. Unset fields fall through to the next source.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Pass command lines to the platform shell.
    pub shell: Option<bool>,
    /// Timeout in (fractional) seconds.
    pub timeout_secs: Option<f64>,
    /// Trace flags: `on`, `timestamp`, `log-info`, `log-debug`.
    pub trace: Option<Vec<String>>,
    pub exit_on_error: Option<bool>,
    /// `utf-8`, `utf-8-lossy`, `latin1` or `binary`.
    pub encoding: Option<String>,
    pub close_fds: Option<bool>,
    /// Working directory for commands (can use ~). Will be expanded.
    pub cwd: Option<String>,
    /// Start commands with an empty environment plus `env`.
    pub clear_env: Option<bool>,
    /// Variables set for every command.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Platform option bags. At most one of the two may be given.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PlatformConfig {
    pub posix: Option<PosixOptions>,
    pub windows: Option<WindowsOptions>,
}

const PROJECT_CONFIG_FILENAME: &str = ".runcmd.toml";

impl Config {
    /// Builds `RunOptions` from this configuration.
    ///
    /// Assumes `validate_config` passed; invalid values are still reported as errors.
    pub fn to_run_options(&self) -> Result<RunOptions> {
        let run = &self.run;
        let mut options = RunOptions::default()
            .use_shell(run.shell.unwrap_or(false))
            .exit_on_error(run.exit_on_error.unwrap_or(false))
            .close_fds(run.close_fds.unwrap_or(false))
            .trace(parse_trace_flags(run.trace.as_deref().unwrap_or_default())?);

        if let Some(encoding) = &run.encoding {
            options = options.output_mode(parse_encoding(encoding)?);
        }
        if let Some(secs) = run.timeout_secs {
            options = options.timeout_secs(secs).ok_or_else(|| {
                anyhow!(RuncmdError::Config(format!(
                    "timeout_secs must be a non-negative number, got {secs}"
                )))
            })?;
        }
        if let Some(cwd) = &run.cwd {
            options = options.cwd(cwd);
        }
        options = options.env(if run.clear_env.unwrap_or(false) {
            EnvSetting::Replace(run.env.clone())
        } else if run.env.is_empty() {
            EnvSetting::Inherit
        } else {
            EnvSetting::Extend(run.env.clone())
        });
        if let Some(platform) = self.platform.to_platform_options()? {
            options = options.platform(platform);
        }
        Ok(options)
    }
}

impl PlatformConfig {
    fn to_platform_options(&self) -> Result<Option<PlatformOptions>> {
        match (&self.posix, &self.windows) {
            (Some(_), Some(_)) => Err(anyhow!(RuncmdError::Config(
                "Only one of [platform.posix] and [platform.windows] may be set.".to_string()
            ))),
            (Some(posix), None) => Ok(Some(PlatformOptions::Posix(posix.clone()))),
            (None, Some(windows)) => Ok(Some(PlatformOptions::Windows(windows.clone()))),
            (None, None) => Ok(None),
        }
    }
}

/// Parses trace flag names into `TraceOptions`.
pub fn parse_trace_flags<S: AsRef<str>>(flags: &[S]) -> Result<TraceOptions> {
    let parsed = flags
        .iter()
        .map(|flag| flag.as_ref().parse::<TraceFlag>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| anyhow!(RuncmdError::Config(e)))?;
    Ok(TraceOptions::from_flags(parsed))
}

/// Parses an encoding name into an `OutputMode`.
pub fn parse_encoding(encoding: &str) -> Result<OutputMode> {
    encoding
        .parse::<OutputMode>()
        .map_err(|e| anyhow!(RuncmdError::Config(e)))
}

pub fn load_config() -> Result<Config> {
    let user_config = load_user_config()?;
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    let project_config = load_project_config(&current_dir)?;
    let mut merged_config = merge_configs(user_config.unwrap_or_default(), project_config);
    expand_config_paths(&mut merged_config).context("Failed to expand paths in configuration")?;
    validate_config(&merged_config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", merged_config);
    Ok(merged_config)
}

/// Loads a single configuration file, skipping discovery and merging.
pub fn load_config_file(path: &Path) -> Result<Config> {
    let mut config = load_config_from_path(path)?;
    expand_config_paths(&mut config).context("Failed to expand paths in configuration")?;
    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

fn load_user_config() -> Result<Option<Config>> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "runcmd") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.exists() {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_from_path(&config_path).map(Some)
        } else {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

fn load_project_config(start: &Path) -> Result<Option<Config>> {
    if let Some(project_config_path) = find_project_config_path(start) {
        info!(
            "Loading project configuration from: {}",
            project_config_path.display()
        );
        load_config_from_path(&project_config_path).map(Some)
    } else {
        debug!("No project configuration file (.runcmd.toml) found in current directory or ancestors.");
        Ok(None)
    }
}

fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    let mut path = start;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Some(project_config);
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return None;
        }
        path = path.parent()?;
    }
}

pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Project values win field by field; environment maps are combined.
fn merge_configs(user: Config, project: Option<Config>) -> Config {
    let project = match project {
        Some(p) => p,
        None => return user,
    };
    let mut env = user.run.env;
    env.extend(project.run.env);
    Config {
        run: RunConfig {
            shell: project.run.shell.or(user.run.shell),
            timeout_secs: project.run.timeout_secs.or(user.run.timeout_secs),
            trace: project.run.trace.or(user.run.trace),
            exit_on_error: project.run.exit_on_error.or(user.run.exit_on_error),
            encoding: project.run.encoding.or(user.run.encoding),
            close_fds: project.run.close_fds.or(user.run.close_fds),
            cwd: project.run.cwd.or(user.run.cwd),
            clear_env: project.run.clear_env.or(user.run.clear_env),
            env,
        },
        // Option bags are replaced as a whole, never mixed.
        platform: if project.platform != PlatformConfig::default() {
            project.platform
        } else {
            user.platform
        },
    }
}

fn expand_config_paths(config: &mut Config) -> Result<()> {
    if let Some(cwd) = &config.run.cwd {
        let expanded = shellexpand::tilde(cwd).into_owned();
        debug!("Expanded working directory: {}", expanded);
        config.run.cwd = Some(expanded);
    }
    Ok(())
}

fn validate_config(config: &Config) -> Result<()> {
    info!("Validating final configuration...");
    if let Some(cwd) = &config.run.cwd {
        let dir = PathBuf::from(cwd);
        if !dir.exists() {
            warn!("Configured working directory '{}' does not exist.", dir.display());
        } else if !dir.is_dir() {
            return Err(anyhow!(RuncmdError::Config(format!(
                "Configured working directory '{}' exists but is not a directory.",
                dir.display()
            ))));
        }
    }
    // Building the options checks trace flags, encoding, timeout and platform bags.
    let options = config.to_run_options()?;
    if let Some(platform) = &options.platform {
        platform
            .validate()
            .map_err(|e| anyhow!(RuncmdError::Config(e.to_string())))?;
    }
    info!("Configuration validation successful.");
    Ok(())
}
