// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::Parser;

/// GUI-automation controller: launches a target application and drives it
/// through a recorded or hand-written script.
#[derive(Debug, Parser)]
#[command(name = "wmonkey", version, about)]
pub struct Config {
    /// Path to the target application binary.
    #[arg(long, env = "QTMONKEY_USER_APP")]
    pub user_app: PathBuf,

    /// Script file to run. May be given more than once; fragments from
    /// every file are enqueued in the order given.
    #[arg(long = "script", required = true)]
    pub scripts: Vec<PathBuf>,

    /// Terminate shortly after the first script error is observed.
    #[arg(long, env = "QTMONKEY_EXIT_ON_SCRIPT_ERROR")]
    pub exit_on_script_error: bool,

    /// Text encoding of script files and stdio (only "utf-8" is supported).
    #[arg(long, env = "QTMONKEY_ENCODING", default_value = "utf-8")]
    pub encoding: String,

    /// Log format (json or text).
    #[arg(long, env = "QTMONKEY_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "QTMONKEY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Pin the loopback port the agent connects back on, instead of
    /// letting the OS assign one.
    #[arg(long, env = "QTMONKEY_PORT_OVERRIDE")]
    pub port: Option<u16>,

    /// How long to drain events after `--exit-on-script-error` fires,
    /// before cancelling the session.
    #[arg(long, env = "QTMONKEY_WAIT_BEFORE_EXIT_MS", default_value = "300")]
    pub wait_before_exit_ms: u64,

    /// Directory the agent writes screenshots into.
    #[arg(long, env = "QTMONKEY_SCREENSHOT_DIR")]
    pub screenshot_dir: Option<PathBuf>,

    /// Maximum number of screenshots to retain (newest by mtime).
    #[arg(long, env = "QTMONKEY_SCREENSHOT_RETAIN")]
    pub screenshot_retain: Option<usize>,

    /// Arguments forwarded to the target application.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub user_app_args: Vec<String>,
}

const SUPPORTED_ENCODINGS: &[&str] = &["utf-8", "utf8"];

impl Config {
    /// Validate the configuration after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.scripts.is_empty() {
            anyhow::bail!("at least one --script must be specified");
        }
        if self.user_app.as_os_str().is_empty() {
            anyhow::bail!("--user-app must not be empty");
        }
        if !SUPPORTED_ENCODINGS.contains(&self.encoding.to_lowercase().as_str()) {
            anyhow::bail!("unsupported --encoding: {}", self.encoding);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
