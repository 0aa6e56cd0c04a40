// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Target application lifecycle.
//!
//! Unlike the teacher's `NativePty`, the target here is not attached to
//! a pseudo-terminal: the controller only needs to launch a plain child
//! process with one extra environment variable and observe its stdio
//! and exit status, so `tokio::process::Command` is the right primitive
//! and no `unsafe` `forkpty` dance is required.

use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout};
use tokio::sync::mpsc;

use crate::error::ProcessError;

/// A running target process, with its stdout/stderr forwarded line by
/// line onto a channel the dispatcher turns into `{"app output":...}`
/// and `{"app errors":...}` events.
pub struct ChildProcess {
    child: Child,
}

/// One line of target output, tagged by stream.
#[derive(Debug, Clone)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

impl ChildProcess {
    /// Spawn `program args...` with `QTMONKEY_PORT` set to `port`,
    /// encoded the way [`wmonkey_core::encode_port_env`] specifies.
    ///
    /// `screenshot_dir`/`screenshot_retain`, when set, are forwarded as
    /// `QTMONKEY_SCREENSHOT_DIR`/`QTMONKEY_SCREENSHOT_RETAIN` so the
    /// child's own agent runtime can configure its screenshot policy
    /// without the controller touching its own process environment.
    pub fn spawn(
        program: &Path,
        args: &[String],
        port: u16,
        screenshot_dir: Option<&Path>,
        screenshot_retain: Option<usize>,
    ) -> Result<Self, ProcessError> {
        let port_bytes = wmonkey_core::encode_port_env(port);
        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args)
            .env("QTMONKEY_PORT", OsStr::from_bytes(&port_bytes))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = screenshot_dir {
            cmd.env("QTMONKEY_SCREENSHOT_DIR", dir);
        }
        if let Some(retain) = screenshot_retain {
            cmd.env("QTMONKEY_SCREENSHOT_RETAIN", retain.to_string());
        }
        let child = cmd.spawn().map_err(ProcessError::Spawn)?;
        Ok(Self { child })
    }

    /// Take the child's stdout/stderr pipes and spawn tasks that forward
    /// each line onto `tx`, tagged by stream.
    pub fn forward_output(&mut self, tx: mpsc::Sender<OutputLine>) {
        if let Some(stdout) = self.child.stdout.take() {
            spawn_line_forwarder(stdout, tx.clone(), OutputLine::Stdout);
        }
        if let Some(stderr) = self.child.stderr.take() {
            spawn_line_forwarder_err(stderr, tx, OutputLine::Stderr);
        }
    }

    pub async fn wait(&mut self) -> Result<ExitStatus, ProcessError> {
        self.child.wait().await.map_err(ProcessError::Wait)
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }
}

fn spawn_line_forwarder(
    stdout: ChildStdout,
    tx: mpsc::Sender<OutputLine>,
    wrap: fn(String) -> OutputLine,
) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(wrap(line)).await.is_err() {
                break;
            }
        }
    });
}

fn spawn_line_forwarder_err(
    stderr: ChildStderr,
    tx: mpsc::Sender<OutputLine>,
    wrap: fn(String) -> OutputLine,
) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(wrap(line)).await.is_err() {
                break;
            }
        }
    });
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
