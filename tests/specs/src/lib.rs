// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end binary smoke tests.
//!
//! Spawns the real `wmonkey` controller binary as a subprocess, wired
//! to the compiled fixture target, and drives it purely through its
//! stdin/stdout JSON line protocol — the same surface a GUI front end
//! would use.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Duration;

/// Resolve the path to a compiled binary under `target/debug`.
fn workspace_binary(name: &str) -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join(name)
}

pub fn wmonkey_binary() -> PathBuf {
    workspace_binary("wmonkey")
}

pub fn fixture_target_binary() -> PathBuf {
    workspace_binary("wmonkey-fixture-target")
}

/// Write `contents` to a new file named `name` inside `dir`, returning
/// its path.
pub fn write_script(dir: &Path, name: &str, contents: &str) -> anyhow::Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}

/// Builder for configuring a [`WmonkeyProcess`] before spawning it.
pub struct WmonkeyBuilder {
    scripts: Vec<PathBuf>,
    exit_on_script_error: bool,
    wait_before_exit_ms: u64,
}

impl Default for WmonkeyBuilder {
    fn default() -> Self {
        Self { scripts: Vec::new(), exit_on_script_error: false, wait_before_exit_ms: 200 }
    }
}

impl WmonkeyBuilder {
    pub fn script(mut self, path: impl Into<PathBuf>) -> Self {
        self.scripts.push(path.into());
        self
    }

    pub fn exit_on_script_error(mut self) -> Self {
        self.exit_on_script_error = true;
        self
    }

    pub fn spawn(self) -> anyhow::Result<WmonkeyProcess> {
        let binary = wmonkey_binary();
        anyhow::ensure!(binary.exists(), "wmonkey binary not found at {}", binary.display());
        let fixture = fixture_target_binary();
        anyhow::ensure!(fixture.exists(), "fixture target binary not found at {}", fixture.display());

        let mut args: Vec<String> = vec![
            "--user-app".into(),
            fixture.to_string_lossy().into_owned(),
            "--log-format".into(),
            "text".into(),
            "--log-level".into(),
            "warn".into(),
            "--wait-before-exit-ms".into(),
            self.wait_before_exit_ms.to_string(),
        ];
        for script in &self.scripts {
            args.push("--script".into());
            args.push(script.to_string_lossy().into_owned());
        }
        if self.exit_on_script_error {
            args.push("--exit-on-script-error".into());
        }

        let mut child = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = child.stdin.take().expect("piped stdin");
        let stdout = BufReader::new(child.stdout.take().expect("piped stdout"));

        Ok(WmonkeyProcess { child, stdin, stdout })
    }
}

/// A running `wmonkey` controller process, killed on drop.
pub struct WmonkeyProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl WmonkeyProcess {
    pub fn build() -> WmonkeyBuilder {
        WmonkeyBuilder::default()
    }

    pub fn start(script: impl Into<PathBuf>) -> anyhow::Result<Self> {
        Self::build().script(script).spawn()
    }

    /// Send `{"run script": {"script": ..., "file": ...}}` on stdin.
    pub fn send_run_script(&mut self, file: &str, script: &str) -> anyhow::Result<()> {
        let value = serde_json::json!({ "run script": { "script": script, "file": file } });
        writeln!(self.stdin, "{value}")?;
        self.stdin.flush()?;
        Ok(())
    }

    /// Read and parse the next JSON line from stdout, blocking.
    pub fn read_value(&mut self) -> anyhow::Result<serde_json::Value> {
        let mut line = String::new();
        let n = self.stdout.read_line(&mut line)?;
        anyhow::ensure!(n > 0, "controller closed stdout");
        Ok(serde_json::from_str(line.trim_end())?)
    }

    /// Read JSON lines until one matches `predicate`, or `attempts` are
    /// exhausted.
    pub fn read_until(
        &mut self,
        attempts: usize,
        predicate: impl Fn(&serde_json::Value) -> bool,
    ) -> anyhow::Result<serde_json::Value> {
        for _ in 0..attempts {
            let value = self.read_value()?;
            if predicate(&value) {
                return Ok(value);
            }
        }
        anyhow::bail!("no matching line observed within {attempts} reads")
    }

    /// Wait for the process to exit within `timeout`.
    pub async fn wait_exit(&mut self, timeout: Duration) -> anyhow::Result<std::process::ExitStatus> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("wmonkey did not exit within {timeout:?}");
            }
            if let Some(status) = self.child.try_wait()? {
                return Ok(status);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

impl Drop for WmonkeyProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
