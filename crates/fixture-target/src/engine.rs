// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A minimal stand-in script interpreter: recognizes a handful of
//! `Test.*` calls line by line and evaluates them against a real
//! [`ScriptApi`], without embedding a real language runtime. Exists
//! only so the controller's dispatcher can be exercised end-to-end
//! against a compiled target binary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use wmonkey_agent::runner::{BacktraceFrame, EngineFailure, ScriptEngine, ThrowOutsideScript};
use wmonkey_agent::ScriptApi;

pub struct FixtureEngine {
    api: Arc<ScriptApi>,
    current_line: Option<u32>,
    running: bool,
    /// Set when a script calls `Test.quit()`. The binary's main loop
    /// polls this to know when to close the channel and exit, since
    /// there is no real toolkit event loop whose own termination would
    /// signal it.
    quit: Arc<AtomicBool>,
}

impl FixtureEngine {
    pub fn new(api: Arc<ScriptApi>, quit: Arc<AtomicBool>) -> Self {
        Self { api, current_line: None, running: false, quit }
    }
}

impl ScriptEngine for FixtureEngine {
    fn evaluate(&mut self, code: &str) -> Result<(), EngineFailure> {
        self.running = true;
        let result = self.evaluate_lines(code);
        self.running = false;
        self.current_line = None;
        result
    }

    fn current_line(&self) -> Option<u32> {
        self.current_line
    }

    fn throw_error(&mut self, message: &str) -> Result<(), ThrowOutsideScript> {
        if !self.running {
            return Err(ThrowOutsideScript);
        }
        tracing::warn!("script threw: {message}");
        Ok(())
    }
}

impl FixtureEngine {
    fn evaluate_lines(&mut self, code: &str) -> Result<(), EngineFailure> {
        for (offset, raw_line) in code.split('\n').enumerate() {
            let line_no = (offset + 1) as u32;
            self.current_line = Some(line_no);
            let line = raw_line.trim().trim_end_matches(';').trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            if let Some(text) = call_argument(line, "Test.log") {
                self.api.log(&text);
                continue;
            }
            if let Some(text) = call_argument(line, "Test.fail") {
                return Err(EngineFailure {
                    backtrace: vec![BacktraceFrame { line: line_no, text: line.to_string() }],
                    message: text,
                    exception_line: Some(line_no),
                });
            }
            if let Some(ms) = call_argument(line, "Test.wait").and_then(|s| s.parse().ok()) {
                self.api.wait(ms);
                continue;
            }
            if line == "Test.quit()" {
                self.quit.store(true, Ordering::SeqCst);
                continue;
            }
            tracing::debug!("fixture engine ignoring unrecognized statement: {line}");
        }
        Ok(())
    }
}

/// Pull the single string (or bare numeric) argument out of a call like
/// `Test.log("hi")` or `Test.wait(50)`. Returns `None` if `line` doesn't
/// start with `prefix(`.
fn call_argument(line: &str, prefix: &str) -> Option<String> {
    let rest = line.strip_prefix(prefix)?.trim_start();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?.trim();
    if let Some(quoted) = inner.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(quoted.to_string())
    } else if !inner.is_empty() {
        Some(inner.to_string())
    } else {
        None
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
