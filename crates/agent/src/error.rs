// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed errors for the agent-side modules, converted from toolkit- or
//! interpreter-specific failures at their owning module's boundary.

use thiserror::Error;

/// Errors raised marshaling work onto or off of the GUI thread.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuiError {
    #[error("runInGui called from the GUI thread")]
    WrongThread,
    #[error("GUI round trip exceeded its timeout")]
    Timeout,
}

/// Errors resolving a widget identifier path to a live widget.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WidgetError {
    #[error("widget path `{0}` could not be parsed")]
    BadPath(String),
    #[error("no widget found for path `{0}`")]
    NotFound(String),
    #[error("widget `{0}` is not currently on screen")]
    NotOnScreen(String),
    #[error("widget `{0}` is disabled")]
    Disabled(String),
    #[error("timed out after {0:?} waiting for widget `{1}`")]
    TimedOut(std::time::Duration, String),
}

/// Bad arguments passed to a script API operation: unknown mouse button,
/// empty key sequence, odd-length index list, and the like.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScriptContractError {
    #[error("unknown mouse button `{0}`")]
    UnknownButton(String),
    #[error("empty key sequence")]
    EmptyKeySequence,
    #[error("index list must have an even number of entries, got {0}")]
    OddIndexList(usize),
    #[error(transparent)]
    Widget(#[from] WidgetError),
    #[error(transparent)]
    Gui(#[from] GuiError),
}

/// An uncaught failure inside the script interpreter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("script evaluation failed: {message}")]
pub struct ScriptFault {
    pub backtrace: Vec<String>,
    pub failing_line: Option<u32>,
    pub offending_source: Option<String>,
    pub message: String,
}

impl ScriptFault {
    /// Render the backtrace, failing line, offending source text and
    /// message as the single formatted string the `ScriptError` packet
    /// carries back to the controller.
    pub fn to_report_string(&self) -> String {
        let mut out = String::new();
        for frame in &self.backtrace {
            out.push_str(frame);
            out.push('\n');
        }
        if let Some(line) = self.failing_line {
            out.push_str(&format!("at line {line}"));
            if let Some(source) = &self.offending_source {
                out.push_str(": ");
                out.push_str(source);
            }
            out.push('\n');
        }
        out.push_str(&self.message);
        out
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
