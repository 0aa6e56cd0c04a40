// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The controller's line-delimited JSON protocol, in both directions.
//!
//! Incoming values are parsed loosely as `serde_json::Value` first and
//! then matched by shape: a value that parses as JSON but matches none
//! of the recognized shapes is a [`crate::error`]-free no-op (logged
//! and skipped), never a stall — only genuinely malformed JSON bytes
//! stay buffered as residual.

use serde::Serialize;
use serde_json::Value;

/// A decoded `{"run script": {"script": "...", "file": "..."}}` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunScriptRequest {
    pub script: String,
    pub file: String,
}

/// Try to read a `RunScriptRequest` out of an arbitrary incoming value.
/// Returns `None` for any shape the controller doesn't recognize.
pub fn parse_run_script(value: &Value) -> Option<RunScriptRequest> {
    let body = value.get("run script")?;
    let script = body.get("script")?.as_str()?.to_string();
    let file = body.get("file")?.as_str()?.to_string();
    Some(RunScriptRequest { script, file })
}

/// One outgoing protocol event, serialized as a single JSON line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingEvent {
    /// A recorded gesture, forwarded verbatim from the agent.
    Event { script: String },
    /// Target stderr or an agent-side script error.
    AppErrors(String),
    /// An agent log line.
    ScriptLogs(String),
    /// Target stdout.
    AppOutput(String),
    /// End of one dispatched fragment.
    ScriptEnd,
}

impl OutgoingEvent {
    /// Render as the exact JSON value the wire shape describes.
    pub fn to_value(&self) -> Value {
        #[derive(Serialize)]
        struct Event<'a> {
            script: &'a str,
        }
        match self {
            OutgoingEvent::Event { script } => serde_json::json!({ "event": Event { script } }),
            OutgoingEvent::AppErrors(text) => serde_json::json!({ "app errors": text }),
            OutgoingEvent::ScriptLogs(text) => serde_json::json!({ "script logs": text }),
            OutgoingEvent::AppOutput(text) => serde_json::json!({ "app output": text }),
            OutgoingEvent::ScriptEnd => Value::String("script end".to_string()),
        }
    }

    /// Render as a single line of output, newline-terminated.
    pub fn to_line(&self) -> String {
        format!("{}\n", self.to_value())
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
