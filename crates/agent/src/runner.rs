// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Evaluates a script fragment in the (externally supplied) embedded
//! interpreter, surfacing a structured fault on uncaught failure.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use wmonkey_core::ScriptFragment;

use crate::error::ScriptFault;

/// The embedded script interpreter is an external collaborator; this
/// crate only needs "evaluate source, produce optional error with
/// backtrace" from it.
pub trait ScriptEngine {
    /// Evaluate `code`. On an uncaught failure, return the interpreter's
    /// raw backtrace frames (outermost first) and its exception message.
    fn evaluate(&mut self, code: &str) -> Result<(), EngineFailure>;

    /// The line currently executing, parsed from the last backtrace
    /// frame of the live execution context. `None` when idle.
    fn current_line(&self) -> Option<u32>;

    /// Raise a script-visible error from a host callback. Requires a
    /// script to currently be running.
    fn throw_error(&mut self, message: &str) -> Result<(), ThrowOutsideScript>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrowOutsideScript;

/// Raw failure data as reported by the interpreter, before the runner
/// resolves the failing line and offending source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineFailure {
    pub backtrace: Vec<BacktraceFrame>,
    pub message: String,
    /// The interpreter's own exception-line attribute, used when the
    /// backtrace is empty.
    pub exception_line: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacktraceFrame {
    pub line: u32,
    pub text: String,
}

thread_local! {
    /// The "current script runner" register: worker-thread-only, so a
    /// plain `RefCell` behind a thread-local needs no lock.
    static CURRENT: RefCell<Option<ScriptContext>> = const { RefCell::new(None) };
}

/// A scoped register pointing at the fragment currently executing.
/// Worker-thread-only; installed only between entry and exit of
/// [`ScriptRunner::run`].
#[derive(Clone)]
pub struct ScriptContext {
    filename: PathBuf,
    begin_line: u32,
}

impl ScriptContext {
    /// Resolve a line number relative to the start of this fragment's
    /// own source text (as the interpreter reports it) to the absolute
    /// line in the original script file.
    pub fn current_line_number(&self, relative_line: u32) -> u32 {
        self.begin_line + relative_line.saturating_sub(1)
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Install `self` as the current script runner register for the
    /// duration of `f`, restoring whatever was installed before
    /// (normally nothing) once `f` returns. `f` is handed back a
    /// reference to the installed context.
    fn install<R>(self, f: impl FnOnce(&ScriptContext) -> R) -> R {
        let snapshot = self.clone();
        let previous = CURRENT.with(|cell| cell.borrow_mut().replace(self));
        let result = f(&snapshot);
        CURRENT.with(|cell| *cell.borrow_mut() = previous);
        result
    }
}

/// The absolute file line of the fragment currently running on this
/// thread, if any. Used by script-facing operations (e.g.
/// [`crate::api::ScriptApi::script_checkpoint`]) that need to report
/// "where" a script currently is without holding their own reference to
/// the interpreter.
pub fn current_line() -> Option<u32> {
    CURRENT.with(|cell| cell.borrow().as_ref().map(|ctx| ctx.begin_line))
}

/// The script file currently running on this thread, if any.
pub fn current_filename() -> Option<PathBuf> {
    CURRENT.with(|cell| cell.borrow().as_ref().map(|ctx| ctx.filename().to_path_buf()))
}

/// Evaluates one [`ScriptFragment`] and turns interpreter failures into
/// a [`ScriptFault`] with a resolved failing line and source text.
pub struct ScriptRunner<'e> {
    engine: &'e mut dyn ScriptEngine,
}

impl<'e> ScriptRunner<'e> {
    pub fn new(engine: &'e mut dyn ScriptEngine) -> Self {
        Self { engine }
    }

    /// Run `fragment`'s code, consuming it. Returns `Ok(())` on success
    /// or a [`ScriptFault`] carrying the backtrace, failing line,
    /// offending source text and message.
    pub fn run(&mut self, fragment: &mut ScriptFragment) -> Result<(), ScriptFault> {
        let code = fragment.take_code();
        let context =
            ScriptContext { filename: PathBuf::from(&fragment.filename), begin_line: fragment.begin_line };
        let engine = &mut self.engine;

        context.install(move |context| match engine.evaluate(&code) {
            Ok(()) => Ok(()),
            Err(failure) => Err(to_fault(&code, failure, context)),
        })
    }
}

/// Turn a raw [`EngineFailure`] into a [`ScriptFault`], resolving the
/// interpreter's fragment-relative line number to the absolute line in
/// the original script file via `context`.
fn to_fault(source: &str, failure: EngineFailure, context: &ScriptContext) -> ScriptFault {
    let relative_line =
        failure.backtrace.last().map(|frame| frame.line).or(failure.exception_line);

    let offending_source = relative_line.and_then(|line| nth_line(source, line));
    let failing_line = relative_line.map(|line| context.current_line_number(line));

    ScriptFault {
        backtrace: failure.backtrace.into_iter().map(|f| f.text).collect(),
        failing_line,
        offending_source,
        message: failure.message,
    }
}

fn nth_line(source: &str, line: u32) -> Option<String> {
    if line == 0 {
        return None;
    }
    source.split('\n').nth((line - 1) as usize).map(str::to_string)
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
