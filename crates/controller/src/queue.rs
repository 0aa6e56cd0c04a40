// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The FIFO fragment queue and the restart-gating state machine.
//!
//! A fragment is dispatched only while nothing else is running; a
//! fragment marked `run_after_app_start` additionally waits for the
//! child to have been freshly restarted since the last such dispatch.

use std::collections::VecDeque;

use wmonkey_core::ScriptFragment;

/// What the dispatcher should do right now.
#[derive(Debug, PartialEq, Eq)]
pub enum QueueAction {
    /// Nothing queued.
    Empty,
    /// A fragment is running; wait for it to finish.
    Busy,
    /// The head fragment needs a fresh restart before it can run.
    WaitForRestart,
    /// The head fragment is ready to dispatch now.
    Ready,
}

#[derive(Debug, Default)]
pub struct ScriptQueue {
    fragments: VecDeque<ScriptFragment>,
    script_running: bool,
    restart_done: bool,
}

impl ScriptQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue_all(&mut self, fragments: Vec<ScriptFragment>) {
        self.fragments.extend(fragments);
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn script_running(&self) -> bool {
        self.script_running
    }

    /// Record that the child process has just been relaunched, opening
    /// the restart gate for the next `run_after_app_start` fragment.
    pub fn mark_restarted(&mut self) {
        self.restart_done = true;
    }

    /// Record that the previously dispatched fragment has finished
    /// (`ScriptEnd` or `ScriptError` observed).
    pub fn mark_fragment_done(&mut self) {
        self.script_running = false;
    }

    pub fn action(&self) -> QueueAction {
        if self.script_running {
            return QueueAction::Busy;
        }
        match self.fragments.front() {
            None => QueueAction::Empty,
            Some(f) if f.run_after_app_start && !self.restart_done => QueueAction::WaitForRestart,
            Some(_) => QueueAction::Ready,
        }
    }

    /// Pop and return the head fragment if [`Self::action`] is
    /// [`QueueAction::Ready`]; otherwise leaves the queue untouched.
    ///
    /// Dispatching a gated fragment closes the restart gate again, so a
    /// later `run_after_app_start` fragment needs its own restart.
    pub fn dispatch_next(&mut self) -> Option<ScriptFragment> {
        if self.action() != QueueAction::Ready {
            return None;
        }
        let gated = self.fragments.front().map(|f| f.run_after_app_start).unwrap_or(false);
        let fragment = self.fragments.pop_front()?;
        self.script_running = true;
        if gated {
            self.restart_done = false;
        }
        Some(fragment)
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
