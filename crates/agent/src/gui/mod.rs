// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-thread invocation onto the GUI thread, with a timed variant
//! that tolerates a nested event loop (e.g. a modal dialog) opened by
//! the posted closure.

pub mod native;

use std::thread::ThreadId;
use std::time::{Duration, Instant};

use wmonkey_core::Semaphore;

use crate::error::GuiError;

/// Capability to post a closure onto the toolkit's native GUI thread.
///
/// Object-safe by design: the toolkit adapter is the only place that
/// knows how to queue work into the native loop. Return values travel
/// back through the closure's own captures rather than through the
/// trait, which keeps this dyn-compatible.
pub trait GuiExecutor: Send + Sync {
    /// Enqueue `job` to run on the GUI thread; returns immediately.
    fn post(&self, job: Box<dyn FnOnce() + Send>);

    /// Identity of the OS thread this executor's jobs run on.
    fn thread_id(&self) -> ThreadId;

    /// A monotonically increasing counter a running job bumps when it
    /// opens a nested event loop (e.g. a modal dialog), and again when
    /// it closes one. Used to detect "f is blocked in a nested loop"
    /// from the calling thread without a real event queue to inspect.
    fn modal_identity(&self) -> u64;
}

const MARKER_POLL: Duration = Duration::from_millis(10);
const MARKER_BUDGET: Duration = Duration::from_millis(50);
const EVENT_PUMP_INTERVAL: Duration = Duration::from_millis(100);

/// Post `f` to the GUI thread and block the calling thread until it
/// completes, returning its result.
///
/// Panics (via [`GuiError::WrongThread`]) if called from the GUI thread
/// itself — this function exists for the worker thread only.
pub fn run_in_gui<T, F>(executor: &dyn GuiExecutor, f: F) -> Result<T, GuiError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    if std::thread::current().id() == executor.thread_id() {
        return Err(GuiError::WrongThread);
    }

    let done = std::sync::Arc::new(Semaphore::new(0));
    let slot = std::sync::Arc::new(parking_lot::Mutex::new(None));

    let done_job = std::sync::Arc::clone(&done);
    let slot_job = std::sync::Arc::clone(&slot);
    executor.post(Box::new(move || {
        let result = f();
        *slot_job.lock() = Some(result);
        done_job.release();
    }));

    done.acquire();
    let mut guard = slot.lock();
    guard.take().ok_or(GuiError::Timeout)
}

/// Post `f` to the GUI thread and wait for it, but make progress if `f`
/// opens a nested event loop instead of returning directly.
///
/// Algorithm:
/// 1. Snapshot the current modal identity.
/// 2. Post `f`.
/// 3. Poll briefly (the "marker" wait) for either completion or a
///    change in modal identity.
/// 4. If the identity changed, `f` opened a nested loop: keep polling
///    for completion up to `timeout`, checking every 100 ms.
/// 5. If `timeout` elapses, return `Err(GuiError::Timeout)` without
///    cancelling `f` — it remains queued/running in the background.
pub fn run_in_gui_with_timeout<T, F>(
    executor: &dyn GuiExecutor,
    f: F,
    timeout: Duration,
) -> Result<T, GuiError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    if std::thread::current().id() == executor.thread_id() {
        return Err(GuiError::WrongThread);
    }

    let done = std::sync::Arc::new(Semaphore::new(0));
    let slot = std::sync::Arc::new(parking_lot::Mutex::new(None));
    let modal_before = executor.modal_identity();

    let done_job = std::sync::Arc::clone(&done);
    let slot_job = std::sync::Arc::clone(&slot);
    executor.post(Box::new(move || {
        let result = f();
        *slot_job.lock() = Some(result);
        done_job.release();
    }));

    // Stage 1: short marker wait — cheap, distinguishes "already done"
    // and "just slow" from "opened a nested loop".
    let marker_deadline = Instant::now() + MARKER_BUDGET;
    loop {
        if done.try_acquire(MARKER_POLL) {
            return take_result(&slot);
        }
        if executor.modal_identity() != modal_before {
            break;
        }
        if Instant::now() >= marker_deadline {
            break;
        }
    }

    // Stage 2: timed event-pump loop. `f` may be running a nested
    // event loop; keep polling rather than blocking indefinitely.
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(GuiError::Timeout);
        }
        let slice = remaining.min(EVENT_PUMP_INTERVAL);
        if done.try_acquire(slice) {
            return take_result(&slot);
        }
    }
}

fn take_result<T>(slot: &parking_lot::Mutex<Option<T>>) -> Result<T, GuiError> {
    slot.lock().take().ok_or(GuiError::Timeout)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
