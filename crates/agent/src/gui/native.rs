// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A stand-in GUI thread: an OS thread that drains a queue of posted
//! closures in order, the only place that knows how to reach the
//! (assumed) native widget toolkit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{JoinHandle, ThreadId};

use super::GuiExecutor;

type Job = Box<dyn FnOnce() + Send>;

/// Runs posted closures on a dedicated OS thread, one at a time, in
/// post order. Stands in for the toolkit's native event loop, which in
/// a real embedding would be driven by the toolkit itself rather than
/// by this thread's `for job in rx { job() }` loop.
pub struct NativeGuiThread {
    sender: parking_lot::Mutex<Option<mpsc::Sender<Job>>>,
    thread_id: ThreadId,
    modal_identity: Arc<AtomicU64>,
    join_handle: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl NativeGuiThread {
    pub fn spawn() -> Arc<Self> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let modal_identity = Arc::new(AtomicU64::new(0));
        let (id_tx, id_rx) = mpsc::channel::<ThreadId>();

        let join_handle = std::thread::spawn(move || {
            let _ = id_tx.send(std::thread::current().id());
            for job in receiver {
                job();
            }
        });

        // The GUI thread sends its id before processing any job; a recv
        // failure here only happens if it panicked during startup, in
        // which case falling back to the caller's id is harmless (the
        // thread is already gone and every subsequent post() is a
        // silently dropped no-op).
        let thread_id = id_rx.recv().unwrap_or_else(|_| std::thread::current().id());

        Arc::new(Self {
            sender: parking_lot::Mutex::new(Some(sender)),
            thread_id,
            modal_identity,
            join_handle: parking_lot::Mutex::new(Some(join_handle)),
        })
    }

    /// Called from within a job running on the GUI thread to signal
    /// that a nested event loop (e.g. a modal dialog) has been entered.
    /// Visible to other threads immediately, independent of whether the
    /// job itself ever returns.
    pub fn enter_nested_loop(&self) {
        self.modal_identity.fetch_add(1, Ordering::SeqCst);
    }

    /// Shut the GUI thread down by dropping the sender and joining.
    /// Jobs still queued are dropped unrun.
    ///
    /// Blocks until the thread exits, which never happens if a
    /// previously posted job is stuck in an unbounded nested loop —
    /// callers that deliberately queue such a job must not call this.
    pub fn shutdown(&self) {
        self.sender.lock().take();
        if let Some(handle) = self.join_handle.lock().take() {
            let _ = handle.join();
        }
    }
}

impl GuiExecutor for NativeGuiThread {
    fn post(&self, job: Job) {
        // A closed receiver means the GUI thread has already exited;
        // there is nothing further to dispatch to.
        if let Some(sender) = self.sender.lock().as_ref() {
            let _ = sender.send(job);
        }
    }

    fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    fn modal_identity(&self) -> u64 {
        self.modal_identity.load(Ordering::SeqCst)
    }
}
