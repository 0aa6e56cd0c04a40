// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The stdin-reading helper thread.
//!
//! Standard input cannot be integrated into the async event loop
//! portably, so a dedicated OS thread reads it one byte at a time and
//! hands accumulated bytes to the dispatcher through a `SharedCell`
//! plus a notify signal, the way the teacher's console-adjacent code
//! bridges a blocking byte source into an async loop.

use std::io::Read;
use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::sync::Notify;
use wmonkey_core::SharedCell;

/// Owns the reader thread and the shared handoff buffer.
pub struct StdinBridge {
    buffer: Arc<SharedCell<Vec<u8>>>,
    notify: Arc<Notify>,
    _thread: JoinHandle<()>,
}

impl StdinBridge {
    /// Spawn the reader thread against the process's real stdin.
    pub fn spawn() -> Self {
        Self::spawn_from(Box::new(std::io::stdin()))
    }

    /// Spawn against an arbitrary byte source, for tests.
    pub fn spawn_from(mut source: Box<dyn Read + Send>) -> Self {
        let buffer = Arc::new(SharedCell::new(Vec::new()));
        let notify = Arc::new(Notify::new());

        let thread_buffer = Arc::clone(&buffer);
        let thread_notify = Arc::clone(&notify);
        let thread = std::thread::spawn(move || {
            let mut byte = [0u8; 1];
            loop {
                match source.read(&mut byte) {
                    Ok(0) | Err(_) => return,
                    Ok(_) => {
                        thread_buffer.lock().push(byte[0]);
                        thread_notify.notify_one();
                    }
                }
            }
        });

        Self { buffer, notify, _thread: thread }
    }

    /// Wait until at least one byte has been appended since the last
    /// call that observed one.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }

    /// Drain and return whatever bytes have accumulated so far.
    pub fn take_bytes(&self) -> Vec<u8> {
        std::mem::take(&mut *self.buffer.lock())
    }
}

#[cfg(test)]
#[path = "stdio_tests.rs"]
mod tests;
