// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Owns components C1-C8 on the target side: boots the worker thread,
//! routes incoming `RunScript` packets through the script runner, and
//! emits `ScriptEnd`/`ScriptError`/`ScriptLog`/`NewUserAppEvent` back to
//! the controller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use wmonkey_core::{split_to_executable_parts, ScriptFragment, ToAgent, ToController};

use crate::channel::Channel;
use crate::gui::{run_in_gui_with_timeout, GuiExecutor};
use crate::runner::{ScriptEngine, ScriptRunner};

const POLL_TIMEOUT: Duration = Duration::from_millis(200);
const POST_SCRIPT_DRAIN: Duration = Duration::from_secs(10);
const CLOSE_ACK_TIMEOUT: Duration = Duration::from_secs(2);

enum ShutdownRequest {
    Quit,
}

/// Handle to the agent's worker thread. Construction blocks until the
/// worker has either connected and signaled ready, or has given up.
pub struct AgentOrchestrator {
    ready: Arc<AtomicBool>,
    failed: Arc<AtomicBool>,
    shutdown_tx: mpsc::Sender<ShutdownRequest>,
    join_handle: Mutex<Option<JoinHandle<()>>>,
}

impl AgentOrchestrator {
    /// Spawn the worker thread, which connects to `port` and then drains
    /// `RunScript`/`SetScriptFileName` packets, running them through
    /// `engine` and reporting outcomes back over the channel. Blocks the
    /// calling thread until the worker reports ready or exits early.
    pub fn spawn<E>(port: u16, gui: Arc<dyn GuiExecutor>, engine: E) -> Self
    where
        E: ScriptEngine + Send + 'static,
    {
        let ready = Arc::new(AtomicBool::new(false));
        let failed = Arc::new(AtomicBool::new(false));
        let (shutdown_tx, shutdown_rx) = mpsc::channel();

        let worker_ready = Arc::clone(&ready);
        let worker_failed = Arc::clone(&failed);
        let join_handle = std::thread::spawn(move || {
            worker_loop(port, gui, engine, shutdown_rx, worker_ready, worker_failed);
        });

        while !ready.load(Ordering::SeqCst) && !failed.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(5));
        }

        Self { ready, failed, shutdown_tx, join_handle: Mutex::new(Some(join_handle)) }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn connect_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    /// The `aboutToQuit` hook: ask the worker to send `Close`, wait for
    /// `CloseAck` (bounded), and join the thread.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(ShutdownRequest::Quit);
        if let Some(handle) = self.join_handle.lock().take() {
            let _ = handle.join();
        }
    }

    /// Block until the worker thread exits on its own, e.g. because the
    /// controller closed the channel without an orderly `Close`. Unlike
    /// [`Self::shutdown`], this never asks the worker to quit.
    pub fn wait(&self) {
        if let Some(handle) = self.join_handle.lock().take() {
            let _ = handle.join();
        }
    }
}

struct PendingScript {
    filename: Option<String>,
}

fn worker_loop<E: ScriptEngine>(
    port: u16,
    gui: Arc<dyn GuiExecutor>,
    mut engine: E,
    shutdown_rx: mpsc::Receiver<ShutdownRequest>,
    ready: Arc<AtomicBool>,
    failed: Arc<AtomicBool>,
) {
    let mut channel = match Channel::connect(port) {
        Ok(channel) => channel,
        Err(_) => {
            failed.store(true, Ordering::SeqCst);
            return;
        }
    };
    ready.store(true, Ordering::SeqCst);

    let mut pending = PendingScript { filename: None };

    loop {
        if matches!(shutdown_rx.try_recv(), Ok(ShutdownRequest::Quit)) {
            let _ = channel.close_and_wait_ack(
                ToController::Close as u32,
                ToAgent::CloseAck as u32,
                CLOSE_ACK_TIMEOUT,
            );
            return;
        }

        let packet = match channel.try_recv_timeout(POLL_TIMEOUT) {
            Ok(Some(packet)) => packet,
            Ok(None) => continue,
            Err(_) => return,
        };

        match packet.to_agent_kind() {
            Some(ToAgent::SetScriptFileName) => pending.filename = Some(packet.text),
            Some(ToAgent::RunScript) => {
                let filename = pending.filename.take().unwrap_or_else(|| "<script>".to_string());
                dispatch_run_script(&mut channel, &gui, &mut engine, &filename, &packet.text);
            }
            _ => {}
        }
    }
}

/// Split `source` into fragments and run each, emitting `ScriptError`
/// (if it failed) followed by `ScriptEnd` for every fragment in order.
/// On success, synchronizes with the GUI thread for up to 10 s before
/// `ScriptEnd` so in-flight recorded events arrive first.
fn dispatch_run_script<E: ScriptEngine>(
    channel: &mut Channel,
    gui: &Arc<dyn GuiExecutor>,
    engine: &mut E,
    filename: &str,
    source: &str,
) {
    let mut fragments = split_to_executable_parts(filename, source);
    for fragment in &mut fragments {
        run_one_fragment(channel, gui, engine, fragment);
    }
}

fn run_one_fragment<E: ScriptEngine>(
    channel: &mut Channel,
    gui: &Arc<dyn GuiExecutor>,
    engine: &mut E,
    fragment: &mut ScriptFragment,
) {
    let mut runner = ScriptRunner::new(engine);
    match runner.run(fragment) {
        Ok(()) => {
            let _ = run_in_gui_with_timeout(gui.as_ref(), || (), POST_SCRIPT_DRAIN);
        }
        Err(fault) => {
            let _ = channel.send(ToController::ScriptError as u32, &fault.to_report_string());
        }
    }
    let _ = channel.send(ToController::ScriptEnd as u32, "");
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
