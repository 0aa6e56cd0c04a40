// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The controller's `tokio::select!` loop: owns the child process, the
//! agent channel, the stdin bridge, and the script queue, and drives
//! the state machine described for the controller dispatcher.

use std::path::PathBuf;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use wmonkey_core::{split_to_executable_parts, ToAgent, ToController};

use crate::channel::Channel;
use crate::process::{ChildProcess, OutputLine};
use crate::protocol::{self, OutgoingEvent};
use crate::queue::{QueueAction, ScriptQueue};
use crate::stdio::StdinBridge;

/// One script source supplied on the command line via `--script`.
#[derive(Debug, Clone)]
pub struct ScriptSource {
    pub file: String,
    pub contents: String,
}

/// Everything the dispatcher needs to run one session.
pub struct DispatcherConfig {
    pub user_app: PathBuf,
    pub user_app_args: Vec<String>,
    pub initial_scripts: Vec<ScriptSource>,
    pub exit_on_script_error: bool,
    pub wait_before_exit: Duration,
    pub port_override: Option<u16>,
    /// Directory the agent should write screenshots into, forwarded to
    /// the child process as `QTMONKEY_SCREENSHOT_DIR`.
    pub screenshot_dir: Option<PathBuf>,
    /// Maximum number of screenshots the agent should retain, forwarded
    /// as `QTMONKEY_SCREENSHOT_RETAIN`.
    pub screenshot_retain: Option<usize>,
}

/// Emit one outgoing line on the controller's real stdout. Split out so
/// tests can swap in a buffer instead of the process stdout.
pub trait OutputSink {
    fn emit(&mut self, event: &OutgoingEvent);
}

/// Writes each event as one JSON line to stdout.
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&mut self, event: &OutgoingEvent) {
        print!("{}", event.to_line());
    }
}

/// Drive one controller session to completion, returning the process
/// exit code.
pub async fn run(
    config: DispatcherConfig,
    cancel: CancellationToken,
    sink: &mut dyn OutputSink,
) -> anyhow::Result<i32> {
    let listener =
        TcpListener::bind(("127.0.0.1", config.port_override.unwrap_or(0))).await?;
    let port = listener.local_addr()?.port();

    let mut queue = ScriptQueue::new();
    for script in &config.initial_scripts {
        queue.enqueue_all(split_to_executable_parts(&script.file, &script.contents));
    }

    let mut child = ChildProcess::spawn(
        &config.user_app,
        &config.user_app_args,
        port,
        config.screenshot_dir.as_deref(),
        config.screenshot_retain,
    )?;
    let (output_tx, mut output_rx) = mpsc::channel::<OutputLine>(256);
    child.forward_output(output_tx);

    let stdin_bridge = StdinBridge::spawn();
    let mut json_stream = wmonkey_core::jsonstream::JsonStream::new();
    let mut channel: Option<Channel> = None;
    let mut script_error_seen = false;
    let mut final_status_code: Option<i32> = None;
    let mut exit_timer_armed = false;
    let mut fatal_error: Option<std::io::Error> = None;

    try_dispatch_next(&mut queue, &channel, sink).await;

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                break;
            }

            event = next_channel_event(&mut channel, &listener) => {
                match event {
                    ChannelEvent::Accepted(stream) => {
                        channel = Some(Channel::spawn(stream, cancel.clone()));
                        try_dispatch_next(&mut queue, &channel, sink).await;
                    }
                    ChannelEvent::AcceptFailed(e) => {
                        warn!("failed to accept agent connection: {e}");
                        fatal_error = Some(e);
                        break;
                    }
                    ChannelEvent::Packet(p) => {
                        handle_agent_packet(
                            p,
                            &mut queue,
                            channel.as_ref(),
                            sink,
                            &mut script_error_seen,
                        ).await;
                        if config.exit_on_script_error && script_error_seen && !exit_timer_armed {
                            exit_timer_armed = true;
                            let deadline_cancel = cancel.clone();
                            let wait = config.wait_before_exit;
                            tokio::spawn(async move {
                                tokio::time::sleep(wait).await;
                                deadline_cancel.cancel();
                            });
                        }
                        try_dispatch_next(&mut queue, &channel, sink).await;
                    }
                    ChannelEvent::Disconnected => {
                        channel = None;
                    }
                }
            }

            line = output_rx.recv() => {
                if let Some(line) = line {
                    match line {
                        OutputLine::Stdout(text) => sink.emit(&OutgoingEvent::AppOutput(text)),
                        OutputLine::Stderr(text) => sink.emit(&OutgoingEvent::AppErrors(text)),
                    }
                }
            }

            _ = stdin_bridge.notified() => {
                let bytes = stdin_bridge.take_bytes();
                json_stream.push(&bytes);
                for value in json_stream.drain::<serde_json::Value>() {
                    match protocol::parse_run_script(&value) {
                        Some(request) => {
                            queue.enqueue_all(split_to_executable_parts(&request.file, &request.script));
                            try_dispatch_next(&mut queue, &channel, sink).await;
                        }
                        None => debug!("ignoring unrecognized stdin shape"),
                    }
                }
            }

            status = child.wait() => {
                let code = status.map(|s| s.code().unwrap_or(1)).unwrap_or(1);
                channel = None;
                if queue.is_empty() {
                    final_status_code = Some(code);
                    break;
                }
                debug!("target exited with queued work remaining, relaunching");
                child = ChildProcess::spawn(
                    &config.user_app,
                    &config.user_app_args,
                    port,
                    config.screenshot_dir.as_deref(),
                    config.screenshot_retain,
                )?;
                let (tx, rx) = mpsc::channel(256);
                output_rx = rx;
                child.forward_output(tx);
                queue.mark_restarted();
            }
        }
    }

    if let Some(e) = fatal_error {
        return Err(e.into());
    }

    Ok(final_status_code.unwrap_or(if script_error_seen { 1 } else { 0 }))
}

/// What happened the next time the agent connection made progress.
///
/// Folding "accept a new connection" and "read the next packet" into one
/// future keeps exactly one mutable borrow of `channel` alive per select
/// iteration, instead of splitting it across two branches that would
/// otherwise need to borrow it at once.
enum ChannelEvent {
    Accepted(tokio::net::TcpStream),
    AcceptFailed(std::io::Error),
    Packet(wmonkey_core::Packet),
    Disconnected,
}

async fn next_channel_event(channel: &mut Option<Channel>, listener: &TcpListener) -> ChannelEvent {
    match channel {
        Some(ch) => match ch.recv().await {
            Some(packet) => ChannelEvent::Packet(packet),
            None => ChannelEvent::Disconnected,
        },
        None => match listener.accept().await {
            Ok((stream, _)) => ChannelEvent::Accepted(stream),
            Err(e) => ChannelEvent::AcceptFailed(e),
        },
    }
}

async fn try_dispatch_next(queue: &mut ScriptQueue, channel: &Option<Channel>, sink: &mut dyn OutputSink) {
    let Some(channel) = channel else { return };
    if queue.action() != QueueAction::Ready {
        return;
    }
    let Some(mut fragment) = queue.dispatch_next() else { return };
    let code = fragment.take_code();
    if let Err(e) = channel.send(ToAgent::SetScriptFileName as u32, fragment.filename.clone()).await
    {
        warn!("failed to send filename to agent: {e}");
    }
    if let Err(e) = channel.send(ToAgent::RunScript as u32, code).await {
        warn!("failed to send script to agent: {e}");
        sink.emit(&OutgoingEvent::AppErrors(format!("failed to dispatch script: {e}")));
    }
}

async fn handle_agent_packet(
    packet: wmonkey_core::Packet,
    queue: &mut ScriptQueue,
    channel: Option<&Channel>,
    sink: &mut dyn OutputSink,
    script_error_seen: &mut bool,
) {
    match packet.to_controller_kind() {
        Some(ToController::NewUserAppEvent) => {
            sink.emit(&OutgoingEvent::Event { script: packet.text });
        }
        Some(ToController::ScriptError) => {
            *script_error_seen = true;
            sink.emit(&OutgoingEvent::AppErrors(packet.text));
            queue.mark_fragment_done();
        }
        Some(ToController::ScriptEnd) => {
            sink.emit(&OutgoingEvent::ScriptEnd);
            queue.mark_fragment_done();
        }
        Some(ToController::ScriptLog) => {
            sink.emit(&OutgoingEvent::ScriptLogs(packet.text));
        }
        Some(ToController::StopOnBreakpoint) => {
            debug!("breakpoint hit at {}, stepping is not implemented", packet.text);
        }
        Some(ToController::Close) => {
            if let Some(channel) = channel {
                if let Err(e) = channel.send(ToAgent::CloseAck as u32, "").await {
                    warn!("failed to ack agent close: {e}");
                }
            }
        }
        None => warn!("received packet with unknown kind {}", packet.kind),
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
