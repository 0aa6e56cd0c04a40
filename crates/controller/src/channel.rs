// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The async counterpart to the agent's synchronous framed channel.
//!
//! A dedicated reader task and a dedicated writer task share one
//! `TcpStream` split in half; the reader pushes decoded packets onto an
//! `mpsc` channel the dispatcher drains, the writer drains an `mpsc`
//! channel of outgoing packets the dispatcher feeds. Both stop as soon
//! as the socket closes or the supplied `CancellationToken` fires.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use wmonkey_core::{create_packet, FrameBuffer, Packet};

use crate::error::ChannelError;

const READ_CHUNK: usize = 4096;

/// One outgoing packet, queued for the writer task.
#[derive(Debug, Clone)]
pub struct Outgoing {
    pub kind: u32,
    pub text: String,
}

/// Handle to a running agent connection. Dropping it does not itself
/// close the socket; call [`Channel::shut_down`] or cancel the shared
/// token to stop both tasks.
pub struct Channel {
    incoming: mpsc::Receiver<Packet>,
    outgoing: mpsc::Sender<Outgoing>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Channel {
    /// Take ownership of `stream` and start its reader/writer tasks.
    pub fn spawn(stream: TcpStream, cancel: CancellationToken) -> Self {
        let (read_half, write_half) = stream.into_split();
        let (incoming_tx, incoming_rx) = mpsc::channel(64);
        let (outgoing_tx, outgoing_rx) = mpsc::channel(64);

        let reader_cancel = cancel.clone();
        let reader = tokio::spawn(read_loop(read_half, incoming_tx, reader_cancel));
        let writer = tokio::spawn(write_loop(write_half, outgoing_rx, cancel));

        Self { incoming: incoming_rx, outgoing: outgoing_tx, reader, writer }
    }

    /// Receive the next packet from the agent, or `None` once the
    /// socket has closed and every buffered packet has been drained.
    pub async fn recv(&mut self) -> Option<Packet> {
        self.incoming.recv().await
    }

    /// Queue `text` under `kind` for delivery to the agent.
    pub async fn send(&self, kind: u32, text: impl Into<String>) -> Result<(), ChannelError> {
        self.outgoing
            .send(Outgoing { kind, text: text.into() })
            .await
            .map_err(|_| ChannelError::Closed)
    }

    /// Wait for both tasks to finish (best-effort; ignores panics).
    pub async fn join(self) {
        drop(self.outgoing);
        let _ = self.reader.await;
        let _ = self.writer.await;
    }
}

async fn read_loop(
    mut read_half: tokio::net::tcp::OwnedReadHalf,
    incoming_tx: mpsc::Sender<Packet>,
    cancel: CancellationToken,
) {
    let mut frame = FrameBuffer::new();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            read = read_half.read(&mut chunk) => {
                let n = match read {
                    Ok(0) | Err(_) => return,
                    Ok(n) => n,
                };
                frame.push(&chunk[..n]);
                loop {
                    match frame.pop() {
                        Ok(Some(packet)) => {
                            if incoming_tx.send(packet).await.is_err() {
                                return;
                            }
                        }
                        Ok(None) => break,
                        Err(_) => return,
                    }
                }
            }
        }
    }
}

async fn write_loop(
    mut write_half: tokio::net::tcp::OwnedWriteHalf,
    mut outgoing_rx: mpsc::Receiver<Outgoing>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            next = outgoing_rx.recv() => {
                match next {
                    Some(Outgoing { kind, text }) => {
                        let wire = create_packet(kind, &text);
                        if write_half.write_all(&wire).await.is_err() {
                            return;
                        }
                    }
                    None => return,
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
