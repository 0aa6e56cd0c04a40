// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent side of the framed channel: a blocking TCP connection to
//! the controller, read from and written to by the worker thread.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use thiserror::Error;
use wmonkey_core::{create_packet, FrameBuffer, Packet, ProtocolError};

/// Transport-level failures connecting to or communicating with the
/// controller. Distinct from [`ProtocolError`], which covers framing
/// once bytes are flowing.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not connect to controller: {0}")]
    ConnectRefused(#[source] std::io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("channel I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("controller did not send CloseAck before the shutdown deadline")]
    CloseAckTimeout,
}

/// A connected, blocking channel to the controller. Owns the socket and
/// the receive-side [`FrameBuffer`]; reads are synchronous, and a
/// remote disconnect that follows an orderly `Close`/`CloseAck`
/// exchange is not surfaced as an error.
pub struct Channel {
    stream: TcpStream,
    recv_buf: FrameBuffer,
}

impl Channel {
    /// Connect to `127.0.0.1:port`, as advertised through the
    /// `QTMONKEY_PORT` environment variable.
    pub fn connect(port: u16) -> Result<Self, TransportError> {
        let stream =
            TcpStream::connect(("127.0.0.1", port)).map_err(TransportError::ConnectRefused)?;
        stream.set_nodelay(true).ok();
        Ok(Self { stream, recv_buf: FrameBuffer::new() })
    }

    /// Send one packet, handling partial writes internally.
    pub fn send(&mut self, kind: u32, text: &str) -> Result<(), TransportError> {
        let wire = create_packet(kind, text);
        self.stream.write_all(&wire)?;
        Ok(())
    }

    /// Block until one full packet has been read and framed.
    pub fn recv(&mut self) -> Result<Packet, TransportError> {
        loop {
            if let Some(packet) = self.recv_buf.pop()? {
                return Ok(packet);
            }
            let mut chunk = [0u8; 4096];
            let n = self.stream.read(&mut chunk)?;
            if n == 0 {
                return Err(TransportError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "controller closed the connection",
                )));
            }
            self.recv_buf.push(&chunk[..n]);
        }
    }

    /// Poll for one packet, blocking no longer than `timeout`. Returns
    /// `Ok(None)` when nothing complete arrived in that window, letting
    /// the caller interleave shutdown checks with receiving.
    pub fn try_recv_timeout(&mut self, timeout: Duration) -> Result<Option<Packet>, TransportError> {
        if let Some(packet) = self.recv_buf.pop()? {
            return Ok(Some(packet));
        }
        self.stream.set_read_timeout(Some(timeout)).ok();
        let mut chunk = [0u8; 4096];
        match self.stream.read(&mut chunk) {
            Ok(0) => Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "controller closed the connection",
            ))),
            Ok(n) => {
                self.recv_buf.push(&chunk[..n]);
                Ok(self.recv_buf.pop()?)
            }
            Err(e) if matches!(e.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut) => {
                Ok(None)
            }
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    /// Send `Close` and block (bounded) for the controller's
    /// `CloseAck`, draining and discarding any other packets that
    /// arrive in the meantime.
    pub fn close_and_wait_ack(
        &mut self,
        close_kind: u32,
        close_ack_kind: u32,
        timeout: Duration,
    ) -> Result<(), TransportError> {
        self.send(close_kind, "")?;
        self.stream.set_read_timeout(Some(timeout)).ok();
        let deadline = std::time::Instant::now() + timeout;
        loop {
            if std::time::Instant::now() >= deadline {
                return Err(TransportError::CloseAckTimeout);
            }
            match self.recv() {
                Ok(packet) if packet.kind == close_ack_kind => return Ok(()),
                Ok(_) => continue,
                Err(TransportError::Io(e)) if matches!(e.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut) => {
                    return Err(TransportError::CloseAckTimeout);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
