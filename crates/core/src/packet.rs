// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-prefixed packet framing for the agent/controller wire protocol.
//!
//! A packet is a little-endian three-word header (`magic`, `type`, `length`)
//! followed by exactly `length` bytes of UTF-8 text.

use thiserror::Error;

/// Four bytes of magic at the start of every header.
pub const MAGIC: u32 = 0x1234_5678;

/// Largest payload this protocol will frame.
pub const MAX_PACKET_LEN: u32 = 1024 * 1024;

const HEADER_LEN: usize = 12;

/// Packet kinds sent from controller to agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ToAgent {
    RunScript = 0,
    SetScriptFileName = 1,
    SetBreakpoint = 2,
    Continue = 3,
    Halt = 4,
    CloseAck = 5,
}

impl ToAgent {
    fn from_u32(v: u32) -> Option<Self> {
        Some(match v {
            0 => Self::RunScript,
            1 => Self::SetScriptFileName,
            2 => Self::SetBreakpoint,
            3 => Self::Continue,
            4 => Self::Halt,
            5 => Self::CloseAck,
            _ => return None,
        })
    }
}

/// Packet kinds sent from agent to controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ToController {
    NewUserAppEvent = 0,
    ScriptError = 1,
    ScriptEnd = 2,
    ScriptLog = 3,
    StopOnBreakpoint = 4,
    Close = 5,
}

impl ToController {
    fn from_u32(v: u32) -> Option<Self> {
        Some(match v {
            0 => Self::NewUserAppEvent,
            1 => Self::ScriptError,
            2 => Self::ScriptEnd,
            3 => Self::ScriptLog,
            4 => Self::StopOnBreakpoint,
            5 => Self::Close,
            _ => return None,
        })
    }
}

/// A fully decoded packet: a raw type tag plus its UTF-8 payload.
///
/// Kept generic over the raw `u32` tag rather than a single shared enum
/// because `ToAgent` and `ToController` are disjoint type spaces that
/// happen to share numeric values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub kind: u32,
    pub text: String,
}

impl Packet {
    pub fn to_agent_kind(&self) -> Option<ToAgent> {
        ToAgent::from_u32(self.kind)
    }

    pub fn to_controller_kind(&self) -> Option<ToController> {
        ToController::from_u32(self.kind)
    }
}

/// Errors arising from malformed framing. Fatal for the channel: the
/// caller must stop consuming and close the connection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("packet magic mismatch")]
    BadMagic,
    #[error("packet length {0} exceeds maximum of {MAX_PACKET_LEN}")]
    Oversize(u32),
    #[error("packet payload is not valid UTF-8")]
    InvalidUtf8,
}

/// Result of inspecting the head of a receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Fewer bytes than a full header, or fewer than header+length.
    NotReady,
    /// Magic mismatch or length exceeds [`MAX_PACKET_LEN`].
    Damaged,
    /// At least one full packet is available at the front of the buffer.
    Ready,
}

/// Serialize a packet into its wire representation.
pub fn create_packet(kind: u32, text: &str) -> Vec<u8> {
    let body = text.as_bytes();
    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(&MAGIC.to_le_bytes());
    out.extend_from_slice(&kind.to_le_bytes());
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(body);
    out
}

/// Inspect the head of `buf` without consuming it.
pub fn calc_frame_state(buf: &[u8]) -> FrameState {
    if buf.len() < HEADER_LEN {
        return FrameState::NotReady;
    }
    let magic = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if magic != MAGIC {
        return FrameState::Damaged;
    }
    let length = u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
    if length > MAX_PACKET_LEN {
        return FrameState::Damaged;
    }
    if buf.len() < HEADER_LEN + length as usize {
        return FrameState::NotReady;
    }
    FrameState::Ready
}

/// Pop exactly one packet from the front of `buf`, returning it plus the
/// number of bytes consumed. Caller must have already confirmed
/// [`FrameState::Ready`].
pub fn extract_from_buffer(buf: &[u8]) -> Result<(Packet, usize), ProtocolError> {
    match calc_frame_state(buf) {
        FrameState::NotReady => return Err(ProtocolError::BadMagic),
        FrameState::Damaged => {
            let magic = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
            if magic != MAGIC {
                return Err(ProtocolError::BadMagic);
            }
            let length = u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
            return Err(ProtocolError::Oversize(length));
        }
        FrameState::Ready => {}
    }
    let kind = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let length = u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]) as usize;
    let body = &buf[HEADER_LEN..HEADER_LEN + length];
    let text = String::from_utf8(body.to_vec()).map_err(|_| ProtocolError::InvalidUtf8)?;
    Ok((Packet { kind, text }, HEADER_LEN + length))
}

/// An accumulating receive buffer that pops complete packets as they
/// become available, carrying residual bytes across pushes.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append freshly received bytes, in whatever chunk size arrived.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pop one packet if the buffer holds a complete one.
    ///
    /// Returns `Ok(None)` when more bytes are needed, `Err` when the
    /// buffer is damaged (caller should stop consuming).
    pub fn pop(&mut self) -> Result<Option<Packet>, ProtocolError> {
        match calc_frame_state(&self.buf) {
            FrameState::NotReady => Ok(None),
            FrameState::Damaged => {
                let magic = u32::from_le_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]);
                if magic != MAGIC {
                    Err(ProtocolError::BadMagic)
                } else {
                    let length =
                        u32::from_le_bytes([self.buf[8], self.buf[9], self.buf[10], self.buf[11]]);
                    Err(ProtocolError::Oversize(length))
                }
            }
            FrameState::Ready => {
                let (packet, consumed) = extract_from_buffer(&self.buf)?;
                self.buf.drain(..consumed);
                Ok(Some(packet))
            }
        }
    }
}

#[cfg(test)]
#[path = "packet_tests.rs"]
mod tests;
