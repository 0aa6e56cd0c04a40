// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency-light building blocks shared by the synchronous agent and
//! the async controller: wire framing, the script splitter, the shared
//! resource cell, and the hand-rolled semaphore.
//!
//! Deliberately carries no async runtime so it can be linked into the
//! agent's worker thread (which is plain `std::thread`) without pulling
//! `tokio` into a process that never runs an executor.

pub mod error;
pub mod jsonstream;
pub mod packet;
pub mod script;
pub mod semaphore;
pub mod shared;

pub use error::ProtocolError;
pub use packet::{
    calc_frame_state, create_packet, extract_from_buffer, FrameBuffer, FrameState, Packet,
    ToAgent, ToController, MAGIC, MAX_PACKET_LEN,
};
pub use script::{split_to_executable_parts, ScriptFragment, RESTART_MARKER};
pub use semaphore::Semaphore;
pub use shared::{SharedCell, SharedHandle};

/// Read the `QTMONKEY_PORT` environment variable, decoding it as a
/// big-endian 16-bit integer packed into a 2-byte buffer the way the
/// controller writes it.
pub fn decode_port_env(raw: &[u8]) -> Option<u16> {
    if raw.len() != 2 {
        return None;
    }
    Some(u16::from_be_bytes([raw[0], raw[1]]))
}

/// Encode a port number the same way the controller advertises it:
/// big-endian 16-bit integer in a 2-byte buffer.
pub fn encode_port_env(port: u16) -> [u8; 2] {
    port.to_be_bytes()
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn port_env_round_trips_big_endian() {
        let encoded = encode_port_env(0x1234);
        assert_eq!(encoded, [0x12, 0x34]);
        assert_eq!(decode_port_env(&encoded), Some(0x1234));
    }

    #[test]
    fn port_env_rejects_wrong_length() {
        assert_eq!(decode_port_env(&[1, 2, 3]), None);
    }
}
