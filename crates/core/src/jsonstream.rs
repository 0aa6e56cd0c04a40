// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parse-as-many-as-possible concatenated JSON values from a byte stream,
//! carrying residual (incomplete trailing) bytes across calls.

use serde::de::DeserializeOwned;

/// Feed bytes in, get back as many complete JSON values as are present.
///
/// Used for the controller's stdin protocol, where values may arrive
/// concatenated without newline separation; `parser_stop_pos` always
/// equals the number of input bytes actually consumed as complete
/// values, leaving any trailing partial value unconsumed.
#[derive(Debug, Default)]
pub struct JsonStream {
    buf: Vec<u8>,
}

impl JsonStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Drain every complete value currently bufferable, in order.
    /// Malformed trailing bytes that can never complete are left in the
    /// buffer (the caller may inspect `residual_len` to detect stalls).
    pub fn drain<T: DeserializeOwned>(&mut self) -> Vec<T> {
        let mut out = Vec::new();
        loop {
            let mut de = serde_json::Deserializer::from_slice(&self.buf).into_iter::<T>();
            match de.next() {
                Some(Ok(value)) => {
                    let consumed = de.byte_offset();
                    out.push(value);
                    self.buf.drain(..consumed);
                }
                _ => break,
            }
        }
        out
    }

    pub fn residual_len(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
#[path = "jsonstream_tests.rs"]
mod tests;
