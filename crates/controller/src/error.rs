// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller-side error kinds. Each scopes one of the semantic kinds
//! that cross the worker/dispatcher boundary.

use thiserror::Error;

/// Failure modes for the async agent channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("socket io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Protocol(#[from] wmonkey_core::ProtocolError),
    #[error("channel closed")]
    Closed,
}

/// Failure modes for spawning or driving the target process.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn target application: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("failed to wait on target application: {0}")]
    Wait(#[source] std::io::Error),
}
