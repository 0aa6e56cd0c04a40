// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The async controller half: spawns the target application, speaks the
//! framed wire protocol to its agent, and exposes the line-delimited
//! JSON protocol on stdio.

pub mod channel;
pub mod dispatcher;
pub mod error;
pub mod process;
pub mod protocol;
pub mod queue;
pub mod stdio;

pub use channel::Channel;
pub use dispatcher::{run, DispatcherConfig, OutputSink, ScriptSource, StdoutSink};
pub use error::{ChannelError, ProcessError};
pub use process::ChildProcess;
pub use protocol::{OutgoingEvent, RunScriptRequest};
pub use queue::{QueueAction, ScriptQueue};
pub use stdio::StdinBridge;
