// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The GUI-automation agent: links into the target application, records
//! user gestures as script source, and replays synthetic input sent by
//! the controller process over a framed loopback channel.

pub mod analyzer;
pub mod api;
pub mod channel;
pub mod error;
pub mod gui;
pub mod orchestrator;
pub mod runner;
pub mod widget;

pub use analyzer::{Analyzer, EventContext, KeyEvent, KeyOutcome, MouseButtons, MouseEvent};
pub use api::{ScreenshotCapture, ScreenshotConfig, ScriptApi};
pub use channel::{Channel, TransportError};
pub use error::{GuiError, ScriptContractError, ScriptFault, WidgetError};
pub use gui::{run_in_gui, run_in_gui_with_timeout, GuiExecutor};
pub use orchestrator::AgentOrchestrator;
pub use runner::{EngineFailure, ScriptEngine, ScriptRunner};
pub use widget::{get_widget, PathSegment, Point, WidgetId, WidgetTree};
