// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Translates toolkit events into recorded script lines: key/mouse
//! deduplication, identifier-path computation, and the pluggable
//! recognizer chain.

pub mod recognizers;

use std::collections::HashSet;

use crate::widget::{Point, WidgetId};
use recognizers::{default_chain, Recognizer, RecognizedCommand};

const DEDUP_WINDOW_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    Press,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Press,
    DoubleClick,
    Release,
}

/// A simple bitset of held mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseButtons(u8);

impl MouseButtons {
    pub const LEFT: Self = Self(1);
    pub const RIGHT: Self = Self(2);
    pub const MIDDLE: Self = Self(4);

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn primary_name(&self) -> &'static str {
        if self.contains(Self::LEFT) {
            "Qt.LeftButton"
        } else if self.contains(Self::RIGHT) {
            "Qt.RightButton"
        } else if self.contains(Self::MIDDLE) {
            "Qt.MiddleButton"
        } else {
            "Qt.NoButton"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub kind: KeyEventKind,
    pub timestamp_ms: u64,
    pub key_code: u32,
    pub is_modifier_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub timestamp_ms: u64,
    pub global_point: Point,
    pub buttons: MouseButtons,
    pub widget: WidgetId,
}

impl Point {
    fn key(&self) -> (i32, i32) {
        (self.x, self.y)
    }
}

/// Precomputed facts about the widget under a click, gathered by the
/// caller from the (toolkit-specific) widget tree before the
/// recognizer chain runs. Kept flat and data-only so each recognizer
/// is a pure function with no toolkit access of its own.
#[derive(Debug, Clone, Default)]
pub struct EventContext {
    pub kind: MouseEventKind,
    pub id_path: String,
    pub parent_id_path: Option<String>,
    pub class_name: String,
    pub local_point: Point,
    pub buttons: MouseButtons,
    pub item_text: Option<String>,
    pub menu_action: Option<String>,
    pub tab_text: Option<String>,
    pub view_indices: Option<Vec<(u32, u32)>>,
    pub mdi_title: Option<(String, String)>,
    pub button_caption: Option<String>,
    pub is_unnamed_button: bool,
    pub macos_menu_action: Option<String>,
}

impl Default for MouseEventKind {
    fn default() -> Self {
        Self::Press
    }
}

impl Default for Point {
    fn default() -> Self {
        Point { x: 0, y: 0 }
    }
}

/// De-duplication and pairing state that lives for the agent's
/// lifetime. Tree/tree-view expansion watches use plain widget ids
/// rather than toolkit weak pointers; [`Analyzer::forget_widget`] must
/// be called on widget destruction to prune them.
#[derive(Debug, Default)]
struct RecorderState {
    last_key: Option<KeyEvent>,
    last_mouse: Option<MouseEvent>,
    press_count: u64,
    release_count: u64,
    watching_expansion: HashSet<WidgetId>,
}

/// Installed as a toolkit-wide event filter (conceptually); drives the
/// recognizer chain and de-duplication described in component 5.
pub struct Analyzer {
    state: RecorderState,
    chain: Vec<Box<dyn Recognizer>>,
    shortcut_key_code: Option<u32>,
}

impl Analyzer {
    pub fn new() -> Self {
        Self { state: RecorderState::default(), chain: default_chain(), shortcut_key_code: None }
    }

    /// Install a global shortcut key code that dumps widget-tree info
    /// to the log channel instead of being recorded.
    pub fn with_shortcut(mut self, key_code: u32) -> Self {
        self.shortcut_key_code = Some(key_code);
        self
    }

    /// A widget has been destroyed; drop any expansion-watch entry for
    /// it so the recorder state does not leak.
    pub fn forget_widget(&mut self, widget: WidgetId) {
        self.state.watching_expansion.remove(&widget);
    }

    /// Process a key event, returning a script line if one should be
    /// recorded, or `Some(ShortcutTriggered)` signaled via the return's
    /// side channel.
    pub fn on_key_event(&mut self, event: KeyEvent) -> KeyOutcome {
        if event.is_modifier_only {
            return KeyOutcome::None;
        }
        if let Some(code) = self.shortcut_key_code {
            if event.kind == KeyEventKind::Press && event.key_code == code {
                return KeyOutcome::DumpWidgetTree;
            }
        }
        if is_duplicate_key(&self.state.last_key, &event) {
            self.state.last_key = Some(event);
            return KeyOutcome::None;
        }

        match event.kind {
            KeyEventKind::Press => {
                self.state.press_count += 1;
            }
            KeyEventKind::Release => {
                self.state.release_count += 1;
            }
        }

        let line = if event.kind == KeyEventKind::Release
            && self.state.release_count == self.state.press_count
        {
            Some(format!("Test.keyClick(\"{}\");", key_sequence_text(event.key_code)))
        } else {
            None
        };

        self.state.last_key = Some(event);
        line.map(KeyOutcome::Line).unwrap_or(KeyOutcome::None)
    }

    /// Process a mouse press or double-click: runs the recognizer
    /// chain, applying the primary-plus-alternate rule for unnamed
    /// widgets with same-class siblings.
    pub fn on_mouse_click(
        &mut self,
        event: MouseEvent,
        ctx: EventContext,
        alternate: Option<EventContext>,
    ) -> Vec<String> {
        let widget = event.widget;
        if is_duplicate_mouse(&self.state.last_mouse, &event) {
            self.state.last_mouse = Some(event);
            return Vec::new();
        }
        self.state.last_mouse = Some(event);

        let mut lines = Vec::new();
        if let Some(command) = self.run_chain(&ctx) {
            if command.watch_for_expansion {
                self.state.watching_expansion.insert(widget);
            }
            lines.push(command.line);
        }
        if let Some(alt_ctx) = alternate {
            if let Some(alt_command) = self.run_chain(&alt_ctx) {
                lines.push(format!("// {}", alt_command.line));
            }
        }
        lines
    }

    /// Mouse release: clears the last-mouse dedup record. Any widget
    /// that was being watched for a one-shot expansion signal stops
    /// being watched once the gesture that registered it is over.
    pub fn on_mouse_release(&mut self, widget_released: Option<WidgetId>) {
        self.state.last_mouse = None;
        if let Some(widget) = widget_released {
            self.state.watching_expansion.remove(&widget);
        }
    }

    /// All other events: hand to the recognizer chain directly
    /// (covers macOS dynamic menu-action tracking and anything future
    /// recognizers might match that isn't gated on press/double-click).
    pub fn on_other_event(&mut self, ctx: EventContext) -> Option<String> {
        self.run_chain(&ctx).map(|c| c.line)
    }

    fn run_chain(&self, ctx: &EventContext) -> Option<RecognizedCommand> {
        self.chain.iter().find_map(|r| r.recognize(ctx))
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    None,
    Line(String),
    DumpWidgetTree,
}

fn is_duplicate_key(last: &Option<KeyEvent>, event: &KeyEvent) -> bool {
    match last {
        Some(prev) => {
            prev.kind == event.kind
                && prev.key_code == event.key_code
                && event.timestamp_ms.saturating_sub(prev.timestamp_ms) < DEDUP_WINDOW_MS
        }
        None => false,
    }
}

fn is_duplicate_mouse(last: &Option<MouseEvent>, event: &MouseEvent) -> bool {
    match last {
        Some(prev) => {
            prev.kind == event.kind
                && prev.global_point.key() == event.global_point.key()
                && prev.buttons == event.buttons
                && prev.widget == event.widget
                && event.timestamp_ms.saturating_sub(prev.timestamp_ms) < DEDUP_WINDOW_MS
        }
        None => false,
    }
}

fn key_sequence_text(key_code: u32) -> String {
    format!("Key_{key_code}")
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
