// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Script-visible operations: every call takes a step (checkpoint plus
//! optional demonstration-mode delay), resolves a widget id path, and
//! marshals synthetic input to the GUI thread with a bounded timeout.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use wmonkey_core::SharedCell;

use crate::error::{GuiError, ScriptContractError, WidgetError};
use crate::gui::{run_in_gui_with_timeout, GuiExecutor};
use crate::runner;
use crate::widget::{get_widget, Point, WidgetId, WidgetTree};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEMONSTRATION_STEP_DELAY: Duration = Duration::from_millis(200);
const CURSOR_STEP_DELAY_MICROS: u64 = 6_000;

/// Capture a screenshot to `path`; the actual pixel-grab is an
/// external toolkit primitive.
pub trait ScreenshotCapture: Send + Sync {
    fn capture(&self, path: &Path) -> std::io::Result<()>;
}

/// Retention policy for `scriptCheckpoint`'s screenshot mode.
#[derive(Debug, Clone)]
pub struct ScreenshotConfig {
    pub enabled: bool,
    pub dir: PathBuf,
    pub retain: usize,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self { enabled: false, dir: PathBuf::new(), retain: 10 }
    }
}

/// Operations exposed to running scripts. Every method runs on the
/// worker thread.
pub struct ScriptApi {
    executor: Arc<dyn GuiExecutor>,
    tree: Arc<dyn WidgetTree + Send + Sync>,
    screenshot_capture: Option<Arc<dyn ScreenshotCapture>>,
    screenshot: SharedCell<ScreenshotConfig>,
    demonstration_mode: AtomicBool,
    tracing_enabled: AtomicBool,
    cursor_position: SharedCell<Point>,
    step_counter: AtomicU32,
}

impl ScriptApi {
    pub fn new(executor: Arc<dyn GuiExecutor>, tree: Arc<dyn WidgetTree + Send + Sync>) -> Self {
        Self {
            executor,
            tree,
            screenshot_capture: None,
            screenshot: SharedCell::new(ScreenshotConfig::default()),
            demonstration_mode: AtomicBool::new(false),
            tracing_enabled: AtomicBool::new(false),
            cursor_position: SharedCell::new(Point { x: 0, y: 0 }),
            step_counter: AtomicU32::new(0),
        }
    }

    pub fn with_screenshot_capture(mut self, capture: Arc<dyn ScreenshotCapture>) -> Self {
        self.screenshot_capture = Some(capture);
        self
    }

    pub fn configure_screenshots(&self, config: ScreenshotConfig) {
        *self.screenshot.lock() = config;
    }

    pub fn set_demonstration_mode(&self, enabled: bool) {
        self.demonstration_mode.store(enabled, Ordering::SeqCst);
    }

    pub fn set_tracing(&self, enabled: bool) {
        self.tracing_enabled.store(enabled, Ordering::SeqCst);
    }

    /// Called before every user-visible action. Logs the current line
    /// when tracing is on; in screenshot mode, captures a frame and
    /// prunes older ones to the retained count.
    pub fn script_checkpoint(&self, current_line: Option<u32>) {
        let step = self.step_counter.fetch_add(1, Ordering::SeqCst);
        if self.tracing_enabled.load(Ordering::SeqCst) {
            let filename = runner::current_filename();
            tracing::debug!(line = current_line, filename = ?filename, "script checkpoint");
        }

        let config = self.screenshot.lock();
        if config.enabled {
            if let Some(capture) = &self.screenshot_capture {
                let name = format!("screenshot_{step}_{}.png", current_line.unwrap_or(0));
                let path = config.dir.join(name);
                if let Err(err) = capture.capture(&path) {
                    tracing::warn!(error = %err, "screenshot capture failed");
                } else {
                    prune_screenshots(&config.dir, config.retain);
                }
            }
        }
    }

    /// Checkpoint before a user-visible action, reading the currently
    /// running fragment's line from the worker thread's script runner
    /// register rather than requiring each call site to thread it
    /// through by hand.
    fn step(&self) {
        self.script_checkpoint(runner::current_line());
        if self.demonstration_mode.load(Ordering::SeqCst) {
            std::thread::sleep(DEMONSTRATION_STEP_DELAY);
        }
    }

    fn resolve(&self, path: &str, require_enabled: bool) -> Result<WidgetId, WidgetError> {
        get_widget(self.tree.as_ref(), path, DEFAULT_TIMEOUT.as_secs_f64(), require_enabled)
    }

    /// Move the simulated cursor from its current position to `target`
    /// one pixel at a time, as demonstration mode does before issuing a
    /// synthetic click.
    fn interpolate_cursor_if_demonstrating(&self, target: Point) {
        if !self.demonstration_mode.load(Ordering::SeqCst) {
            *self.cursor_position.lock() = target;
            return;
        }
        let start = *self.cursor_position.lock();
        let steps = (start.x - target.x).abs().max((start.y - target.y).abs()).max(1);
        for i in 1..=steps {
            let x = start.x + (target.x - start.x) * i / steps;
            let y = start.y + (target.y - start.y) * i / steps;
            *self.cursor_position.lock() = Point { x, y };
            std::thread::sleep(Duration::from_micros(CURSOR_STEP_DELAY_MICROS));
        }
    }

    pub fn mouse_click(
        &self,
        path: &str,
        button: &str,
        x: i32,
        y: i32,
    ) -> Result<(), ScriptContractError> {
        self.step();
        let _button = parse_mouse_button(button)?;
        let widget = self.resolve(path, true)?;
        self.interpolate_cursor_if_demonstrating(Point { x, y });
        self.marshal(move || synthesize_click(widget, x, y))?;
        Ok(())
    }

    pub fn mouse_dclick(
        &self,
        path: &str,
        button: &str,
        x: i32,
        y: i32,
    ) -> Result<(), ScriptContractError> {
        self.step();
        let _button = parse_mouse_button(button)?;
        let widget = self.resolve(path, true)?;
        self.interpolate_cursor_if_demonstrating(Point { x, y });
        self.marshal(move || synthesize_click(widget, x, y))?;
        Ok(())
    }

    pub fn key_click(&self, path: &str, key_sequence: &str) -> Result<(), ScriptContractError> {
        self.step();
        if key_sequence.is_empty() {
            return Err(ScriptContractError::EmptyKeySequence);
        }
        let chord = parse_key_sequence(key_sequence)?;
        let widget = self.resolve(path, true)?;
        self.marshal(move || synthesize_key(widget, chord))?;
        Ok(())
    }

    pub fn activate_item(&self, path: &str, item_text: &str) -> Result<(), ScriptContractError> {
        self.step();
        let widget = self.resolve(path, true)?;
        let item_text = item_text.to_string();
        self.marshal(move || synthesize_activate(widget, item_text))?;
        Ok(())
    }

    pub fn activate_item_in_view(
        &self,
        path: &str,
        indices: &[u32],
    ) -> Result<(), ScriptContractError> {
        self.step();
        if indices.len() % 2 != 0 {
            return Err(ScriptContractError::OddIndexList(indices.len()));
        }
        let widget = self.resolve(path, true)?;
        let indices = indices.to_vec();
        self.marshal(move || synthesize_activate_view(widget, indices))?;
        Ok(())
    }

    pub fn expand_item_in_tree(&self, path: &str, text: &str) -> Result<(), ScriptContractError> {
        self.step();
        let widget = self.resolve(path, true)?;
        let text = text.to_string();
        self.marshal(move || synthesize_expand(widget, text))?;
        Ok(())
    }

    pub fn expand_item_in_tree_view(
        &self,
        path: &str,
        indices: &[u32],
    ) -> Result<(), ScriptContractError> {
        self.step();
        if indices.len() % 2 != 0 {
            return Err(ScriptContractError::OddIndexList(indices.len()));
        }
        let widget = self.resolve(path, true)?;
        let indices = indices.to_vec();
        self.marshal(move || synthesize_expand_view(widget, indices))?;
        Ok(())
    }

    pub fn wait(&self, ms: u64) {
        self.step();
        std::thread::sleep(Duration::from_millis(ms));
    }

    pub fn choose_window_with_title(
        &self,
        workspace: &str,
        title: &str,
    ) -> Result<(), ScriptContractError> {
        self.step();
        let widget = self.resolve(workspace, false)?;
        let title = title.to_string();
        self.marshal(move || synthesize_choose_window(widget, title))?;
        Ok(())
    }

    pub fn set_demonstration_mode_op(&self, enabled: bool) {
        self.set_demonstration_mode(enabled);
    }

    pub fn press_button_with_text(
        &self,
        parent: &str,
        text: &str,
    ) -> Result<(), ScriptContractError> {
        self.step();
        let widget = self.resolve(parent, true)?;
        let text = text.to_string();
        self.marshal(move || synthesize_press_button(widget, text))?;
        Ok(())
    }

    pub fn assert(&self, condition: bool) -> Result<(), ScriptContractError> {
        if !condition {
            return Err(ScriptContractError::Widget(WidgetError::NotFound(
                "assertion failed".to_string(),
            )));
        }
        Ok(())
    }

    pub fn assert_equal<T: PartialEq + std::fmt::Debug>(
        &self,
        a: T,
        b: T,
    ) -> Result<(), ScriptContractError> {
        if a != b {
            return Err(ScriptContractError::Widget(WidgetError::NotFound(format!(
                "assertEqual failed: {a:?} != {b:?}"
            ))));
        }
        Ok(())
    }

    pub fn get_object_by_id(&self, path: &str) -> Result<WidgetId, ScriptContractError> {
        Ok(self.resolve(path, false)?)
    }

    pub fn log(&self, text: &str) {
        tracing::info!(target: "wmonkey_agent::script", "{text}");
    }

    fn marshal<F>(&self, f: F) -> Result<(), GuiError>
    where
        F: FnOnce() + Send + 'static,
    {
        run_in_gui_with_timeout(self.executor.as_ref(), f, DEFAULT_TIMEOUT)
    }
}

/// Prune `dir` to at most `retain` screenshot files, keeping the ones
/// with the newest modification time.
pub fn prune_screenshots(dir: &Path, retain: usize) {
    let Ok(entries) = std::fs::read_dir(dir) else { return };
    let mut files: Vec<(std::time::SystemTime, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("png"))
        .filter_map(|e| e.metadata().ok().and_then(|m| m.modified().ok()).map(|t| (t, e.path())))
        .collect();

    files.sort_by(|a, b| b.0.cmp(&a.0));
    for (_, path) in files.into_iter().skip(retain) {
        let _ = std::fs::remove_file(path);
    }
}

fn parse_mouse_button(name: &str) -> Result<MouseButton, ScriptContractError> {
    match name {
        "LeftButton" | "Qt.LeftButton" => Ok(MouseButton::Left),
        "RightButton" | "Qt.RightButton" => Ok(MouseButton::Right),
        "MiddleButton" | "Qt.MiddleButton" => Ok(MouseButton::Middle),
        other => Err(ScriptContractError::UnknownButton(other.to_string())),
    }
}

enum MouseButton {
    Left,
    Right,
    Middle,
}

/// A parsed key sequence: up to four modifier chords plus a terminal
/// key, accumulated into a single bit mask issued as one synthetic
/// key-click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub modifiers: u8,
    pub key: u32,
}

const MOD_CTRL: u8 = 1;
const MOD_SHIFT: u8 = 2;
const MOD_ALT: u8 = 4;
const MOD_META: u8 = 8;

fn parse_key_sequence(sequence: &str) -> Result<KeyChord, ScriptContractError> {
    if sequence.is_empty() {
        return Err(ScriptContractError::EmptyKeySequence);
    }
    let mut modifiers = 0u8;
    let mut key = None;
    for part in sequence.split('+') {
        match part {
            "Ctrl" => modifiers |= MOD_CTRL,
            "Shift" => modifiers |= MOD_SHIFT,
            "Alt" => modifiers |= MOD_ALT,
            "Meta" => modifiers |= MOD_META,
            other if !other.is_empty() => key = Some(key_code_for(other)),
            _ => {}
        }
    }
    match key {
        Some(key) => Ok(KeyChord { modifiers, key }),
        None => Err(ScriptContractError::EmptyKeySequence),
    }
}

fn key_code_for(name: &str) -> u32 {
    name.chars().next().map(|c| c as u32).unwrap_or(0)
}

// The following `synthesize_*` functions are where a real embedding
// would call into the toolkit's synthetic-input helpers; they are an
// external primitive per scope, so here they only touch the widget the
// GUI thread already resolved, establishing the call shape the
// toolkit adapter must fill in.
fn synthesize_click(_widget: WidgetId, _x: i32, _y: i32) {}
fn synthesize_key(_widget: WidgetId, _chord: KeyChord) {}
fn synthesize_activate(_widget: WidgetId, _text: String) {}
fn synthesize_activate_view(_widget: WidgetId, _indices: Vec<u32>) {}
fn synthesize_expand(_widget: WidgetId, _text: String) {}
fn synthesize_expand_view(_widget: WidgetId, _indices: Vec<u32>) {}
fn synthesize_choose_window(_widget: WidgetId, _title: String) {}
fn synthesize_press_button(_widget: WidgetId, _text: String) {}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
