// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A stand-in "target application": links the agent runtime, connects
//! back to the controller over `QTMONKEY_PORT`, and evaluates scripts
//! through a tiny fixture interpreter. Used by integration tests that
//! need a real child process on the other end of the wire protocol.

mod engine;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use wmonkey_agent::gui::native::NativeGuiThread;
use wmonkey_agent::widget::testkit::InMemoryWidgetTree;
use wmonkey_agent::widget::WidgetTree;
use wmonkey_agent::{AgentOrchestrator, ScreenshotConfig, ScriptApi};

use engine::FixtureEngine;

const QUIT_POLL: Duration = Duration::from_millis(10);

fn main() {
    tracing_subscriber::fmt::try_init().ok();

    let port = read_port().unwrap_or_else(|| {
        eprintln!("QTMONKEY_PORT is not set or malformed");
        std::process::exit(1);
    });

    let gui = NativeGuiThread::spawn();
    let tree: Arc<dyn WidgetTree + Send + Sync> = Arc::new(fixture_tree());
    let api = Arc::new(ScriptApi::new(gui.clone(), tree));
    if let Some(config) = read_screenshot_config() {
        api.configure_screenshots(config);
    }
    let quit = Arc::new(AtomicBool::new(false));
    let engine = FixtureEngine::new(api, quit.clone());

    let orchestrator = AgentOrchestrator::spawn(port, gui, engine);
    if orchestrator.connect_failed() {
        eprintln!("failed to connect to controller on port {port}");
        std::process::exit(1);
    }

    // No real toolkit event loop decides when this process is done; a
    // script requests it explicitly via `Test.quit()`.
    while !quit.load(Ordering::SeqCst) {
        std::thread::sleep(QUIT_POLL);
    }
    orchestrator.shutdown();
}

fn read_port() -> Option<u16> {
    use std::os::unix::ffi::OsStrExt;
    let raw = std::env::var_os("QTMONKEY_PORT")?;
    wmonkey_core::decode_port_env(raw.as_bytes())
}

/// Decode the screenshot policy the controller forwarded through the
/// environment, mirroring `read_port`. Screenshots stay off unless a
/// directory was actually set.
fn read_screenshot_config() -> Option<ScreenshotConfig> {
    let dir = std::env::var_os("QTMONKEY_SCREENSHOT_DIR")?;
    let retain = std::env::var("QTMONKEY_SCREENSHOT_RETAIN")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(10);
    Some(ScreenshotConfig { enabled: true, dir: dir.into(), retain })
}

fn fixture_tree() -> InMemoryWidgetTree {
    let mut tree = InMemoryWidgetTree::new();
    let root = tree.root();
    tree.insert(
        root,
        Some("mainWindow"),
        "MainWindow",
        true,
        wmonkey_agent::widget::Point { x: 0, y: 0 },
    );
    tree
}
