// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn key(kind: KeyEventKind, code: u32, ts: u64) -> KeyEvent {
    KeyEvent { kind, timestamp_ms: ts, key_code: code, is_modifier_only: false }
}

fn mouse(kind: MouseEventKind, ts: u64, point: (i32, i32), widget: u64) -> MouseEvent {
    MouseEvent {
        kind,
        timestamp_ms: ts,
        global_point: Point { x: point.0, y: point.1 },
        buttons: MouseButtons::LEFT,
        widget: WidgetId(widget),
    }
}

fn ctx(id_path: &str) -> EventContext {
    EventContext {
        kind: MouseEventKind::Press,
        id_path: id_path.to_string(),
        class_name: "PushButton".to_string(),
        ..Default::default()
    }
}

#[test]
fn bare_modifier_key_is_ignored() {
    let mut analyzer = Analyzer::new();
    let event = KeyEvent { is_modifier_only: true, ..key(KeyEventKind::Press, 16, 0) };
    assert_eq!(analyzer.on_key_event(event), KeyOutcome::None);
}

#[test]
fn matched_press_release_pair_emits_exactly_one_line() {
    let mut analyzer = Analyzer::new();
    assert_eq!(analyzer.on_key_event(key(KeyEventKind::Press, 65, 0)), KeyOutcome::None);
    match analyzer.on_key_event(key(KeyEventKind::Release, 65, 10)) {
        KeyOutcome::Line(line) => assert!(line.contains("keyClick")),
        other => panic!("expected a line, got {other:?}"),
    }
}

#[test]
fn duplicate_key_within_window_is_suppressed() {
    let mut analyzer = Analyzer::new();
    analyzer.on_key_event(key(KeyEventKind::Press, 65, 0));
    // Same kind/key within 100ms: suppressed, counters untouched.
    let outcome = analyzer.on_key_event(key(KeyEventKind::Press, 65, 50));
    assert_eq!(outcome, KeyOutcome::None);
    assert_eq!(analyzer.state.press_count, 1);
}

#[test]
fn global_shortcut_dumps_widget_tree_instead_of_recording() {
    let mut analyzer = Analyzer::new().with_shortcut(999);
    let outcome = analyzer.on_key_event(key(KeyEventKind::Press, 999, 0));
    assert_eq!(outcome, KeyOutcome::DumpWidgetTree);
}

#[test]
fn duplicate_mouse_event_within_100ms_emits_nothing() {
    let mut analyzer = Analyzer::new();
    let first = mouse(MouseEventKind::Press, 0, (10, 10), 1);
    let lines = analyzer.on_mouse_click(first, ctx("a.root"), None);
    assert_eq!(lines.len(), 1);

    let duplicate = mouse(MouseEventKind::Press, 50, (10, 10), 1);
    let lines = analyzer.on_mouse_click(duplicate, ctx("a.root"), None);
    assert!(lines.is_empty());
}

#[test]
fn mouse_event_after_100ms_is_not_a_duplicate() {
    let mut analyzer = Analyzer::new();
    let first = mouse(MouseEventKind::Press, 0, (10, 10), 1);
    analyzer.on_mouse_click(first, ctx("a.root"), None);

    let later = mouse(MouseEventKind::Press, 150, (10, 10), 1);
    let lines = analyzer.on_mouse_click(later, ctx("a.root"), None);
    assert_eq!(lines.len(), 1);
}

#[test]
fn mouse_release_clears_dedup_record() {
    let mut analyzer = Analyzer::new();
    let first = mouse(MouseEventKind::Press, 0, (10, 10), 1);
    analyzer.on_mouse_click(first, ctx("a.root"), None);
    analyzer.on_mouse_release(Some(WidgetId(1)));

    let immediate_repeat = mouse(MouseEventKind::Press, 10, (10, 10), 1);
    let lines = analyzer.on_mouse_click(immediate_repeat, ctx("a.root"), None);
    assert_eq!(lines.len(), 1);
}

#[test]
fn alternate_variant_is_emitted_as_a_trailing_comment() {
    let mut analyzer = Analyzer::new();
    let event = mouse(MouseEventKind::Press, 0, (10, 10), 1);
    let primary = ctx("<class_name=PushButton,1>.mainWindow");
    let alternate = ctx("namedAncestor.mainWindow");
    let lines = analyzer.on_mouse_click(event, primary, Some(alternate));

    assert_eq!(lines.len(), 2);
    assert!(!lines[0].starts_with("//"));
    assert!(lines[1].starts_with("// "));
}
