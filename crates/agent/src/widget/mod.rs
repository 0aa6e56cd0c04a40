// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Widget identifier paths and the polling `getWidget` resolver.
//!
//! The host toolkit's actual widget types are an external primitive;
//! this module only defines the [`WidgetTree`] capability a toolkit
//! adapter must provide and the path syntax scripts use to name a
//! widget.

#[cfg(feature = "test-support")]
pub mod testkit;

use std::time::{Duration, Instant};

use crate::error::WidgetError;

/// Opaque identity of a single widget inside a [`WidgetTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(pub u64);

/// A point in global (screen) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Read-only view of the live widget tree, as the GUI thread sees it.
/// All methods are cheap, synchronous snapshots — callers are
/// responsible for invoking them only from the GUI thread or through
/// [`crate::gui::run_in_gui`].
pub trait WidgetTree {
    fn root(&self) -> WidgetId;
    fn children(&self, id: WidgetId) -> Vec<WidgetId>;
    fn parent(&self, id: WidgetId) -> Option<WidgetId>;
    fn name(&self, id: WidgetId) -> Option<String>;
    fn class_name(&self, id: WidgetId) -> String;
    fn is_visible(&self, id: WidgetId) -> bool;
    fn is_enabled(&self, id: WidgetId) -> bool;
    fn is_top_level(&self, id: WidgetId) -> bool;
    fn global_center(&self, id: WidgetId) -> Point;
    /// The top-level window whose region actually contains `point`,
    /// independent of widget tree structure (a hit test).
    fn widget_at_global_point(&self, point: Point) -> Option<WidgetId>;
    /// The top-level window ancestor of `id`, or `id` itself if it is
    /// already top-level.
    fn top_level_of(&self, id: WidgetId) -> WidgetId;
    /// Every widget currently alive, for the brute-force fallback scan.
    fn all_widgets(&self) -> Vec<WidgetId>;
}

/// One segment of a dotted identifier path, root-last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// The widget's own object name.
    Named(String),
    /// `<class_name=C[,k]>`: match by class and zero-based index among
    /// same-class siblings.
    ClassIndexed { class: String, index: usize },
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Named(name) => write!(f, "{name}"),
            PathSegment::ClassIndexed { class, index: 0 } => write!(f, "<class_name={class}>"),
            PathSegment::ClassIndexed { class, index } => {
                write!(f, "<class_name={class},{index}>")
            }
        }
    }
}

/// Parse `path` (`child.parent….root`) into its segments, root-last, as
/// written; resolution walks it root-first (reversed).
pub fn parse_id_path(path: &str) -> Result<Vec<PathSegment>, WidgetError> {
    if path.is_empty() {
        return Err(WidgetError::BadPath(path.to_string()));
    }
    path.split('.')
        .map(|segment| parse_segment(segment, path))
        .collect()
}

fn parse_segment(segment: &str, whole_path: &str) -> Result<PathSegment, WidgetError> {
    if let Some(inner) = segment.strip_prefix("<class_name=").and_then(|s| s.strip_suffix('>')) {
        return match inner.split_once(',') {
            Some((class, index)) => {
                let index: usize =
                    index.parse().map_err(|_| WidgetError::BadPath(whole_path.to_string()))?;
                Ok(PathSegment::ClassIndexed { class: class.to_string(), index })
            }
            None => Ok(PathSegment::ClassIndexed { class: inner.to_string(), index: 0 }),
        };
    }
    if segment.is_empty() {
        return Err(WidgetError::BadPath(whole_path.to_string()));
    }
    Ok(PathSegment::Named(segment.to_string()))
}

/// Build the dotted identifier path for `id`, root-last: each segment is
/// the widget's name if set, else `<class_name=C[,k]>` giving its
/// zero-based index among same-class siblings (omitted when 0).
pub fn identifier_path(tree: &dyn WidgetTree, id: WidgetId) -> String {
    let mut segments = Vec::new();
    let mut current = id;
    loop {
        segments.push(segment_for(tree, current).to_string());
        match tree.parent(current) {
            Some(parent) => current = parent,
            None => break,
        }
    }
    segments.join(".")
}

fn segment_for(tree: &dyn WidgetTree, id: WidgetId) -> PathSegment {
    if let Some(name) = tree.name(id) {
        if !name.is_empty() {
            return PathSegment::Named(name);
        }
    }
    let class = tree.class_name(id);
    let index = match tree.parent(id) {
        Some(parent) => tree
            .children(parent)
            .iter()
            .filter(|sibling| tree.class_name(**sibling) == class)
            .position(|sibling| *sibling == id)
            .unwrap_or(0),
        None => 0,
    };
    PathSegment::ClassIndexed { class, index }
}

const POLL_INTERVAL: Duration = Duration::from_millis(70);

/// Resolve `path` to a live, on-screen widget, polling every 70 ms for
/// up to `max_seconds`. If `require_enabled`, the widget must also be
/// enabled.
pub fn get_widget(
    tree: &dyn WidgetTree,
    path: &str,
    max_seconds: f64,
    require_enabled: bool,
) -> Result<WidgetId, WidgetError> {
    let segments = parse_id_path(path)?;
    let deadline = Instant::now() + Duration::from_secs_f64(max_seconds.max(0.0));

    loop {
        if let Some(id) = resolve_once(tree, &segments, path) {
            if is_usable(tree, id, require_enabled) {
                return Ok(id);
            }
        }
        if Instant::now() >= deadline {
            break;
        }
        std::thread::sleep(POLL_INTERVAL.min(deadline.saturating_duration_since(Instant::now())));
    }

    match resolve_once(tree, &segments, path) {
        Some(id) if !is_usable(tree, id, require_enabled) => {
            if require_enabled && !tree.is_enabled(id) {
                Err(WidgetError::Disabled(path.to_string()))
            } else {
                Err(WidgetError::NotOnScreen(path.to_string()))
            }
        }
        _ => Err(WidgetError::TimedOut(Duration::from_secs_f64(max_seconds.max(0.0)), path.to_string())),
    }
}

fn resolve_once(tree: &dyn WidgetTree, segments: &[PathSegment], path: &str) -> Option<WidgetId> {
    if let Some(id) = resolve_by_path(tree, segments) {
        return Some(id);
    }
    // Fall back to a brute-force scan matching the path's last segment.
    let last = segments.last()?;
    tree.all_widgets().into_iter().find(|id| &segment_for(tree, *id) == last || path_matches(tree, *id, path))
}

fn path_matches(tree: &dyn WidgetTree, id: WidgetId, path: &str) -> bool {
    identifier_path(tree, id) == path
}

fn resolve_by_path(tree: &dyn WidgetTree, segments: &[PathSegment]) -> Option<WidgetId> {
    // Segments are root-last in the path string; walk root-first: the
    // first segment resolved is looked up among the application root's
    // own children (its top-level windows), each following segment
    // descends through the previous match's children.
    let mut ordered = segments.to_vec();
    ordered.reverse();

    let mut current = tree.root();
    for segment in ordered {
        current = descend(tree, current, &segment)?;
    }
    Some(current)
}

fn descend(tree: &dyn WidgetTree, parent: WidgetId, segment: &PathSegment) -> Option<WidgetId> {
    let children = tree.children(parent);
    match segment {
        PathSegment::Named(name) => {
            children.into_iter().find(|child| tree.name(*child).as_deref() == Some(name.as_str()))
        }
        PathSegment::ClassIndexed { class, index } => children
            .into_iter()
            .filter(|child| &tree.class_name(*child) == class)
            .nth(*index),
    }
}

fn is_usable(tree: &dyn WidgetTree, id: WidgetId, require_enabled: bool) -> bool {
    if !tree.is_visible(id) {
        return false;
    }
    if require_enabled && !tree.is_enabled(id) {
        return false;
    }
    if tree.is_top_level(id) {
        return true;
    }
    let center = tree.global_center(id);
    match tree.widget_at_global_point(center) {
        Some(hit) => tree.top_level_of(hit) == tree.top_level_of(id),
        None => false,
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
