// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An in-memory [`WidgetTree`] double, gated behind `test-support`, for
//! exercising the script API surface and the `getWidget` resolver
//! without a real toolkit.

use std::collections::HashMap;

use super::{Point, WidgetId, WidgetTree};

#[derive(Debug, Clone)]
struct Node {
    name: Option<String>,
    class_name: String,
    parent: Option<WidgetId>,
    children: Vec<WidgetId>,
    visible: bool,
    enabled: bool,
    top_level: bool,
    center: Point,
}

/// A hand-built widget tree for tests: a fixed root plus whatever
/// widgets the test inserts via [`InMemoryWidgetTree::insert`].
pub struct InMemoryWidgetTree {
    nodes: HashMap<WidgetId, Node>,
    root: WidgetId,
    next_id: u64,
}

impl Default for InMemoryWidgetTree {
    fn default() -> Self {
        let root = WidgetId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                name: Some("root".to_string()),
                class_name: "Application".to_string(),
                parent: None,
                children: Vec::new(),
                visible: true,
                enabled: true,
                top_level: true,
                center: Point { x: 0, y: 0 },
            },
        );
        Self { nodes, root, next_id: 1 }
    }
}

impl InMemoryWidgetTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new widget as a child of `parent`, returning its id.
    #[allow(clippy::too_many_arguments)]
    pub fn insert(
        &mut self,
        parent: WidgetId,
        name: Option<&str>,
        class_name: &str,
        top_level: bool,
        center: Point,
    ) -> WidgetId {
        let id = WidgetId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                name: name.map(str::to_string),
                class_name: class_name.to_string(),
                parent: Some(parent),
                children: Vec::new(),
                visible: true,
                enabled: true,
                top_level,
                center,
            },
        );
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        id
    }

    pub fn set_visible(&mut self, id: WidgetId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.visible = visible;
        }
    }

    pub fn set_enabled(&mut self, id: WidgetId, enabled: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.enabled = enabled;
        }
    }

    pub fn destroy(&mut self, id: WidgetId) {
        if let Some(node) = self.nodes.remove(&id) {
            if let Some(parent) = node.parent {
                if let Some(p) = self.nodes.get_mut(&parent) {
                    p.children.retain(|c| *c != id);
                }
            }
        }
    }
}

impl WidgetTree for InMemoryWidgetTree {
    fn root(&self) -> WidgetId {
        self.root
    }

    fn children(&self, id: WidgetId) -> Vec<WidgetId> {
        self.nodes.get(&id).map(|n| n.children.clone()).unwrap_or_default()
    }

    fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    fn name(&self, id: WidgetId) -> Option<String> {
        self.nodes.get(&id).and_then(|n| n.name.clone())
    }

    fn class_name(&self, id: WidgetId) -> String {
        self.nodes.get(&id).map(|n| n.class_name.clone()).unwrap_or_default()
    }

    fn is_visible(&self, id: WidgetId) -> bool {
        self.nodes.get(&id).map(|n| n.visible).unwrap_or(false)
    }

    fn is_enabled(&self, id: WidgetId) -> bool {
        self.nodes.get(&id).map(|n| n.enabled).unwrap_or(false)
    }

    fn is_top_level(&self, id: WidgetId) -> bool {
        self.nodes.get(&id).map(|n| n.top_level).unwrap_or(false)
    }

    fn global_center(&self, id: WidgetId) -> Point {
        self.nodes.get(&id).map(|n| n.center).unwrap_or(Point { x: 0, y: 0 })
    }

    fn widget_at_global_point(&self, point: Point) -> Option<WidgetId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.visible && n.center == point)
            .map(|(id, _)| *id)
            .next()
    }

    fn top_level_of(&self, id: WidgetId) -> WidgetId {
        let mut current = id;
        while let Some(node) = self.nodes.get(&current) {
            if node.top_level {
                return current;
            }
            match node.parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        current
    }

    fn all_widgets(&self) -> Vec<WidgetId> {
        self.nodes.keys().copied().collect()
    }
}
