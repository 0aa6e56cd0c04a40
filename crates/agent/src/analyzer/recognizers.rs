// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The ordered recognizer chain: each element is a pure function of the
//! event context, returning the first non-empty script line.

use super::{EventContext, MouseEventKind};

/// One command line recognized from an event, plus whether the
/// analyzer should start watching the widget for a later
/// item-expansion signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedCommand {
    pub line: String,
    pub watch_for_expansion: bool,
}

impl RecognizedCommand {
    fn line(line: impl Into<String>) -> Self {
        Self { line: line.into(), watch_for_expansion: false }
    }

    fn with_expansion(line: impl Into<String>) -> Self {
        Self { line: line.into(), watch_for_expansion: true }
    }
}

/// A single element of the recognizer chain.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, ctx: &EventContext) -> Option<RecognizedCommand>;
}

/// The full chain, in specified order: menu, tree widget, combo/list,
/// tab bar, tree/list view, MDI title bar, unnamed button, macOS menu
/// tracking, generic fallback.
pub fn default_chain() -> Vec<Box<dyn Recognizer>> {
    vec![
        Box::new(MenuClick),
        Box::new(TreeWidgetClick),
        Box::new(ComboOrListClick),
        Box::new(TabBarClick),
        Box::new(TreeOrListViewClick),
        Box::new(MdiTitleBarPress),
        Box::new(UnnamedButtonPress),
        Box::new(MacMenuAction),
        Box::new(GenericFallback),
    ]
}

/// a. Menu click → `activateItem(menuId, actionText)`.
struct MenuClick;
impl Recognizer for MenuClick {
    fn recognize(&self, ctx: &EventContext) -> Option<RecognizedCommand> {
        let action = ctx.menu_action.as_ref()?;
        Some(RecognizedCommand::line(format!(
            "Test.activateItem(\"{}\", \"{}\");",
            ctx.id_path, escape(action)
        )))
    }
}

/// b. Tree-widget click → `activateItem`/`doubleClickItem`; subscribes
/// to item-expanded for a later `expandItemInTree`.
struct TreeWidgetClick;
impl Recognizer for TreeWidgetClick {
    fn recognize(&self, ctx: &EventContext) -> Option<RecognizedCommand> {
        if ctx.class_name != "TreeWidget" {
            return None;
        }
        let text = ctx.item_text.as_ref()?;
        let call = match ctx.kind {
            MouseEventKind::DoubleClick => "doubleClickItem",
            _ => "activateItem",
        };
        Some(RecognizedCommand::with_expansion(format!(
            "Test.{call}(\"{}\", \"{}\");",
            ctx.id_path,
            escape(text)
        )))
    }
}

/// c. Combo-box and list-widget click → `activateItem(id, text)`.
struct ComboOrListClick;
impl Recognizer for ComboOrListClick {
    fn recognize(&self, ctx: &EventContext) -> Option<RecognizedCommand> {
        if !matches!(ctx.class_name.as_str(), "ComboBox" | "ListWidget") {
            return None;
        }
        let text = ctx.item_text.as_ref()?;
        Some(RecognizedCommand::line(format!(
            "Test.activateItem(\"{}\", \"{}\");",
            ctx.id_path,
            escape(text)
        )))
    }
}

/// d. Tab-bar click → `activateItem(id, tabText)`.
struct TabBarClick;
impl Recognizer for TabBarClick {
    fn recognize(&self, ctx: &EventContext) -> Option<RecognizedCommand> {
        if ctx.class_name != "TabBar" {
            return None;
        }
        let text = ctx.tab_text.as_ref()?;
        Some(RecognizedCommand::line(format!(
            "Test.activateItem(\"{}\", \"{}\");",
            ctx.id_path,
            escape(text)
        )))
    }
}

/// e. Tree-view / list-view click → `activateItemInView(id,
/// [pairs…])`; tree-view additionally subscribes for
/// `expandItemInTreeView`.
struct TreeOrListViewClick;
impl Recognizer for TreeOrListViewClick {
    fn recognize(&self, ctx: &EventContext) -> Option<RecognizedCommand> {
        if !matches!(ctx.class_name.as_str(), "TreeView" | "ListView") {
            return None;
        }
        let pairs = ctx.view_indices.as_ref()?;
        let flattened = pairs
            .iter()
            .flat_map(|(col, row)| [col.to_string(), row.to_string()])
            .collect::<Vec<_>>()
            .join(", ");
        let line = format!("Test.activateItemInView(\"{}\", [{flattened}]);", ctx.id_path);
        if ctx.class_name == "TreeView" {
            Some(RecognizedCommand::with_expansion(line))
        } else {
            Some(RecognizedCommand::line(line))
        }
    }
}

/// f. MDI title-bar press → `chooseWindowWithTitle(workspaceId,
/// title)`.
struct MdiTitleBarPress;
impl Recognizer for MdiTitleBarPress {
    fn recognize(&self, ctx: &EventContext) -> Option<RecognizedCommand> {
        let (workspace_id, title) = ctx.mdi_title.as_ref()?;
        Some(RecognizedCommand::line(format!(
            "Test.chooseWindowWithTitle(\"{workspace_id}\", \"{}\");",
            escape(title)
        )))
    }
}

/// g. Press on an unnamed button with a non-empty caption →
/// `pressButtonWithText(parentId, escapedCaption)`.
struct UnnamedButtonPress;
impl Recognizer for UnnamedButtonPress {
    fn recognize(&self, ctx: &EventContext) -> Option<RecognizedCommand> {
        if !ctx.is_unnamed_button {
            return None;
        }
        let caption = ctx.button_caption.as_ref().filter(|c| !c.is_empty())?;
        Some(RecognizedCommand::line(format!(
            "Test.pressButtonWithText(\"{}\", \"{}\");",
            ctx.parent_id_path.as_deref().unwrap_or(""),
            escape(caption)
        )))
    }
}

/// h. macOS-only dynamic menu action tracking → `activateItem`.
struct MacMenuAction;
impl Recognizer for MacMenuAction {
    fn recognize(&self, ctx: &EventContext) -> Option<RecognizedCommand> {
        if !cfg!(target_os = "macos") {
            return None;
        }
        let action = ctx.macos_menu_action.as_ref()?;
        Some(RecognizedCommand::line(format!(
            "Test.activateItem(\"{}\", \"{}\");",
            ctx.id_path,
            escape(action)
        )))
    }
}

/// i. Generic fallback → `mouseClick`/`mouseDClick` with local
/// coordinates.
struct GenericFallback;
impl Recognizer for GenericFallback {
    fn recognize(&self, ctx: &EventContext) -> Option<RecognizedCommand> {
        let call = match ctx.kind {
            MouseEventKind::DoubleClick => "mouseDClick",
            MouseEventKind::Press => "mouseClick",
            MouseEventKind::Release => return None,
        };
        Some(RecognizedCommand::line(format!(
            "Test.{call}(\"{}\", \"{}\", {}, {});",
            ctx.id_path,
            ctx.buttons.primary_name(),
            ctx.local_point.x,
            ctx.local_point.y
        )))
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
#[path = "recognizers_tests.rs"]
mod tests;
