//! Selection-indicator controls mounted on cards.

use ego_tree::NodeId;
use once_cell::sync::Lazy;
use scraper::{Node, Selector};

use crate::dom::parser::element_template;
use crate::dom::{has_class, Page};

/// Class carried by every control the engine mounts.
pub const CONTROL_CLASS: &str = "yt-extractor-checkbox";
pub const CHECKMARK: &str = "✓";

/// Every mounted control on a page.
pub static CONTROLS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".yt-extractor-checkbox").expect("control selector is valid")
});

const UNSELECTED_MARKUP: &str = r#"<div class="yt-extractor-checkbox" data-state="unselected" role="checkbox" aria-checked="false"></div>"#;
const SELECTED_MARKUP: &str = r#"<div class="yt-extractor-checkbox selected" data-state="selected" role="checkbox" aria-checked="true">✓</div>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Unselected,
    Selected,
}

impl ControlState {
    pub fn from_selected(selected: bool) -> Self {
        if selected {
            ControlState::Selected
        } else {
            ControlState::Unselected
        }
    }
}

/// Result of a mount request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mount {
    /// A control was already present at the anchor.
    Existing(NodeId),
    Mounted(NodeId),
}

impl Mount {
    pub fn control(self) -> NodeId {
        match self {
            Mount::Existing(id) | Mount::Mounted(id) => id,
        }
    }
}

/// Builds, mounts and restyles controls from pre-parsed node templates.
pub struct OverlayController {
    unselected: Node,
    selected: Node,
    glyph: Vec<Node>,
}

impl OverlayController {
    pub fn new() -> Self {
        let (unselected, _) =
            element_template(UNSELECTED_MARKUP).expect("unselected control markup is an element");
        let (selected, glyph) =
            element_template(SELECTED_MARKUP).expect("selected control markup is an element");
        Self {
            unselected,
            selected,
            glyph,
        }
    }

    /// Control already mounted directly under `anchor`, if any.
    pub fn find(page: &Page, anchor: NodeId) -> Option<NodeId> {
        page.children(anchor)
            .into_iter()
            .find(|child| page.node(*child).is_some_and(|n| has_class(n, CONTROL_CLASS)))
    }

    /// Mount a control under `anchor` unless one is already there.
    pub fn mount(&self, page: &mut Page, anchor: NodeId, state: ControlState) -> Option<Mount> {
        if let Some(existing) = Self::find(page, anchor) {
            self.set_state(page, existing, state);
            return Some(Mount::Existing(existing));
        }
        let control = page.append(anchor, self.unselected.clone())?;
        self.set_state(page, control, state);
        Some(Mount::Mounted(control))
    }

    pub fn set_state(&self, page: &mut Page, control: NodeId, state: ControlState) {
        if Self::state(page, control) == Some(state) {
            return;
        }
        let template = match state {
            ControlState::Unselected => &self.unselected,
            ControlState::Selected => &self.selected,
        };
        if !page.replace_value(control, template.clone()) {
            return;
        }
        page.clear_children(control);
        if state == ControlState::Selected {
            for node in &self.glyph {
                page.append(control, node.clone());
            }
        }
    }

    /// Current state of a control; `None` if `control` is not one.
    pub fn state(page: &Page, control: NodeId) -> Option<ControlState> {
        let el = page.element(control)?;
        if !el.value().classes().any(|c| c == CONTROL_CLASS) {
            return None;
        }
        match el.value().attr("data-state") {
            Some("selected") => Some(ControlState::Selected),
            _ => Some(ControlState::Unselected),
        }
    }

    pub fn unmount(page: &mut Page, control: NodeId) -> bool {
        page.remove(control)
    }

    /// Whether `id` is a control or lies inside one.
    pub fn is_control_node(page: &Page, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if page.node(node_id).is_some_and(|n| has_class(n, CONTROL_CLASS)) {
                return true;
            }
            current = page.parent(node_id);
        }
        false
    }
}

impl Default for OverlayController {
    fn default() -> Self {
        Self::new()
    }
}
