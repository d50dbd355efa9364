pub mod parser;

use std::collections::HashMap;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// Error while constructing a page.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("invalid page URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// A single child-list mutation, as a mutation observer would report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// Node whose children changed.
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

/// Handle for a registered activation listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy)]
struct Listener {
    id: ListenerId,
    capture: bool,
}

/// Live, mutable document.
///
/// Wraps a parsed `scraper::Html` tree and adds the pieces a content script
/// relies on: child-list mutation records, per-node activation listeners and
/// href resolution against the page URL. Node identity is the arena
/// `NodeId`, which stays stable for as long as the page lives (detached
/// nodes keep their id but are no longer reachable from the root).
pub struct Page {
    document: Html,
    url: Url,
    records: Vec<MutationRecord>,
    listeners: HashMap<NodeId, Vec<Listener>>,
    next_listener: u64,
}

impl Page {
    /// Parse a full document served from `url`.
    pub fn parse(html: &str, url: &str) -> Result<Self, PageError> {
        let url = Url::parse(url).map_err(|source| PageError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        Ok(Self {
            document: Html::parse_document(html),
            url,
            records: Vec::new(),
            listeners: HashMap::new(),
            next_listener: 0,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Resolve a (possibly relative) href against the page URL.
    pub fn resolve(&self, href: &str) -> Option<Url> {
        self.url.join(href).ok()
    }

    pub fn root_id(&self) -> NodeId {
        self.document.tree.root().id()
    }

    pub fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.document.tree.get(id).and_then(ElementRef::wrap)
    }

    /// All attached elements matching `selector`, in document order.
    ///
    /// Walks down from the root element, so nodes inside detached subtrees
    /// never match even though they stay in the arena.
    pub fn select_ids(&self, selector: &Selector) -> Vec<NodeId> {
        self.document
            .root_element()
            .select(selector)
            .map(|el| el.id())
            .collect()
    }

    /// Whether the node is still reachable from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let root = self.root_id();
        match self.document.tree.get(id) {
            Some(node) if node.id() == root => true,
            Some(node) => node.ancestors().any(|a| a.id() == root),
            None => false,
        }
    }

    /// Whether `id` is `ancestor` or lies beneath it.
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        if ancestor == id {
            return true;
        }
        self.document
            .tree
            .get(id)
            .map(|n| n.ancestors().any(|a| a.id() == ancestor))
            .unwrap_or(false)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.document.tree.get(id)?.parent().map(|p| p.id())
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.document
            .tree
            .get(id)
            .map(|n| n.children().map(|c| c.id()).collect())
            .unwrap_or_default()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.document.tree.get(id).map(|n| n.value())
    }

    /// Append a node under `parent`, recording the mutation.
    pub fn append(&mut self, parent: NodeId, value: Node) -> Option<NodeId> {
        let added = self.document.tree.get_mut(parent)?.append(value).id();
        self.records.push(MutationRecord {
            target: parent,
            added: vec![added],
            removed: Vec::new(),
        });
        Some(added)
    }

    /// Parse `markup` as a fragment and append its top-level nodes to `parent`.
    pub fn append_html(&mut self, parent: NodeId, markup: &str) -> Vec<NodeId> {
        let added = parser::graft_fragment(&mut self.document.tree, parent, markup);
        if !added.is_empty() {
            self.records.push(MutationRecord {
                target: parent,
                added: added.clone(),
                removed: Vec::new(),
            });
        }
        added
    }

    /// Replace the children of `id` with `markup`, keeping the element itself.
    ///
    /// This is how virtualized lists recycle a card for another video.
    pub fn set_inner_html(&mut self, id: NodeId, markup: &str) -> Vec<NodeId> {
        let removed = self.detach_children(id);
        let added = parser::graft_fragment(&mut self.document.tree, id, markup);
        if !removed.is_empty() || !added.is_empty() {
            self.records.push(MutationRecord {
                target: id,
                added: added.clone(),
                removed,
            });
        }
        added
    }

    /// Detach every child of `id`, recording the mutation.
    pub fn clear_children(&mut self, id: NodeId) {
        let removed = self.detach_children(id);
        if !removed.is_empty() {
            self.records.push(MutationRecord {
                target: id,
                added: Vec::new(),
                removed,
            });
        }
    }

    /// Detach `id` from its parent. No-op for the root or detached nodes.
    pub fn remove(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        if let Some(mut node) = self.document.tree.get_mut(id) {
            node.detach();
        }
        self.records.push(MutationRecord {
            target: parent,
            added: Vec::new(),
            removed: vec![id],
        });
        true
    }

    /// Overwrite a node's value in place (attribute change, not a child-list mutation).
    pub fn replace_value(&mut self, id: NodeId, value: Node) -> bool {
        match self.document.tree.get_mut(id) {
            Some(mut node) => {
                *node.value() = value;
                true
            }
            None => false,
        }
    }

    /// Drain pending mutation records.
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn pending_records(&self) -> usize {
        self.records.len()
    }

    /// Register an activation listener on `id`.
    pub fn add_listener(&mut self, id: NodeId, capture: bool) -> ListenerId {
        let listener = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.entry(id).or_default().push(Listener {
            id: listener,
            capture,
        });
        listener
    }

    pub fn remove_listener(&mut self, id: NodeId, listener: ListenerId) -> bool {
        let Some(list) = self.listeners.get_mut(&id) else {
            return false;
        };
        let before = list.len();
        list.retain(|l| l.id != listener);
        let removed = list.len() != before;
        if list.is_empty() {
            self.listeners.remove(&id);
        }
        removed
    }

    /// Total registered listeners across the page.
    pub fn listener_count(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    /// Capture-phase listeners an activation on `target` would hit, outermost first.
    pub fn capture_path(&self, target: NodeId) -> Vec<(NodeId, ListenerId)> {
        let Some(node) = self.document.tree.get(target) else {
            return Vec::new();
        };
        let mut path: Vec<NodeId> = node.ancestors().map(|a| a.id()).collect();
        path.reverse();
        path.push(target);

        path.into_iter()
            .flat_map(|id| {
                self.listeners
                    .get(&id)
                    .into_iter()
                    .flatten()
                    .filter(|l| l.capture)
                    .map(move |l| (id, l.id))
            })
            .collect()
    }

    fn detach_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = self.children(id);
        for child in &children {
            if let Some(mut node) = self.document.tree.get_mut(*child) {
                node.detach();
            }
        }
        children
    }
}

/// Trimmed text content of an element.
pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Whether an element node carries `class`.
pub fn has_class(node: &Node, class: &str) -> bool {
    node.as_element()
        .map(|el| el.classes().any(|c| c == class))
        .unwrap_or(false)
}
