use ego_tree::{NodeId, NodeRef, Tree};
use scraper::{Html, Node};

/// Parse `markup` as a fragment and copy its top-level nodes (with their
/// subtrees) under `parent`. Returns the ids of the copied top-level nodes.
pub fn graft_fragment(tree: &mut Tree<Node>, parent: NodeId, markup: &str) -> Vec<NodeId> {
    let fragment = Html::parse_fragment(markup);
    let container = fragment.root_element();

    let mut added = Vec::new();
    for child in container.children() {
        if let Some(id) = copy_subtree(tree, parent, child) {
            added.push(id);
        }
    }
    added
}

/// First element of a fragment, together with its direct child nodes.
///
/// Used to build node templates that can be cloned into a live page.
pub fn element_template(markup: &str) -> Option<(Node, Vec<Node>)> {
    let fragment = Html::parse_fragment(markup);
    let element = fragment
        .root_element()
        .children()
        .find(|c| c.value().is_element())?;
    let children = element.children().map(|c| c.value().clone()).collect();
    Some((element.value().clone(), children))
}

fn copy_subtree(tree: &mut Tree<Node>, parent: NodeId, src: NodeRef<'_, Node>) -> Option<NodeId> {
    let id = tree.get_mut(parent)?.append(src.value().clone()).id();
    for child in src.children() {
        copy_subtree(tree, id, child);
    }
    Some(id)
}
