//! Per-card bindings, kept in a side table keyed by node identity instead of
//! being stashed on the host page's elements.

use std::collections::HashMap;

use ego_tree::NodeId;

use crate::dom::ListenerId;
use crate::extract::classify::CardKind;

/// What the engine knows about one card element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardBinding {
    pub processed: bool,
    pub kind: CardKind,
    pub bound_video_id: Option<String>,
    /// Capture-phase listener installed on the card.
    pub click_interceptor: Option<ListenerId>,
    /// Overlay control mounted for this card.
    pub control: Option<NodeId>,
    /// Where the control was mounted.
    pub overlay_anchor: Option<NodeId>,
}

impl CardBinding {
    pub fn new(kind: CardKind, video_id: String) -> Self {
        Self {
            processed: true,
            kind,
            bound_video_id: Some(video_id),
            click_interceptor: None,
            control: None,
            overlay_anchor: None,
        }
    }

    pub fn is_bound_to(&self, video_id: &str) -> bool {
        self.bound_video_id.as_deref() == Some(video_id)
    }
}

/// How a freshly classified card relates to its existing binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Never seen: bind.
    Unseen,
    /// Same video as before: nothing to do.
    Unchanged,
    /// Element reused for another video: release, then bind.
    Recycled,
}

#[derive(Debug, Default)]
pub struct BindingTable {
    cards: HashMap<NodeId, CardBinding>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, card: NodeId) -> Option<&CardBinding> {
        self.cards.get(&card)
    }

    pub fn get_mut(&mut self, card: NodeId) -> Option<&mut CardBinding> {
        self.cards.get_mut(&card)
    }

    pub fn transition(&self, card: NodeId, video_id: &str) -> Transition {
        match self.cards.get(&card) {
            None => Transition::Unseen,
            Some(b) if b.is_bound_to(video_id) => Transition::Unchanged,
            Some(_) => Transition::Recycled,
        }
    }

    pub fn insert(&mut self, card: NodeId, binding: CardBinding) {
        self.cards.insert(card, binding);
    }

    pub fn remove(&mut self, card: NodeId) -> Option<CardBinding> {
        self.cards.remove(&card)
    }

    /// Card owning the given capture listener.
    pub fn card_for_listener(&self, card: NodeId, listener: ListenerId) -> Option<&CardBinding> {
        self.cards
            .get(&card)
            .filter(|b| b.click_interceptor == Some(listener))
    }

    /// Cards currently bound to `video_id` (a video may be rendered twice).
    pub fn cards_bound_to(&self, video_id: &str) -> Vec<NodeId> {
        self.cards
            .iter()
            .filter(|(_, b)| b.is_bound_to(video_id))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn card_ids(&self) -> Vec<NodeId> {
        self.cards.keys().copied().collect()
    }

    pub fn drain(&mut self) -> Vec<(NodeId, CardBinding)> {
        self.cards.drain().collect()
    }
}
