//! Full-page scan: classify every item container and reconcile it with the
//! binding table.

use std::collections::HashSet;

use ego_tree::NodeId;

use crate::dom::Page;
use crate::extract::classify::{classify, CardKind};
use crate::extract::ITEM_CONTAINERS;

use super::binding::{CardBinding, Transition};
use super::overlay::{ControlState, Mount, OverlayController};
use super::Extractor;

/// Per-pass counters. Diagnostic only.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    pub candidates: usize,
    pub newly_bound: usize,
    /// Cards recycled for another video and bound again.
    pub rebound: usize,
    pub unchanged: usize,
    /// Unchanged cards whose control had to be mounted again.
    pub remounted: usize,
    /// Bindings dropped because the card vanished or stopped being a video.
    pub released: usize,
    pub skipped: usize,
}

impl ScanReport {
    /// Whether the pass changed anything on the page.
    pub fn is_quiet(&self) -> bool {
        self.newly_bound == 0 && self.rebound == 0 && self.remounted == 0 && self.released == 0
    }
}

impl Extractor {
    /// Reconcile every rendered card with its binding. Idempotent: a second
    /// pass over an unchanged page mounts and rebinds nothing.
    pub fn scan(&mut self, page: &mut Page) -> ScanReport {
        let mut report = ScanReport::default();
        if !self.is_enabled() {
            return report;
        }
        self.scans += 1;

        let items = page.select_ids(&ITEM_CONTAINERS);
        report.candidates = items.len();
        for card in &items {
            self.reconcile(page, *card, &mut report);
        }

        let present: HashSet<NodeId> = items.into_iter().collect();
        for card in self.bindings.card_ids() {
            if present.contains(&card) {
                continue;
            }
            if let Some(binding) = self.bindings.remove(card) {
                log::trace!("card for {:?} left the page", binding.bound_video_id);
                self.release_binding(page, card, binding);
                report.released += 1;
            }
        }

        if report.is_quiet() {
            log::trace!("scan #{}: {:?}", self.scans, report);
        } else {
            log::debug!("scan #{}: {:?}", self.scans, report);
        }
        report
    }

    /// Apply the binding transition for one card against its current markup.
    pub(super) fn reconcile(&mut self, page: &mut Page, card: NodeId, report: &mut ScanReport) {
        let class = classify(page, card);
        let (Some(kind), Some(video_id), Some(anchor)) =
            (class.kind(), class.video_id(), class.overlay_anchor())
        else {
            report.skipped += 1;
            if let Some(stale) = self.bindings.remove(card) {
                self.release_binding(page, card, stale);
                report.released += 1;
            }
            return;
        };

        match self.bindings.transition(card, video_id) {
            Transition::Unchanged => {
                report.unchanged += 1;
                if self.ensure_control(page, card, anchor) {
                    report.remounted += 1;
                }
            }
            Transition::Recycled => {
                if let Some(stale) = self.bindings.remove(card) {
                    log::debug!(
                        "card recycled: {:?} -> {}",
                        stale.bound_video_id,
                        video_id
                    );
                    self.release_binding(page, card, stale);
                }
                self.bind(page, card, kind, video_id, anchor);
                report.rebound += 1;
            }
            Transition::Unseen => {
                self.bind(page, card, kind, video_id, anchor);
                report.newly_bound += 1;
            }
        }
    }

    fn bind(&mut self, page: &mut Page, card: NodeId, kind: CardKind, video_id: &str, anchor: NodeId) {
        let state = ControlState::from_selected(self.is_selected(video_id));
        let mut binding = CardBinding::new(kind, video_id.to_string());
        binding.control = self.overlay.mount(page, anchor, state).map(Mount::control);
        binding.overlay_anchor = Some(anchor);
        binding.click_interceptor = Some(page.add_listener(card, true));
        log::trace!("bound {:?} card to {}", kind, video_id);
        self.bindings.insert(card, binding);
    }

    /// Make sure an unchanged card still shows its control at `anchor`.
    /// Returns true when a new control had to be mounted.
    fn ensure_control(&mut self, page: &mut Page, card: NodeId, anchor: NodeId) -> bool {
        let Some(binding) = self.bindings.get(card) else {
            return false;
        };
        let state = binding
            .bound_video_id
            .as_deref()
            .map_or(ControlState::Unselected, |id| {
                ControlState::from_selected(self.is_selected(id))
            });

        if let Some(control) = binding.control {
            if page.is_attached(control) && page.parent(control) == Some(anchor) {
                self.overlay.set_state(page, control, state);
                return false;
            }
            // The host re-rendered part of the card or moved the anchor.
            if page.is_attached(control) {
                OverlayController::unmount(page, control);
            }
        }

        let mount = self.overlay.mount(page, anchor, state);
        if let Some(binding) = self.bindings.get_mut(card) {
            binding.control = mount.map(Mount::control);
            binding.overlay_anchor = Some(anchor);
        }
        matches!(mount, Some(Mount::Mounted(_)))
    }

    /// Detach the card's interceptor and remove its control.
    pub(super) fn release_binding(&self, page: &mut Page, card: NodeId, binding: CardBinding) {
        if let Some(listener) = binding.click_interceptor {
            page.remove_listener(card, listener);
        }
        if let Some(control) = binding.control {
            if page.is_attached(control) {
                OverlayController::unmount(page, control);
            }
        }
    }
}
