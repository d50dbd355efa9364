//! Card activation and selection edits.

use ego_tree::NodeId;

use crate::dom::Page;
use crate::export::{ExportError, ExportFormat};
use crate::extract::metadata::extract_record;

use super::overlay::ControlState;
use super::scanner::ScanReport;
use super::Extractor;

/// Result of dispatching an activation through the capture path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// No bound card intercepted it: the host page handles navigation.
    PassThrough,
    /// A card interceptor suppressed navigation and toggled its video.
    Toggled { video_id: String, selected: bool },
}

impl ClickOutcome {
    pub fn default_prevented(&self) -> bool {
        matches!(self, ClickOutcome::Toggled { .. })
    }
}

impl Extractor {
    /// Deliver an activation on `target`. Card interceptors run in the
    /// capture phase, so they see it before anything the host registered
    /// deeper in the tree.
    pub fn click(&mut self, page: &mut Page, target: NodeId) -> ClickOutcome {
        if !self.is_enabled() {
            return ClickOutcome::PassThrough;
        }
        for (node, listener) in page.capture_path(target) {
            if self.bindings.card_for_listener(node, listener).is_none() {
                continue;
            }
            if let Some(selected) = self.toggle(page, node) {
                let video_id = self
                    .bindings
                    .get(node)
                    .and_then(|b| b.bound_video_id.clone())
                    .unwrap_or_default();
                return ClickOutcome::Toggled { video_id, selected };
            }
        }
        ClickOutcome::PassThrough
    }

    /// Flip selection of the video `card` currently shows.
    ///
    /// The card is reconciled first, so a card recycled since the last scan
    /// toggles its new video rather than the stale one. Returns the new
    /// selection state, or `None` when the card is not a bound video card.
    pub fn toggle(&mut self, page: &mut Page, card: NodeId) -> Option<bool> {
        if !self.is_enabled() {
            return None;
        }
        self.reconcile(page, card, &mut ScanReport::default());
        let video_id = self.bindings.get(card)?.bound_video_id.clone()?;

        let selection = self.selection.as_mut()?;
        let selected = if selection.remove(&video_id).is_some() {
            false
        } else {
            selection.insert(extract_record(page, card, &video_id, &self.config));
            true
        };
        log::debug!("{} {}", if selected { "selected" } else { "deselected" }, video_id);

        self.sync_controls(page, &video_id, ControlState::from_selected(selected));
        self.notify_selection();
        Some(selected)
    }

    /// Toggle a video by id through one of the cards rendering it.
    ///
    /// Cards are reconciled before use; one recycled for another video since
    /// the last scan is skipped.
    pub fn toggle_video(&mut self, page: &mut Page, video_id: &str) -> Option<bool> {
        for card in self.bindings.cards_bound_to(video_id) {
            if !page.is_attached(card) {
                continue;
            }
            self.reconcile(page, card, &mut ScanReport::default());
            if self.bindings.get(card).is_some_and(|b| b.is_bound_to(video_id)) {
                return self.toggle(page, card);
            }
        }
        None
    }

    /// Drop `video_id` from the selection. Rendered cards are reset.
    pub fn remove_video(&mut self, page: &mut Page, video_id: &str) -> bool {
        let removed = self
            .selection
            .as_mut()
            .and_then(|s| s.remove(video_id))
            .is_some();
        if removed {
            self.sync_controls(page, video_id, ControlState::Unselected);
            self.notify_selection();
        }
        removed
    }

    /// Empty the selection and reset every rendered control.
    pub fn clear_selection(&mut self, page: &mut Page) {
        let Some(selection) = self.selection.as_mut() else {
            return;
        };
        let cleared = selection.len();
        selection.clear();

        for card in self.bindings.card_ids() {
            if let Some(control) = self.bindings.get(card).and_then(|b| b.control) {
                self.overlay.set_state(page, control, ControlState::Unselected);
            }
        }
        log::debug!("cleared {} selected videos", cleared);
        self.notify_selection();
    }

    /// Render the selection. An empty selection is an error, never an empty file.
    pub fn export(&self, format: ExportFormat) -> Result<String, ExportError> {
        format.render(&self.selected())
    }

    /// Restyle every control bound to `video_id` (a video may be rendered twice).
    ///
    /// Each card is reconciled first; a card now showing another video is
    /// rebound with its own state instead of inheriting this one.
    fn sync_controls(&mut self, page: &mut Page, video_id: &str, state: ControlState) {
        for card in self.bindings.cards_bound_to(video_id) {
            if !page.is_attached(card) {
                continue;
            }
            self.reconcile(page, card, &mut ScanReport::default());
            let Some(binding) = self.bindings.get(card).filter(|b| b.is_bound_to(video_id)) else {
                continue;
            };
            if let Some(control) = binding.control {
                self.overlay.set_state(page, control, state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractorConfig;
    use crate::dom::parser::element_template;
    use crate::engine::overlay::OverlayController;
    use crate::extract::ITEM_CONTAINERS;
    use crate::testing::fixtures;
    use scraper::Selector;

    fn feed() -> (Page, Extractor) {
        let mut page = fixtures::page(&format!(
            "{}{}",
            fixtures::rich_item("abc123", "Say \"hi\"", "/@maker"),
            fixtures::shorts_item("xyz789", "Short one"),
        ));
        let mut extractor = Extractor::new(ExtractorConfig::default());
        extractor.enable(&mut page);
        (page, extractor)
    }

    fn first(page: &Page, css: &str) -> NodeId {
        page.select_ids(&Selector::parse(css).unwrap())[0]
    }

    #[test]
    fn toggle_round_trip() {
        let (mut page, mut extractor) = feed();
        let cards = page.select_ids(&ITEM_CONTAINERS);

        assert_eq!(extractor.toggle(&mut page, cards[0]), Some(true));
        assert_eq!(extractor.toggle(&mut page, cards[1]), Some(true));
        assert_eq!(extractor.selection_len(), 2);

        let selected = extractor.selected();
        assert_eq!(selected[0].id, "abc123");
        assert_eq!(selected[0].url, "https://www.youtube.com/watch?v=abc123");
        assert_eq!(selected[0].title, "Say \"hi\"");
        assert_eq!(selected[0].channel_id, "@maker");
        assert_eq!(selected[1].id, "xyz789");
        assert_eq!(selected[1].url, "https://www.youtube.com/watch?v=xyz789");
        assert_eq!(selected[1].channel_id, "");

        assert_eq!(extractor.toggle(&mut page, cards[0]), Some(false));
        assert_eq!(extractor.selection_len(), 1);
        assert!(extractor.is_selected("xyz789"));
        assert!(!extractor.is_selected("abc123"));
    }

    #[test]
    fn click_inside_card_is_intercepted() {
        let (mut page, mut extractor) = feed();
        let title_link = first(&page, "a#video-title-link");

        let outcome = extractor.click(&mut page, title_link);
        assert_eq!(
            outcome,
            ClickOutcome::Toggled {
                video_id: "abc123".into(),
                selected: true
            }
        );
        assert!(outcome.default_prevented());

        let card = page.select_ids(&ITEM_CONTAINERS)[0];
        let control = extractor.bindings().get(card).unwrap().control.unwrap();
        assert_eq!(OverlayController::state(&page, control), Some(ControlState::Selected));

        // Clicking the control itself goes through the same interceptor.
        let outcome = extractor.click(&mut page, control);
        assert!(matches!(outcome, ClickOutcome::Toggled { selected: false, .. }));
    }

    #[test]
    fn click_outside_cards_passes_through() {
        let (mut page, mut extractor) = feed();
        let contents = first(&page, "#contents");
        assert_eq!(extractor.click(&mut page, contents), ClickOutcome::PassThrough);

        extractor.disable(&mut page);
        let link = first(&page, "a#video-title-link");
        assert_eq!(extractor.click(&mut page, link), ClickOutcome::PassThrough);
    }

    #[test]
    fn toggle_sees_recycled_markup_before_rescan() {
        let mut page = fixtures::page(&fixtures::rich_item("aaa", "A", "/@a"));
        let mut extractor =
            Extractor::new(ExtractorConfig::default().with_debounce(Some(std::time::Duration::from_secs(1))));
        extractor.enable(&mut page);
        let card = page.select_ids(&ITEM_CONTAINERS)[0];

        // Recycled, debounce still pending.
        page.set_inner_html(card, &fixtures::rich_item_body("bbb", "B", "/@b"));
        assert_eq!(extractor.toggle(&mut page, card), Some(true));
        assert!(extractor.is_selected("bbb"));
        assert!(!extractor.is_selected("aaa"));
        assert_eq!(extractor.selected()[0].title, "B");
    }

    #[test]
    fn remove_and_clear_reset_controls() {
        let (mut page, mut extractor) = feed();
        extractor.toggle_video(&mut page, "abc123");
        extractor.toggle_video(&mut page, "xyz789");

        assert!(extractor.remove_video(&mut page, "abc123"));
        assert!(!extractor.remove_video(&mut page, "abc123"));
        let card = page.select_ids(&ITEM_CONTAINERS)[0];
        let control = extractor.bindings().get(card).unwrap().control.unwrap();
        assert_eq!(OverlayController::state(&page, control), Some(ControlState::Unselected));

        extractor.clear_selection(&mut page);
        assert_eq!(extractor.selection_len(), 0);
        for card in page.select_ids(&ITEM_CONTAINERS) {
            let control = extractor.bindings().get(card).unwrap().control.unwrap();
            assert_eq!(OverlayController::state(&page, control), Some(ControlState::Unselected));
        }
    }

    #[test]
    fn export_requires_a_selection() {
        let (mut page, mut extractor) = feed();
        assert!(matches!(
            extractor.export(ExportFormat::Csv),
            Err(ExportError::EmptySelection)
        ));

        extractor.toggle_video(&mut page, "abc123");
        let csv = extractor.export(ExportFormat::Csv).unwrap();
        assert!(csv.starts_with('\u{FEFF}'));
        assert!(csv.contains(r#""Say ""hi""""#));
        assert_eq!(
            extractor.export(ExportFormat::Clipboard).unwrap(),
            "https://www.youtube.com/watch?v=abc123"
        );
    }

    #[test]
    fn toggle_video_skips_card_recycled_for_another_video() {
        let mut page = fixtures::page(&fixtures::rich_item("aaa", "A", "/@a"));
        let mut extractor =
            Extractor::new(ExtractorConfig::default().with_debounce(Some(std::time::Duration::from_secs(1))));
        extractor.enable(&mut page);
        let card = page.select_ids(&ITEM_CONTAINERS)[0];

        page.set_inner_html(card, &fixtures::rich_item_body("bbb", "B", "/@b"));
        assert_eq!(extractor.toggle_video(&mut page, "aaa"), None);
        assert_eq!(extractor.selection_len(), 0);
        assert!(extractor.bindings().get(card).unwrap().is_bound_to("bbb"));
    }

    #[test]
    fn selecting_a_video_leaves_rewritten_duplicate_alone() {
        let mut page = fixtures::page(&format!(
            "{}{}",
            fixtures::rich_item("aaa", "A", "/@a"),
            fixtures::rich_item("aaa", "A", "/@a"),
        ));
        let mut extractor = Extractor::new(ExtractorConfig::default());
        extractor.enable(&mut page);
        let cards = page.select_ids(&ITEM_CONTAINERS);
        let (rewritten, other) = (cards[0], cards[1]);

        // Links rewritten in place: no child-list record, no rescan.
        let thumbnail = page.select_ids(&Selector::parse("a#thumbnail").unwrap())[0];
        let (link, _) = element_template(r#"<a id="thumbnail" href="/watch?v=bbb"></a>"#).unwrap();
        assert!(page.replace_value(thumbnail, link));

        assert_eq!(extractor.toggle(&mut page, other), Some(true));
        assert!(extractor.is_selected("aaa"));

        let binding = extractor.bindings().get(rewritten).unwrap();
        assert!(binding.is_bound_to("bbb"));
        let control = binding.control.unwrap();
        assert_eq!(OverlayController::state(&page, control), Some(ControlState::Unselected));

        let control = extractor.bindings().get(other).unwrap().control.unwrap();
        assert_eq!(OverlayController::state(&page, control), Some(ControlState::Selected));
    }

    #[test]
    fn unknown_video_cannot_be_toggled() {
        let (mut page, mut extractor) = feed();
        assert_eq!(extractor.toggle_video(&mut page, "nope"), None);
        assert_eq!(extractor.selection_len(), 0);
    }
}
