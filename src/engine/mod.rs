//! The page engine: keeps card overlays and the selection in step with a
//! continuously mutating, virtualized page.
//!
//! Everything runs on one thread, driven by the caller: mutation bursts
//! (`on_mutations`), clock ticks for the debounce (`tick`), activations
//! (`click`) and controller messages (`handle` / `pump`). Correctness rests
//! on the scan being idempotent, not on the debounce.

pub mod binding;
pub mod dispatch;
pub mod interaction;
pub mod monitor;
pub mod overlay;
pub mod scanner;

use std::time::Instant;

use crate::config::ExtractorConfig;
use crate::dom::Page;
use crate::messaging::{Notification, NotificationSink};
use crate::selection::{SelectionStore, VideoRecord};
use crate::storage::{read_enabled, KeyValueStore};

use binding::BindingTable;
use monitor::{ChangeMonitor, Trigger};
use overlay::{OverlayController, CONTROLS};
pub use interaction::ClickOutcome;
pub use scanner::ScanReport;

/// Download state reported by the backend for one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadAnnotation {
    pub video_id: String,
    pub is_downloaded: bool,
    pub download_date: Option<String>,
    pub file_path: Option<String>,
}

pub struct Extractor {
    config: ExtractorConfig,
    /// Present only while enabled.
    selection: Option<SelectionStore>,
    bindings: BindingTable,
    overlay: OverlayController,
    monitor: ChangeMonitor,
    sink: Option<Box<dyn NotificationSink>>,
    scans: u64,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Self {
        let monitor = ChangeMonitor::new(config.debounce);
        Self {
            config,
            selection: None,
            bindings: BindingTable::new(),
            overlay: OverlayController::new(),
            monitor,
            sink: None,
            scans: 0,
        }
    }

    /// Route selection notifications to `sink`.
    pub fn with_sink(mut self, sink: Box<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.selection.is_some()
    }

    /// Page load: enable if the persisted flag says so.
    pub fn bootstrap(&mut self, page: &mut Page, store: &dyn KeyValueStore) {
        if read_enabled(store, &self.config.storage_key) {
            self.enable(page);
        } else {
            log::info!("extractor disabled by stored setting");
        }
    }

    pub fn set_enabled(&mut self, page: &mut Page, enabled: bool) {
        if enabled {
            self.enable(page);
        } else {
            self.disable(page);
        }
    }

    /// Start observing with an empty selection and scan what is already rendered.
    pub fn enable(&mut self, page: &mut Page) {
        if self.is_enabled() {
            return;
        }
        log::info!("extractor enabled on {}", page.url());
        self.selection = Some(SelectionStore::new());
        // Records from before enabling describe markup the first scan covers.
        page.take_records();
        self.monitor.observe();
        self.scan(page);
    }

    /// Full teardown: stop observing, cancel any pending scan, unmount every
    /// control, detach every interceptor and drop all bindings and the
    /// selection. Safe to call when never enabled.
    pub fn disable(&mut self, page: &mut Page) {
        self.monitor.disconnect();

        let released = self.bindings.len();
        for (card, binding) in self.bindings.drain() {
            self.release_binding(page, card, binding);
        }
        // Controls whose card was recycled out from under us.
        for stray in page.select_ids(&CONTROLS) {
            OverlayController::unmount(page, stray);
        }
        page.take_records();

        if self.selection.take().is_some() {
            log::info!("extractor disabled, released {} cards", released);
        }
    }

    /// Feed pending mutation records from `page` into the change monitor.
    pub fn on_mutations(&mut self, page: &mut Page, now: Instant) -> Option<ScanReport> {
        let records = page.take_records();
        if records.is_empty() || !self.is_enabled() {
            return None;
        }
        match self.monitor.record_burst(page, &records, now) {
            Trigger::ScanNow => Some(self.scan(page)),
            Trigger::Scheduled(deadline) => {
                log::trace!("scan scheduled in {:?}", deadline.saturating_duration_since(now));
                None
            }
            Trigger::Ignored => None,
        }
    }

    /// Run the debounced scan if its deadline has passed.
    pub fn tick(&mut self, page: &mut Page, now: Instant) -> Option<ScanReport> {
        if self.monitor.poll(now) {
            Some(self.scan(page))
        } else {
            None
        }
    }

    pub fn pending_scan(&self) -> Option<Instant> {
        self.monitor.pending()
    }

    pub fn scan_count(&self) -> u64 {
        self.scans
    }

    pub fn bound_cards(&self) -> usize {
        self.bindings.len()
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    pub fn selection_len(&self) -> usize {
        self.selection.as_ref().map_or(0, SelectionStore::len)
    }

    pub fn is_selected(&self, video_id: &str) -> bool {
        self.selection.as_ref().is_some_and(|s| s.contains(video_id))
    }

    /// Selected records in selection order.
    pub fn selected(&self) -> Vec<VideoRecord> {
        self.selection.as_ref().map(SelectionStore::to_vec).unwrap_or_default()
    }

    /// Apply backend download state to matching selected records.
    pub fn annotate_downloads(&mut self, annotations: &[DownloadAnnotation]) -> usize {
        let Some(selection) = self.selection.as_mut() else {
            return 0;
        };
        let mut applied = 0;
        for a in annotations {
            if let Some(record) = selection.get_mut(&a.video_id) {
                record.is_downloaded = Some(a.is_downloaded);
                record.download_date = a.download_date.clone();
                record.file_path = a.file_path.clone();
                applied += 1;
            }
        }
        applied
    }

    /// Push the new selection state. A closed controller is not an error.
    fn notify_selection(&self) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        let items = self.selected();
        let count = items.len();
        for notification in [
            Notification::UpdateCount { count },
            Notification::SelectionChanged { count, items },
        ] {
            if let Err(e) = sink.notify(notification) {
                log::debug!("selection notification dropped: {}", e);
                return;
            }
        }
    }
}
