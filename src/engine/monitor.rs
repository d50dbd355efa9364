//! Change monitor: turns mutation bursts into scan triggers.
//!
//! Time is passed in by the caller, so the debounce is a plain
//! deadline that gets pushed back on every burst and fires once.

use std::time::{Duration, Instant};

use ego_tree::NodeId;

use crate::dom::{MutationRecord, Page};

use super::overlay::OverlayController;

/// What the caller should do after reporting a burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Not observing, or only our own nodes changed.
    Ignored,
    /// No debounce configured: scan right away.
    ScanNow,
    /// Scan once `deadline` passes without further bursts.
    Scheduled(Instant),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MonitorStats {
    pub bursts: u64,
    /// Bursts that pushed back an already pending deadline.
    pub coalesced: u64,
    pub fired: u64,
}

#[derive(Debug)]
pub struct ChangeMonitor {
    debounce: Option<Duration>,
    observing: bool,
    deadline: Option<Instant>,
    stats: MonitorStats,
}

impl ChangeMonitor {
    pub fn new(debounce: Option<Duration>) -> Self {
        Self {
            debounce,
            observing: false,
            deadline: None,
            stats: MonitorStats::default(),
        }
    }

    pub fn observe(&mut self) {
        self.observing = true;
    }

    /// Stop observing and cancel any pending scan.
    pub fn disconnect(&mut self) {
        self.observing = false;
        self.deadline = None;
    }

    pub fn is_observing(&self) -> bool {
        self.observing
    }

    pub fn pending(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    /// Report one burst of mutation records observed at `now`.
    pub fn record_burst(&mut self, page: &Page, records: &[MutationRecord], now: Instant) -> Trigger {
        if !self.observing || !records.iter().any(|r| is_foreign(page, r)) {
            return Trigger::Ignored;
        }
        self.stats.bursts += 1;
        match self.debounce {
            None => Trigger::ScanNow,
            Some(window) => {
                if self.deadline.is_some() {
                    self.stats.coalesced += 1;
                }
                let deadline = now + window;
                self.deadline = Some(deadline);
                Trigger::Scheduled(deadline)
            }
        }
    }

    /// Whether the pending scan is due at `now`. Fires at most once per deadline.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if self.observing && now >= deadline => {
                self.deadline = None;
                self.stats.fired += 1;
                true
            }
            _ => false,
        }
    }
}

/// A record counts unless every node it touches is one of our controls.
fn is_foreign(page: &Page, record: &MutationRecord) -> bool {
    let ours = |id: &NodeId| OverlayController::is_control_node(page, *id);
    if OverlayController::is_control_node(page, record.target) {
        return false;
    }
    !(record.added.iter().all(ours) && record.removed.iter().all(ours))
}
