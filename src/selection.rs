//! Selected videos: the single source of truth for what gets exported.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Descriptive record of one selected video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: String,
    /// Canonical long-form watch URL, even for short-form cards.
    pub url: String,
    pub title: String,
    /// Channel id or `@handle`; empty when the card has no channel link.
    pub channel_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_downloaded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl VideoRecord {
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
        channel_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            title: title.into(),
            channel_id: channel_id.into(),
            is_downloaded: None,
            download_date: None,
            file_path: None,
        }
    }
}

/// Insertion-ordered, deduplicated id → record map.
#[derive(Debug, Clone, Default)]
pub struct SelectionStore {
    records: IndexMap<String, VideoRecord>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&VideoRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut VideoRecord> {
        self.records.get_mut(id)
    }

    /// Insert a record. Returns `false` (and keeps the original position and
    /// record) if the id is already selected.
    pub fn insert(&mut self, record: VideoRecord) -> bool {
        if self.records.contains_key(&record.id) {
            return false;
        }
        self.records.insert(record.id.clone(), record);
        true
    }

    /// Remove by id, preserving the order of the remaining records.
    pub fn remove(&mut self, id: &str) -> Option<VideoRecord> {
        self.records.shift_remove(id)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &VideoRecord> {
        self.records.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Snapshot of the records in selection order.
    pub fn to_vec(&self) -> Vec<VideoRecord> {
        self.records.values().cloned().collect()
    }
}
