//! Extractor settings.

use std::time::Duration;

use url::Url;

/// Storage key of the persisted enabled flag.
pub const DEFAULT_STORAGE_KEY: &str = "ytbExtractorEnabled";
pub const DEFAULT_SITE_ORIGIN: &str = "https://www.youtube.com";
pub const DEFAULT_UNKNOWN_TITLE: &str = "Unknown Title";
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Quiet period before a re-scan; `None` scans once per mutation burst.
    pub debounce: Option<Duration>,
    pub storage_key: String,
    /// Origin used to rebuild canonical watch URLs.
    pub site_origin: Url,
    /// Title recorded when no title strategy matches.
    pub unknown_title: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            debounce: Some(DEFAULT_DEBOUNCE),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            site_origin: Url::parse(DEFAULT_SITE_ORIGIN).expect("default origin is a valid URL"),
            unknown_title: DEFAULT_UNKNOWN_TITLE.to_string(),
        }
    }
}

impl ExtractorConfig {
    pub fn with_debounce(mut self, debounce: Option<Duration>) -> Self {
        self.debounce = debounce.filter(|d| !d.is_zero());
        self
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_site_origin(mut self, origin: Url) -> Self {
        self.site_origin = origin;
        self
    }

    pub fn with_unknown_title(mut self, title: impl Into<String>) -> Self {
        self.unknown_title = title.into();
        self
    }
}
