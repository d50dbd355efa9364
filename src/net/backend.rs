//! Client for the local download-tracking service.
//!
//! The service only enriches records with a downloaded flag. Any failure
//! here degrades to "unknown" and never touches the selection itself.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::engine::DownloadAnnotation;
use crate::selection::VideoRecord;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
const CHECK_PATH: &str = "api/downloads/check_downloads";

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("invalid backend URL {0:?}")]
    InvalidUrl(String),
    #[error("client error: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("backend answered {0}")]
    Status(u16),
    #[error("unreadable response: {0}")]
    Decode(#[source] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct CheckDownloadsRequest<'a> {
    urls: &'a [String],
}

/// Download state of one URL as the service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VideoDownloadStatus {
    pub url: String,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub is_downloaded: bool,
    #[serde(default)]
    pub download_date: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub video_title: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckDownloadsResponse {
    pub results: Vec<VideoDownloadStatus>,
    #[serde(default)]
    pub total_checked: usize,
    #[serde(default)]
    pub total_downloaded: usize,
}

impl CheckDownloadsResponse {
    /// Annotations for every result that names a video.
    pub fn annotations(&self) -> Vec<DownloadAnnotation> {
        self.results
            .iter()
            .filter_map(|r| {
                let video_id = r.video_id.clone().filter(|id| !id.is_empty())?;
                Some(DownloadAnnotation {
                    video_id,
                    is_downloaded: r.is_downloaded,
                    download_date: r.download_date.clone(),
                    file_path: r.file_path.clone(),
                })
            })
            .collect()
    }
}

pub struct DownloadChecker {
    endpoint: Url,
    client: reqwest::blocking::Client,
}

impl DownloadChecker {
    pub fn new(base: &str) -> Result<Self, BackendError> {
        let endpoint = Url::parse(base)
            .and_then(|u| {
                // Keep any path prefix the service is mounted under.
                if u.path().ends_with('/') {
                    u.join(CHECK_PATH)
                } else {
                    Url::parse(&format!("{}/", u)).and_then(|u| u.join(CHECK_PATH))
                }
            })
            .map_err(|_| BackendError::InvalidUrl(base.to_string()))?;

        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("ytb-extractor/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(BackendError::Client)?;

        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Ask the service about `urls` (blocking).
    pub fn check(&self, urls: &[String]) -> Result<CheckDownloadsResponse, BackendError> {
        if urls.is_empty() {
            return Ok(CheckDownloadsResponse {
                results: Vec::new(),
                total_checked: 0,
                total_downloaded: 0,
            });
        }

        let response = self
            .client
            .post(self.endpoint.as_str())
            .json(&CheckDownloadsRequest { urls })
            .send()
            .map_err(BackendError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }
        let body: CheckDownloadsResponse = response.json().map_err(BackendError::Decode)?;
        log::info!(
            "download check: {}/{} videos already downloaded",
            body.total_downloaded,
            body.total_checked
        );
        Ok(body)
    }

    /// Annotations for `records`; an unreachable or failing service yields none.
    pub fn annotations_for(&self, records: &[VideoRecord]) -> Vec<DownloadAnnotation> {
        let urls: Vec<String> = records.iter().map(|r| r.url.clone()).collect();
        match self.check(&urls) {
            Ok(response) => response.annotations(),
            Err(e) => {
                log::warn!("download check unavailable: {}", e);
                Vec::new()
            }
        }
    }
}
