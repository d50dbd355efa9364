//! Title and channel extraction.
//!
//! Each field has an ordered table of independent strategies; the first one
//! returning a non-empty value wins. Missing structure is the normal case
//! (short-form cards rarely link their channel), so nothing here fails.

use ego_tree::NodeId;
use scraper::ElementRef;
use url::Url;

use super::resolver::canonical_watch_url;
use super::{CHANNEL_LINK, SHORTS_TITLE, VIDEO_TITLE, VIDEO_TITLE_LINK};
use crate::config::ExtractorConfig;
use crate::dom::{text_of, Page};
use crate::selection::VideoRecord;

/// A named extraction step over a card element.
pub struct Strategy {
    pub name: &'static str,
    pub extract: fn(ElementRef<'_>) -> Option<String>,
}

pub const TITLE_STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "video-title",
        extract: title_text,
    },
    Strategy {
        name: "video-title-link",
        extract: title_link_label,
    },
    Strategy {
        name: "shorts-title",
        extract: shorts_title,
    },
];

pub const CHANNEL_STRATEGIES: &[Strategy] = &[Strategy {
    name: "channel-link",
    extract: channel_href,
}];

/// Run `strategies` in order and return the first non-empty result.
pub fn first_match(card: ElementRef<'_>, strategies: &[Strategy]) -> Option<String> {
    strategies.iter().find_map(|s| {
        let value = (s.extract)(card)?;
        let value = value.trim();
        if value.is_empty() {
            None
        } else {
            log::trace!("strategy {} matched", s.name);
            Some(value.to_string())
        }
    })
}

/// Build the record for `video_id` from the card element `card`.
pub fn extract_record(
    page: &Page,
    card: NodeId,
    video_id: &str,
    config: &ExtractorConfig,
) -> VideoRecord {
    let element = page.element(card);

    let title = element
        .and_then(|el| first_match(el, TITLE_STRATEGIES))
        .unwrap_or_else(|| config.unknown_title.clone());

    let channel_id = element
        .and_then(|el| first_match(el, CHANNEL_STRATEGIES))
        .map(|href| channel_id_from_href(page.url(), &href))
        .unwrap_or_default();

    VideoRecord::new(
        video_id,
        canonical_watch_url(&config.site_origin, video_id),
        title,
        channel_id,
    )
}

/// Channel identifier from a channel link target.
///
/// `/channel/<id>` yields `<id>`, `/@handle` yields `@handle` (sigil kept),
/// anything else the last path segment.
pub fn channel_id_from_href(base: &Url, href: &str) -> String {
    let Ok(url) = base.join(href) else {
        return String::new();
    };
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        ["channel", id, ..] => id.to_string(),
        [handle, ..] if handle.starts_with('@') => handle.to_string(),
        [.., last] => last.to_string(),
        [] => String::new(),
    }
}

fn title_text(card: ElementRef<'_>) -> Option<String> {
    card.select(&VIDEO_TITLE).next().map(text_of)
}

fn title_link_label(card: ElementRef<'_>) -> Option<String> {
    let link = card.select(&VIDEO_TITLE_LINK).next()?;
    ["aria-label", "title"]
        .iter()
        .filter_map(|attr| link.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| Some(text_of(link)))
}

fn shorts_title(card: ElementRef<'_>) -> Option<String> {
    card.select(&SHORTS_TITLE).map(text_of).find(|t| !t.is_empty())
}

fn channel_href(card: ElementRef<'_>) -> Option<String> {
    card.select(&CHANNEL_LINK)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .next()
}
