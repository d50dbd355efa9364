//! Card classification: is this item a video, which kind, and where does
//! the overlay control go.

use ego_tree::NodeId;
use scraper::ElementRef;

use super::resolver::{is_shorts_href, resolve_video_id};
use super::{
    DETAILS, SHORTS_ANCHOR, SHORTS_LOCKUP, SHORTS_THUMBNAIL, THUMBNAIL, THUMBNAIL_ANCHOR,
    THUMBNAIL_OVERLAYS,
};
use crate::dom::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardKind {
    Standard,
    ShortForm,
}

/// Classification of one item-level element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardClass {
    NotAVideo,
    Standard {
        anchor_href: String,
        overlay_anchor: NodeId,
        video_id: String,
    },
    ShortForm {
        anchor_href: String,
        overlay_anchor: NodeId,
        video_id: String,
    },
}

impl CardClass {
    pub fn kind(&self) -> Option<CardKind> {
        match self {
            CardClass::NotAVideo => None,
            CardClass::Standard { .. } => Some(CardKind::Standard),
            CardClass::ShortForm { .. } => Some(CardKind::ShortForm),
        }
    }

    pub fn video_id(&self) -> Option<&str> {
        match self {
            CardClass::NotAVideo => None,
            CardClass::Standard { video_id, .. } | CardClass::ShortForm { video_id, .. } => {
                Some(video_id)
            }
        }
    }

    pub fn overlay_anchor(&self) -> Option<NodeId> {
        match self {
            CardClass::NotAVideo => None,
            CardClass::Standard { overlay_anchor, .. }
            | CardClass::ShortForm { overlay_anchor, .. } => Some(*overlay_anchor),
        }
    }

    pub fn anchor_href(&self) -> Option<&str> {
        match self {
            CardClass::NotAVideo => None,
            CardClass::Standard { anchor_href, .. }
            | CardClass::ShortForm { anchor_href, .. } => Some(anchor_href),
        }
    }
}

/// Classify the item element `item`.
///
/// The standard-thumbnail branch is tried first; the short-form lockup
/// branch only runs when the first one does not produce an identifier.
pub fn classify(page: &Page, item: NodeId) -> CardClass {
    let Some(el) = page.element(item) else {
        return CardClass::NotAVideo;
    };
    standard_card(page, el)
        .or_else(|| short_form_card(page, el))
        .unwrap_or(CardClass::NotAVideo)
}

fn standard_card(page: &Page, item: ElementRef<'_>) -> Option<CardClass> {
    let (thumbnail, anchor) = match item.select(&THUMBNAIL).next() {
        Some(thumb) => (thumb, thumb.select(&THUMBNAIL_ANCHOR).next()?),
        None => {
            // Some renderers expose the anchor itself as the thumbnail.
            let anchor = item.select(&THUMBNAIL_ANCHOR).next()?;
            (anchor, anchor)
        }
    };
    let href = anchor.value().attr("href")?;
    let video_id = resolve_video_id(page.url(), href)?;

    let overlay_anchor = item
        .select(&DETAILS)
        .next()
        .or_else(|| thumbnail.select(&THUMBNAIL_OVERLAYS).next())
        .map(|el| el.id())
        .unwrap_or_else(|| thumbnail.id());

    Some(CardClass::Standard {
        anchor_href: href.to_string(),
        overlay_anchor,
        video_id,
    })
}

fn short_form_card(page: &Page, item: ElementRef<'_>) -> Option<CardClass> {
    let lockup = item.select(&SHORTS_LOCKUP).next()?;
    let href = lockup
        .select(&SHORTS_ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| is_shorts_href(page.url(), href))?;
    let video_id = resolve_video_id(page.url(), href)?;

    let overlay_anchor = lockup
        .select(&SHORTS_THUMBNAIL)
        .next()
        .map(|el| el.id())
        .unwrap_or_else(|| lockup.id());

    Some(CardClass::ShortForm {
        anchor_href: href.to_string(),
        overlay_anchor,
        video_id,
    })
}
