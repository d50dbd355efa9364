//! Card recognition and metadata extraction over the host page markup.

pub mod classify;
pub mod metadata;
pub mod resolver;

use once_cell::sync::Lazy;
use scraper::Selector;

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e:?}"))
}

/// Item-level containers the host page renders one video into.
pub static ITEM_CONTAINERS: Lazy<Selector> = Lazy::new(|| {
    selector(
        "ytd-rich-item-renderer, ytd-video-renderer, ytd-grid-video-renderer, \
         ytd-compact-video-renderer, ytd-reel-item-renderer, ytd-playlist-video-renderer",
    )
});

// Standard cards
pub(crate) static THUMBNAIL: Lazy<Selector> = Lazy::new(|| selector("ytd-thumbnail"));
pub(crate) static THUMBNAIL_ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a#thumbnail"));
pub(crate) static DETAILS: Lazy<Selector> = Lazy::new(|| selector("#details"));
pub(crate) static THUMBNAIL_OVERLAYS: Lazy<Selector> = Lazy::new(|| selector("#overlays"));

// Short-form lockups
pub(crate) static SHORTS_LOCKUP: Lazy<Selector> =
    Lazy::new(|| selector("ytm-shorts-lockup-view-model, .shortsLockupViewModelHost"));
pub(crate) static SHORTS_ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a[href*=\"/shorts/\"]"));
pub(crate) static SHORTS_THUMBNAIL: Lazy<Selector> =
    Lazy::new(|| selector(".shortsLockupViewModelHostThumbnailContainer"));

// Metadata
pub(crate) static VIDEO_TITLE: Lazy<Selector> = Lazy::new(|| selector("#video-title"));
pub(crate) static VIDEO_TITLE_LINK: Lazy<Selector> = Lazy::new(|| selector("a#video-title-link"));
pub(crate) static SHORTS_TITLE: Lazy<Selector> = Lazy::new(|| {
    selector(
        ".shortsLockupViewModelHostMetadataTitle, \
         .shortsLockupViewModelHostOutsideMetadataTitle",
    )
});
pub(crate) static CHANNEL_LINK: Lazy<Selector> = Lazy::new(|| {
    selector("ytd-channel-name a, #channel-name a, #channel-info a, a.ytd-channel-name")
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_selectors_compile() {
        for sel in [
            &ITEM_CONTAINERS,
            &THUMBNAIL,
            &THUMBNAIL_ANCHOR,
            &DETAILS,
            &THUMBNAIL_OVERLAYS,
            &SHORTS_LOCKUP,
            &SHORTS_ANCHOR,
            &SHORTS_THUMBNAIL,
            &VIDEO_TITLE,
            &VIDEO_TITLE_LINK,
            &SHORTS_TITLE,
            &CHANNEL_LINK,
        ] {
            Lazy::force(sel);
        }
    }
}
