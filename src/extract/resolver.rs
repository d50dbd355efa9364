//! Canonical video identifiers from card links.

use url::Url;

/// Path of the long-form player page.
pub const WATCH_PATH: &str = "/watch";
/// Path prefix of short-form videos.
pub const SHORTS_PREFIX: &str = "/shorts/";

/// Derive a video id from an absolute URL.
///
/// `/watch?v=<id>` yields the `v` parameter, `/shorts/<id>` the segment after
/// the prefix. Anything else is not a video link.
pub fn video_id(url: &Url) -> Option<String> {
    let path = url.path();
    if path == WATCH_PATH {
        return url
            .query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty());
    }
    path.strip_prefix(SHORTS_PREFIX)
        .and_then(|rest| rest.split('/').next())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Resolve `href` against `base` and derive its video id.
pub fn resolve_video_id(base: &Url, href: &str) -> Option<String> {
    base.join(href).ok().as_ref().and_then(video_id)
}

/// Whether `href` (relative or absolute) points at a short-form video.
pub fn is_shorts_href(base: &Url, href: &str) -> bool {
    base.join(href)
        .map(|u| u.path().starts_with(SHORTS_PREFIX))
        .unwrap_or(false)
}

/// Long-form watch URL for `id`, whatever kind of link the card used.
pub fn canonical_watch_url(origin: &Url, id: &str) -> String {
    let mut url = origin.clone();
    url.set_path(WATCH_PATH);
    url.set_fragment(None);
    url.query_pairs_mut().clear().append_pair("v", id);
    url.to_string()
}
