//! Markup fixtures shaped like the host site's feed renderers.

pub mod fixtures {
    use crate::dom::Page;

    pub const PAGE_URL: &str = "https://www.youtube.com/";

    /// Wrap card markup in a feed page.
    pub fn document(cards: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html><head><title>Feed</title></head>
<body><ytd-app><div id="contents">{cards}</div></ytd-app></body></html>"#
        )
    }

    pub fn page(cards: &str) -> Page {
        Page::parse(&document(cards), PAGE_URL).expect("fixture page parses")
    }

    /// Home-feed card with a details region and a channel link.
    pub fn rich_item(id: &str, title: &str, channel_href: &str) -> String {
        format!(
            r#"<ytd-rich-item-renderer>{}</ytd-rich-item-renderer>"#,
            rich_item_body(id, title, channel_href)
        )
    }

    /// Inner markup of a home-feed card, used when recycling a card in place.
    pub fn rich_item_body(id: &str, title: &str, channel_href: &str) -> String {
        format!(
            r#"<div id="content">
                 <ytd-thumbnail>
                   <a id="thumbnail" href="/watch?v={id}"><img src="/vi/{id}/hq.jpg"></a>
                   <div id="overlays"></div>
                 </ytd-thumbnail>
                 <div id="details">
                   <h3><a id="video-title-link" href="/watch?v={id}"><span id="video-title">{title}</span></a></h3>
                   <ytd-channel-name><a href="{channel_href}">Creator</a></ytd-channel-name>
                 </div>
               </div>"#
        )
    }

    /// Short-form lockup card without any channel affordance.
    pub fn shorts_item(id: &str, title: &str) -> String {
        format!(
            r#"<ytd-rich-item-renderer>
                 <ytm-shorts-lockup-view-model class="shortsLockupViewModelHost">
                   <a href="/shorts/{id}" class="shortsLockupViewModelHostEndpoint">
                     <div class="shortsLockupViewModelHostThumbnailContainer"><img></div>
                   </a>
                   <div class="shortsLockupViewModelHostOutsideMetadata">
                     <h3 class="shortsLockupViewModelHostMetadataTitle"><span>{title}</span></h3>
                   </div>
                 </ytm-shorts-lockup-view-model>
               </ytd-rich-item-renderer>"#
        )
    }
}
