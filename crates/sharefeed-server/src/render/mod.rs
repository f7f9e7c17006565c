//! HTML rendering for share-link previews.
//!
//! A share page is a complete, script-free document whose `<head>` carries
//! Open Graph and Twitter Card metadata for link-preview crawlers, and whose
//! `<body>` shows the post for anyone who opens it directly.
//!
//! All rendering uses [maud](https://maud.lambda.xyz/), so every dynamic
//! value (author handle, body text, URLs) is HTML-escaped.

pub mod components;

use maud::{Markup, html};
use sharefeed_core::Post;

use components::{
    OgImage, OpenGraphData, app_link, author_header, collapse_whitespace, image_mime, page_shell,
    truncate,
};

/// Longest description we emit, in characters (ellipsis included).
pub const DESCRIPTION_MAX_CHARS: usize = 160;

/// Advertised preview image dimensions (the common 1.91:1 card size).
pub const OG_IMAGE_WIDTH: u32 = 1200;
pub const OG_IMAGE_HEIGHT: u32 = 630;

/// Site-wide values every share page needs.
#[derive(Debug, Clone, Copy)]
pub struct ShareSite<'a> {
    /// Public base URL without trailing slash.
    pub base_url: &'a str,
    /// Site name for `og:site_name` and the app link.
    pub site_name: &'a str,
    /// Where the "open in app" link points for this post.
    pub app_url: &'a str,
}

/// Canonical share URL for a post.
pub fn share_url(base_url: &str, post: &Post) -> String {
    format!("{base_url}/post/{}", post.id)
}

/// Absolute URL for a stored image reference.
///
/// References are normally relative (`/uploads/...`) and get the base URL
/// prepended. Already-absolute http(s) URLs pass through.
pub fn absolute_image_url(base_url: &str, image_ref: &str) -> String {
    if image_ref.starts_with("https://") || image_ref.starts_with("http://") {
        image_ref.to_string()
    } else if image_ref.starts_with('/') {
        format!("{base_url}{image_ref}")
    } else {
        format!("{base_url}/{image_ref}")
    }
}

/// Render the share page for a post.
pub fn share_page(post: &Post, site: ShareSite<'_>) -> Markup {
    let title = format!("Post by {}", post.username);
    let description = truncate(&collapse_whitespace(&post.content), DESCRIPTION_MAX_CHARS);
    let canonical = share_url(site.base_url, post);

    let image_url = post
        .image_url
        .as_deref()
        .map(|path| absolute_image_url(site.base_url, path));
    let image_alt = format!("Image shared by {}", post.username);

    let image = image_url.as_deref().map(|url| OgImage {
        url,
        mime: image_mime(url),
        width: OG_IMAGE_WIDTH,
        height: OG_IMAGE_HEIGHT,
        alt: &image_alt,
    });

    let twitter_card_type = if image.is_some() {
        "summary_large_image"
    } else {
        "summary"
    };

    let og = OpenGraphData {
        title: &title,
        description: &description,
        url: &canonical,
        og_type: "article",
        site_name: site.site_name,
        image,
        twitter_card_type,
    };

    let body = html! {
        article class="card" {
            (author_header(&post.username, post.created_at))
            p class="content" { (post.content) }
            @if let Some(url) = &image_url {
                img class="post-image" src=(url) alt=(image_alt) loading="lazy";
            }
        }
        (app_link(site.app_url, site.site_name))
    };

    page_shell(&og, body)
}
