//! Shared HTML components for rendered pages.
//!
//! These are maud functions that return `Markup` fragments for composition
//! into full pages.

use chrono::{DateTime, Utc};
use maud::{Markup, PreEscaped, html};

/// Inline CSS for share pages.
pub const PAGE_CSS: &str = r#"
*{margin:0;padding:0;box-sizing:border-box}
:root{--bg:#f4f5f7;--fg:#111;--fg2:#555;--fg3:#999;--accent:#1d72e8;--accent-hover:#155bb8;--border:rgba(0,0,0,.08)}
body{font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;line-height:1.6;color:var(--fg);background:var(--bg);min-height:100vh;display:flex;flex-direction:column;align-items:center;padding:1.5rem 1rem}
main{max-width:600px;width:100%;flex:1}
a{color:var(--accent);text-decoration:none}
a:hover{text-decoration:underline}
.card{background:#fff;padding:1.25rem 1.5rem;border:1px solid var(--border);border-radius:10px}
.author{display:flex;align-items:center;gap:.75rem;margin-bottom:1rem}
.author-pic{width:44px;height:44px;border-radius:50%;background:var(--accent);color:#fff;display:flex;align-items:center;justify-content:center;font-weight:700;text-transform:uppercase}
.author-name{font-weight:600}
.post-time{display:block;font-size:.8rem;color:var(--fg3)}
.content{white-space:pre-wrap;word-break:break-word;font-size:1.05rem}
.post-image{display:block;width:100%;margin-top:1rem;border-radius:8px}
.actions{margin-top:1.25rem;display:flex;justify-content:center}
.app-link{display:inline-block;padding:.55rem 1.1rem;background:var(--accent);color:#fff;border-radius:6px;font-weight:500}
.app-link:hover{background:var(--accent-hover);text-decoration:none}
@media(prefers-color-scheme:dark){
:root{--bg:#0d0f14;--fg:#e5e5e5;--fg2:#a0a0a0;--fg3:#666;--border:rgba(255,255,255,.1)}
.card{background:#161a22}
}
"#;

/// Content-Security-Policy header value for share pages.
///
/// Inline styles only. No scripts, no frames, images from anywhere on http(s).
pub const CSP_HEADER: &str = "default-src 'none'; style-src 'unsafe-inline'; img-src https: http: data:; form-action 'none'; frame-ancestors 'none'; base-uri 'none'";

/// Suffix appended to truncated text.
pub const ELLIPSIS: &str = "...";

/// Open Graph metadata for a page.
pub struct OpenGraphData<'a> {
    /// OG title, also the document title.
    pub title: &'a str,
    /// OG description and `<meta name="description">`.
    pub description: &'a str,
    /// Canonical absolute URL of the page.
    pub url: &'a str,
    /// OG type (e.g., "website", "article").
    pub og_type: &'a str,
    /// Site name.
    pub site_name: &'a str,
    /// Preview image, if any.
    pub image: Option<OgImage<'a>>,
    /// Twitter card type ("summary", "summary_large_image").
    pub twitter_card_type: &'a str,
}

/// Preview image metadata.
pub struct OgImage<'a> {
    /// Absolute URL.
    pub url: &'a str,
    /// Mime type, when it can be told from the extension.
    pub mime: Option<&'static str>,
    /// Advertised width in pixels.
    pub width: u32,
    /// Advertised height in pixels.
    pub height: u32,
    /// Alt text.
    pub alt: &'a str,
}

/// Render the full HTML page shell with `<head>`, OG tags, and body content.
pub fn page_shell(og: &OpenGraphData<'_>, body_content: Markup) -> Markup {
    html! {
        (maud::DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (og.title) }
                meta name="description" content=(og.description);
                link rel="canonical" href=(og.url);

                // Open Graph
                meta property="og:type" content=(og.og_type);
                meta property="og:url" content=(og.url);
                meta property="og:title" content=(og.title);
                meta property="og:description" content=(og.description);
                meta property="og:site_name" content=(og.site_name);
                meta property="og:locale" content="en_US";
                @if let Some(image) = &og.image {
                    meta property="og:image" content=(image.url);
                    @if image.url.starts_with("https://") {
                        meta property="og:image:secure_url" content=(image.url);
                    }
                    @if let Some(mime) = image.mime {
                        meta property="og:image:type" content=(mime);
                    }
                    meta property="og:image:width" content=(image.width);
                    meta property="og:image:height" content=(image.height);
                    meta property="og:image:alt" content=(image.alt);
                }

                // Twitter Card
                meta name="twitter:card" content=(og.twitter_card_type);
                meta name="twitter:url" content=(og.url);
                meta name="twitter:title" content=(og.title);
                meta name="twitter:description" content=(og.description);
                @if let Some(image) = &og.image {
                    meta name="twitter:image" content=(image.url);
                    meta name="twitter:image:alt" content=(image.alt);
                }

                style { (PreEscaped(PAGE_CSS)) }
            }
            body {
                main { (body_content) }
            }
        }
    }
}

/// Author initial plus handle, and the post time underneath.
pub fn author_header(username: &str, created_at: DateTime<Utc>) -> Markup {
    let initial = username
        .trim()
        .chars()
        .next()
        .unwrap_or('?')
        .to_uppercase()
        .to_string();
    let (display, iso) = format_timestamp(created_at);

    html! {
        div class="author" {
            div class="author-pic" { (initial) }
            div {
                span class="author-name" { (username) }
                time class="post-time" datetime=(iso) { (display) }
            }
        }
    }
}

/// A single call-to-action link into the client app.
pub fn app_link(href: &str, site_name: &str) -> Markup {
    html! {
        div class="actions" {
            a class="app-link" href=(href) { "Open in " (site_name) }
        }
    }
}

/// Format a timestamp as ("Mon DD, YYYY HH:MM UTC", ISO 8601).
fn format_timestamp(ts: DateTime<Utc>) -> (String, String) {
    let display = ts.format("%b %d, %Y %H:%M UTC").to_string();
    let iso = ts.format("%Y-%m-%dT%H:%M:%SZ").to_string();
    (display, iso)
}

/// Truncate to at most `max_chars` characters, ending in [`ELLIPSIS`] if cut.
///
/// Counts Unicode scalar values, never splits one. When `max_chars` leaves no
/// room for the ellipsis the text is cut bare.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }

    if max_chars <= ELLIPSIS.len() {
        return s.chars().take(max_chars).collect();
    }

    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let end = s.char_indices().nth(keep).map_or(s.len(), |(i, _)| i);
    format!("{}{ELLIPSIS}", s[..end].trim_end())
}

/// Collapse runs of whitespace (including newlines) into single spaces.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Image mime type from a path's extension.
pub fn image_mime(path: &str) -> Option<&'static str> {
    let file = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = file.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "avif" => Some("image/avif"),
        "svg" => Some("image/svg+xml"),
        "bmp" => Some("image/bmp"),
        "ico" => Some("image/x-icon"),
        _ => None,
    }
}
