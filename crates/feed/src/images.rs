// ABOUTME: Image selection, validation, and URL resolution for feed content.
// ABOUTME: Finds usable item images from enclosures or embedded HTML, filtering tracking pixels.

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use crate::models::{Item, Link, LinkType};

/// Substrings that mark a URL as a tracking pixel or placeholder.
const INVALID_PATTERNS: &[&str] = &[
    "pixel",
    "tracking",
    "analytics",
    "beacon",
    "spacer",
    "clear.gif",
    "blank.gif",
    "1x1",
    // 1x1 transparent GIF data URI prefix.
    "data:image/gif;base64,r0lgodlhaqabai",
];

static INVALID_MATCHER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(INVALID_PATTERNS)
        .unwrap()
});

/// Checks that an image URL is not a known tracking pixel or placeholder.
pub fn is_valid_image_url(url: &str) -> bool {
    if INVALID_MATCHER.is_match(url) {
        return false;
    }
    !contains_tiny_dimensions(&url.to_ascii_lowercase())
}

fn contains_tiny_dimensions(url: &str) -> bool {
    if url.contains("width=1") || url.contains("height=1") {
        return true;
    }
    if url.contains("w=1&") || url.contains("&w=1") || url.ends_with("w=1") {
        return true;
    }
    url.contains("h=1&") || url.contains("&h=1") || url.ends_with("h=1")
}

/// Resolves a possibly-relative reference against the caller-supplied base.
/// Absolute inputs pass through untouched; unresolvable relatives come back as-is.
pub fn resolve_ref(base: Option<&Url>, raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    if Url::parse(raw).is_ok() {
        return raw.to_string();
    }
    if let Some(base) = base {
        if let Ok(resolved) = base.join(raw) {
            return resolved.to_string();
        }
    }
    raw.to_string()
}

/// Extracts the first usable image URL from an HTML fragment.
pub fn extract_first_image(html: &str, base: Option<&Url>) -> Option<String> {
    let document = Html::parse_fragment(html);
    let selector = Selector::parse("img[src]").ok()?;

    for element in document.select(&selector) {
        let Some(src) = element.value().attr("src") else {
            continue;
        };
        if src.trim().is_empty() {
            continue;
        }
        let resolved = resolve_ref(base, src);
        if is_valid_image_url(&resolved) {
            return Some(resolved);
        }
    }
    None
}

/// Picks an image for an item that declared none explicitly: first an
/// image-typed enclosure, then the first usable <img> in the content,
/// then in the description.
pub fn select_item_image(item: &Item, base: Option<&Url>) -> Option<String> {
    for link in &item.links {
        if link.link_type == LinkType::Enclosure
            && is_image_link(link)
            && is_valid_image_url(&link.uri)
        {
            return Some(link.uri.clone());
        }
    }

    // Relative srcs resolve against the item's own page before the feed base.
    let page = item
        .links
        .iter()
        .find(|l| l.link_type == LinkType::Alternate)
        .and_then(|l| Url::parse(&l.uri).ok());
    let effective = page.as_ref().or(base);

    [item.content.as_deref(), item.description.as_deref()]
        .into_iter()
        .flatten()
        .find_map(|html| extract_first_image(html, effective))
}

fn is_image_link(link: &Link) -> bool {
    if link
        .media_type
        .as_deref()
        .is_some_and(|t| t.starts_with("image/"))
    {
        return true;
    }
    has_image_extension(&link.uri)
}

fn has_image_extension(uri: &str) -> bool {
    let path = uri
        .split(&['?', '#'][..])
        .next()
        .unwrap_or(uri)
        .to_ascii_lowercase();
    [".jpg", ".jpeg", ".png", ".gif", ".webp", ".avif"]
        .iter()
        .any(|ext| path.ends_with(ext))
}
