// ABOUTME: Named character entity table for resolving general references in feed text.
// ABOUTME: Covers the XML predefined set plus HTML entities commonly found in feeds.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static ENTITIES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        // XML predefined
        ("amp", "&"),
        ("lt", "<"),
        ("gt", ">"),
        ("quot", "\""),
        ("apos", "'"),
        // HTML entities that show up in real-world feeds
        ("nbsp", "\u{A0}"),
        ("ndash", "\u{2013}"),
        ("mdash", "\u{2014}"),
        ("lsquo", "\u{2018}"),
        ("rsquo", "\u{2019}"),
        ("ldquo", "\u{201C}"),
        ("rdquo", "\u{201D}"),
        ("hellip", "\u{2026}"),
        ("copy", "\u{A9}"),
        ("reg", "\u{AE}"),
        ("trade", "\u{2122}"),
        ("bull", "\u{2022}"),
        ("middot", "\u{B7}"),
        ("deg", "\u{B0}"),
        ("plusmn", "\u{B1}"),
        ("times", "\u{D7}"),
        ("divide", "\u{F7}"),
        ("frac12", "\u{BD}"),
        ("frac14", "\u{BC}"),
        ("frac34", "\u{BE}"),
        ("euro", "\u{20AC}"),
        ("pound", "\u{A3}"),
        ("yen", "\u{A5}"),
        ("cent", "\u{A2}"),
    ])
});

/// Looks up a named entity (without `&`/`;`), returning its replacement text.
pub fn resolve(name: &str) -> Option<&'static str> {
    ENTITIES.get(name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predefined_entities() {
        assert_eq!(resolve("amp"), Some("&"));
        assert_eq!(resolve("lt"), Some("<"));
        assert_eq!(resolve("gt"), Some(">"));
        assert_eq!(resolve("quot"), Some("\""));
        assert_eq!(resolve("apos"), Some("'"));
    }

    #[test]
    fn test_html_entities() {
        assert_eq!(resolve("nbsp"), Some("\u{A0}"));
        assert_eq!(resolve("mdash"), Some("\u{2014}"));
        assert_eq!(resolve("hellip"), Some("\u{2026}"));
    }

    #[test]
    fn test_unknown_entity() {
        assert_eq!(resolve("nosuchentity"), None);
        assert_eq!(resolve(""), None);
    }
}
