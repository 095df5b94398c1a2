// ABOUTME: Per-format element classification for RSS, Atom, and OPDS documents.
// ABOUTME: Maps (local name, namespace) pairs to semantic roles and detects item boundaries.

use crate::cursor::{NodeKind, XmlCursor};
use crate::ns;

/// Document grammar selected once per parse call.
///
/// OPDS shares Atom's element vocabulary; its catalog semantics live in link
/// relations handled by the opds module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Rss,
    Atom,
    Opds,
}

/// Semantic role of an element during the channel scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Start of an item/entry; metadata scanning stops here.
    Item,
    Link,
    Person,
    Category,
    Image,
    /// Anything else: scalar fields and unrecognized elements.
    Content,
}

impl Dialect {
    /// Guesses the dialect from the first start tag of a document.
    ///
    /// OPDS is indistinguishable from Atom at the root and must be requested
    /// explicitly; this never returns `Opds`.
    pub fn sniff(data: &[u8]) -> Option<Dialect> {
        let mut cursor = XmlCursor::new(data);
        while let Ok(true) = cursor.advance() {
            if cursor.kind() != NodeKind::Start {
                continue;
            }
            return match cursor.local_name() {
                "rss" | "channel" if cursor.namespace().is_none() => Some(Dialect::Rss),
                "feed" if ns::is_atom(cursor.namespace()) => Some(Dialect::Atom),
                _ => None,
            };
        }
        None
    }

    /// True when the element opens an item (RSS) or entry (Atom/OPDS).
    pub fn is_item_boundary(&self, name: &str, namespace: Option<&str>) -> bool {
        match self {
            Dialect::Rss => name == "item" && namespace.is_none(),
            Dialect::Atom | Dialect::Opds => name == "entry" && ns::is_atom(namespace),
        }
    }

    pub fn classify(&self, name: &str, namespace: Option<&str>) -> Role {
        if self.is_item_boundary(name, namespace) {
            return Role::Item;
        }
        match self {
            Dialect::Rss => classify_rss(name, namespace),
            Dialect::Atom | Dialect::Opds => classify_atom(name, namespace),
        }
    }
}

fn classify_rss(name: &str, namespace: Option<&str>) -> Role {
    if ns::is_atom(namespace) {
        // RFC 5005 paging arrives as atom:link even inside RSS documents.
        return match name {
            "link" => Role::Link,
            _ => Role::Content,
        };
    }
    if ns::is_itunes(namespace) {
        return match name {
            "image" => Role::Image,
            "category" => Role::Category,
            "author" => Role::Person,
            _ => Role::Content,
        };
    }
    if ns::is_dublin_core(namespace) {
        return match name {
            "creator" => Role::Person,
            _ => Role::Content,
        };
    }
    if namespace.is_some() {
        return Role::Content;
    }
    match name {
        "link" | "enclosure" | "comments" | "source" => Role::Link,
        "author" | "managingEditor" | "webMaster" => Role::Person,
        "category" => Role::Category,
        "image" => Role::Image,
        _ => Role::Content,
    }
}

fn classify_atom(name: &str, namespace: Option<&str>) -> Role {
    if ns::is_atom(namespace) {
        return match name {
            "link" => Role::Link,
            "author" | "contributor" => Role::Person,
            "category" => Role::Category,
            "icon" | "logo" => Role::Image,
            _ => Role::Content,
        };
    }
    if ns::is_dublin_core(namespace) && name == "creator" {
        return Role::Person;
    }
    Role::Content
}
