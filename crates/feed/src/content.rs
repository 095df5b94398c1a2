// ABOUTME: Generic in-memory tree for one element subtree, built from the cursor.
// ABOUTME: Used for bounded units (one item/entry at a time), never the whole document.

use crate::cursor::{Attr, NodeKind, XmlCursor};
use crate::error::FeedError;

/// Defensive cap on element nesting while building a tree.
const MAX_NESTING: usize = 32;

/// A materialized element: name, namespace, attributes, and either text or children.
///
/// A node carries `value` only when it has no child elements; an element with
/// nested markup gets `children` and its loose text pieces are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Content {
    pub name: String,
    pub namespace: Option<String>,
    pub value: Option<String>,
    pub attributes: Vec<Attr>,
    pub children: Vec<Content>,
}

impl Content {
    /// Finds an attribute by local name, ignoring its prefix and namespace.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// First child with the given local name.
    pub fn child(&self, name: &str) -> Option<&Content> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Text content of this node, when it is a leaf.
    pub fn text(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Text content of the first child with the given local name.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(Content::text)
    }
}

/// Builds a `Content` tree for the element the cursor is positioned on,
/// consuming its whole subtree. The cursor ends up on the element's end tag.
pub fn materialize(cursor: &mut XmlCursor) -> Result<Content, FeedError> {
    materialize_at(cursor, 0)
}

fn materialize_at(cursor: &mut XmlCursor, nesting: usize) -> Result<Content, FeedError> {
    if nesting >= MAX_NESTING {
        return Err(FeedError::too_deep(cursor.local_name()));
    }
    let mut node = Content {
        name: cursor.local_name().to_string(),
        namespace: cursor.namespace().map(str::to_string),
        value: None,
        attributes: cursor.attrs().to_vec(),
        children: Vec::new(),
    };
    let depth = cursor.depth();
    let mut text = String::new();
    while cursor.advance()? {
        match cursor.kind() {
            NodeKind::Start => node.children.push(materialize_at(cursor, nesting + 1)?),
            NodeKind::Text => text.push_str(cursor.text()),
            NodeKind::End if cursor.depth() == depth => {
                if node.children.is_empty() {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        node.value = Some(trimmed.to_string());
                    }
                }
                return Ok(node);
            }
            _ => {}
        }
    }
    Err(FeedError::xml("unexpected end of stream inside element"))
}
