// ABOUTME: Forward-only, depth-tracking cursor over a namespace-resolved XML stream.
// ABOUTME: Wraps quick-xml's NsReader and exposes advance/read_text/skip_subtree primitives.

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesRef, BytesStart, Event};
use quick_xml::name::{Namespace, QName, ResolveResult};
use quick_xml::reader::NsReader;

use crate::entities;
use crate::error::FeedError;

/// Kind of the node the cursor is currently positioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Start of an element. Name, namespace, and attributes are populated.
    Start,
    /// End of an element. Name and namespace are populated.
    End,
    /// A piece of character data (text, CDATA, or a resolved reference).
    Text,
    /// End of the stream, or before the first `advance` call.
    Eof,
}

/// One attribute of an element, with its namespace resolved where bound.
/// Namespace declarations (`xmlns`, `xmlns:*`) are filtered out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attr {
    pub name: String,
    pub namespace: Option<String>,
    pub value: String,
}

/// A forward-only cursor over an XML document.
///
/// Depth follows the owning convention: the root start tag is at depth 0 and
/// an element at depth `d` owns exactly the nodes at depth `d + 1` until its
/// end tag (also reported at depth `d`) is seen. Empty elements are expanded
/// to start/end pairs so the convention holds uniformly.
pub struct XmlCursor<'a> {
    reader: NsReader<&'a [u8]>,
    kind: NodeKind,
    // Number of elements currently open; the depth of the next start tag.
    level: usize,
    depth: usize,
    name: String,
    ns: Option<String>,
    text: String,
    attrs: Vec<Attr>,
}

impl<'a> XmlCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        let mut reader = NsReader::from_reader(data);
        reader.config_mut().expand_empty_elements = true;
        XmlCursor {
            reader,
            kind: NodeKind::Eof,
            level: 0,
            depth: 0,
            name: String::new(),
            ns: None,
            text: String::new(),
            attrs: Vec::new(),
        }
    }

    /// Moves to the next start tag, end tag, or piece of character data.
    /// Returns false once the stream is exhausted.
    pub fn advance(&mut self) -> Result<bool, FeedError> {
        loop {
            let (resolve, event) = self.reader.read_resolved_event().map_err(FeedError::xml)?;
            let ns = owned_namespace(resolve);
            match event {
                Event::Start(e) => {
                    self.kind = NodeKind::Start;
                    self.depth = self.level;
                    self.level += 1;
                    self.name = local_name(&e);
                    self.ns = ns;
                    self.text.clear();
                    self.attrs = self.collect_attrs(&e);
                    return Ok(true);
                }
                Event::End(e) => {
                    self.level = self.level.saturating_sub(1);
                    self.kind = NodeKind::End;
                    self.depth = self.level;
                    self.name = end_name(&e);
                    self.ns = ns;
                    self.text.clear();
                    self.attrs.clear();
                    return Ok(true);
                }
                Event::Text(e) => {
                    self.set_text_node(match e.decode() {
                        Ok(t) => t.into_owned(),
                        // Undecodable content degrades to the raw bytes.
                        Err(_) => String::from_utf8_lossy(e.as_ref()).into_owned(),
                    });
                    return Ok(true);
                }
                Event::CData(e) => {
                    self.set_text_node(String::from_utf8_lossy(&e.into_inner()).into_owned());
                    return Ok(true);
                }
                Event::GeneralRef(e) => {
                    self.set_text_node(resolve_reference(&e));
                    return Ok(true);
                }
                Event::Eof => {
                    self.kind = NodeKind::Eof;
                    return Ok(false);
                }
                // Declarations, comments, processing instructions, doctypes.
                _ => {}
            }
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Local name of the current element, without any prefix.
    pub fn local_name(&self) -> &str {
        &self.name
    }

    /// Resolved namespace URI of the current element, if bound.
    pub fn namespace(&self) -> Option<&str> {
        self.ns.as_deref()
    }

    /// Character data when positioned on a `Text` node.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    /// Finds an attribute by local name, ignoring its prefix and namespace.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Reads the concatenated character data of the current element's whole
    /// subtree, leaving the cursor on the element's end tag. Nested markup is
    /// dropped; its character data is kept.
    pub fn read_text(&mut self) -> Result<String, FeedError> {
        let target = self.depth;
        let mut out = String::new();
        while self.advance()? {
            match self.kind {
                NodeKind::Text => out.push_str(&self.text),
                NodeKind::End if self.depth == target => return Ok(out.trim().to_string()),
                _ => {}
            }
        }
        Err(FeedError::xml("unexpected end of stream inside element"))
    }

    /// Consumes the current element's subtree, leaving the cursor on its end tag.
    /// No-op unless positioned on a start tag.
    pub fn skip_subtree(&mut self) -> Result<(), FeedError> {
        if self.kind != NodeKind::Start {
            return Ok(());
        }
        let target = self.depth;
        while self.advance()? {
            if self.kind == NodeKind::End && self.depth == target {
                break;
            }
        }
        Ok(())
    }

    fn set_text_node(&mut self, text: String) {
        self.kind = NodeKind::Text;
        self.depth = self.level;
        self.name.clear();
        self.ns = None;
        self.text = text;
        self.attrs.clear();
    }

    fn collect_attrs(&self, e: &BytesStart) -> Vec<Attr> {
        let mut out = Vec::new();
        for attr in e.attributes().flatten() {
            if is_namespace_decl(attr.key) {
                continue;
            }
            let (resolve, local) = self.reader.resolve_attribute(attr.key);
            out.push(Attr {
                name: String::from_utf8_lossy(local.as_ref()).into_owned(),
                namespace: owned_namespace(resolve),
                value: attr_value(&attr),
            });
        }
        out
    }
}

fn owned_namespace(resolve: ResolveResult) -> Option<String> {
    match resolve {
        ResolveResult::Bound(Namespace(uri)) => Some(String::from_utf8_lossy(uri).into_owned()),
        _ => None,
    }
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn end_name(e: &BytesEnd) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn is_namespace_decl(key: QName) -> bool {
    match key.prefix() {
        Some(prefix) => prefix.as_ref() == b"xmlns",
        None => key.local_name().as_ref() == b"xmlns",
    }
}

fn attr_value(attr: &Attribute) -> String {
    match attr.unescape_value() {
        Ok(v) => v.into_owned(),
        Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
    }
}

/// Resolves a general reference: character references by code point, named
/// entities via the entity table, anything else passed through literally.
fn resolve_reference(r: &BytesRef) -> String {
    let raw = String::from_utf8_lossy(r);
    if let Some(num) = raw.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => num.parse::<u32>().ok(),
        };
        if let Some(ch) = code.and_then(char::from_u32) {
            return ch.to_string();
        }
    } else if let Some(replacement) = entities::resolve(&raw) {
        return replacement.to_string();
    }
    format!("&{};", raw)
}
