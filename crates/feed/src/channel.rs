// ABOUTME: Streaming scan over a feed document: channel metadata plus items in order.
// ABOUTME: Materializes one subtree at a time and never holds the whole document.

use url::Url;

use crate::classify::{Dialect, Role};
use crate::content::{materialize, Content};
use crate::cursor::{NodeKind, XmlCursor};
use crate::error::FeedError;
use crate::fields::keep;
use crate::item::map_item;
use crate::models::{Channel, FeedType, Image, ImageType, ParsedFeed};
use crate::{dates, fields, ns};

/// Parses a feed document, detecting RSS vs Atom from the root element.
/// Unrecognizable input falls back to the permissive RSS scan, so junk
/// parses to an empty channel rather than an error.
pub fn parse_feed(data: &[u8], base: Option<&Url>) -> Result<ParsedFeed, FeedError> {
    let dialect = Dialect::sniff(data).unwrap_or(Dialect::Rss);
    parse_feed_with(data, dialect, base)
}

/// Parses a feed document under an explicitly chosen dialect.
pub fn parse_feed_with(
    data: &[u8],
    dialect: Dialect,
    base: Option<&Url>,
) -> Result<ParsedFeed, FeedError> {
    let mut cursor = XmlCursor::new(data);
    let mut feed = ParsedFeed::default();
    feed.channel.feed_type = match dialect {
        Dialect::Rss => FeedType::Rss,
        Dialect::Atom | Dialect::Opds => FeedType::Atom,
    };

    if !seek_root(&mut cursor)? {
        return Ok(feed);
    }
    if let Some(lang) = fields::non_empty(cursor.attr("lang")) {
        feed.channel.language = Some(lang);
    }

    let mut saw_item = false;
    while cursor.advance()? {
        if cursor.kind() != NodeKind::Start {
            continue;
        }
        if dialect == Dialect::Rss
            && cursor.namespace().is_none()
            && cursor.local_name() == "channel"
        {
            continue;
        }
        if dialect.is_item_boundary(cursor.local_name(), cursor.namespace()) {
            saw_item = true;
            if let Some(node) = read_subtree(&mut cursor)? {
                feed.items.push(map_item(&node, dialect, base));
            }
            continue;
        }
        if saw_item {
            // Channel metadata is only collected up to the first item.
            cursor.skip_subtree()?;
            continue;
        }
        if let Some(node) = read_subtree(&mut cursor)? {
            apply_channel_element(&mut feed.channel, &node, dialect);
        }
    }

    feed.channel.paging_links = fields::derive_paging(&feed.channel.links);
    Ok(feed)
}

/// Advances to the document's root element. Returns false when the input
/// contains no element at all.
pub(crate) fn seek_root(cursor: &mut XmlCursor) -> Result<bool, FeedError> {
    while cursor.advance()? {
        if cursor.kind() == NodeKind::Start {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Materializes the element the cursor is on, downgrading recoverable
/// failures to a logged skip and realigning the cursor past the subtree.
pub(crate) fn read_subtree(cursor: &mut XmlCursor) -> Result<Option<Content>, FeedError> {
    let depth = cursor.depth();
    match materialize(cursor) {
        Ok(node) => Ok(Some(node)),
        Err(e) if !e.is_fatal() => {
            tracing::warn!(error = %e, "skipping unreadable subtree");
            skip_to_end(cursor, depth)?;
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn skip_to_end(cursor: &mut XmlCursor, depth: usize) -> Result<(), FeedError> {
    loop {
        match cursor.kind() {
            NodeKind::End if cursor.depth() <= depth => return Ok(()),
            NodeKind::Eof => return Ok(()),
            _ => {}
        }
        if !cursor.advance()? {
            return Ok(());
        }
    }
}

/// Applies one materialized channel-level element to the channel record.
pub(crate) fn apply_channel_element(channel: &mut Channel, node: &Content, dialect: Dialect) {
    match dialect.classify(&node.name, node.namespace.as_deref()) {
        Role::Link => {
            if let Some(link) = keep(fields::parse_link(node)) {
                channel.links.push(link);
            }
        }
        Role::Person => {
            let person_type = fields::person_type_for(&node.name);
            if let Some(person) = keep(fields::parse_person(node, person_type)) {
                channel.contributors.push(person);
            }
        }
        Role::Category => {
            if let Some(category) = keep(fields::parse_category(node)) {
                channel.categories.push(category);
            }
        }
        Role::Image => apply_channel_image(channel, node),
        Role::Content => match dialect {
            Dialect::Rss => apply_rss_scalar(channel, node),
            Dialect::Atom | Dialect::Opds => apply_atom_scalar(channel, node),
        },
        // Item boundaries are consumed by the scan loop before this point.
        Role::Item => {}
    }
}

fn apply_channel_image(channel: &mut Channel, node: &Content) {
    if node.attr("href").is_some() || node.child("url").is_some() {
        if let Some(image) = keep(fields::parse_image(node)) {
            channel.images.push(image);
        }
        return;
    }
    if let Some(uri) = node.text() {
        let image_type = if node.name == "icon" {
            ImageType::Icon
        } else {
            ImageType::Logo
        };
        channel.images.push(Image {
            uri: uri.to_string(),
            image_type,
            ..Default::default()
        });
    }
}

fn apply_rss_scalar(channel: &mut Channel, node: &Content) {
    if ns::is_itunes(node.namespace.as_deref()) {
        if node.name == "summary" && channel.description.is_none() {
            channel.description = node.text().map(str::to_string);
        }
        return;
    }
    if ns::is_dublin_core(node.namespace.as_deref()) {
        apply_dc_scalar(channel, node);
        return;
    }
    if node.namespace.is_some() {
        tracing::debug!(element = %node.name, "ignoring foreign-namespace element");
        return;
    }
    match node.name.as_str() {
        "title" => channel.title = node.text().unwrap_or_default().to_string(),
        "description" => channel.description = node.text().map(str::to_string),
        "language" => channel.language = node.text().map(str::to_string),
        "copyright" => channel.copyright = node.text().map(str::to_string),
        "generator" => channel.generator = node.text().map(str::to_string),
        "lastBuildDate" => channel.last_build_date = node.text().and_then(dates::parse_datetime),
        "pubDate" => channel.published_at = node.text().and_then(dates::parse_datetime),
        _ => {}
    }
}

fn apply_dc_scalar(channel: &mut Channel, node: &Content) {
    match node.name.as_str() {
        "date" if channel.published_at.is_none() => {
            channel.published_at = node.text().and_then(dates::parse_datetime);
        }
        "language" if channel.language.is_none() => {
            channel.language = node.text().map(str::to_string);
        }
        _ => {}
    }
}

fn apply_atom_scalar(channel: &mut Channel, node: &Content) {
    if ns::is_dublin_core(node.namespace.as_deref()) {
        apply_dc_scalar(channel, node);
        return;
    }
    if !ns::is_atom(node.namespace.as_deref()) {
        tracing::debug!(element = %node.name, "ignoring foreign-namespace element");
        return;
    }
    match node.name.as_str() {
        "title" => channel.title = node.text().unwrap_or_default().to_string(),
        "id" => channel.id = node.text().map(str::to_string),
        "subtitle" => channel.description = node.text().map(str::to_string),
        "rights" => channel.copyright = node.text().map(str::to_string),
        "generator" => channel.generator = node.text().map(str::to_string),
        "updated" => channel.last_build_date = node.text().and_then(dates::parse_datetime),
        _ => {}
    }
}
