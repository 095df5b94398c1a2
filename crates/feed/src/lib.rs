// ABOUTME: Core feed parsing library for folio.
// ABOUTME: Streams RSS 2.0, Atom 1.0, and OPDS catalogs into normalized channel/item records.

pub mod channel;
pub mod classify;
pub mod content;
pub mod cursor;
pub mod dates;
pub mod durations;
pub mod entities;
pub mod error;
pub mod fields;
pub mod images;
pub mod item;
pub mod models;
pub mod ns;
pub mod opds;
pub mod opensearch;

pub use channel::{parse_feed, parse_feed_with};
pub use classify::Dialect;
pub use content::Content;
pub use cursor::{Attr, NodeKind, XmlCursor};
pub use error::FeedError;
pub use models::{Channel, FeedType, Image, Item, Link, ParsedFeed};
pub use opds::{parse_catalog, Catalog, CatalogEntry};
pub use opensearch::{parse_description, SearchDescription};

// ----------------------------------------------------------------------------
// Search discovery
// ----------------------------------------------------------------------------

const OPENSEARCH_MEDIA_TYPE: &str = "application/opensearchdescription+xml";

/// Finds the OpenSearch description URL a channel advertises, if any.
/// Catalogs link their search endpoint as `rel="search"` with the
/// OpenSearch description media type.
pub fn search_description_url(channel: &Channel) -> Option<&str> {
    channel
        .links
        .iter()
        .find(|link| link.media_type.as_deref() == Some(OPENSEARCH_MEDIA_TYPE))
        .map(|link| link.uri.as_str())
}
