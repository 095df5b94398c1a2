// ABOUTME: Normalized records produced by the feed parsers.
// ABOUTME: Channel and Item cover RSS/Atom; the opds module layers catalog records on top.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source grammar of a parsed document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedType {
    #[default]
    Rss,
    Atom,
}

/// Semantic relation of a link, normalized across formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkType {
    #[default]
    Alternate,
    #[serde(rename = "Self")]
    SelfLink,
    Enclosure,
    Related,
    Source,
    Permalink,
    Comments,
    First,
    Previous,
    Next,
    Last,
    CurrentArchive,
    PreviousArchive,
    NextArchive,
    Other,
}

/// A link extracted from a feed, item, or catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub uri: String,
    pub link_type: LinkType,
    pub title: Option<String>,
    pub media_type: Option<String>,
    /// Declared size in bytes, for enclosures.
    pub length: Option<u64>,
}

/// Role of a person within a feed or item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonType {
    #[default]
    Author,
    Contributor,
    Editor,
    Webmaster,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub person_type: PersonType,
    pub email: Option<String>,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub term: String,
    pub label: Option<String>,
    pub scheme: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageType {
    #[default]
    Icon,
    Logo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub uri: String,
    pub image_type: ImageType,
    pub title: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// RFC 5005 navigation slots derived from a channel's links.
/// When a relation occurs more than once, the last occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PagingLinks {
    pub first: Option<String>,
    pub previous: Option<String>,
    pub next: Option<String>,
    pub last: Option<String>,
    pub current: Option<String>,
}

/// Top-level metadata of a feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub title: String,
    pub id: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub copyright: Option<String>,
    pub generator: Option<String>,
    pub last_build_date: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub feed_type: FeedType,
    pub links: Vec<Link>,
    pub images: Vec<Image>,
    pub contributors: Vec<Person>,
    pub categories: Vec<Category>,
    pub paging_links: Option<PagingLinks>,
}

/// One item (RSS) or entry (Atom) within a feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Playback length in seconds, for podcast items.
    pub duration: Option<u32>,
    pub links: Vec<Link>,
    pub contributors: Vec<Person>,
    pub categories: Vec<Category>,
}

/// A fully parsed feed: channel metadata plus its items in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedFeed {
    pub channel: Channel,
    pub items: Vec<Item>,
}
