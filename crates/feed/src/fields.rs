// ABOUTME: Mappers from materialized elements to Link, Person, Category, and Image records.
// ABOUTME: Also derives RFC 5005 paging slots from a channel's collected links.

use crate::content::Content;
use crate::error::FeedError;
use crate::models::{Category, Image, ImageType, Link, LinkType, PagingLinks, Person, PersonType};

/// Maps a link-bearing element to a `Link`.
///
/// Handles `<link>` in both its Atom (attribute) and RSS (text) forms, and
/// the RSS link-like elements `<enclosure>`, `<comments>`, and `<source>`.
pub fn parse_link(node: &Content) -> Result<Link, FeedError> {
    match node.name.as_str() {
        "link" => link_element(node),
        "enclosure" => enclosure_link(node),
        "comments" => comments_link(node),
        "source" => source_link(node),
        other => Err(FeedError::missing(other, "a recognized link form")),
    }
}

fn link_element(node: &Content) -> Result<Link, FeedError> {
    // href, then a url attribute, then element text (the RSS form).
    let uri = non_empty(node.attr("href"))
        .or_else(|| non_empty(node.attr("url")))
        .or_else(|| node.text().map(str::to_string))
        .ok_or_else(|| FeedError::missing("link", "an href"))?;
    let link_type = node.attr("rel").map(link_type_for_rel).unwrap_or_default();
    Ok(Link {
        uri,
        link_type,
        title: non_empty(node.attr("title")),
        media_type: non_empty(node.attr("type")),
        length: node.attr("length").and_then(|v| v.trim().parse().ok()),
    })
}

fn enclosure_link(node: &Content) -> Result<Link, FeedError> {
    let uri =
        non_empty(node.attr("url")).ok_or_else(|| FeedError::missing("enclosure", "a url"))?;
    Ok(Link {
        uri,
        link_type: LinkType::Enclosure,
        title: None,
        media_type: non_empty(node.attr("type")),
        length: node.attr("length").and_then(|v| v.trim().parse().ok()),
    })
}

fn comments_link(node: &Content) -> Result<Link, FeedError> {
    let uri = node
        .text()
        .ok_or_else(|| FeedError::missing("comments", "a url"))?;
    Ok(Link {
        uri: uri.to_string(),
        link_type: LinkType::Comments,
        ..Default::default()
    })
}

fn source_link(node: &Content) -> Result<Link, FeedError> {
    let uri =
        non_empty(node.attr("url")).ok_or_else(|| FeedError::missing("source", "a url"))?;
    Ok(Link {
        uri,
        link_type: LinkType::Source,
        title: node.text().map(str::to_string),
        ..Default::default()
    })
}

/// Maps an Atom/RFC 5005 `rel` value to a `LinkType`. Unknown rels become `Other`.
pub fn link_type_for_rel(rel: &str) -> LinkType {
    match rel.trim().to_ascii_lowercase().as_str() {
        "" | "alternate" => LinkType::Alternate,
        "self" => LinkType::SelfLink,
        "enclosure" => LinkType::Enclosure,
        "related" => LinkType::Related,
        "via" | "source" => LinkType::Source,
        "comments" | "replies" => LinkType::Comments,
        "permalink" => LinkType::Permalink,
        "first" => LinkType::First,
        "previous" | "prev" => LinkType::Previous,
        "next" => LinkType::Next,
        "last" => LinkType::Last,
        "current" => LinkType::CurrentArchive,
        "prev-archive" => LinkType::PreviousArchive,
        "next-archive" => LinkType::NextArchive,
        _ => LinkType::Other,
    }
}

/// Maps a person-bearing element to a `Person`. A person without any usable
/// name is a mapping failure.
///
/// Atom persons carry `<name>`/`<email>`/`<uri>` children; RSS and Dublin Core
/// persons are a single text value in one of the conventional shapes.
pub fn parse_person(node: &Content, person_type: PersonType) -> Result<Person, FeedError> {
    if node.child("name").is_some() || node.child("email").is_some() || node.child("uri").is_some()
    {
        let email = non_empty(node.child_text("email"));
        let name = non_empty(node.child_text("name"))
            .or_else(|| email.clone())
            .ok_or_else(|| FeedError::missing(&node.name, "a name"))?;
        return Ok(Person {
            name,
            person_type,
            email,
            uri: non_empty(node.child_text("uri")),
        });
    }

    let text = node
        .text()
        .ok_or_else(|| FeedError::missing(&node.name, "a name"))?;
    let (name, email) = split_person_text(text);
    let name = name
        .or_else(|| email.clone())
        .ok_or_else(|| FeedError::missing(&node.name, "a name"))?;
    Ok(Person {
        name,
        person_type,
        email,
        uri: None,
    })
}

/// Role implied by a person element's name.
pub fn person_type_for(name: &str) -> PersonType {
    match name {
        "contributor" => PersonType::Contributor,
        "managingEditor" => PersonType::Editor,
        "webMaster" => PersonType::Webmaster,
        _ => PersonType::Author,
    }
}

/// Splits the RSS person conventions `user@host (Name)` and `Name <user@host>`.
/// A bare value becomes an email when it looks like one, otherwise a name.
fn split_person_text(text: &str) -> (Option<String>, Option<String>) {
    let text = text.trim();

    if let Some(start) = text.find('(') {
        if text.ends_with(')') {
            let head = text[..start].trim();
            let name = text[start + 1..text.len() - 1].trim();
            if head.contains('@') {
                return (
                    (!name.is_empty()).then(|| name.to_string()),
                    Some(head.to_string()),
                );
            }
        }
    }

    if let Some(start) = text.find('<') {
        if text.ends_with('>') {
            let name = text[..start].trim();
            let email = text[start + 1..text.len() - 1].trim();
            if email.contains('@') {
                return (
                    (!name.is_empty()).then(|| name.to_string()),
                    Some(email.to_string()),
                );
            }
        }
    }

    if text.contains('@') && !text.contains(char::is_whitespace) {
        return (None, Some(text.to_string()));
    }
    (Some(text.to_string()), None)
}

/// Maps a category element to a `Category`.
///
/// Covers Atom (`term`/`label`/`scheme` attributes), iTunes (`text` attribute),
/// and RSS (text content with an optional `domain`).
pub fn parse_category(node: &Content) -> Result<Category, FeedError> {
    if let Some(term) = non_empty(node.attr("term")) {
        return Ok(Category {
            term,
            label: non_empty(node.attr("label")),
            scheme: non_empty(node.attr("scheme")),
        });
    }
    if let Some(term) = non_empty(node.attr("text")) {
        return Ok(Category {
            term,
            label: None,
            scheme: None,
        });
    }
    let term = node
        .text()
        .ok_or_else(|| FeedError::missing(&node.name, "a term"))?;
    Ok(Category {
        term: term.to_string(),
        label: None,
        scheme: non_empty(node.attr("domain")),
    })
}

/// Maps an image element to an `Image`.
///
/// Covers the RSS `<image>` block (child elements) and `itunes:image` (href
/// attribute). Atom `<icon>`/`<logo>` are plain text and handled by the caller.
pub fn parse_image(node: &Content) -> Result<Image, FeedError> {
    if let Some(uri) = non_empty(node.attr("href")).or_else(|| non_empty(node.attr("url"))) {
        return Ok(Image {
            uri,
            image_type: ImageType::Logo,
            ..Default::default()
        });
    }
    let uri = node
        .child_text("url")
        .ok_or_else(|| FeedError::missing(&node.name, "a url"))?;
    Ok(Image {
        uri: uri.to_string(),
        image_type: ImageType::Logo,
        title: node.child_text("title").map(str::to_string),
        description: node.child_text("description").map(str::to_string),
        link: node.child_text("link").map(str::to_string),
        width: node.child_text("width").and_then(|w| w.parse().ok()),
        height: node.child_text("height").and_then(|h| h.parse().ok()),
    })
}

/// Builds an `Image` of the given kind from an already-parsed link.
pub fn image_from_link(link: &Link, image_type: ImageType) -> Image {
    Image {
        uri: link.uri.clone(),
        image_type,
        title: link.title.clone(),
        ..Default::default()
    }
}

/// Collects RFC 5005 navigation slots from a channel's links.
/// Returns `None` when no paging relation is present at all.
pub fn derive_paging(links: &[Link]) -> Option<PagingLinks> {
    let mut paging = PagingLinks::default();
    let mut found = false;
    for link in links {
        let slot = match link.link_type {
            LinkType::First => &mut paging.first,
            LinkType::Previous | LinkType::PreviousArchive => &mut paging.previous,
            LinkType::Next | LinkType::NextArchive => &mut paging.next,
            LinkType::Last => &mut paging.last,
            LinkType::CurrentArchive => &mut paging.current,
            _ => continue,
        };
        *slot = Some(link.uri.clone());
        found = true;
    }
    found.then_some(paging)
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Logs and drops a recoverable mapping failure.
pub(crate) fn keep<T>(result: Result<T, FeedError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, "dropping malformed field");
            None
        }
    }
}
