// ABOUTME: Maps one materialized <item> or <entry> subtree to a normalized Item.
// ABOUTME: Dispatches children by namespace and role, then fills a fallback image.

use url::Url;

use crate::classify::{Dialect, Role};
use crate::content::Content;
use crate::fields::keep;
use crate::models::{Item, Link, LinkType};
use crate::{dates, durations, fields, images, ns, opds};

/// Maps an item/entry subtree to an `Item`.
///
/// Malformed children are dropped with a warning; the item itself always
/// materializes. OPDS catalog links (acquisitions, covers, facets) are left
/// for the opds module to pick up from the same subtree.
pub fn map_item(node: &Content, dialect: Dialect, base: Option<&Url>) -> Item {
    let mut item = Item::default();
    for child in &node.children {
        match dialect.classify(&child.name, child.namespace.as_deref()) {
            Role::Link => {
                if dialect == Dialect::Opds
                    && opds::is_catalog_rel(child.attr("rel").unwrap_or(""))
                {
                    continue;
                }
                if let Some(link) = keep(fields::parse_link(child)) {
                    item.links.push(link);
                }
            }
            Role::Person => {
                let person_type = fields::person_type_for(&child.name);
                if let Some(person) = keep(fields::parse_person(child, person_type)) {
                    item.contributors.push(person);
                }
            }
            Role::Category => {
                if let Some(category) = keep(fields::parse_category(child)) {
                    item.categories.push(category);
                }
            }
            Role::Image => apply_image(&mut item, child),
            Role::Content => match dialect {
                Dialect::Rss => apply_rss_field(&mut item, child),
                Dialect::Atom | Dialect::Opds => apply_atom_field(&mut item, child),
            },
            Role::Item => {}
        }
    }
    if item.image_url.is_none() {
        item.image_url = images::select_item_image(&item, base);
    }
    item
}

fn apply_image(item: &mut Item, node: &Content) {
    let uri = if node.attr("href").is_some() || node.child("url").is_some() {
        keep(fields::parse_image(node)).map(|image| image.uri)
    } else {
        node.text().map(str::to_string)
    };
    if let Some(uri) = uri {
        if item.image_url.is_none() && images::is_valid_image_url(&uri) {
            item.image_url = Some(uri);
        }
    }
}

fn apply_rss_field(item: &mut Item, node: &Content) {
    if ns::is_itunes(node.namespace.as_deref()) {
        match node.name.as_str() {
            "duration" => {
                if let Some(seconds) = node.text().and_then(durations::parse_seconds) {
                    item.duration = Some(seconds);
                }
            }
            "summary" => {
                if item.description.is_none() {
                    item.description = node.text().map(str::to_string);
                }
            }
            _ => {}
        }
        return;
    }
    if node.namespace.as_deref() == Some(ns::RSS_CONTENT) && node.name == "encoded" {
        item.content = node.text().map(str::to_string);
        return;
    }
    if ns::is_dublin_core(node.namespace.as_deref()) {
        if node.name == "date" && item.published_at.is_none() {
            item.published_at = node.text().and_then(dates::parse_datetime);
        }
        return;
    }
    if node.namespace.is_some() {
        tracing::debug!(element = %node.name, "ignoring foreign-namespace element");
        return;
    }
    match node.name.as_str() {
        "title" => item.title = node.text().unwrap_or_default().to_string(),
        "description" => item.description = node.text().map(str::to_string),
        "guid" => apply_guid(item, node),
        "pubDate" => item.published_at = node.text().and_then(dates::parse_datetime),
        _ => {}
    }
}

fn apply_atom_field(item: &mut Item, node: &Content) {
    if ns::is_dublin_core(node.namespace.as_deref()) {
        if node.name == "date" && item.published_at.is_none() {
            item.published_at = node.text().and_then(dates::parse_datetime);
        }
        return;
    }
    if !ns::is_atom(node.namespace.as_deref()) {
        tracing::debug!(element = %node.name, "ignoring foreign-namespace element");
        return;
    }
    match node.name.as_str() {
        "id" => item.id = node.text().map(str::to_string),
        "title" => item.title = node.text().unwrap_or_default().to_string(),
        "summary" => item.description = node.text().map(str::to_string),
        "content" => item.content = node.text().map(str::to_string),
        "published" => item.published_at = node.text().and_then(dates::parse_datetime),
        "updated" => item.updated_at = node.text().and_then(dates::parse_datetime),
        _ => {}
    }
}

fn apply_guid(item: &mut Item, node: &Content) {
    let Some(guid) = node.text() else { return };
    item.id = Some(guid.to_string());
    // isPermaLink defaults to true in RSS 2.0.
    let permalink = node
        .attr("isPermaLink")
        .map(|v| !v.eq_ignore_ascii_case("false"))
        .unwrap_or(true);
    if permalink && guid.starts_with("http") {
        item.links.push(Link {
            uri: guid.to_string(),
            link_type: LinkType::Permalink,
            ..Default::default()
        });
    }
}
