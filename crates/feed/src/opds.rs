// ABOUTME: OPDS catalog parsing layered on the Atom scan: acquisition links,
// ABOUTME: prices, indirect acquisition chains, artwork, and facet groups.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::channel::{apply_channel_element, read_subtree, seek_root};
use crate::classify::Dialect;
use crate::content::Content;
use crate::cursor::{NodeKind, XmlCursor};
use crate::error::FeedError;
use crate::fields::{self, keep};
use crate::item::map_item;
use crate::models::{Channel, FeedType, Image, ImageType, Item, Link, LinkType, ParsedFeed};
use crate::{dates, ns};

const ACQUISITION_REL_PREFIX: &str = "http://opds-spec.org/acquisition";
const FACET_REL: &str = "http://opds-spec.org/facet";
const IMAGE_REL: &str = "http://opds-spec.org/image";
const THUMBNAIL_REL: &str = "http://opds-spec.org/image/thumbnail";
// OPDS 0.9 used short artwork rels; plenty of catalogs still serve them.
const LEGACY_COVER_REL: &str = "http://opds-spec.org/cover";
const LEGACY_THUMBNAIL_REL: &str = "http://opds-spec.org/thumbnail";

/// Nesting cap for `indirectAcquisition` chains.
const MAX_INDIRECTION: usize = 16;

/// How a publication is obtained through an acquisition link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquisitionType {
    #[default]
    Generic,
    OpenAccess,
    Borrow,
    Buy,
    Sample,
    Subscribe,
}

/// A price attached to an acquisition link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub value: f64,
    pub currency_code: String,
}

/// One acquisition link of a catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Acquisition {
    pub href: String,
    pub acquisition_type: AcquisitionType,
    pub media_type: Option<String>,
    pub price: Option<Price>,
    /// Media types of the indirect acquisition chain, outermost first.
    pub indirect_media_types: Vec<String>,
}

/// One facet link within a facet group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Facet {
    pub href: String,
    pub title: String,
    /// Raw `facetGroup` attribute; grouping treats absent as the empty name.
    pub facet_group: Option<String>,
    pub is_active: bool,
    pub count: Option<u64>,
}

/// Facets sharing one `facetGroup` value, in document order.
/// The unnamed group uses an empty name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetGroup {
    pub name: String,
    pub facets: Vec<Facet>,
}

/// A catalog entry: the plain Atom item plus its bibliographic fields and
/// OPDS link kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub item: Item,
    pub language: Option<String>,
    pub publisher: Option<String>,
    pub identifier: Option<String>,
    pub acquisitions: Vec<Acquisition>,
    pub images: Vec<Image>,
}

/// A parsed OPDS catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub channel: Channel,
    pub entries: Vec<CatalogEntry>,
    pub facet_groups: Vec<FacetGroup>,
}

impl Catalog {
    /// Collapses the catalog into a plain feed view, folding each entry's
    /// acquisitions back into its item links.
    pub fn into_feed(self) -> ParsedFeed {
        let items = self
            .entries
            .into_iter()
            .map(|entry| {
                let mut item = entry.item;
                for acquisition in entry.acquisitions {
                    item.links.push(Link {
                        uri: acquisition.href,
                        link_type: LinkType::Enclosure,
                        title: None,
                        media_type: acquisition.media_type,
                        length: None,
                    });
                }
                item
            })
            .collect();
        ParsedFeed {
            channel: self.channel,
            items,
        }
    }
}

/// Parses an OPDS catalog document.
///
/// Follows the same permissive contract as the feed scan: input without a
/// root element parses to an empty catalog, and broken subtrees are skipped.
pub fn parse_catalog(data: &[u8], base: Option<&Url>) -> Result<Catalog, FeedError> {
    let mut cursor = XmlCursor::new(data);
    let mut catalog = Catalog::default();
    catalog.channel.feed_type = FeedType::Atom;

    if !seek_root(&mut cursor)? {
        return Ok(catalog);
    }
    if let Some(lang) = fields::non_empty(cursor.attr("lang")) {
        catalog.channel.language = Some(lang);
    }

    let mut facet_links = Vec::new();
    let mut saw_entry = false;
    while cursor.advance()? {
        if cursor.kind() != NodeKind::Start {
            continue;
        }
        if Dialect::Opds.is_item_boundary(cursor.local_name(), cursor.namespace()) {
            saw_entry = true;
            if let Some(node) = read_subtree(&mut cursor)? {
                catalog.entries.push(map_entry(&node, base));
            }
            continue;
        }
        if saw_entry {
            cursor.skip_subtree()?;
            continue;
        }
        let Some(node) = read_subtree(&mut cursor)? else {
            continue;
        };
        if is_facet_link(&node) {
            if let Some(facet) = keep(build_facet(&node)) {
                facet_links.push(facet);
            }
            continue;
        }
        apply_channel_element(&mut catalog.channel, &node, Dialect::Opds);
    }

    catalog.facet_groups = group_facets(facet_links);
    catalog.channel.paging_links = fields::derive_paging(&catalog.channel.links);
    Ok(catalog)
}

/// True for rels the catalog mapper claims for itself; the generic item
/// mapper leaves those links alone.
pub(crate) fn is_catalog_rel(rel: &str) -> bool {
    catalog_rel(rel).is_some()
}

enum CatalogRel {
    Acquisition(AcquisitionType),
    Artwork(ImageType),
    Facet,
}

fn catalog_rel(rel: &str) -> Option<CatalogRel> {
    let rel = rel.trim();
    if let Some(rest) = rel.strip_prefix(ACQUISITION_REL_PREFIX) {
        let acquisition_type = match rest {
            "/open-access" => AcquisitionType::OpenAccess,
            "/borrow" => AcquisitionType::Borrow,
            "/buy" => AcquisitionType::Buy,
            "/sample" => AcquisitionType::Sample,
            "/subscribe" => AcquisitionType::Subscribe,
            _ => AcquisitionType::Generic,
        };
        return Some(CatalogRel::Acquisition(acquisition_type));
    }
    match rel {
        IMAGE_REL | LEGACY_COVER_REL => Some(CatalogRel::Artwork(ImageType::Logo)),
        THUMBNAIL_REL | LEGACY_THUMBNAIL_REL => Some(CatalogRel::Artwork(ImageType::Icon)),
        FACET_REL => Some(CatalogRel::Facet),
        _ => None,
    }
}

fn is_facet_link(node: &Content) -> bool {
    node.name == "link"
        && ns::is_atom(node.namespace.as_deref())
        && matches!(
            catalog_rel(node.attr("rel").unwrap_or("")),
            Some(CatalogRel::Facet)
        )
}

fn map_entry(node: &Content, base: Option<&Url>) -> CatalogEntry {
    let mut entry = CatalogEntry {
        item: map_item(node, Dialect::Opds, base),
        ..Default::default()
    };

    for child in &node.children {
        if ns::is_dublin_core(child.namespace.as_deref()) {
            apply_dc_entry_field(&mut entry, child);
            continue;
        }
        if child.name != "link" || !ns::is_atom(child.namespace.as_deref()) {
            continue;
        }
        let Some(rel) = child.attr("rel") else {
            continue;
        };
        match catalog_rel(rel) {
            Some(CatalogRel::Acquisition(acquisition_type)) => {
                if let Some(acquisition) = keep(build_acquisition(child, acquisition_type)) {
                    entry.acquisitions.push(acquisition);
                }
            }
            Some(CatalogRel::Artwork(image_type)) => {
                if let Some(link) = keep(fields::parse_link(child)) {
                    entry.images.push(fields::image_from_link(&link, image_type));
                }
            }
            // Facets are a feed-level concept; an entry-level one means nothing.
            Some(CatalogRel::Facet) | None => {}
        }
    }

    // A declared cover beats anything scraped out of the entry body.
    let cover = entry
        .images
        .iter()
        .find(|i| i.image_type == ImageType::Logo)
        .or_else(|| entry.images.first());
    if let Some(cover) = cover {
        entry.item.image_url = Some(cover.uri.clone());
    }
    entry
}

fn apply_dc_entry_field(entry: &mut CatalogEntry, node: &Content) {
    match node.name.as_str() {
        "language" => entry.language = node.text().map(str::to_string),
        "publisher" => entry.publisher = node.text().map(str::to_string),
        "identifier" => entry.identifier = node.text().map(str::to_string),
        "issued" if entry.item.published_at.is_none() => {
            entry.item.published_at = node.text().and_then(dates::parse_datetime);
        }
        _ => {}
    }
}

fn build_acquisition(
    node: &Content,
    acquisition_type: AcquisitionType,
) -> Result<Acquisition, FeedError> {
    let href =
        fields::non_empty(node.attr("href")).ok_or_else(|| FeedError::missing("link", "an href"))?;
    let mut acquisition = Acquisition {
        href,
        acquisition_type,
        media_type: fields::non_empty(node.attr("type")),
        price: None,
        indirect_media_types: Vec::new(),
    };
    for child in &node.children {
        if !is_opds_extension(child.namespace.as_deref()) {
            continue;
        }
        match child.name.as_str() {
            "price" => {
                if acquisition.price.is_none() {
                    acquisition.price = keep(parse_price(child));
                }
            }
            "indirectAcquisition" => {
                collect_indirect(child, &mut acquisition.indirect_media_types, 0)?;
            }
            _ => {}
        }
    }
    Ok(acquisition)
}

fn is_opds_extension(namespace: Option<&str>) -> bool {
    matches!(namespace, None | Some(ns::OPDS))
}

fn parse_price(node: &Content) -> Result<Price, FeedError> {
    let text = node
        .text()
        .ok_or_else(|| FeedError::missing("price", "a value"))?;
    let value = text
        .trim()
        .parse()
        .map_err(|_| FeedError::missing("price", "a numeric value"))?;
    let currency_code = node
        .attr("currencycode")
        .or_else(|| node.attr("currencyCode"))
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("USD")
        .to_string();
    Ok(Price {
        value,
        currency_code,
    })
}

/// Flattens an `indirectAcquisition` chain into its media types, outermost
/// first. Chains deeper than the cap poison the whole acquisition link.
fn collect_indirect(node: &Content, out: &mut Vec<String>, nesting: usize) -> Result<(), FeedError> {
    if nesting >= MAX_INDIRECTION {
        return Err(FeedError::too_deep("indirectAcquisition"));
    }
    if let Some(media_type) = fields::non_empty(node.attr("type")) {
        out.push(media_type);
    }
    for child in &node.children {
        if child.name == "indirectAcquisition" && is_opds_extension(child.namespace.as_deref()) {
            collect_indirect(child, out, nesting + 1)?;
        }
    }
    Ok(())
}

fn build_facet(node: &Content) -> Result<Facet, FeedError> {
    let href =
        fields::non_empty(node.attr("href")).ok_or_else(|| FeedError::missing("link", "an href"))?;
    let title = fields::non_empty(node.attr("title")).unwrap_or_default();
    let facet_group = fields::non_empty(node.attr("facetGroup"));
    let is_active = node
        .attr("activeFacet")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"));
    let count = node
        .attributes
        .iter()
        .find(|a| {
            a.name == "count" && matches!(a.namespace.as_deref(), None | Some(ns::THREADING))
        })
        .and_then(|a| a.value.trim().parse().ok());
    Ok(Facet {
        href,
        title,
        facet_group,
        is_active,
        count,
    })
}

/// Groups facets by their `facetGroup` value, treating a missing attribute as
/// the empty name. Groups appear in the order their first member did; members
/// keep document order.
fn group_facets(facets: Vec<Facet>) -> Vec<FacetGroup> {
    let mut groups: Vec<FacetGroup> = Vec::new();
    for facet in facets {
        let name = facet.facet_group.clone().unwrap_or_default();
        match groups.iter_mut().find(|g| g.name == name) {
            Some(group) => group.facets.push(facet),
            None => groups.push(FacetGroup {
                name,
                facets: vec![facet],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CATALOG_NS: &str = r#"xmlns="http://www.w3.org/2005/Atom"
        xmlns:opds="http://opds-spec.org/2010/catalog"
        xmlns:dc="http://purl.org/dc/terms/"
        xmlns:thr="http://purl.org/syndication/thread/1.0""#;

    fn catalog(body: &str) -> Catalog {
        let xml = format!("<feed {CATALOG_NS}>{body}</feed>");
        parse_catalog(xml.as_bytes(), None).unwrap()
    }

    #[test]
    fn test_acquisition_rel_subtypes() {
        let cases = [
            ("http://opds-spec.org/acquisition", AcquisitionType::Generic),
            (
                "http://opds-spec.org/acquisition/open-access",
                AcquisitionType::OpenAccess,
            ),
            ("http://opds-spec.org/acquisition/borrow", AcquisitionType::Borrow),
            ("http://opds-spec.org/acquisition/buy", AcquisitionType::Buy),
            ("http://opds-spec.org/acquisition/sample", AcquisitionType::Sample),
            (
                "http://opds-spec.org/acquisition/subscribe",
                AcquisitionType::Subscribe,
            ),
            // Unknown subtypes still count as acquisitions.
            ("http://opds-spec.org/acquisition/lease", AcquisitionType::Generic),
        ];
        for (rel, expected) in cases {
            match catalog_rel(rel) {
                Some(CatalogRel::Acquisition(acquisition_type)) => {
                    assert_eq!(acquisition_type, expected, "{rel}");
                }
                _ => panic!("{rel} should classify as an acquisition"),
            }
        }
    }

    #[test]
    fn test_artwork_and_facet_rels() {
        assert!(matches!(
            catalog_rel("http://opds-spec.org/image"),
            Some(CatalogRel::Artwork(ImageType::Logo))
        ));
        assert!(matches!(
            catalog_rel("http://opds-spec.org/cover"),
            Some(CatalogRel::Artwork(ImageType::Logo))
        ));
        assert!(matches!(
            catalog_rel("http://opds-spec.org/image/thumbnail"),
            Some(CatalogRel::Artwork(ImageType::Icon))
        ));
        assert!(matches!(
            catalog_rel("http://opds-spec.org/thumbnail"),
            Some(CatalogRel::Artwork(ImageType::Icon))
        ));
        assert!(matches!(
            catalog_rel("http://opds-spec.org/facet"),
            Some(CatalogRel::Facet)
        ));
        assert!(catalog_rel("alternate").is_none());
        assert!(catalog_rel("").is_none());
    }

    #[test]
    fn test_entry_with_priced_acquisition() {
        let parsed = catalog(
            r#"<entry>
                 <title>Paid Book</title>
                 <link rel="http://opds-spec.org/acquisition/buy"
                       href="http://example.com/buy/1"
                       type="application/epub+zip">
                   <opds:price currencycode="EUR">2.99</opds:price>
                 </link>
               </entry>"#,
        );
        let entry = &parsed.entries[0];
        assert_eq!(entry.item.title, "Paid Book");
        assert_eq!(entry.acquisitions.len(), 1);
        let acquisition = &entry.acquisitions[0];
        assert_eq!(acquisition.acquisition_type, AcquisitionType::Buy);
        assert_eq!(acquisition.href, "http://example.com/buy/1");
        assert_eq!(acquisition.media_type.as_deref(), Some("application/epub+zip"));
        assert_eq!(
            acquisition.price,
            Some(Price {
                value: 2.99,
                currency_code: "EUR".to_string(),
            })
        );
    }

    #[test]
    fn test_price_currency_defaults_to_usd() {
        let parsed = catalog(
            r#"<entry>
                 <link rel="http://opds-spec.org/acquisition/buy" href="http://example.com/b">
                   <opds:price>0.99</opds:price>
                 </link>
               </entry>"#,
        );
        let price = parsed.entries[0].acquisitions[0].price.clone().unwrap();
        assert_eq!(price.currency_code, "USD");
        assert_eq!(price.value, 0.99);
    }

    #[test]
    fn test_indirect_acquisition_flattens_outer_to_inner() {
        let parsed = catalog(
            r#"<entry>
                 <link rel="http://opds-spec.org/acquisition/borrow" href="http://example.com/borrow">
                   <opds:indirectAcquisition type="application/vnd.adobe.adept+xml">
                     <opds:indirectAcquisition type="application/epub+zip"/>
                   </opds:indirectAcquisition>
                 </link>
               </entry>"#,
        );
        let acquisition = &parsed.entries[0].acquisitions[0];
        assert_eq!(
            acquisition.indirect_media_types,
            vec![
                "application/vnd.adobe.adept+xml".to_string(),
                "application/epub+zip".to_string(),
            ]
        );
    }

    #[test]
    fn test_overdeep_indirect_chain_drops_the_acquisition_only() {
        let mut chain = String::new();
        for i in 0..20 {
            chain.push_str(&format!(r#"<opds:indirectAcquisition type="t/{i}">"#));
        }
        for _ in 0..20 {
            chain.push_str("</opds:indirectAcquisition>");
        }
        let parsed = catalog(&format!(
            r#"<entry>
                 <title>Deep</title>
                 <link rel="http://opds-spec.org/acquisition/borrow" href="http://example.com/deep">{chain}</link>
                 <link rel="http://opds-spec.org/acquisition" href="http://example.com/plain"/>
               </entry>"#
        ));
        let entry = &parsed.entries[0];
        assert_eq!(entry.item.title, "Deep");
        assert_eq!(entry.acquisitions.len(), 1);
        assert_eq!(entry.acquisitions[0].href, "http://example.com/plain");
    }

    #[test]
    fn test_entry_bibliographic_fields() {
        let parsed = catalog(
            r#"<entry>
                 <title>Book</title>
                 <dc:language>fr</dc:language>
                 <dc:publisher>Gallimard</dc:publisher>
                 <dc:identifier>urn:isbn:9782070413119</dc:identifier>
                 <dc:issued>2001-05-12</dc:issued>
               </entry>"#,
        );
        let entry = &parsed.entries[0];
        assert_eq!(entry.language.as_deref(), Some("fr"));
        assert_eq!(entry.publisher.as_deref(), Some("Gallimard"));
        assert_eq!(entry.identifier.as_deref(), Some("urn:isbn:9782070413119"));
        assert!(entry.item.published_at.is_some());
    }

    #[test]
    fn test_entry_artwork_prefers_full_cover() {
        let parsed = catalog(
            r#"<entry>
                 <link rel="http://opds-spec.org/image/thumbnail" href="http://example.com/thumb.png"/>
                 <link rel="http://opds-spec.org/image" href="http://example.com/cover.png"/>
               </entry>"#,
        );
        let entry = &parsed.entries[0];
        assert_eq!(entry.images.len(), 2);
        assert_eq!(entry.images[0].image_type, ImageType::Icon);
        assert_eq!(entry.item.image_url.as_deref(), Some("http://example.com/cover.png"));
    }

    #[test]
    fn test_catalog_links_do_not_leak_into_item_links() {
        let parsed = catalog(
            r#"<entry>
                 <link rel="http://opds-spec.org/acquisition" href="http://example.com/book.epub"/>
                 <link rel="alternate" href="http://example.com/book"/>
               </entry>"#,
        );
        let entry = &parsed.entries[0];
        assert_eq!(entry.item.links.len(), 1);
        assert_eq!(entry.item.links[0].uri, "http://example.com/book");
        assert_eq!(entry.acquisitions.len(), 1);
    }

    #[test]
    fn test_facets_group_in_first_appearance_order() {
        let parsed = catalog(
            r#"<title>Books</title>
               <link rel="http://opds-spec.org/facet" href="http://example.com/az"
                     title="A-Z" opds:facetGroup="Sort" opds:activeFacet="TRUE"/>
               <link rel="http://opds-spec.org/facet" href="http://example.com/fiction"
                     title="Fiction" opds:facetGroup="Genre" thr:count="120"/>
               <link rel="http://opds-spec.org/facet" href="http://example.com/newest"
                     title="Newest" opds:facetGroup="Sort"/>
               <link rel="http://opds-spec.org/facet" href="http://example.com/odd" title="Odd"/>"#,
        );
        let groups = &parsed.facet_groups;
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].name, "Sort");
        assert_eq!(groups[0].facets.len(), 2);
        assert!(groups[0].facets[0].is_active);
        assert_eq!(groups[0].facets[1].title, "Newest");
        assert!(!groups[0].facets[1].is_active);
        assert_eq!(groups[1].name, "Genre");
        assert_eq!(groups[1].facets[0].count, Some(120));
        assert_eq!(groups[1].facets[0].facet_group.as_deref(), Some("Genre"));
        assert_eq!(groups[2].name, "");
        assert_eq!(groups[2].facets[0].facet_group, None);
        assert_eq!(groups[2].facets[0].title, "Odd");
    }

    #[test]
    fn test_facet_links_stay_out_of_channel_links() {
        let parsed = catalog(
            r#"<link rel="self" href="http://example.com/catalog"/>
               <link rel="next" href="http://example.com/catalog?page=2"/>
               <link rel="http://opds-spec.org/facet" href="http://example.com/az" title="A-Z"/>"#,
        );
        assert_eq!(parsed.channel.links.len(), 2);
        let paging = parsed.channel.paging_links.unwrap();
        assert_eq!(paging.next.as_deref(), Some("http://example.com/catalog?page=2"));
        assert_eq!(parsed.facet_groups.len(), 1);
    }

    #[test]
    fn test_catalog_metadata_applies() {
        let parsed = catalog("<title>Root Catalog</title><id>urn:catalog</id>");
        assert_eq!(parsed.channel.title, "Root Catalog");
        assert_eq!(parsed.channel.id.as_deref(), Some("urn:catalog"));
        assert_eq!(parsed.channel.feed_type, FeedType::Atom);
    }

    #[test]
    fn test_empty_input_parses_to_empty_catalog() {
        let parsed = parse_catalog(b"", None).unwrap();
        assert!(parsed.entries.is_empty());
        assert!(parsed.facet_groups.is_empty());
    }

    #[test]
    fn test_into_feed_folds_acquisitions_into_links() {
        let parsed = catalog(
            r#"<title>Books</title>
               <entry>
                 <title>Book</title>
                 <link rel="http://opds-spec.org/acquisition" href="http://example.com/book.epub"
                       type="application/epub+zip"/>
               </entry>"#,
        );
        let feed = parsed.into_feed();
        assert_eq!(feed.channel.title, "Books");
        assert_eq!(feed.items.len(), 1);
        let link = &feed.items[0].links[0];
        assert_eq!(link.link_type, LinkType::Enclosure);
        assert_eq!(link.media_type.as_deref(), Some("application/epub+zip"));
    }
}
