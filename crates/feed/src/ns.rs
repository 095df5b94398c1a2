// ABOUTME: XML namespace URIs recognized by the feed and catalog parsers.
// ABOUTME: Elements in any other namespace are treated as opaque content and skipped.

/// Atom 1.0 (RFC 4287). Also the base vocabulary for OPDS catalogs.
pub const ATOM: &str = "http://www.w3.org/2005/Atom";

/// iTunes podcast extensions embedded in RSS.
pub const ITUNES: &str = "http://www.itunes.com/dtds/podcast-1.0.dtd";

/// RSS 1.0 content module (`content:encoded`).
pub const RSS_CONTENT: &str = "http://purl.org/rss/1.0/modules/content/";

/// Dublin Core element set.
pub const DC_ELEMENTS: &str = "http://purl.org/dc/elements/1.1/";

/// Dublin Core terms.
pub const DC_TERMS: &str = "http://purl.org/dc/terms/";

/// OPDS catalog attributes (facets, prices, indirect acquisition).
pub const OPDS: &str = "http://opds-spec.org/2010/catalog";

/// OpenSearch 1.1 description documents.
pub const OPENSEARCH: &str = "http://a9.com/-/spec/opensearch/1.1/";

/// Atom threading extension (RFC 4685), used by OPDS for facet counts.
pub const THREADING: &str = "http://purl.org/syndication/thread/1.0";

pub fn is_atom(ns: Option<&str>) -> bool {
    ns == Some(ATOM)
}

pub fn is_itunes(ns: Option<&str>) -> bool {
    ns == Some(ITUNES)
}

/// True for either Dublin Core vocabulary; feeds mix them freely.
pub fn is_dublin_core(ns: Option<&str>) -> bool {
    matches!(ns, Some(DC_ELEMENTS) | Some(DC_TERMS))
}

pub fn is_opensearch(ns: Option<&str>) -> bool {
    // Unnamespaced description documents exist in the wild; accept them too.
    ns.is_none() || ns == Some(OPENSEARCH)
}
