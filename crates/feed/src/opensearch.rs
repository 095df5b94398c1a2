// ABOUTME: OpenSearch 1.1 description document parsing, used to discover the
// ABOUTME: Atom search endpoint a catalog advertises.

use serde::{Deserialize, Serialize};

use crate::channel::{read_subtree, seek_root};
use crate::cursor::{NodeKind, XmlCursor};
use crate::error::FeedError;
use crate::fields;
use crate::ns;

/// Media type a usable search `Url` must declare.
const ATOM_MEDIA_TYPE: &str = "application/atom+xml";

/// Search capability advertised by an OpenSearch description document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDescription {
    pub short_name: Option<String>,
    pub description: Option<String>,
    /// Template of the first Atom-typed `Url` element, with the
    /// `{searchTerms}` placeholder left in place for the caller to fill.
    pub template: Option<String>,
}

/// Parses an OpenSearch description document.
///
/// Only `Url` elements whose `type` mentions `application/atom+xml` yield a
/// template; a description offering nothing but HTML search leaves `template`
/// unset. Input without a root element parses to an empty description.
pub fn parse_description(data: &[u8]) -> Result<SearchDescription, FeedError> {
    let mut cursor = XmlCursor::new(data);
    let mut description = SearchDescription::default();
    if !seek_root(&mut cursor)? {
        return Ok(description);
    }
    while cursor.advance()? {
        if cursor.kind() != NodeKind::Start {
            continue;
        }
        if !ns::is_opensearch(cursor.namespace()) {
            cursor.skip_subtree()?;
            continue;
        }
        let Some(node) = read_subtree(&mut cursor)? else {
            continue;
        };
        match node.name.as_str() {
            "ShortName" if description.short_name.is_none() => {
                description.short_name = node.text().map(str::to_string);
            }
            "Description" if description.description.is_none() => {
                description.description = node.text().map(str::to_string);
            }
            "Url" if description.template.is_none() => {
                let is_atom = node
                    .attr("type")
                    .is_some_and(|t| t.contains(ATOM_MEDIA_TYPE));
                if is_atom {
                    description.template = fields::non_empty(node.attr("template"));
                }
            }
            _ => {}
        }
    }
    Ok(description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn description(body: &str) -> SearchDescription {
        let xml = format!(
            r#"<OpenSearchDescription xmlns="http://a9.com/-/spec/opensearch/1.1/">{body}</OpenSearchDescription>"#
        );
        parse_description(xml.as_bytes()).unwrap()
    }

    #[test]
    fn test_atom_url_yields_template() {
        let parsed = description(
            r#"<ShortName>Catalog Search</ShortName>
               <Description>Search the catalog.</Description>
               <Url type="application/atom+xml" template="http://x/search?q={searchTerms}"/>"#,
        );
        assert_eq!(parsed.short_name.as_deref(), Some("Catalog Search"));
        assert_eq!(parsed.description.as_deref(), Some("Search the catalog."));
        assert_eq!(
            parsed.template.as_deref(),
            Some("http://x/search?q={searchTerms}")
        );
    }

    #[test]
    fn test_html_only_url_yields_no_template() {
        let parsed = description(
            r#"<Url type="text/html" template="http://x/search?q={searchTerms}"/>"#,
        );
        assert_eq!(parsed.template, None);
    }

    #[test]
    fn test_profiled_atom_type_still_matches() {
        let parsed = description(
            r#"<Url type="application/atom+xml;profile=opds-catalog"
                    template="http://x/opds?q={searchTerms}"/>"#,
        );
        assert_eq!(parsed.template.as_deref(), Some("http://x/opds?q={searchTerms}"));
    }

    #[test]
    fn test_first_atom_url_wins() {
        let parsed = description(
            r#"<Url type="text/html" template="http://x/html?q={searchTerms}"/>
               <Url type="application/atom+xml" template="http://x/a?q={searchTerms}"/>
               <Url type="application/atom+xml" template="http://x/b?q={searchTerms}"/>"#,
        );
        assert_eq!(parsed.template.as_deref(), Some("http://x/a?q={searchTerms}"));
    }

    #[test]
    fn test_unnamespaced_document_is_accepted() {
        let parsed = parse_description(
            br#"<OpenSearchDescription>
                  <ShortName>Plain</ShortName>
                  <Url type="application/atom+xml" template="http://x/s?q={searchTerms}"/>
                </OpenSearchDescription>"#,
        )
        .unwrap();
        assert_eq!(parsed.short_name.as_deref(), Some("Plain"));
        assert!(parsed.template.is_some());
    }

    #[test]
    fn test_foreign_namespace_elements_are_skipped() {
        let parsed = parse_description(
            br#"<OpenSearchDescription xmlns="http://a9.com/-/spec/opensearch/1.1/"
                                       xmlns:x="http://example.com/ext">
                  <x:Url type="application/atom+xml" template="http://x/evil"/>
                  <ShortName>Real</ShortName>
                </OpenSearchDescription>"#,
        )
        .unwrap();
        assert_eq!(parsed.template, None);
        assert_eq!(parsed.short_name.as_deref(), Some("Real"));
    }

    #[test]
    fn test_empty_input_parses_to_empty_description() {
        let parsed = parse_description(b"").unwrap();
        assert_eq!(parsed, SearchDescription::default());
    }

    #[test]
    fn test_url_without_template_attribute() {
        let parsed = description(r#"<Url type="application/atom+xml"/>"#);
        assert_eq!(parsed.template, None);
    }
}
