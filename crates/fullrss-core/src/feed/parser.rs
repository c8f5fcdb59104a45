use std::collections::BTreeMap;

use super::models::{ElementExtension, Feed};
use super::modules::{ModuleRegistry, Target};
use super::xml::{parse_document, Element};
use super::{atom, rss};
use crate::{Error, Result};

/// Media types a source feed may be served with
const FEED_MEDIA_TYPES: &[&str] = &[
    "text/xml",
    "application/xml",
    "application/rss+xml",
    "application/atom+xml",
];

/// Parses RSS 2.0 and Atom 1.0 documents into a [`Feed`]
#[derive(Clone, Default)]
pub struct FeedParser {
    registry: ModuleRegistry,
}

impl FeedParser {
    /// Parser with the built-in extension modules
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: ModuleRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ModuleRegistry {
        &mut self.registry
    }

    /// Parse a document, dispatching on its root element
    pub fn parse(&self, bytes: &[u8]) -> Result<Feed> {
        let root = parse_document(bytes)?;
        match root.name() {
            "rss" => rss::parse(&root, &self.registry),
            "feed" => atom::parse(&root, &self.registry),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }

    /// Parse a document served with the given `Content-Type`, rejecting
    /// non-XML media types before any parsing is attempted
    pub fn parse_with_media_type(&self, content_type: &str, bytes: &[u8]) -> Result<Feed> {
        if !is_feed_media_type(content_type) {
            return Err(Error::UnsupportedMediaType(content_type.to_string()));
        }
        self.parse(bytes)
    }
}

/// Parse a feed with the built-in extension modules
pub fn parse_feed(bytes: &[u8]) -> Result<Feed> {
    FeedParser::new().parse(bytes)
}

pub fn parse_with_media_type(content_type: &str, bytes: &[u8]) -> Result<Feed> {
    FeedParser::new().parse_with_media_type(content_type, bytes)
}

/// Whether a `Content-Type` value names one of the accepted feed media types.
/// Parameters such as `charset` are ignored.
pub fn is_feed_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    FEED_MEDIA_TYPES.contains(&essence.as_str())
}

/// `xmlns:prefix` declarations of a root element
pub(super) fn collect_namespaces(root: &Element) -> BTreeMap<String, String> {
    root.namespace_declarations()
        .map(|(prefix, url)| (prefix.to_string(), url.to_string()))
        .collect()
}

/// Namespace state shared by the format parsers while walking one document
pub(super) struct Extensions<'a> {
    namespaces: &'a BTreeMap<String, String>,
    registry: &'a ModuleRegistry,
}

impl<'a> Extensions<'a> {
    pub(super) fn new(namespaces: &'a BTreeMap<String, String>, registry: &'a ModuleRegistry) -> Self {
        Self {
            namespaces,
            registry,
        }
    }

    /// Record `element` on the target if its prefix is a declared namespace,
    /// then hand it to the module registered for that namespace.
    ///
    /// Returns false for elements the format parser should handle itself.
    pub(super) fn handle(&self, element: &Element, target: Target<'_>) -> bool {
        let Some((prefix, namespace)) = element
            .prefix()
            .and_then(|p| self.namespaces.get_key_value(p))
        else {
            return false;
        };

        let extension = ElementExtension {
            name: element.name().to_string(),
            prefix: prefix.clone(),
            namespace: namespace.clone(),
            value: element.text(),
        };
        let module = self.registry.lookup(namespace);

        match target {
            Target::Feed(feed) => {
                feed.extensions.push(extension);
                if let Some(module) = module {
                    module.apply_to_feed(element, feed);
                }
            }
            Target::Item(item) => {
                item.extensions.push(extension);
                if let Some(module) = module {
                    module.apply_to_item(element, item);
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_gate() {
        assert!(is_feed_media_type("application/rss+xml"));
        assert!(is_feed_media_type("Application/Atom+XML; charset=utf-8"));
        assert!(is_feed_media_type("text/xml;charset=ISO-8859-1"));
        assert!(!is_feed_media_type("text/html"));
        assert!(!is_feed_media_type(""));

        let result = parse_with_media_type("text/html", b"<rss version=\"2.0\"></rss>");
        assert!(matches!(result, Err(Error::UnsupportedMediaType(_))));
    }

    #[test]
    fn test_unknown_root_is_unsupported() {
        let result = parse_feed(b"<html><body/></html>");
        match result {
            Err(Error::UnsupportedFormat(root)) => assert_eq!(root, "html"),
            other => panic!("expected UnsupportedFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_broken_xml_is_malformed() {
        let result = parse_feed(b"<rss><channel><item></channel></rss>");
        assert!(matches!(result, Err(Error::MalformedDocument(_))));
    }

    #[test]
    fn test_https_namespace_reaches_dublin_core() {
        let doc = br#"<rss version="2.0" xmlns:dc="https://purl.org/dc/elements/1.1/">
<channel>
  <title>t</title>
  <item><title>one</title><dc:creator>Grace</dc:creator></item>
</channel>
</rss>"#;
        let feed = parse_feed(doc).unwrap();
        let item = &feed.items[0];
        assert_eq!(item.authors.len(), 1);
        assert_eq!(item.authors[0].name, "Grace");
        assert_eq!(item.extensions.len(), 1);
        assert_eq!(item.extensions[0].namespace, "https://purl.org/dc/elements/1.1/");
    }

    #[test]
    fn test_unregistered_namespace_is_still_recorded() {
        let doc = br#"<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
<channel>
  <media:rating>nonadult</media:rating>
  <item><media:title>m</media:title><title>kept</title></item>
</channel>
</rss>"#;
        let parser = FeedParser::with_registry(ModuleRegistry::empty());
        let feed = parser.parse(doc).unwrap();
        assert_eq!(feed.extensions.len(), 1);
        assert_eq!(feed.extensions[0].name, "rating");
        assert_eq!(feed.extensions[0].prefix, "media");
        assert_eq!(feed.extensions[0].value, "nonadult");
        assert_eq!(feed.items[0].title, "kept");
        assert_eq!(feed.items[0].extensions[0].name, "title");
    }
}
