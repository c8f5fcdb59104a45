//! Extension modules: handlers for namespaced elements that neither the
//! RSS 2.0 nor the Atom 1.0 core vocabulary defines.

use std::sync::Arc;

use super::date::parse_date;
use super::models::{Feed, Item, Person};
use super::xml::Element;

pub const DUBLIN_CORE_NS: &str = "http://purl.org/dc/elements/1.1/";
pub const RSS_CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";
pub const RSS_SYNDICATION_NS: &str = "http://purl.org/rss/1.0/modules/syndication/";

/// What a module is being applied to
pub enum Target<'a> {
    Feed(&'a mut Feed),
    Item(&'a mut Item),
}

/// Handler for the elements of one XML namespace.
///
/// Both methods default to doing nothing, so a module only implements the
/// target kinds it understands.
pub trait ExtensionModule: Send + Sync {
    fn apply_to_feed(&self, _element: &Element, _feed: &mut Feed) {}

    fn apply_to_item(&self, _element: &Element, _item: &mut Item) {}

    fn apply(&self, element: &Element, target: Target<'_>) {
        match target {
            Target::Feed(feed) => self.apply_to_feed(element, feed),
            Target::Item(item) => self.apply_to_item(element, item),
        }
    }
}

/// Namespace URL to module mapping, consulted by the feed parsers
#[derive(Clone)]
pub struct ModuleRegistry {
    modules: Vec<(String, Arc<dyn ExtensionModule>)>,
}

/// Namespaces compare without their `http://` / `https://` scheme
fn normalize_namespace(url: &str) -> &str {
    url.strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .unwrap_or(url)
}

impl ModuleRegistry {
    /// A registry with no modules at all
    pub fn empty() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// A registry with Dublin Core, RSS content and RSS syndication registered
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(DUBLIN_CORE_NS, DublinCore);
        registry.register(RSS_CONTENT_NS, RssContent);
        registry.register(RSS_SYNDICATION_NS, RssSyndication);
        registry
    }

    /// Register a module, replacing any module already bound to the namespace
    pub fn register<M>(&mut self, namespace_url: &str, module: M)
    where
        M: ExtensionModule + 'static,
    {
        let key = normalize_namespace(namespace_url).to_string();
        let module: Arc<dyn ExtensionModule> = Arc::new(module);
        match self.modules.iter_mut().find(|(ns, _)| *ns == key) {
            Some(entry) => entry.1 = module,
            None => self.modules.push((key, module)),
        }
    }

    pub fn lookup(&self, namespace_url: &str) -> Option<&dyn ExtensionModule> {
        let key = normalize_namespace(namespace_url);
        self.modules
            .iter()
            .find(|(ns, _)| ns == key)
            .map(|(_, module)| module.as_ref())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

/// Dublin Core: http://web.resource.org/rss/1.0/modules/dc/
pub struct DublinCore;

impl ExtensionModule for DublinCore {
    fn apply_to_feed(&self, element: &Element, feed: &mut Feed) {
        let text = element.text();
        match element.name() {
            "title" => feed.title = text,
            "creator" => feed.authors.push(Person::named(text)),
            "contributor" => feed.contributors.push(Person::named(text)),
            "subject" => feed.add_category(&text),
            "description" => feed.description = text,
            "date" => {
                if let Some(date) = parse_date(&text) {
                    feed.last_updated = Some(date);
                }
            }
            "language" => feed.language = text,
            "rights" => feed.copyright = text,
            _ => {}
        }
    }

    fn apply_to_item(&self, element: &Element, item: &mut Item) {
        let text = element.text();
        match element.name() {
            "title" => item.title = text,
            "creator" => item.authors.push(Person::named(text)),
            "contributor" => item.contributors.push(Person::named(text)),
            "subject" => item.add_category(&text),
            "description" => item.summary = text,
            "date" => {
                if let Some(date) = parse_date(&text) {
                    item.published = Some(date);
                }
            }
            "rights" => item.copyright = text,
            _ => {}
        }
    }
}

/// RSS content module: `content:encoded` carries the full item body
pub struct RssContent;

impl ExtensionModule for RssContent {
    fn apply_to_item(&self, element: &Element, item: &mut Item) {
        if element.name() == "encoded" {
            item.content = element.text();
        }
    }
}

/// RSS syndication module: `sy:updateBase` sets the feed's update time
pub struct RssSyndication;

impl ExtensionModule for RssSyndication {
    fn apply_to_feed(&self, element: &Element, feed: &mut Feed) {
        if element.name() == "updateBase" {
            if let Some(date) = parse_date(&element.text()) {
                feed.last_updated = Some(date);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::xml::parse_document;

    #[test]
    fn test_lookup_ignores_scheme() {
        let registry = ModuleRegistry::with_builtin();
        assert!(registry.lookup("https://purl.org/dc/elements/1.1/").is_some());
        assert!(registry.lookup("http://purl.org/dc/elements/1.1/").is_some());
        assert!(registry.lookup("purl.org/dc/elements/1.1/").is_some());
        assert!(registry.lookup("http://example.com/unknown/").is_none());
    }

    #[test]
    fn test_register_replaces_existing() {
        struct Marker;
        impl ExtensionModule for Marker {
            fn apply_to_item(&self, _element: &Element, item: &mut Item) {
                item.title = "marked".to_string();
            }
        }

        let mut registry = ModuleRegistry::with_builtin();
        let before = registry.len();
        registry.register("https://purl.org/dc/elements/1.1/", Marker);
        assert_eq!(registry.len(), before);

        let element = parse_document(b"<dc:creator>someone</dc:creator>").unwrap();
        let mut item = Item::default();
        registry
            .lookup(DUBLIN_CORE_NS)
            .unwrap()
            .apply(&element, Target::Item(&mut item));
        assert_eq!(item.title, "marked");
        assert!(item.authors.is_empty());
    }

    #[test]
    fn test_dublin_core_targets() {
        let creator = parse_document(b"<dc:creator>Ada</dc:creator>").unwrap();
        let date = parse_document(b"<dc:date>2024-01-02T15:04:05Z</dc:date>").unwrap();

        let mut feed = Feed::default();
        DublinCore.apply(&creator, Target::Feed(&mut feed));
        DublinCore.apply(&date, Target::Feed(&mut feed));
        assert_eq!(feed.authors, vec![Person::named("Ada")]);
        assert!(feed.last_updated.is_some());

        let mut item = Item::default();
        DublinCore.apply(&creator, Target::Item(&mut item));
        DublinCore.apply(&date, Target::Item(&mut item));
        assert_eq!(item.authors, vec![Person::named("Ada")]);
        assert!(item.published.is_some());
    }

    #[test]
    fn test_content_module_ignores_feed_target() {
        let encoded = parse_document(b"<content:encoded>full</content:encoded>").unwrap();
        let mut feed = Feed::default();
        RssContent.apply(&encoded, Target::Feed(&mut feed));
        assert_eq!(feed, Feed::default());

        let mut item = Item::default();
        RssContent.apply(&encoded, Target::Item(&mut item));
        assert_eq!(item.content, "full");
    }
}
