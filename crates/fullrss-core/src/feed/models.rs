use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A syndication document, independent of the wire format it was read from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub id: String,
    /// Format version as declared by the document ("2.0", "1.0", ...)
    pub version: String,
    pub title: String,
    pub description: String,
    pub language: String,
    pub copyright: String,
    pub generator: String,
    pub image_url: String,
    pub base_url: String,
    pub last_updated: Option<DateTime<Utc>>,
    pub links: Vec<Link>,
    pub categories: Vec<String>,
    pub authors: Vec<Person>,
    pub contributors: Vec<Person>,
    /// Namespace prefix to namespace URL, as declared on the root element
    pub namespaces: BTreeMap<String, String>,
    pub extensions: Vec<ElementExtension>,
    pub items: Vec<Item>,
}

/// One entry of a feed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub title: String,
    /// Short form, from `<description>` or `<summary>`
    pub summary: String,
    /// Full form; stays empty until a feed module or the extractor fills it
    pub content: String,
    pub copyright: String,
    pub base_url: String,
    pub published: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub links: Vec<Link>,
    pub categories: Vec<String>,
    pub authors: Vec<Person>,
    pub contributors: Vec<Person>,
    pub extensions: Vec<ElementExtension>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub title: String,
    pub media_type: String,
    pub rel: String,
}

/// An author or contributor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub url: String,
    pub email: String,
}

/// A namespaced element preserved verbatim so nothing is silently dropped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementExtension {
    /// Local name, e.g. `creator` for `<dc:creator>`
    pub name: String,
    pub prefix: String,
    /// Namespace URL the prefix was bound to
    pub namespace: String,
    pub value: String,
}

impl Link {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

impl Person {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Append a category unless an identical one is already present
fn push_category(categories: &mut Vec<String>, category: &str) {
    let category = category.trim();
    if category.is_empty() || categories.iter().any(|c| c == category) {
        return;
    }
    categories.push(category.to_string());
}

impl Feed {
    pub fn add_category(&mut self, category: &str) {
        push_category(&mut self.categories, category);
    }

    /// The site link, if the feed declares one
    pub fn link(&self) -> Option<&str> {
        self.links.first().map(|l| l.url.as_str())
    }
}

impl Item {
    pub fn add_category(&mut self, category: &str) {
        push_category(&mut self.categories, category);
    }

    /// The page an extractor should fetch for this item
    pub fn link(&self) -> Option<&str> {
        self.links.first().map(|l| l.url.as_str())
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_are_set_like() {
        let mut item = Item::default();
        item.add_category("rust");
        item.add_category(" rust ");
        item.add_category("");
        item.add_category("async");
        assert_eq!(item.categories, vec!["rust", "async"]);
    }

    #[test]
    fn test_first_link_is_canonical() {
        let mut item = Item::default();
        assert_eq!(item.link(), None);

        item.links.push(Link::new("https://example.com/a"));
        item.links.push(Link::new("https://example.com/b"));
        assert_eq!(item.link(), Some("https://example.com/a"));
    }
}
