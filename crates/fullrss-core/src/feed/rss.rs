//! RSS 2.0: https://validator.w3.org/feed/docs/rss2.html

use super::date::parse_date;
use super::models::{Feed, Item, Link, Person};
use super::modules::{ModuleRegistry, Target};
use super::parser::{collect_namespaces, Extensions};
use super::xml::Element;
use crate::{Error, Result};

pub(super) fn parse(root: &Element, registry: &ModuleRegistry) -> Result<Feed> {
    let channel = root.child("channel").ok_or_else(|| {
        Error::MalformedDocument("RSS document without <channel> element".to_string())
    })?;

    let namespaces = collect_namespaces(root);
    let extensions = Extensions::new(&namespaces, registry);
    let mut feed = Feed {
        version: root.attr("version").unwrap_or_default().to_string(),
        ..Default::default()
    };

    for element in channel.elements() {
        if extensions.handle(element, Target::Feed(&mut feed)) {
            continue;
        }
        match element.name() {
            "title" => feed.title = element.text(),
            "description" => feed.description = element.text(),
            "link" => feed.links.push(Link::new(element.text().trim())),
            "language" => feed.language = element.text(),
            "copyright" => feed.copyright = element.text(),
            "lastBuildDate" => {
                if let Some(date) = parse_date(&element.text()) {
                    feed.last_updated = Some(date);
                }
            }
            "category" => feed.add_category(&element.text()),
            "generator" => feed.generator = element.text(),
            "docs" => feed.base_url = element.text(),
            "image" => {
                if let Some(url) = element.child("url") {
                    feed.image_url = url.text().trim().to_string();
                }
            }
            "item" => feed.items.push(parse_item(element, &extensions)),
            _ => {}
        }
    }

    feed.namespaces = namespaces;
    Ok(feed)
}

fn parse_item(element: &Element, extensions: &Extensions<'_>) -> Item {
    let mut item = Item::default();
    for child in element.elements() {
        if extensions.handle(child, Target::Item(&mut item)) {
            continue;
        }
        match child.name() {
            "title" => item.title = child.text(),
            "link" => item.links.push(Link::new(child.text().trim())),
            "description" => {
                item.summary = html_escape::decode_html_entities(&child.text()).into_owned()
            }
            "author" => item.authors.push(Person::named(child.text())),
            "category" => item.add_category(&child.text()),
            "guid" => item.id = child.text(),
            "pubDate" => item.published = parse_date(&child.text()),
            "source" => {
                if let Some(url) = child.attr("url") {
                    item.base_url = url.to_string();
                }
            }
            _ => {}
        }
    }
    item
}
