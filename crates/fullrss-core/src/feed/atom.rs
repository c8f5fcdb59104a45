//! Atom 1.0: https://validator.w3.org/feed/docs/rfc4287.html

use super::date::parse_date;
use super::models::{Feed, Item, Link, Person};
use super::modules::{ModuleRegistry, Target};
use super::parser::{collect_namespaces, Extensions};
use super::xml::Element;
use crate::Result;

fn unescape(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

pub(super) fn parse(root: &Element, registry: &ModuleRegistry) -> Result<Feed> {
    let namespaces = collect_namespaces(root);
    let extensions = Extensions::new(&namespaces, registry);
    let mut feed = Feed {
        version: root.attr("version").unwrap_or("1.0").to_string(),
        ..Default::default()
    };

    for element in root.elements() {
        if extensions.handle(element, Target::Feed(&mut feed)) {
            continue;
        }
        match element.name() {
            "author" => feed.authors.push(parse_person(element)),
            "contributor" => feed.contributors.push(parse_person(element)),
            "category" => {
                if let Some(term) = element.attr("term") {
                    feed.add_category(term);
                }
            }
            "generator" => feed.generator = element.text(),
            "id" => feed.id = element.text(),
            "link" => feed.links.push(parse_link(element)),
            "logo" => feed.image_url = element.text().trim().to_string(),
            "rights" => feed.copyright = element.text(),
            "subtitle" => feed.description = element.text(),
            "title" => feed.title = element.text(),
            "updated" => {
                if let Some(date) = parse_date(&element.text()) {
                    feed.last_updated = Some(date);
                }
            }
            "entry" => feed.items.push(parse_entry(element, &extensions)),
            _ => {}
        }
    }

    feed.namespaces = namespaces;
    Ok(feed)
}

fn parse_entry(element: &Element, extensions: &Extensions<'_>) -> Item {
    let mut item = Item::default();
    for child in element.elements() {
        if extensions.handle(child, Target::Item(&mut item)) {
            continue;
        }
        match child.name() {
            "author" => item.authors.push(parse_person(child)),
            "contributor" => item.contributors.push(parse_person(child)),
            "category" => {
                if let Some(term) = child.attr("term") {
                    item.add_category(term);
                }
            }
            "id" => item.id = child.text(),
            "title" => item.title = child.text(),
            "link" => item.links.push(parse_link(child)),
            "published" => item.published = parse_date(&child.text()),
            "updated" => item.last_updated = parse_date(&child.text()),
            "rights" => item.copyright = child.text(),
            "summary" => item.summary = unescape(&child.text()),
            "content" => item.content = unescape(&child.text()),
            _ => {}
        }
    }
    item
}

fn parse_link(element: &Element) -> Link {
    let attr = |name| element.attr(name).unwrap_or_default().to_string();
    Link {
        url: unescape(element.attr("href").unwrap_or_default()),
        title: attr("title"),
        media_type: attr("type"),
        rel: attr("rel"),
    }
}

fn parse_person(element: &Element) -> Person {
    let field = |name| element.child(name).map(Element::text).unwrap_or_default();
    Person {
        name: field("name"),
        url: field("uri"),
        email: field("email"),
    }
}
