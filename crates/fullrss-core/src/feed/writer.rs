//! RSS 2.0 output for an enriched [`Feed`].

use std::fmt::Write;

use chrono::{DateTime, Utc};
use html_escape::encode_text;

use super::models::Feed;

const GENERATOR: &str = concat!("fullrss/", env!("CARGO_PKG_VERSION"));

fn rfc1123(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Wrap text in a CDATA section, splitting any `]]>` it contains
fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

/// Render the feed as an RSS 2.0 document with full item content
pub fn write_rss(feed: &Feed) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push_str(
        r#"<rss xmlns:content="http://purl.org/rss/1.0/modules/content/" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:atom="http://www.w3.org/2005/Atom" xmlns:media="http://search.yahoo.com/mrss/" version="2.0">"#,
    );
    out.push_str("<channel>");

    // Writing into a String cannot fail
    let _ = write!(out, "<title>{}</title>", cdata(&feed.title));
    if let Some(link) = feed.link() {
        let _ = write!(out, "<link>{}</link>", encode_text(link));
    }
    if !feed.language.is_empty() {
        let _ = write!(out, "<language>{}</language>", encode_text(&feed.language));
    }
    if !feed.description.is_empty() {
        let _ = write!(out, "<description>{}</description>", encode_text(&feed.description));
    }
    if let Some(updated) = &feed.last_updated {
        let _ = write!(out, "<lastBuildDate>{}</lastBuildDate>", rfc1123(updated));
    }
    let _ = write!(out, "<generator>{}</generator>", GENERATOR);
    if !feed.image_url.is_empty() {
        let _ = write!(out, "<image><url>{}</url></image>", encode_text(&feed.image_url));
    }

    for item in &feed.items {
        out.push_str("<item>");
        let _ = write!(out, "<title>{}</title>", cdata(&item.title));
        if let Some(link) = item.link() {
            let _ = write!(out, "<link>{}</link>", encode_text(link));
        }
        if !item.summary.is_empty() {
            let _ = write!(out, "<description>{}</description>", cdata(&item.summary));
        }
        for author in &item.authors {
            let _ = write!(out, "<dc:creator>{}</dc:creator>", cdata(&author.name));
        }
        if item.has_content() {
            let _ = write!(out, "<content:encoded>{}</content:encoded>", cdata(&item.content));
        }
        for category in &item.categories {
            let _ = write!(out, "<category>{}</category>", encode_text(category));
        }
        if let Some(published) = &item.published {
            let _ = write!(out, "<pubDate>{}</pubDate>", rfc1123(published));
        }
        out.push_str("</item>");
    }

    out.push_str("</channel></rss>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::models::{Item, Link, Person};
    use crate::feed::parse_feed;
    use chrono::TimeZone;

    fn sample() -> Feed {
        let mut item = Item {
            title: "Hello".to_string(),
            summary: "short".to_string(),
            content: "<p>a ]]> b</p>".to_string(),
            published: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single(),
            ..Default::default()
        };
        item.links.push(Link::new("https://example.com/?a=1&b=2"));
        item.authors.push(Person::named("Ann"));
        item.add_category("x & y");

        Feed {
            title: "Site".to_string(),
            language: "en".to_string(),
            last_updated: Utc.with_ymd_and_hms(2030, 6, 7, 8, 9, 10).single(),
            links: vec![Link::new("https://example.com/")],
            items: vec![item, Item::default()],
            ..Default::default()
        }
    }

    #[test]
    fn test_item_uses_its_own_publish_date() {
        let xml = write_rss(&sample());
        assert!(xml.contains("<lastBuildDate>Fri, 07 Jun 2030 08:09:10 GMT</lastBuildDate>"));
        assert!(xml.contains("<pubDate>Tue, 02 Jan 2024 03:04:05 GMT</pubDate>"));
    }

    #[test]
    fn test_escaping_and_optional_elements() {
        let xml = write_rss(&sample());
        assert!(xml.contains("<link>https://example.com/?a=1&amp;b=2</link>"));
        assert!(xml.contains("<category>x &amp; y</category>"));
        assert!(xml.contains("<dc:creator><![CDATA[Ann]]></dc:creator>"));
        assert!(!xml.contains("<description></description>"));
        // the empty second item has no link, no content and no date
        assert!(xml.contains("<item><title><![CDATA[]]></title></item>"));
    }

    #[test]
    fn test_output_parses_back() {
        let xml = write_rss(&sample());
        let feed = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(feed.title, "Site");
        assert_eq!(feed.items.len(), 2);
        assert_eq!(feed.items[0].content, "<p>a ]]> b</p>");
        assert_eq!(feed.items[0].authors[0].name, "Ann");
        assert_eq!(feed.items[0].link(), Some("https://example.com/?a=1&b=2"));
    }
}
