//! Final cleanup of the gathered nodes and serialization to an HTML fragment.

use html_escape::{encode_double_quoted_attribute, encode_text};
use url::Url;

use super::dom::{Dom, NodeId, NodeKind};
use super::patterns::{
    ALLOWED_ATTRIBUTES, HEADING_TAGS, INTERACTIVE_TAGS, SELF_CLOSING_TAGS, STYLED_MARKER,
};
use super::scoring::{char_len, class_weight, comma_count, link_density};

/// Drop gathered nodes that look like furniture rather than content
pub fn filter_gathered(dom: &Dom, nodes: Vec<NodeId>, min_text_length: usize) -> Vec<NodeId> {
    nodes
        .into_iter()
        .filter(|&node| {
            if dom.has_tag(node, HEADING_TAGS) {
                return class_weight(dom, node) >= 0.0 && link_density(dom, node) <= 0.33;
            }
            if dom.has_tag(node, INTERACTIVE_TAGS) {
                return false;
            }
            if dom.has_tag(node, &["table", "ul", "div"]) {
                return !is_suspicious_container(dom, node, min_text_length);
            }
            true
        })
        .collect()
}

/// The conditional-removal heuristic for `table`, `ul` and `div`
fn is_suspicious_container(dom: &Dom, node: NodeId, min_text_length: usize) -> bool {
    let weight = class_weight(dom, node);
    if weight < 0.0 {
        return true;
    }

    let text = dom.inner_text(node);
    if comma_count(&text) >= 10 {
        return false;
    }

    let count = |tags: &[&str]| dom.find(node, tags).len() as i64;
    let paragraphs = count(&["p", "br"]);
    let images = count(&["img"]);
    let list_items = count(&["li"]) - 100;
    let inputs = count(&["input"]);
    let embeds = dom
        .find(node, &["embed"])
        .into_iter()
        .filter(|&e| dom.has_attr(e, "src"))
        .count();

    let content_length = char_len(text.trim());
    let density = link_density(dom, node);
    let tag = dom.tag(node).unwrap_or_default();

    (images > paragraphs && images > 1)
        || (list_items > paragraphs && tag != "ul" && tag != "ol")
        || inputs > paragraphs / 3
        || (content_length < min_text_length && (images == 0 || images > 2))
        || (weight < 25.0 && density > 0.2)
        || (weight >= 25.0 && density > 0.5)
        || (embeds == 1 && content_length < 75)
        || embeds > 1
}

fn is_marker(dom: &Dom, node: NodeId) -> bool {
    dom.tag(node) == Some("p") && dom.attr(node, "class") == Some(STYLED_MARKER)
}

/// Resolve a `src`/`href` value against the page URL. `javascript:` values
/// yield `None`.
fn resolve_link(base: &Url, value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.to_ascii_lowercase().starts_with("javascript:") {
        return None;
    }
    const ABSOLUTE: &[&str] = &["http://", "https://", "ftp://", "mailto:"];
    if ABSOLUTE.iter().any(|scheme| trimmed.starts_with(scheme)) {
        return Some(value.to_string());
    }
    Some(
        base.join(trimmed)
            .map(String::from)
            .unwrap_or_else(|_| value.to_string()),
    )
}

/// Render `nodes` as one HTML fragment
pub fn serialize(dom: &Dom, base: &Url, nodes: &[NodeId]) -> String {
    let mut out = String::new();
    for &node in nodes {
        write_node(dom, base, node, &mut out);
    }
    out
}

fn write_node(dom: &Dom, base: &Url, node: NodeId, out: &mut String) {
    let tag = match dom.kind(node) {
        NodeKind::Text(text) => {
            out.push_str(&encode_text(text));
            return;
        }
        NodeKind::Document => {
            write_children(dom, base, node, out);
            return;
        }
        NodeKind::Element { tag, .. } => tag.as_str(),
    };

    // Page scaffolding and synthetic paragraphs are transparent
    if is_marker(dom, node) || matches!(tag, "html" | "body") {
        write_children(dom, base, node, out);
        return;
    }
    if tag == "head" || INTERACTIVE_TAGS.contains(&tag) {
        return;
    }

    out.push('<');
    out.push_str(tag);
    for name in ALLOWED_ATTRIBUTES {
        let Some(value) = dom.attr(node, name) else {
            continue;
        };
        let value = if matches!(*name, "src" | "href") {
            match resolve_link(base, value) {
                Some(resolved) => resolved,
                None => continue,
            }
        } else if value.trim().to_ascii_lowercase().starts_with("javascript:") {
            continue;
        } else {
            value.to_string()
        };
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&encode_double_quoted_attribute(&value));
        out.push('"');
    }

    if SELF_CLOSING_TAGS.contains(&tag) {
        out.push_str("/>");
        return;
    }
    out.push('>');
    write_children(dom, base, node, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_children(dom: &Dom, base: &Url, node: NodeId, out: &mut String) {
    for child in dom.children(node) {
        write_node(dom, base, child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/blog/post.html").unwrap()
    }

    fn render(html: &str) -> String {
        let dom = Dom::parse(html);
        let body = dom.find(dom.root(), &["body"])[0];
        let nodes: Vec<_> = dom.children(body).collect();
        serialize(&dom, &base(), &nodes)
    }

    #[test]
    fn test_attributes_are_filtered_and_resolved() {
        let html = r#"<p class="x" style="y"><a href="/about" onclick="z()">About</a><img src="pic.png" alt="a" width="10"></p>"#;
        assert_eq!(
            render(html),
            r#"<p><a href="https://example.com/about">About</a><img src="https://example.com/blog/pic.png" width="10"/></p>"#
        );
    }

    #[test]
    fn test_absolute_and_script_links() {
        assert_eq!(
            render(r#"<a href="mailto:me@example.com">m</a>"#),
            r#"<a href="mailto:me@example.com">m</a>"#
        );
        assert_eq!(
            render(r#"<a href="javascript:void(0)">j</a>"#),
            "<a>j</a>"
        );
        assert_eq!(
            render(r#"<a href="ftp://files.example.com/x">f</a>"#),
            r#"<a href="ftp://files.example.com/x">f</a>"#
        );
    }

    #[test]
    fn test_text_is_escaped_and_markers_unwrapped() {
        let html = r#"<div><p class="readability-styled">a &lt; b</p><br></div>"#;
        assert_eq!(render(html), "<div>a &lt; b<br/></div>");
    }

    #[test]
    fn test_interactive_elements_dropped() {
        assert_eq!(
            render("<p>text<iframe src=\"/ad\"></iframe><button>b</button></p>"),
            "<p>text</p>"
        );
    }

    #[test]
    fn test_filter_gathered() {
        let dom = Dom::parse(
            r#"<h2 class="comment">c</h2><h2>Real heading</h2><form><input></form>
               <ul class="nav"><li><a href="/a">aaaaaaaaaa</a></li><li><a href="/b">bbbbbbbbbb</a></li></ul>
               <div>A short caption without much to say, really.</div>
               <p>para</p>"#,
        );
        let body = dom.find(dom.root(), &["body"])[0];
        let nodes: Vec<_> = dom.children(body).filter(|&n| dom.is_element(n)).collect();
        let kept: Vec<_> = filter_gathered(&dom, nodes, 25)
            .into_iter()
            .filter_map(|n| dom.tag(n))
            .collect();
        assert_eq!(kept, vec!["h2", "form", "div", "p"]);
    }

    fn is_dropped(html: &str) -> bool {
        let dom = Dom::parse(html);
        let body = dom.find(dom.root(), &["body"])[0];
        let node = dom.children(body).find(|&n| dom.is_element(n)).unwrap();
        filter_gathered(&dom, vec![node], 25).is_empty()
    }

    fn list_items(n: usize) -> String {
        "<li>entry</li>".repeat(n)
    }

    const LONG_TEXT: &str = "A paragraph of ordinary prose that runs well past seventy five characters in length.";

    #[test]
    fn test_negative_weight_container_dropped() {
        assert!(is_dropped(&format!(r#"<div class="sidebar"><p>{LONG_TEXT}</p></div>"#)));
    }

    #[test]
    fn test_many_commas_keep_container() {
        assert!(!is_dropped("<div>1,2,3,4,5,6,7,8,9,10,11</div>"));
        assert!(is_dropped("<div>1,2,3,4,5,6,7,8,9</div>"));
    }

    #[test]
    fn test_more_images_than_paragraphs() {
        assert!(is_dropped(
            r#"<div><p>A caption long enough to count as text.</p><img src="a.png"><img src="b.png"><img src="c.png"></div>"#
        ));
        assert!(!is_dropped(
            r#"<div><p>First paragraph with enough text.</p><p>Second paragraph, also fine.</p><img src="a.png"><img src="b.png"></div>"#
        ));
    }

    #[test]
    fn test_list_items_dominate_outside_lists() {
        assert!(is_dropped(&format!("<div><ol>{}</ol></div>", list_items(101))));
        assert!(!is_dropped(&format!("<div><ol>{}</ol></div>", list_items(100))));
        assert!(!is_dropped(&format!("<ul>{}</ul>", list_items(101))));
    }

    #[test]
    fn test_input_density() {
        assert!(is_dropped(
            "<div><p>Enter your email address to get the newsletter.</p><input><input></div>"
        ));
        assert!(!is_dropped(
            "<div><p>Enter your email address.</p><p>We send one letter.</p><p>Never more.</p><input></div>"
        ));
    }

    #[test]
    fn test_short_content_unless_single_image() {
        assert!(is_dropped("<div>tiny</div>"));
        assert!(!is_dropped(r#"<div><img src="a.png">tiny</div>"#));
    }

    #[test]
    fn test_link_density_depends_on_weight() {
        let moderate = r#"<a href="/a">linked words here</a> and plenty of plain text that follows it"#;
        // positive class tolerates moderate link density
        assert!(!is_dropped(&format!(r#"<div class="content">{moderate}</div>"#)));
        assert!(is_dropped(&format!("<div>{moderate}</div>")));
        // but not a container that is mostly links
        assert!(is_dropped(
            r#"<div class="content"><a href="/a">a long run of linked text that dominates</a> tail</div>"#
        ));
    }

    #[test]
    fn test_embeds() {
        assert!(is_dropped(
            r#"<div><p>A short video caption goes here.</p><embed src="v.swf"></div>"#
        ));
        assert!(!is_dropped(&format!(
            r#"<div><p>{LONG_TEXT}</p><embed src="v.swf"></div>"#
        )));
        assert!(!is_dropped(
            "<div><p>A short video caption goes here.</p><embed></div>"
        ));
        assert!(is_dropped(&format!(
            r#"<div><p>{LONG_TEXT}</p><embed src="a.swf"><embed src="b.swf"></div>"#
        )));
    }
}
