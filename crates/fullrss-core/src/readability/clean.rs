//! Tree normalization run before scoring.

use super::dom::{Dom, NodeId};
use super::patterns::{BLACKLIST, DIV_BLOCK_TAGS, MAYBE_CANDIDATE, STYLED_MARKER, UNLIKELY_CANDIDATE};

fn is_blank_text(dom: &Dom, node: NodeId) -> bool {
    dom.text(node).is_some_and(|t| t.trim().is_empty())
}

/// First node at or after `node` that is not whitespace-only text
fn skip_blank(dom: &Dom, mut node: Option<NodeId>) -> Option<NodeId> {
    while let Some(current) = node {
        if !is_blank_text(dom, current) {
            break;
        }
        node = dom.next_sibling(current);
    }
    node
}

fn is_br(dom: &Dom, node: Option<NodeId>) -> bool {
    node.is_some_and(|n| dom.tag(n) == Some("br"))
}

/// Replace every run of two or more `<br>` with a `<p>` holding the content
/// that follows, up to the next such run.
///
/// `<div>foo<br>bar<br> <br><br>abc</div>` becomes
/// `<div>foo<br>bar<p> abc</p></div>`.
pub fn collapse_breaks(dom: &mut Dom) {
    for br in dom.find(dom.root(), &["br"]) {
        if dom.parent(br).is_none() {
            continue;
        }

        let mut replaced = false;
        let mut next = skip_blank(dom, dom.next_sibling(br));
        while let Some(extra) = next.filter(|&n| dom.tag(n) == Some("br")) {
            replaced = true;
            next = dom.next_sibling(extra);
            dom.detach(extra);
            next = skip_blank(dom, next);
        }
        if !replaced {
            continue;
        }

        let p = dom.create_element("p", Vec::new());
        dom.insert_before(br, p);
        dom.detach(br);

        let mut next = dom.next_sibling(p);
        while let Some(sibling) = next {
            if dom.tag(sibling) == Some("br")
                && is_br(dom, skip_blank(dom, dom.next_sibling(sibling)))
            {
                break;
            }
            next = dom.next_sibling(sibling);
            dom.append_child(p, sibling);
        }
    }
}

/// Remove `script`/`style`/`noscript`, then every element whose class and id
/// look like page furniture (comments, menus, footers, ...)
pub fn prune_unlikely(dom: &mut Dom) {
    for node in dom.descendants(dom.root()) {
        let Some(tag) = dom.tag(node) else {
            continue;
        };
        let remove = match tag {
            "script" | "style" | "noscript" => true,
            "html" | "body" | "article" => false,
            _ => {
                let marker = format!(
                    "{}{}",
                    dom.attr(node, "class").unwrap_or_default(),
                    dom.attr(node, "id").unwrap_or_default()
                );
                BLACKLIST.is_match(&marker)
                    || (UNLIKELY_CANDIDATE.is_match(&marker) && !MAYBE_CANDIDATE.is_match(&marker))
            }
        };
        if remove {
            dom.detach(node);
        }
    }
}

/// The lone `<p>` child of a div with no loose text of its own. Other
/// element children do not count.
fn single_paragraph(dom: &Dom, div: NodeId) -> Option<NodeId> {
    let mut paragraph = None;
    for child in dom.children(div) {
        if dom.tag(child) == Some("p") {
            if paragraph.is_some() {
                return None;
            }
            paragraph = Some(child);
        } else if dom.text(child).is_some_and(|t| !t.trim().is_empty()) {
            return None;
        }
    }
    paragraph.filter(|&p| !dom.inner_text(p).trim().is_empty())
}

fn has_block_descendant(dom: &Dom, node: NodeId) -> bool {
    dom.any_descendant(node, |n| dom.has_tag(n, DIV_BLOCK_TAGS))
}

/// Rewrite divs that are really paragraphs, and wrap the loose text of the
/// remaining divs in marker paragraphs so it can be scored.
pub fn normalize_divs(dom: &mut Dom) {
    for div in dom.find(dom.root(), &["div"]) {
        if !dom.is_attached(div) {
            continue;
        }

        if let Some(p) = single_paragraph(dom, div) {
            dom.insert_before(div, p);
            dom.detach(div);
        } else if !has_block_descendant(dom, div) {
            dom.set_tag(div, "p");
        } else {
            let loose: Vec<NodeId> = dom
                .children(div)
                .filter(|&c| dom.text(c).is_some_and(|t| !t.trim().is_empty()))
                .collect();
            for text in loose {
                let p = dom.create_element(
                    "p",
                    vec![("class".to_string(), STYLED_MARKER.to_string())],
                );
                dom.insert_before(text, p);
                dom.append_child(p, text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_tags(dom: &Dom) -> Vec<String> {
        let body = dom.find(dom.root(), &["body"])[0];
        dom.descendants(body)
            .into_iter()
            .filter_map(|n| dom.tag(n).map(str::to_string))
            .collect()
    }

    #[test]
    fn test_collapse_breaks() {
        let mut dom = Dom::parse("<div>foo<br>bar<br> <br><br>abc<br>def</div>");
        collapse_breaks(&mut dom);
        let div = dom.find(dom.root(), &["div"])[0];
        let children: Vec<_> = dom
            .children(div)
            .map(|c| dom.tag(c).unwrap_or("#text").to_string())
            .collect();
        assert_eq!(children, vec!["#text", "br", "#text", "p"]);

        let p = dom.find(div, &["p"])[0];
        assert_eq!(dom.inner_text(p), " abcdef");
        assert_eq!(dom.find(p, &["br"]).len(), 1);
    }

    #[test]
    fn test_single_br_is_left_alone() {
        let mut dom = Dom::parse("<div>a<br>b</div>");
        collapse_breaks(&mut dom);
        assert_eq!(body_tags(&dom), vec!["div", "br"]);
    }

    #[test]
    fn test_prune_unlikely() {
        let mut dom = Dom::parse(
            r#"<script>x()</script><div class="sidebar">nav</div><div id="nav-menu">m</div>
               <div class="comment-body">kept</div><article class="comment">kept</article>
               <div class="popupbody main">gone</div>"#,
        );
        prune_unlikely(&mut dom);
        assert_eq!(body_tags(&dom), vec!["div", "article"]);
    }

    #[test]
    fn test_div_with_single_paragraph_is_unwrapped() {
        let mut dom = Dom::parse("<div> <p>only text</p> </div>");
        normalize_divs(&mut dom);
        assert_eq!(body_tags(&dom), vec!["p"]);
    }

    #[test]
    fn test_single_paragraph_ignores_other_elements() {
        let mut dom = Dom::parse(r#"<div><p>only para text</p><img src="x.png"></div>"#);
        normalize_divs(&mut dom);
        assert_eq!(body_tags(&dom), vec!["p"]);
        let p = dom.find(dom.root(), &["p"])[0];
        assert_eq!(dom.inner_text(p), "only para text");
    }

    #[test]
    fn test_two_paragraphs_or_loose_text_keep_the_div() {
        let mut dom = Dom::parse("<div><p>one</p><p>two</p></div>");
        normalize_divs(&mut dom);
        assert_eq!(body_tags(&dom), vec!["div", "p", "p"]);

        let mut dom = Dom::parse("<div>intro <p>para</p></div>");
        normalize_divs(&mut dom);
        assert_eq!(dom.find(dom.root(), &["div"]).len(), 1);
    }

    #[test]
    fn test_deeply_nested_divs() {
        let depth = 300;
        let html = format!(
            "{}<p>deep paragraph</p><p>second</p>{}",
            "<div>".repeat(depth),
            "</div>".repeat(depth)
        );
        let mut dom = Dom::parse(&html);
        normalize_divs(&mut dom);
        assert_eq!(dom.find(dom.root(), &["div"]).len(), depth);
        assert_eq!(dom.find(dom.root(), &["p"]).len(), 2);
    }

    #[test]
    fn test_div_without_blocks_becomes_paragraph() {
        let mut dom = Dom::parse("<div>plain <span>inline</span></div>");
        normalize_divs(&mut dom);
        assert_eq!(body_tags(&dom), vec!["p", "span"]);
    }

    #[test]
    fn test_loose_text_is_wrapped_in_marker() {
        let mut dom = Dom::parse("<div>loose text<p>para</p>  </div>");
        normalize_divs(&mut dom);
        let div = dom.find(dom.root(), &["div"])[0];
        let first = dom.first_child(div).unwrap();
        assert_eq!(dom.tag(first), Some("p"));
        assert_eq!(dom.attr(first, "class"), Some(STYLED_MARKER));
        assert_eq!(dom.inner_text(first), "loose text");
        assert_eq!(dom.find(div, &["p"]).len(), 2);
    }
}
