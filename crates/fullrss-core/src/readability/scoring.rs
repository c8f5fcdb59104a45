use super::dom::{Dom, NodeId};
use super::patterns::{NEGATIVE, POSITIVE};

/// Latin and full-width (CJK) commas
pub fn comma_count(text: &str) -> usize {
    text.chars().filter(|&c| c == ',' || c == '，').count()
}

/// Length in Unicode scalar values
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// ±25 for each of `class` and `id` that matches the positive or negative
/// keyword patterns; both may apply to the same attribute.
pub fn class_weight(dom: &Dom, node: NodeId) -> f64 {
    let mut weight = 0.0;
    for name in ["class", "id"] {
        let Some(value) = dom.attr(node, name).filter(|v| !v.is_empty()) else {
            continue;
        };
        if NEGATIVE.is_match(value) {
            weight -= 25.0;
        }
        if POSITIVE.is_match(value) {
            weight += 25.0;
        }
    }
    weight
}

/// Share of a node's text that sits inside real links. A node without text
/// has density 0.
pub fn link_density(dom: &Dom, node: NodeId) -> f64 {
    let text_length = char_len(&dom.inner_text(node));
    if text_length == 0 {
        return 0.0;
    }
    let link_length: usize = dom
        .find(node, &["a"])
        .into_iter()
        .filter(|&a| matches!(dom.attr(a, "href"), Some(href) if !href.is_empty() && href != "#"))
        .map(|a| char_len(&dom.inner_text(a)))
        .sum();
    link_length as f64 / text_length as f64
}

/// Initial score of a candidate, before any paragraph contributes to it
pub fn seed_score(dom: &Dom, node: NodeId) -> f64 {
    let tag_score = match dom.tag(node).unwrap_or_default() {
        "article" => 10.0,
        "section" => 8.0,
        "div" => 5.0,
        "pre" | "td" | "blockquote" => 3.0,
        "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" | "form" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" => -5.0,
        _ => 0.0,
    };

    let mut microdata = 0.0;
    if dom.has_attr(node, "itemscope") {
        microdata += 5.0;
    }
    if dom.has_attr(node, "itemtype") {
        microdata += 30.0;
    }

    class_weight(dom, node) + tag_score + microdata
}

/// What one paragraph of `length` characters adds to its parent
pub fn paragraph_score(text: &str, length: usize) -> f64 {
    1.0 + comma_count(text) as f64 + (length / 100).min(3) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(dom: &Dom, tag: &str) -> NodeId {
        dom.find(dom.root(), &[tag])[0]
    }

    #[test]
    fn test_class_weight() {
        let dom = Dom::parse(
            r#"<div class="article">a</div><div class="comment">b</div><div class="wrapper">c</div>
               <div class="post" id="sidebar">d</div>"#,
        );
        let divs = dom.find(dom.root(), &["div"]);
        assert_eq!(class_weight(&dom, divs[0]), 25.0);
        assert_eq!(class_weight(&dom, divs[1]), -25.0);
        assert_eq!(class_weight(&dom, divs[2]), 0.0);
        assert_eq!(class_weight(&dom, divs[3]), 0.0);
    }

    #[test]
    fn test_link_density_without_text_is_zero() {
        let dom = Dom::parse("<div><a href=\"/x\"></a></div>");
        let density = link_density(&dom, first(&dom, "div"));
        assert_eq!(density, 0.0);
        assert!(!density.is_nan());
    }

    #[test]
    fn test_link_density_ignores_placeholder_links() {
        let dom = Dom::parse(
            r##"<div>abcde<a href="/real">fghij</a><a href="#">klmno</a><a>pqrst</a></div>"##,
        );
        let density = link_density(&dom, first(&dom, "div"));
        assert!((density - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_seed_score_combines_tag_weight_and_microdata() {
        let dom = Dom::parse(
            r#"<article class="entry" itemscope itemtype="http://schema.org/Article">x</article>"#,
        );
        assert_eq!(seed_score(&dom, first(&dom, "article")), 10.0 + 25.0 + 5.0 + 30.0);
    }

    #[test]
    fn test_paragraph_score() {
        let text = "a, b，c";
        assert_eq!(paragraph_score(text, 30), 3.0);
        assert_eq!(paragraph_score("", 250), 3.0);
        assert_eq!(paragraph_score("", 1000), 4.0);
    }
}
