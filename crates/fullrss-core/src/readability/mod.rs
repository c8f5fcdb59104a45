//! Main-content extraction for article pages.
//!
//! The page is parsed into a mutable tree, normalized (line breaks, unlikely
//! nodes, paragraph-like divs), scored paragraph by paragraph, and the best
//! scoring container plus its related siblings are sanitized into an HTML
//! fragment. Finding nothing is not an error: the body is then empty.

mod clean;
pub mod dom;
mod patterns;
mod sanitize;
pub mod scoring;

use std::collections::HashMap;

use serde::Serialize;
use url::Url;

use crate::{Error, Result};
use dom::{Dom, NodeId};
use patterns::{SENTENCE_END, TITLE_SEPARATORS};
use scoring::{char_len, link_density, paragraph_score, seed_score};

/// Paragraphs shorter than this (in characters) are not scored
pub const MIN_TEXT_LENGTH: usize = 25;

/// Result of extracting one page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadabilityDocument {
    /// Page the content was extracted from, after redirects
    pub url: Url,
    pub title: String,
    /// Sanitized HTML fragment; empty when no content was found
    pub body: String,
}

impl ReadabilityDocument {
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }
}

/// Scores keyed by node, remembering first-seen order so ties resolve the
/// same way on every run
#[derive(Default)]
struct Candidates {
    scores: HashMap<NodeId, f64>,
    order: Vec<NodeId>,
}

impl Candidates {
    fn score_mut(&mut self, dom: &Dom, node: NodeId) -> &mut f64 {
        if !self.scores.contains_key(&node) {
            self.order.push(node);
        }
        self.scores
            .entry(node)
            .or_insert_with(|| seed_score(dom, node))
    }

    fn get(&self, node: NodeId) -> Option<f64> {
        self.scores.get(&node).copied()
    }
}

/// Readability extractor over one parsed page
pub struct Readability {
    dom: Dom,
    min_text_length: usize,
}

impl Readability {
    pub fn parse(html: &str) -> Self {
        Self {
            dom: Dom::parse(html),
            min_text_length: MIN_TEXT_LENGTH,
        }
    }

    pub fn with_min_text_length(mut self, min_text_length: usize) -> Self {
        self.min_text_length = min_text_length;
        self
    }

    /// Parse `html` and extract it with `base` as the page URL
    pub fn extract_html(base: &Url, html: &str) -> Result<ReadabilityDocument> {
        Self::parse(html).extract(base)
    }

    /// `og:title` / `twitter:title` when present, else `<title>`, with a
    /// trailing site name peeled off
    pub fn title(&self) -> String {
        let dom = &self.dom;
        let meta = dom.find(dom.root(), &["meta"]).into_iter().find(|&m| {
            dom.attr(m, "property") == Some("og:title") || dom.attr(m, "name") == Some("twitter:title")
        });

        let title = match meta {
            Some(meta) => dom.attr(meta, "content").unwrap_or_default().to_string(),
            None => dom
                .find(dom.root(), &["title"])
                .first()
                .map(|&t| dom.inner_text(t))
                .unwrap_or_default(),
        };
        better_title(title.trim())
    }

    /// Run the whole pipeline, consuming the tree
    pub fn extract(mut self, base: &Url) -> Result<ReadabilityDocument> {
        if self.dom.find(self.dom.root(), &["html"]).is_empty() {
            return Err(Error::MalformedDocument(
                "HTML document has no root element".to_string(),
            ));
        }

        let title = self.title();

        clean::collapse_breaks(&mut self.dom);
        clean::prune_unlikely(&mut self.dom);
        clean::normalize_divs(&mut self.dom);

        let body = self.content(base);
        tracing::debug!(url = %base, body_len = body.len(), "Extracted article");

        Ok(ReadabilityDocument {
            url: base.clone(),
            title,
            body,
        })
    }

    fn content(&self, base: &Url) -> String {
        let candidates = self.score_paragraphs();
        let Some((winner, winner_score)) = top_candidate(&self.dom, &candidates) else {
            return String::new();
        };

        let gathered = self.gather_siblings(winner, winner_score, &candidates);
        let kept = sanitize::filter_gathered(&self.dom, gathered, self.min_text_length);
        sanitize::serialize(&self.dom, base, &kept)
    }

    /// Credit every long enough `<p>`/`<td>` to its parent and, at half
    /// weight, its grandparent
    fn score_paragraphs(&self) -> Candidates {
        let dom = &self.dom;
        let mut candidates = Candidates::default();
        let paragraphs = dom
            .find(dom.root(), &["p"])
            .into_iter()
            .chain(dom.find(dom.root(), &["td"]));

        for paragraph in paragraphs {
            let text = dom.inner_text(paragraph);
            let length = char_len(&text);
            if length < self.min_text_length {
                continue;
            }

            let Some(parent) = dom.parent(paragraph).filter(|&p| dom.is_element(p)) else {
                continue;
            };
            let grandparent = dom.parent(parent).filter(|&g| dom.is_element(g));

            let score = paragraph_score(&text, length);
            *candidates.score_mut(dom, parent) += score;
            if let Some(grandparent) = grandparent {
                *candidates.score_mut(dom, grandparent) += score / 2.0;
            }
        }
        candidates
    }

    /// The winner, its related siblings, and anything paragraph-like next to
    /// it, in document order
    fn gather_siblings(&self, winner: NodeId, winner_score: f64, candidates: &Candidates) -> Vec<NodeId> {
        let dom = &self.dom;
        let Some(parent) = dom.parent(winner) else {
            return vec![winner];
        };
        let threshold = f64::max(10.0, winner_score * 0.2);

        dom.children(parent)
            .filter(|&sibling| dom.is_element(sibling))
            .filter(|&sibling| {
                let mut append = sibling == winner
                    || candidates.get(sibling).is_some_and(|score| score >= threshold);

                if dom.tag(sibling) == Some("p") {
                    let density = link_density(dom, sibling);
                    let content = dom.inner_text(sibling);
                    let length = char_len(&content);
                    if length >= 80 && density < 0.25 {
                        append = true;
                    } else if length < 80 && density == 0.0 {
                        append = SENTENCE_END.is_match(&content);
                    }
                }
                append
            })
            .collect()
    }
}

/// Apply the link-density discount to every candidate and return the best
/// one with its discounted score
fn top_candidate(dom: &Dom, candidates: &Candidates) -> Option<(NodeId, f64)> {
    let mut best: Option<(NodeId, f64)> = None;
    for &node in &candidates.order {
        let score = candidates.get(node).unwrap_or_default() * (1.0 - link_density(dom, node));
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((node, score));
        }
    }
    best
}

/// Keep the part before a site-name separator when it is long enough to be a
/// title on its own. A title with two different separators is kept whole.
fn better_title(title: &str) -> String {
    let mut better: Option<&str> = None;
    for separator in TITLE_SEPARATORS {
        let mut parts = title.split(separator);
        let Some(head) = parts.next() else {
            continue;
        };
        if parts.next().is_none() {
            continue;
        }
        if better.is_some() {
            better = Some(title);
            break;
        }
        better = Some(head.trim());
    }

    match better {
        Some(better) if char_len(better) > 10 => better.to_string(),
        _ => title.to_string(),
    }
}

/// Extract the main content of `html`, resolving links against `base`
pub fn extract(base: &Url, html: &str) -> Result<ReadabilityDocument> {
    Readability::extract_html(base, html)
}
