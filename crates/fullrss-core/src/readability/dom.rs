//! Mutable HTML tree used by the extractor.
//!
//! Nodes live in one arena and refer to each other by [`NodeId`]. Parents own
//! their children in the sense that only [`Dom::append_child`],
//! [`Dom::insert_before`] and [`Dom::detach`] rewrite the links, and each of
//! them leaves parent and sibling links consistent for every attached node.

use std::collections::HashMap;

use scraper::{Html, Node as HtmlNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Element { tag: String, attrs: Vec<(String, String)> },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
}

impl Dom {
    /// Parse an HTML document. Comments, doctypes and processing
    /// instructions are dropped.
    pub fn parse(html: &str) -> Self {
        let html = Html::parse_document(html);
        let mut dom = Dom {
            nodes: vec![Node::new(NodeKind::Document)],
        };
        let root = dom.root();

        let mut ids = HashMap::new();
        ids.insert(html.tree.root().id(), root);

        // Pre-order: a parent is always mapped before its children
        for node in html.tree.root().descendants().skip(1) {
            let kind = match node.value() {
                HtmlNode::Element(element) => NodeKind::Element {
                    tag: element.name().to_ascii_lowercase(),
                    attrs: element
                        .attrs()
                        .map(|(name, value)| (name.to_string(), value.to_string()))
                        .collect(),
                },
                HtmlNode::Text(text) => {
                    let text: &str = text;
                    NodeKind::Text(text.to_owned())
                }
                _ => continue,
            };
            let Some(parent) = node.parent().and_then(|p| ids.get(&p.id()).copied()) else {
                continue;
            };
            let id = dom.push(kind);
            dom.append_child(parent, id);
            ids.insert(node.id(), id);
        }
        dom
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node::new(kind));
        NodeId(self.nodes.len() - 1)
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    /// Tag name of an element, `None` for text and the document
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Element { .. })
    }

    pub fn has_tag(&self, id: NodeId, names: &[&str]) -> bool {
        self.tag(id).is_some_and(|tag| names.contains(&tag))
    }

    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        match &self.node(id).kind {
            NodeKind::Element { attrs, .. } => attrs,
            _ => &[],
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Content of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            dom: self,
            next: self.first_child(id),
        }
    }

    /// Every node below `id` in document order, `id` itself excluded
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.first_child(id);
        while let Some(node) = current {
            out.push(node);
            current = self.first_child(node).or_else(|| self.next_in_subtree(node, id));
        }
        out
    }

    /// Pre-order search that stops at the first match
    pub fn any_descendant(&self, id: NodeId, mut predicate: impl FnMut(NodeId) -> bool) -> bool {
        let mut current = self.first_child(id);
        while let Some(node) = current {
            if predicate(node) {
                return true;
            }
            current = self.first_child(node).or_else(|| self.next_in_subtree(node, id));
        }
        false
    }

    /// Next node after `node`'s subtree, staying inside `top`
    fn next_in_subtree(&self, mut node: NodeId, top: NodeId) -> Option<NodeId> {
        loop {
            if node == top {
                return None;
            }
            if let Some(next) = self.next_sibling(node) {
                return Some(next);
            }
            node = self.parent(node)?;
        }
    }

    /// Descendant elements of `id` whose tag is one of `names`, in document order
    pub fn find(&self, id: NodeId, names: &[&str]) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&node| self.has_tag(node, names))
            .collect()
    }

    /// Concatenated text of every descendant text node
    pub fn inner_text(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|node| self.text(node))
            .collect()
    }

    /// Whether `id` is still connected to the document root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current == self.root()
    }

    pub fn create_element(&mut self, tag: &str, attrs: Vec<(String, String)>) -> NodeId {
        self.push(NodeKind::Element {
            tag: tag.to_string(),
            attrs,
        })
    }

    /// Rename an element in place; children and attributes are kept
    pub fn set_tag(&mut self, id: NodeId, name: &str) {
        if let NodeKind::Element { tag, .. } = &mut self.node_mut(id).kind {
            *tag = name.to_string();
        }
    }

    /// Unlink a node (and its subtree) from its parent and siblings
    pub fn detach(&mut self, id: NodeId) {
        let Node {
            parent,
            prev_sibling,
            next_sibling,
            ..
        } = *self.node(id);

        if let Some(prev) = prev_sibling {
            self.node_mut(prev).next_sibling = next_sibling;
        } else if let Some(parent) = parent {
            self.node_mut(parent).first_child = next_sibling;
        }
        if let Some(next) = next_sibling {
            self.node_mut(next).prev_sibling = prev_sibling;
        } else if let Some(parent) = parent {
            self.node_mut(parent).last_child = prev_sibling;
        }

        let node = self.node_mut(id);
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    /// Make `child` the last child of `parent`, detaching it first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        let last = self.node(parent).last_child;
        {
            let node = self.node_mut(child);
            node.parent = Some(parent);
            node.prev_sibling = last;
        }
        match last {
            Some(last) => self.node_mut(last).next_sibling = Some(child),
            None => self.node_mut(parent).first_child = Some(child),
        }
        self.node_mut(parent).last_child = Some(child);
    }

    /// Insert `child` immediately before `reference`, detaching it first
    pub fn insert_before(&mut self, reference: NodeId, child: NodeId) {
        let Some(parent) = self.parent(reference) else {
            return;
        };
        self.detach(child);
        let prev = self.node(reference).prev_sibling;
        {
            let node = self.node_mut(child);
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = Some(reference);
        }
        self.node_mut(reference).prev_sibling = Some(child);
        match prev {
            Some(prev) => self.node_mut(prev).next_sibling = Some(child),
            None => self.node_mut(parent).first_child = Some(child),
        }
    }
}

pub struct Children<'a> {
    dom: &'a Dom,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.dom.next_sibling(current);
        Some(current)
    }
}
