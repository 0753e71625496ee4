//! Editor markup parsing.
//!
//! The rich-text editor hands us HTML fragments. They go through html5ever
//! (so unbalanced or unknown tags are repaired the way a browser would) and
//! come out as an owned [`MarkupNode`] tree whose elements carry a closed
//! [`NodeKind`]. Anything outside the supported vocabulary becomes
//! [`NodeKind::Other`] and is treated as a transparent container later on.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// The tag vocabulary the converter understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// `h1`..`h6`; the level is 1..=6.
    Heading(u8),
    Paragraph,
    BulletList,
    NumberedList,
    ListItem,
    LineBreak,
    Bold,
    Italic,
    Underline,
    /// Any other tag, kept by (lowercased) name.
    Other(String),
}

impl NodeKind {
    pub fn from_tag(tag: &str) -> Self {
        let lower = tag.to_ascii_lowercase();
        match lower.as_str() {
            "h1" => NodeKind::Heading(1),
            "h2" => NodeKind::Heading(2),
            "h3" => NodeKind::Heading(3),
            "h4" => NodeKind::Heading(4),
            "h5" => NodeKind::Heading(5),
            "h6" => NodeKind::Heading(6),
            "p" => NodeKind::Paragraph,
            "ul" => NodeKind::BulletList,
            "ol" => NodeKind::NumberedList,
            "li" => NodeKind::ListItem,
            "br" => NodeKind::LineBreak,
            "strong" | "b" => NodeKind::Bold,
            "em" | "i" => NodeKind::Italic,
            "u" => NodeKind::Underline,
            _ => NodeKind::Other(lower),
        }
    }

    pub fn is_inline_style(&self) -> bool {
        matches!(self, NodeKind::Bold | NodeKind::Italic | NodeKind::Underline)
    }
}

/// One parsed markup node. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Text(String),
    Element {
        kind: NodeKind,
        attrs: Vec<(String, String)>,
        children: Vec<MarkupNode>,
    },
}

impl MarkupNode {
    /// Convenience constructor, mostly for tests.
    pub fn element(tag: &str, children: Vec<MarkupNode>) -> Self {
        MarkupNode::Element {
            kind: NodeKind::from_tag(tag),
            attrs: Vec::new(),
            children,
        }
    }

    pub fn text(s: &str) -> Self {
        MarkupNode::Text(s.to_string())
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            MarkupNode::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str()),
            MarkupNode::Text(_) => None,
        }
    }

    /// Concatenated text of this node and all descendants, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            MarkupNode::Text(t) => out.push_str(t),
            MarkupNode::Element { kind, children, .. } => {
                if *kind == NodeKind::LineBreak {
                    out.push(' ');
                }
                for c in children {
                    c.collect_text(out);
                }
            }
        }
    }
}

fn html5_parse(input: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default()).one(input)
}

fn tag_lower(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_string().to_ascii_lowercase()),
        _ => None,
    }
}

fn attrs_vec(node: &Handle) -> Vec<(String, String)> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .map(|a| (a.name.local.to_string(), a.value.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Elements nested deeper than this are flattened into their text, which
/// keeps every later walk over the tree within a fixed recursion depth.
pub const MAX_DEPTH: usize = 256;

/// Text content of a subtree without recursion.
fn flat_text(node: &Handle) -> String {
    let mut out = String::new();
    let mut stack = vec![node.clone()];
    while let Some(n) = stack.pop() {
        match &n.data {
            NodeData::Text { contents } => out.push_str(&contents.borrow()),
            NodeData::Element { .. } if tag_lower(&n).as_deref() == Some("br") => out.push(' '),
            _ => {}
        }
        stack.extend(n.children.borrow().iter().rev().cloned());
    }
    out
}

fn to_markup(node: &Handle, depth: usize) -> Option<MarkupNode> {
    match &node.data {
        NodeData::Text { contents } => Some(MarkupNode::Text(contents.borrow().to_string())),
        NodeData::Element { .. } => {
            if depth >= MAX_DEPTH {
                return Some(MarkupNode::Text(flat_text(node)));
            }
            let tag = tag_lower(node)?;
            let children = node
                .children
                .borrow()
                .iter()
                .filter_map(|c| to_markup(c, depth + 1))
                .collect();
            Some(MarkupNode::Element {
                kind: NodeKind::from_tag(&tag),
                attrs: attrs_vec(node),
                children,
            })
        }
        // comments, doctypes and processing instructions carry no content
        _ => None,
    }
}

/// Parse an editor fragment (or a full HTML document) into top-level nodes.
///
/// Never fails: html5ever repairs whatever it is given. Blank input yields
/// an empty vector.
pub fn parse(input: &str) -> Vec<MarkupNode> {
    if input.trim().is_empty() {
        return Vec::new();
    }

    let wrapped = if input.to_ascii_lowercase().contains("<html") {
        input.to_string()
    } else {
        format!(
            "<!doctype html><html><head><meta charset=\"utf-8\"></head><body>{}</body></html>",
            input
        )
    };

    let dom = html5_parse(&wrapped);
    let mut body_children: Vec<Handle> = Vec::new();
    fn walk_find_body(node: &Handle, out: &mut Vec<Handle>) -> bool {
        if tag_lower(node).as_deref() == Some("body") {
            out.extend(node.children.borrow().iter().cloned());
            return true;
        }
        for c in node.children.borrow().iter() {
            if walk_find_body(c, out) {
                return true;
            }
        }
        false
    }
    if !walk_find_body(&dom.document, &mut body_children) {
        body_children = dom.document.children.borrow().iter().cloned().collect();
    }

    body_children
        .iter()
        .filter_map(|n| to_markup(n, 0))
        .collect()
}
