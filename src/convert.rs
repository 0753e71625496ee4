//! Markup → document block conversion.
//!
//! A recursive walk over [`MarkupNode`]s that produces an ordered list of
//! [`Block`]s. Two values travel down the recursion: the list nesting level
//! (0 outside any list) and the kind of the innermost list. Ordinal counters
//! for numbered lists live in a [`ListContext`] owned by one conversion.
//!
//! Style tags do not combine: a `<strong>` nested in an `<em>` produces a
//! bold-only run, and the italic flag is lost for that text.

use crate::markup::{MarkupNode, NodeKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl RunStyle {
    pub const PLAIN: RunStyle = RunStyle {
        bold: false,
        italic: false,
        underline: false,
    };

    pub const BOLD: RunStyle = RunStyle {
        bold: true,
        italic: false,
        underline: false,
    };

    pub const ITALIC: RunStyle = RunStyle {
        bold: false,
        italic: true,
        underline: false,
    };

    pub const UNDERLINE: RunStyle = RunStyle {
        bold: false,
        italic: false,
        underline: true,
    };

    fn for_kind(kind: &NodeKind) -> Option<RunStyle> {
        match kind {
            NodeKind::Bold => Some(RunStyle::BOLD),
            NodeKind::Italic => Some(RunStyle::ITALIC),
            NodeKind::Underline => Some(RunStyle::UNDERLINE),
            _ => None,
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == RunStyle::PLAIN
    }
}

/// A piece of text with one style. Never spans a paragraph boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub style: RunStyle,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: RunStyle::PLAIN,
        }
    }

    pub fn styled(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Run(Run),
    LineBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Number,
}

/// Paragraph indentation in twips: `left` for the whole paragraph and a
/// `hanging` first line pulled back by that amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indent {
    pub left: u32,
    pub hanging: u32,
}

impl Indent {
    pub fn for_level(level: u32, unit: u32) -> Self {
        Self {
            left: level.saturating_mul(unit),
            hanging: unit / 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        text: String,
    },
    Paragraph {
        runs: Vec<Inline>,
    },
    ListItem {
        /// Nesting depth, 1 for the outermost list.
        level: u32,
        /// Position within the enclosing numbered list; `None` for bullets.
        ordinal: Option<u32>,
        kind: ListKind,
        runs: Vec<Inline>,
    },
}

impl Block {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph {
            runs: vec![Inline::Run(Run::plain(text))],
        }
    }

    pub fn runs(&self) -> &[Inline] {
        match self {
            Block::Heading { .. } => &[],
            Block::Paragraph { runs } | Block::ListItem { runs, .. } => runs.as_slice(),
        }
    }

    fn runs_mut(&mut self) -> Option<&mut Vec<Inline>> {
        match self {
            Block::Heading { .. } => None,
            Block::Paragraph { runs } | Block::ListItem { runs, .. } => Some(runs),
        }
    }

    /// Text of the block with line breaks rendered as `\n`.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Heading { text, .. } => text.clone(),
            _ => {
                let mut out = String::new();
                for inline in self.runs() {
                    match inline {
                        Inline::Run(r) => out.push_str(&r.text),
                        Inline::LineBreak => out.push('\n'),
                    }
                }
                out
            }
        }
    }

    /// Literal marker text rendered ahead of a list item's runs.
    ///
    /// Numbers are only shown on the outermost level; nested numbered items
    /// keep their ordinal but display no numeral.
    pub fn list_marker(&self, bullet: &str) -> Option<String> {
        match self {
            Block::ListItem {
                kind: ListKind::Bullet,
                ..
            } => Some(format!("{bullet} ")),
            Block::ListItem {
                kind: ListKind::Number,
                level: 1,
                ordinal: Some(n),
                ..
            } => Some(format!("{n}. ")),
            _ => None,
        }
    }

    pub fn indent(&self, unit: u32) -> Option<Indent> {
        match self {
            Block::ListItem { level, .. } => Some(Indent::for_level(*level, unit)),
            _ => None,
        }
    }
}

/// Ordinal counters for numbered lists, indexed by nesting level.
///
/// Belongs to exactly one conversion; never share one between findings.
#[derive(Debug, Default)]
pub struct ListContext {
    counters: Vec<u32>,
}

impl ListContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new list at `level`.
    pub fn reset(&mut self, level: u32) {
        let idx = level as usize;
        if self.counters.len() <= idx {
            self.counters.resize(idx + 1, 0);
        }
        self.counters[idx] = 0;
    }

    /// Advance the counter at `level` and return the new value.
    pub fn next(&mut self, level: u32) -> u32 {
        let idx = level as usize;
        if self.counters.len() <= idx {
            self.counters.resize(idx + 1, 0);
        }
        self.counters[idx] += 1;
        self.counters[idx]
    }
}

fn collapse_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_ws = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !in_ws {
                out.push(' ');
                in_ws = true;
            }
        } else {
            out.push(ch);
            in_ws = false;
        }
    }
    out
}

/// Where inline content currently lands.
#[derive(Debug, Clone, Copy)]
struct Target {
    index: usize,
    /// Opened on demand for loose text; closed by the next block element.
    implicit: bool,
}

/// What a block-level element hands back to its siblings.
fn after_block(target: Option<Target>) -> Option<Target> {
    target.filter(|t| !t.implicit)
}

struct Converter {
    blocks: Vec<Block>,
    lists: ListContext,
}

impl Converter {
    fn new() -> Self {
        Self {
            blocks: Vec::new(),
            lists: ListContext::new(),
        }
    }

    fn open(&mut self, block: Block, implicit: bool) -> Target {
        self.blocks.push(block);
        Target {
            index: self.blocks.len() - 1,
            implicit,
        }
    }

    fn push_inline(&mut self, inline: Inline, target: Option<Target>) -> Option<Target> {
        let target = match target {
            Some(t) => t,
            None => self.open(Block::Paragraph { runs: Vec::new() }, true),
        };
        if let Some(runs) = self.blocks[target.index].runs_mut() {
            runs.push(inline);
        }
        Some(target)
    }

    fn push_plain_text(&mut self, raw: &str, target: Option<Target>) -> Option<Target> {
        let text = collapse_ws(raw);
        let text = text.trim();
        if text.is_empty() {
            return target;
        }
        self.push_inline(Inline::Run(Run::plain(text)), target)
    }

    fn push_styled_text(
        &mut self,
        buf: &mut String,
        style: RunStyle,
        target: Option<Target>,
    ) -> Option<Target> {
        let text = collapse_ws(buf);
        buf.clear();
        if text.trim().is_empty() {
            return target;
        }
        self.push_inline(Inline::Run(Run::styled(text, style)), target)
    }

    fn walk_all(
        &mut self,
        nodes: &[MarkupNode],
        level: u32,
        kind: Option<ListKind>,
        target: Option<Target>,
    ) -> Option<Target> {
        let mut target = target;
        for n in nodes {
            target = self.walk(n, level, kind, target);
        }
        target
    }

    fn walk(
        &mut self,
        node: &MarkupNode,
        level: u32,
        kind: Option<ListKind>,
        target: Option<Target>,
    ) -> Option<Target> {
        let (node_kind, children) = match node {
            MarkupNode::Text(t) => return self.push_plain_text(t, target),
            MarkupNode::Element { kind, children, .. } => (kind, children),
        };

        match node_kind {
            NodeKind::Heading(h) => {
                let text = collapse_ws(&node.text_content()).trim().to_string();
                self.blocks.push(Block::Heading { level: *h, text });
                after_block(target)
            }
            NodeKind::Paragraph => {
                let para = self.open(Block::Paragraph { runs: Vec::new() }, false);
                self.walk_all(children, level, kind, Some(para));
                after_block(target)
            }
            NodeKind::BulletList | NodeKind::NumberedList => {
                let list_kind = if *node_kind == NodeKind::NumberedList {
                    ListKind::Number
                } else {
                    ListKind::Bullet
                };
                let depth = level + 1;
                self.lists.reset(depth);
                for child in children {
                    if let MarkupNode::Element {
                        kind: NodeKind::ListItem,
                        ..
                    } = child
                    {
                        self.walk(child, depth, Some(list_kind), None);
                    }
                }
                after_block(target)
            }
            NodeKind::ListItem => {
                // a stray <li> outside any list renders as a top-level bullet
                let (level, list_kind) = match kind {
                    Some(k) if level > 0 => (level, k),
                    _ => (1, ListKind::Bullet),
                };
                let ordinal = match list_kind {
                    ListKind::Number => Some(self.lists.next(level)),
                    ListKind::Bullet => None,
                };
                let item = self.open(
                    Block::ListItem {
                        level,
                        ordinal,
                        kind: list_kind,
                        runs: Vec::new(),
                    },
                    false,
                );
                self.walk_all(children, level, Some(list_kind), Some(item));
                after_block(target)
            }
            NodeKind::LineBreak => match target {
                Some(_) => self.push_inline(Inline::LineBreak, target),
                None => None,
            },
            NodeKind::Bold | NodeKind::Italic | NodeKind::Underline => {
                let style = RunStyle::for_kind(node_kind).unwrap_or_default();
                self.walk_styled(children, style, level, kind, target)
            }
            NodeKind::Other(_) => self.walk_all(children, level, kind, target),
        }
    }

    /// Flatten a style element's text into runs carrying only `style`.
    /// Nested style elements and line breaks split the run and are handled on
    /// their own, so the innermost style tag decides the flags of its text.
    fn walk_styled(
        &mut self,
        children: &[MarkupNode],
        style: RunStyle,
        level: u32,
        kind: Option<ListKind>,
        target: Option<Target>,
    ) -> Option<Target> {
        let mut target = target;
        let mut buf = String::new();
        for child in children {
            match child {
                MarkupNode::Element { kind: k, .. }
                    if k.is_inline_style() || *k == NodeKind::LineBreak =>
                {
                    target = self.push_styled_text(&mut buf, style, target);
                    target = self.walk(child, level, kind, target);
                }
                other => buf.push_str(&other.text_content()),
            }
        }
        self.push_styled_text(&mut buf, style, target)
    }
}

/// Convert parsed markup into document blocks. Never fails.
pub fn convert(nodes: &[MarkupNode]) -> Vec<Block> {
    let mut converter = Converter::new();
    converter.walk_all(nodes, 0, None, None);
    converter.blocks
}

/// Parse and convert an editor fragment in one step.
pub fn convert_markup(markup: &str) -> Vec<Block> {
    convert(&crate::markup::parse(markup))
}
