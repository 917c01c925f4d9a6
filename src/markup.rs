//! Markup parser – classifies the raw DOM into typed cover-note blocks.
//!
//! Only headings (`h1`–`h3`), paragraphs, lists and the `strong`/`b`,
//! `em`/`i`, `u` emphasis tags carry meaning. Every other tag is either
//! transparent (its children are hoisted in place) or becomes a [`Span`]
//! that later contributes its text without any style.
//!
//! Blocks are produced in document order. Because the scan is a single
//! left-to-right tree walk, the block that starts earliest in the source is
//! always emitted first; two blocks can never start at the same offset.
//!
//! [`Span`]: ElementKind::Span

use serde::{Deserialize, Serialize};

use crate::dom::{parse_html, DomNode, ElementNode, Tag};

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    pub fn number(self) -> u8 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
        }
    }
}

/// Horizontal alignment read from an inline `text-align` declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Inline emphasis recognised by the formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emphasis {
    Bold,
    Italic,
    Underline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Heading(HeadingLevel),
    Paragraph,
    UnorderedList,
    OrderedList,
    ListItem,
    Emphasis(Emphasis),
    /// An unsupported inline tag; contributes its text but no style.
    Span,
}

impl ElementKind {
    pub fn is_list(self) -> bool {
        matches!(self, ElementKind::UnorderedList | ElementKind::OrderedList)
    }
}

/// One parsed node of the cover-note grammar.
///
/// Containers hold children and never raw text; text never holds children.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNode {
    Element(MarkupElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkupElement {
    pub kind: ElementKind,
    pub alignment: Alignment,
    pub children: Vec<MarkupNode>,
}

impl MarkupNode {
    pub fn element(kind: ElementKind, alignment: Alignment, children: Vec<MarkupNode>) -> Self {
        MarkupNode::Element(MarkupElement {
            kind,
            alignment,
            children,
        })
    }

    pub fn as_element(&self) -> Option<&MarkupElement> {
        match self {
            MarkupNode::Element(e) => Some(e),
            MarkupNode::Text(_) => None,
        }
    }

    pub fn kind(&self) -> Option<ElementKind> {
        self.as_element().map(|e| e.kind)
    }

    /// All text below this node, untrimmed, in document order.
    pub fn visible_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            MarkupNode::Text(t) => out.push_str(t),
            MarkupNode::Element(e) => e.children.iter().for_each(|c| c.collect_text(out)),
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse cover-note markup into its top-level blocks.
///
/// Never fails: anything unrecognisable degrades to paragraph text, and
/// input without visible text yields no blocks at all.
pub fn parse(markup: &str) -> Vec<MarkupNode> {
    if markup.trim().is_empty() {
        return Vec::new();
    }
    let dom = parse_html(markup);
    let mut builder = BlockBuilder::default();
    builder.push_all(&dom);
    builder.finish()
}

/// Read `text-align` out of a `style` attribute value. The last declaration
/// wins; anything but `center` or `right` means left.
pub fn alignment_from_style(style: &str) -> Alignment {
    let mut alignment = Alignment::Left;
    for decl in style.split(';') {
        let Some((prop, val)) = decl.split_once(':') else {
            continue;
        };
        if prop.trim().eq_ignore_ascii_case("text-align") {
            alignment = match val.trim().to_ascii_lowercase().as_str() {
                "center" => Alignment::Center,
                "right" => Alignment::Right,
                _ => Alignment::Left,
            };
        }
    }
    alignment
}

fn alignment_of(e: &ElementNode) -> Alignment {
    e.inline_style()
        .map(alignment_from_style)
        .unwrap_or_default()
}

/// Accumulates top-level blocks; loose inline content is gathered into an
/// implicit paragraph until the next block starts.
#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<MarkupNode>,
    pending: Vec<MarkupNode>,
}

impl BlockBuilder {
    fn push_all(&mut self, nodes: &[DomNode]) {
        for node in nodes {
            self.push(node);
        }
    }

    fn push(&mut self, node: &DomNode) {
        let e = match node {
            DomNode::Text(t) => {
                self.pending.push(MarkupNode::Text(t.clone()));
                return;
            }
            DomNode::Element(e) => e,
        };

        match &e.tag {
            Tag::H1 | Tag::H2 | Tag::H3 => {
                let level = match e.tag {
                    Tag::H1 => HeadingLevel::H1,
                    Tag::H2 => HeadingLevel::H2,
                    _ => HeadingLevel::H3,
                };
                self.flush();
                self.blocks.push(MarkupNode::element(
                    ElementKind::Heading(level),
                    alignment_of(e),
                    inline_children(&e.children),
                ));
            }
            Tag::P => {
                self.flush();
                self.blocks.push(MarkupNode::element(
                    ElementKind::Paragraph,
                    alignment_of(e),
                    inline_children(&e.children),
                ));
            }
            Tag::Ul | Tag::Ol => {
                self.flush();
                self.blocks.push(list(e));
            }
            Tag::Li => {
                // Stray item outside any list: its own text reads as a
                // paragraph, nested lists still render as lists.
                log::debug!("treating stray <li> as a paragraph");
                self.flush();
                let (lists, inline): (Vec<&DomNode>, Vec<&DomNode>) = e
                    .children
                    .iter()
                    .partition(|c| matches!(c, DomNode::Element(c) if c.tag.is_list()));
                self.pending.extend(inline.into_iter().map(inline_node));
                self.flush();
                for nested in lists {
                    self.push(nested);
                }
            }
            Tag::Hr => self.flush(),
            _ if e.has_block_descendant() => {
                // Unknown wrapper such as <div>: hoist its content.
                self.push_all(&e.children);
            }
            _ => self.pending.push(inline_node(node)),
        }
    }

    fn flush(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        let has_text = pending
            .iter()
            .any(|n| !n.visible_text().trim().is_empty());
        if has_text {
            self.blocks.push(MarkupNode::element(
                ElementKind::Paragraph,
                Alignment::Left,
                pending,
            ));
        }
    }

    fn finish(mut self) -> Vec<MarkupNode> {
        self.flush();
        self.blocks
    }
}

fn inline_children(children: &[DomNode]) -> Vec<MarkupNode> {
    children.iter().map(inline_node).collect()
}

/// Convert any DOM node for use inside a block's inline content.
fn inline_node(node: &DomNode) -> MarkupNode {
    let e = match node {
        DomNode::Text(t) => return MarkupNode::Text(t.clone()),
        DomNode::Element(e) => e,
    };
    let kind = match e.tag {
        Tag::Strong | Tag::B => ElementKind::Emphasis(Emphasis::Bold),
        Tag::Em | Tag::I => ElementKind::Emphasis(Emphasis::Italic),
        Tag::U => ElementKind::Emphasis(Emphasis::Underline),
        Tag::Br => return MarkupNode::Text(" ".to_string()),
        _ => ElementKind::Span,
    };
    MarkupNode::element(kind, Alignment::Left, inline_children(&e.children))
}

fn list(e: &ElementNode) -> MarkupNode {
    let kind = if e.tag == Tag::Ol {
        ElementKind::OrderedList
    } else {
        ElementKind::UnorderedList
    };

    let mut items = Vec::new();
    list_children(&e.children, &mut items);
    MarkupNode::element(kind, Alignment::Left, items)
}

fn list_children(children: &[DomNode], items: &mut Vec<MarkupNode>) {
    for child in children {
        match child {
            DomNode::Element(li) if li.tag == Tag::Li => items.push(list_item(li)),
            DomNode::Element(nested) if nested.tag.is_list() => {
                // `<ul><ul>…</ul></ul>`: an item with no text of its own.
                items.push(MarkupNode::element(
                    ElementKind::ListItem,
                    Alignment::Left,
                    vec![list(nested)],
                ));
            }
            DomNode::Text(t) if t.trim().is_empty() => {}
            // `<ul><div><li>…</li></div></ul>`: the wrapper dissolves.
            DomNode::Element(wrapper) if wrapper.has_list_content() => {
                list_children(&wrapper.children, items)
            }
            other => {
                let node = inline_node(other);
                if !node.visible_text().trim().is_empty() {
                    items.push(MarkupNode::element(
                        ElementKind::ListItem,
                        Alignment::Left,
                        vec![node],
                    ));
                }
            }
        }
    }
}

fn list_item(li: &ElementNode) -> MarkupNode {
    let mut children = Vec::new();
    for child in &li.children {
        push_item_child(&mut children, child);
    }
    MarkupNode::element(ElementKind::ListItem, Alignment::Left, children)
}

/// Item content keeps nested lists as lists; paragraph and heading wrappers
/// (as emitted by rich-text editors) dissolve into inline content.
fn push_item_child(children: &mut Vec<MarkupNode>, node: &DomNode) {
    let DomNode::Element(e) = node else {
        children.push(inline_node(node));
        return;
    };
    if e.tag.is_list() {
        children.push(list(e));
    } else if e.tag == Tag::P || e.tag.is_heading() {
        let has_content = children
            .iter()
            .any(|c| c.kind().map_or(true, |k| !k.is_list()));
        if has_content {
            children.push(MarkupNode::Text(" ".to_string()));
        }
        children.push(MarkupNode::element(
            ElementKind::Span,
            Alignment::Left,
            inline_children(&e.children),
        ));
    } else if !matches!(e.tag, Tag::Strong | Tag::B | Tag::Em | Tag::I | Tag::U)
        && e.has_block_descendant()
    {
        for grandchild in &e.children {
            push_item_child(children, grandchild);
        }
    } else {
        children.push(inline_node(node));
    }
}
