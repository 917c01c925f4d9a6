//! HTML parser – converts a cover-note markup string into a raw DOM tree.
//!
//! The input comes from a rich-text editor, so it is mostly well formed, but
//! nothing here may fail: unterminated tags, stray closing tags, unknown
//! attributes and plain binary noise all degrade to *some* tree.
//!
//! Recognised names are kept as typed [`Tag`]s; everything else is carried as
//! [`Tag::Unknown`] so later stages can strip it while keeping its text.

use std::collections::HashMap;

/// Nesting beyond this depth is flattened instead of recursed into.
const MAX_DEPTH: usize = 256;

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

/// The tag name of an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    P,
    H1,
    H2,
    H3,
    Ul,
    Ol,
    Li,
    Strong,
    B,
    Em,
    I,
    U,
    Br,
    Hr,
    /// Catch-all for unknown tags – kept so their text survives.
    Unknown(String),
}

impl Tag {
    pub fn from_name(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "p" => Tag::P,
            "h1" => Tag::H1,
            "h2" => Tag::H2,
            "h3" => Tag::H3,
            "ul" => Tag::Ul,
            "ol" => Tag::Ol,
            "li" => Tag::Li,
            "strong" => Tag::Strong,
            "b" => Tag::B,
            "em" => Tag::Em,
            "i" => Tag::I,
            "u" => Tag::U,
            "br" => Tag::Br,
            "hr" => Tag::Hr,
            other => Tag::Unknown(other.to_string()),
        }
    }

    /// Block tags that start a new top-level block.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Tag::P | Tag::H1 | Tag::H2 | Tag::H3 | Tag::Ul | Tag::Ol
        )
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Tag::Ul | Tag::Ol)
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, Tag::H1 | Tag::H2 | Tag::H3)
    }

    /// Elements that never have content.
    pub fn is_void(&self) -> bool {
        match self {
            Tag::Br | Tag::Hr => true,
            Tag::Unknown(name) => matches!(
                name.as_str(),
                "img" | "input" | "meta" | "link" | "wbr" | "col" | "area" | "base" | "source"
            ),
            _ => false,
        }
    }
}

/// A node in our DOM tree.
#[derive(Debug, Clone, PartialEq)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

/// An element node carrying tag, attributes, and children.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub tag: Tag,
    pub attributes: HashMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn inline_style(&self) -> Option<&str> {
        self.attributes.get("style").map(|s| s.as_str())
    }

    /// True when any descendant is a block element.
    pub fn has_block_descendant(&self) -> bool {
        self.children.iter().any(|child| match child {
            DomNode::Element(e) => e.tag.is_block() || e.has_block_descendant(),
            DomNode::Text(_) => false,
        })
    }

    /// True if any descendant is a list or a list item.
    pub fn has_list_content(&self) -> bool {
        self.children.iter().any(|child| match child {
            DomNode::Element(e) => e.tag.is_list() || e.tag == Tag::Li || e.has_list_content(),
            DomNode::Text(_) => false,
        })
    }
}

// ---------------------------------------------------------------------------
// Parser – recursive descent with an explicit open-element stack
// ---------------------------------------------------------------------------

/// Parse a markup string into a list of DOM nodes.
///
/// Closing tags close the nearest matching open element; closing tags that
/// match nothing are dropped. A block start tag implicitly closes an open
/// `<p>` or heading, and `<li>` closes an open `<li>` of the same list.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    let mut parser = Parser::new(html);
    let mut nodes = Vec::new();
    // Top level never returns early on closing tags, but keep scanning until
    // the input is exhausted in case a nested level bailed out.
    while !parser.eof() {
        let before = parser.pos;
        nodes.extend(parser.parse_nodes());
        if parser.pos == before {
            // Stray content the nested levels refused; consume one char.
            parser.advance(1);
        }
    }
    nodes
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    open: Vec<Tag>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            open: Vec::new(),
        }
    }

    fn parse_nodes(&mut self) -> Vec<DomNode> {
        let mut nodes = Vec::new();
        while !self.eof() {
            if self.starts_with("</") {
                if self.handle_closing_tag() {
                    break;
                }
                continue;
            }
            if self.starts_with("<!--") {
                self.skip_comment();
                continue;
            }
            if self.starts_with("<!") || self.starts_with("<?") {
                self.skip_past('>');
                continue;
            }
            if self.at_start_tag() {
                let tag = Tag::from_name(&self.peek_tag_name());
                if self.closed_by(&tag) {
                    break;
                }
                if let Some(node) = self.parse_element(tag) {
                    nodes.push(node);
                }
                continue;
            }
            nodes.push(self.parse_text());
        }
        nodes
    }

    /// Returns `true` when the current level must return to its caller.
    fn handle_closing_tag(&mut self) -> bool {
        let saved = self.pos;
        self.advance(2);
        let name = self.parse_tag_name();
        let tag = Tag::from_name(&name);

        match self.open.iter().rposition(|t| *t == tag) {
            Some(idx) if !name.is_empty() && idx + 1 == self.open.len() => {
                self.skip_past('>');
                true
            }
            Some(_) if !name.is_empty() => {
                // An ancestor's closing tag – unwind and let it consume it.
                self.pos = saved;
                true
            }
            _ => {
                log::debug!("dropping stray closing tag </{name}>");
                self.skip_past('>');
                false
            }
        }
    }

    /// Whether an incoming start tag implicitly closes the innermost open
    /// element (or one of its inline ancestors up to a list boundary).
    fn closed_by(&self, incoming: &Tag) -> bool {
        if incoming.is_block() {
            for open in self.open.iter().rev() {
                if *open == Tag::P || open.is_heading() {
                    return true;
                }
                if open.is_list() || *open == Tag::Li {
                    return false;
                }
            }
        }
        if *incoming == Tag::Li {
            for open in self.open.iter().rev() {
                if *open == Tag::Li {
                    return true;
                }
                if open.is_list() {
                    return false;
                }
            }
        }
        false
    }

    fn parse_text(&mut self) -> DomNode {
        let start = self.pos;
        // Always take at least one char so a lone '<' becomes text.
        self.advance(1);
        while !self.eof() && !self.at_markup() {
            self.advance(1);
        }
        DomNode::Text(decode_entities(&self.input[start..self.pos]))
    }

    fn parse_element(&mut self, tag: Tag) -> Option<DomNode> {
        // Consume '<' and the name
        self.advance(1);
        self.parse_tag_name();
        let mut elem = ElementNode::new(tag.clone());

        // Parse attributes
        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let before = self.pos;
            let (key, value) = self.parse_attribute();
            if !key.is_empty() {
                elem.attributes.insert(key.to_ascii_lowercase(), value);
            }
            if self.pos == before {
                // Junk such as `<p "x">`; step over it.
                self.advance(1);
            }
        }

        if self.starts_with("/>") {
            self.advance(2);
            return Some(DomNode::Element(elem));
        }
        if self.starts_with(">") {
            self.advance(1);
        }
        if tag.is_void() {
            return Some(DomNode::Element(elem));
        }
        if self.open.len() >= MAX_DEPTH {
            // Too deep: drop the wrapper, its content continues as siblings.
            log::debug!("nesting limit reached, flattening <{tag:?}>");
            return None;
        }

        self.open.push(tag);
        elem.children = self.parse_nodes();
        self.open.pop();

        Some(DomNode::Element(elem))
    }

    fn peek_tag_name(&self) -> String {
        let rest = &self.input[self.pos + 1..];
        rest.chars()
            .take_while(|c| is_name_char(*c))
            .collect()
    }

    fn parse_tag_name(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.current_char() {
            if is_name_char(c) {
                self.advance(1);
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_attribute(&mut self) -> (String, String) {
        let key = self.parse_tag_name();
        self.skip_whitespace();
        if !self.starts_with("=") {
            return (key, String::new());
        }
        self.advance(1); // skip '='
        self.skip_whitespace();
        let value = self.parse_attr_value();
        (key, value)
    }

    fn parse_attr_value(&mut self) -> String {
        for quote in ['"', '\''] {
            if self.current_char() == Some(quote) {
                self.advance(1);
                let start = self.pos;
                while !self.eof() && self.current_char() != Some(quote) {
                    self.advance(1);
                }
                let val = decode_entities(&self.input[start..self.pos]);
                if !self.eof() {
                    self.advance(1);
                }
                return val;
            }
        }
        let start = self.pos;
        while let Some(c) = self.current_char() {
            if c.is_whitespace() || c == '>' {
                break;
            }
            if c == '/' && self.input[self.pos..].starts_with("/>") {
                break;
            }
            self.advance(1);
        }
        decode_entities(&self.input[start..self.pos])
    }

    /// `<` followed by a name character.
    fn at_start_tag(&self) -> bool {
        self.starts_with("<")
            && self.input[self.pos + 1..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic())
    }

    /// Anything the node loop treats as markup rather than text.
    fn at_markup(&self) -> bool {
        if !self.starts_with("<") {
            return false;
        }
        match self.input[self.pos + 1..].chars().next() {
            Some(c) => c.is_ascii_alphabetic() || c == '/' || c == '!' || c == '?',
            None => false,
        }
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.advance(1);
        }
    }

    fn skip_past(&mut self, end: char) {
        while let Some(c) = self.current_char() {
            self.advance(1);
            if c == end {
                break;
            }
        }
    }

    fn skip_comment(&mut self) {
        self.advance(4); // skip <!--
        while !self.eof() && !self.starts_with("-->") {
            self.advance(1);
        }
        if !self.eof() {
            self.advance(3);
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn current_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self, n: usize) {
        // Advance by `n` characters (not bytes).
        for _ in 0..n {
            if let Some(c) = self.current_char() {
                self.pos += c.len_utf8();
            }
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':'
}

/// Decode the handful of named entities editors emit plus numeric references.
/// Unrecognised entities are left as written.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: &DomNode) -> &ElementNode {
        match node {
            DomNode::Element(e) => e,
            DomNode::Text(t) => panic!("Expected element, got text {t:?}"),
        }
    }

    #[test]
    fn parse_paragraph_with_style() {
        let html = r#"<p style="text-align: center">Hello</p>"#;
        let nodes = parse_html(html);
        assert_eq!(nodes.len(), 1);
        let p = element(&nodes[0]);
        assert_eq!(p.tag, Tag::P);
        assert_eq!(p.inline_style(), Some("text-align: center"));
        assert_eq!(p.children, vec![DomNode::Text("Hello".into())]);
    }

    #[test]
    fn tag_names_are_case_insensitive() {
        let nodes = parse_html("<P><STRONG>x</STRONG></P>");
        let p = element(&nodes[0]);
        assert_eq!(p.tag, Tag::P);
        assert_eq!(element(&p.children[0]).tag, Tag::Strong);
    }

    #[test]
    fn parse_nested_inline() {
        let nodes = parse_html("<p>Hello <span class=\"x\">world</span>!</p>");
        let p = element(&nodes[0]);
        assert_eq!(p.children.len(), 3); // "Hello ", <span>, "!"
    }

    #[test]
    fn unterminated_tags_close_at_end() {
        let nodes = parse_html("<p>open <b>bold");
        assert_eq!(nodes.len(), 1);
        let p = element(&nodes[0]);
        assert_eq!(element(&p.children[1]).tag, Tag::B);
    }

    #[test]
    fn block_start_closes_open_paragraph() {
        let nodes = parse_html("<p>one<p>two<ul><li>x</ul>");
        let tags: Vec<_> = nodes.iter().map(|n| element(n).tag.clone()).collect();
        assert_eq!(tags, vec![Tag::P, Tag::P, Tag::Ul]);
    }

    #[test]
    fn li_closes_previous_li() {
        let nodes = parse_html("<ul><li>a<li>b</ul>");
        let ul = element(&nodes[0]);
        assert_eq!(ul.children.len(), 2);
    }

    #[test]
    fn nested_li_stays_nested() {
        let nodes = parse_html("<ul><li>a<ul><li>b</li></ul></li><li>c</li></ul>");
        let ul = element(&nodes[0]);
        assert_eq!(ul.children.len(), 2);
        let first = element(&ul.children[0]);
        assert_eq!(element(&first.children[1]).tag, Tag::Ul);
    }

    #[test]
    fn stray_closing_tag_is_dropped() {
        let nodes = parse_html("<p>a</b>b</p>");
        let p = element(&nodes[0]);
        assert_eq!(
            p.children,
            vec![DomNode::Text("a".into()), DomNode::Text("b".into())]
        );
    }

    #[test]
    fn mismatched_close_unwinds_to_ancestor() {
        let nodes = parse_html("<p><b>x</p><p>y</p>");
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn lone_angle_bracket_is_text() {
        let nodes = parse_html("a < b");
        let text: String = nodes
            .iter()
            .map(|n| match n {
                DomNode::Text(t) => t.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(text, "a < b");
    }

    #[test]
    fn junk_attributes_do_not_hang() {
        let nodes = parse_html(r#"<p "x" =y data-a>t</p>"#);
        assert_eq!(element(&nodes[0]).tag, Tag::P);
    }

    #[test]
    fn comments_and_doctype_skipped() {
        let nodes = parse_html("<!DOCTYPE html><!-- c --><p>x</p>");
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn deep_nesting_does_not_overflow() {
        let html = "<span>".repeat(10_000) + "deep";
        let nodes = parse_html(&html);
        assert!(!nodes.is_empty());
    }

    #[test]
    fn entities_decoded_once() {
        assert_eq!(decode_entities("&amp;lt; &lt;b&gt; &#228;&#xE4;"), "&lt; <b> ää");
        assert_eq!(decode_entities("AT&T &bogus;"), "AT&T &bogus;");
    }

    #[test]
    fn binary_noise_never_panics() {
        let noise = "\u{0}<\u{1}</<<>>&#xFFFFFFFF;<p<ä>ö</\u{7f}";
        let _ = parse_html(noise);
    }
}
