//! Inline formatter – flattens a block's inline content into a [`StyledRun`].

use serde::{Deserialize, Serialize};

use crate::markup::{ElementKind, Emphasis, MarkupNode};

/// Style flags of one text segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl TextStyle {
    pub const PLAIN: TextStyle = TextStyle {
        bold: false,
        italic: false,
        underline: false,
    };

    pub const BOLD: TextStyle = TextStyle {
        bold: true,
        italic: false,
        underline: false,
    };

    pub fn with(self, emphasis: Emphasis) -> Self {
        match emphasis {
            Emphasis::Bold => Self { bold: true, ..self },
            Emphasis::Italic => Self {
                italic: true,
                ..self
            },
            Emphasis::Underline => Self {
                underline: true,
                ..self
            },
        }
    }

    /// Union of both flag sets.
    pub fn union(self, other: TextStyle) -> Self {
        Self {
            bold: self.bold || other.bold,
            italic: self.italic || other.italic,
            underline: self.underline || other.underline,
        }
    }

    pub fn is_plain(self) -> bool {
        self == Self::PLAIN
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyledSegment {
    pub text: String,
    pub style: TextStyle,
}

/// Inline text annotated with bold/italic/underline spans.
///
/// Segments are never empty and neighbouring segments never share a style.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StyledRun {
    segments: Vec<StyledSegment>,
}

impl StyledRun {
    /// A single unstyled segment (empty text gives an empty run).
    pub fn plain(text: impl Into<String>) -> Self {
        let mut run = Self::default();
        run.push(&text.into(), TextStyle::PLAIN);
        run
    }

    pub fn push(&mut self, text: &str, style: TextStyle) {
        if text.is_empty() {
            return;
        }
        match self.segments.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.segments.push(StyledSegment {
                text: text.to_string(),
                style,
            }),
        }
    }

    pub fn segments(&self) -> &[StyledSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Concatenated text without styling.
    pub fn plain_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Add `extra` flags to every segment (headings render bold throughout).
    pub fn with_style(&self, extra: TextStyle) -> Self {
        let mut run = Self::default();
        for seg in &self.segments {
            run.push(&seg.text, seg.style.union(extra));
        }
        run
    }

    /// Trim whitespace at the run's outer boundary only.
    fn trimmed(mut self) -> Self {
        while let Some(first) = self.segments.first_mut() {
            let trimmed = first.text.trim_start().to_string();
            if trimmed.is_empty() {
                self.segments.remove(0);
            } else {
                first.text = trimmed;
                break;
            }
        }
        while let Some(last) = self.segments.last_mut() {
            let len = last.text.trim_end().len();
            if len == 0 {
                self.segments.pop();
            } else {
                last.text.truncate(len);
                break;
            }
        }
        self
    }
}

/// Format a node's inline content.
///
/// Emphasis composes as it nests, unsupported tags are transparent and
/// nested lists are skipped (they are not inline content). The result is
/// trimmed at its outer edges; interior whitespace is kept as written.
pub fn format(node: &MarkupNode) -> StyledRun {
    let mut run = StyledRun::default();
    collect(node, TextStyle::PLAIN, &mut run);
    run.trimmed()
}

fn collect(node: &MarkupNode, style: TextStyle, run: &mut StyledRun) {
    match node {
        MarkupNode::Text(text) => run.push(text, style),
        MarkupNode::Element(e) => {
            let style = match e.kind {
                ElementKind::Emphasis(emphasis) => style.with(emphasis),
                ElementKind::UnorderedList | ElementKind::OrderedList => return,
                _ => style,
            };
            for child in &e.children {
                collect(child, style, run);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse;

    fn first_block(markup: &str) -> StyledRun {
        format(&parse(markup)[0])
    }

    const B: TextStyle = TextStyle::BOLD;

    #[test]
    fn nested_emphasis_composes() {
        let run = first_block("<p><strong>a<em>b</em></strong>c</p>");
        let segs: Vec<_> = run
            .segments()
            .iter()
            .map(|s| (s.text.as_str(), s.style))
            .collect();
        assert_eq!(
            segs,
            vec![
                ("a", B),
                (
                    "b",
                    TextStyle {
                        bold: true,
                        italic: true,
                        underline: false
                    }
                ),
                ("c", TextStyle::PLAIN),
            ]
        );
        assert_eq!(run.plain_text(), "abc");
    }

    #[test]
    fn unknown_tags_are_transparent() {
        let run = first_block(r#"<p><span class="x">hi</span> there</p>"#);
        assert_eq!(run.segments().len(), 1);
        assert_eq!(run.plain_text(), "hi there");
        assert!(run.segments()[0].style.is_plain());
    }

    #[test]
    fn outer_whitespace_trimmed_inner_kept() {
        let run = first_block("<p>  <b> a </b>  b  c  </p>");
        assert_eq!(run.plain_text(), "a   b  c");
        assert_eq!(run.segments()[0].text, "a ");
    }

    #[test]
    fn whitespace_only_gives_empty_run() {
        assert!(first_block("<p> <i>  </i> </p>").is_empty());
    }

    #[test]
    fn underline_and_synonyms() {
        let run = first_block("<p><b>x</b><strong>y</strong><i>z</i><u>w</u></p>");
        let segs = run.segments();
        assert_eq!(segs[0].text, "xy");
        assert!(segs[0].style.bold);
        assert!(segs[1].style.italic);
        assert!(segs[2].style.underline);
    }

    #[test]
    fn with_style_merges_segments() {
        let mut run = StyledRun::default();
        run.push("a", TextStyle::PLAIN);
        run.push("b", B);
        let bold = run.with_style(B);
        assert_eq!(bold.segments().len(), 1);
        assert_eq!(bold.plain_text(), "ab");
    }
}
