//! Cover page body – the compiled note followed by the list of attached
//! documents.

use crate::blocks::{compile, LayoutPrimitive};
use crate::inline::StyledRun;
use crate::layout_config::mm;
use crate::markup::{parse, Alignment, HeadingLevel};

pub const ATTACHMENTS_HEADING: &str = "Attached Documents:";

/// What the core needs to describe one cover page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionRequest {
    /// Rich-text markup of the note.
    pub markup: String,
    /// Display names of the attached documents, in merge order.
    pub document_names: Vec<String>,
}

impl ConversionRequest {
    pub fn new(markup: impl Into<String>, document_names: Vec<String>) -> Self {
        Self {
            markup: markup.into(),
            document_names,
        }
    }
}

/// Build the full ordered content of the cover page body.
///
/// Names are opaque display text: they go into plain runs and are never
/// interpreted as markup.
pub fn cover_primitives(request: &ConversionRequest) -> Vec<LayoutPrimitive> {
    let blocks = parse(&request.markup);
    let mut out = compile(&blocks);
    log::debug!(
        "compiled {} blocks into {} primitives",
        blocks.len(),
        out.len()
    );

    if request.document_names.is_empty() {
        return out;
    }

    out.push(LayoutPrimitive::Spacer { height: mm(10.0) });
    out.push(LayoutPrimitive::Heading {
        level: HeadingLevel::H2,
        run: StyledRun::plain(ATTACHMENTS_HEADING),
        alignment: Alignment::Left,
    });
    out.push(LayoutPrimitive::Spacer { height: mm(3.0) });

    for (i, name) in request.document_names.iter().enumerate() {
        out.push(LayoutPrimitive::Paragraph {
            run: StyledRun::plain(format!("{}. {}", i + 1, name)),
            alignment: Alignment::Left,
        });
        out.push(LayoutPrimitive::Spacer { height: mm(1.0) });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(primitives: &[LayoutPrimitive]) -> Vec<String> {
        primitives
            .iter()
            .filter_map(|p| p.run().map(StyledRun::plain_text))
            .collect()
    }

    #[test]
    fn no_documents_no_section() {
        let out = cover_primitives(&ConversionRequest::new("<p>Hi</p>", vec![]));
        assert_eq!(texts(&out), vec!["Hi"]);
    }

    #[test]
    fn documents_listed_in_call_order() {
        let req = ConversionRequest::new(
            "<p>Hi</p>",
            vec!["b.pdf".to_string(), "a.pdf".to_string()],
        );
        let out = cover_primitives(&req);
        assert_eq!(
            texts(&out),
            vec!["Hi", ATTACHMENTS_HEADING, "1. b.pdf", "2. a.pdf"]
        );
    }

    #[test]
    fn names_are_not_markup() {
        let req = ConversionRequest::new("", vec!["<b>x</b> & y.pdf".to_string()]);
        let out = cover_primitives(&req);
        let last = texts(&out).pop().unwrap();
        assert_eq!(last, "1. <b>x</b> & y.pdf");
    }
}
