//! Block-to-layout compiler – turns parsed top-level blocks into the ordered
//! layout primitives consumed by the page composer.

use serde::{Deserialize, Serialize};

use crate::inline::{format, StyledRun};
use crate::layout_config::mm;
use crate::lists::{self, indent_for_depth, ListMarker};
use crate::markup::{Alignment, ElementKind, HeadingLevel, MarkupNode};

/// One unit of cover-page content, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutPrimitive {
    Heading {
        level: HeadingLevel,
        run: StyledRun,
        alignment: Alignment,
    },
    Paragraph {
        run: StyledRun,
        alignment: Alignment,
    },
    ListItem {
        run: StyledRun,
        depth: usize,
        marker: ListMarker,
    },
    /// Vertical space in points.
    Spacer { height: f32 },
}

impl LayoutPrimitive {
    pub fn run(&self) -> Option<&StyledRun> {
        match self {
            LayoutPrimitive::Heading { run, .. }
            | LayoutPrimitive::Paragraph { run, .. }
            | LayoutPrimitive::ListItem { run, .. } => Some(run),
            LayoutPrimitive::Spacer { .. } => None,
        }
    }

    pub fn alignment(&self) -> Alignment {
        match self {
            LayoutPrimitive::Heading { alignment, .. }
            | LayoutPrimitive::Paragraph { alignment, .. } => *alignment,
            _ => Alignment::Left,
        }
    }

    /// Left indentation in points.
    pub fn indent(&self) -> f32 {
        match self {
            LayoutPrimitive::ListItem { depth, .. } => indent_for_depth(*depth),
            _ => 0.0,
        }
    }
}

/// Space after a heading, shrinking with the level.
pub fn heading_spacing(level: HeadingLevel) -> f32 {
    match level {
        HeadingLevel::H1 => mm(6.0),
        HeadingLevel::H2 => mm(4.0),
        HeadingLevel::H3 => mm(3.0),
    }
}

pub fn paragraph_spacing() -> f32 {
    mm(2.0)
}

pub fn list_spacing() -> f32 {
    mm(2.0)
}

/// Compile top-level blocks in order. Blocks without visible text emit
/// nothing, not even their trailing spacer.
pub fn compile(blocks: &[MarkupNode]) -> Vec<LayoutPrimitive> {
    let mut out = Vec::new();
    for block in blocks {
        let Some(element) = block.as_element() else {
            // The parser wraps loose text, but be lenient with hand-built trees.
            let run = format(block);
            if !run.is_empty() {
                out.push(LayoutPrimitive::Paragraph {
                    run,
                    alignment: Alignment::Left,
                });
                out.push(LayoutPrimitive::Spacer {
                    height: paragraph_spacing(),
                });
            }
            continue;
        };

        match element.kind {
            ElementKind::Heading(level) => {
                let run = format(block);
                if run.is_empty() {
                    log::debug!("dropping empty h{}", level.number());
                    continue;
                }
                out.push(LayoutPrimitive::Heading {
                    level,
                    run,
                    alignment: element.alignment,
                });
                out.push(LayoutPrimitive::Spacer {
                    height: heading_spacing(level),
                });
            }
            ElementKind::UnorderedList | ElementKind::OrderedList => {
                let items = lists::render(block, 0);
                if !items.is_empty() {
                    out.extend(items);
                    out.push(LayoutPrimitive::Spacer {
                        height: list_spacing(),
                    });
                }
            }
            _ => {
                let run = format(block);
                if !run.is_empty() {
                    out.push(LayoutPrimitive::Paragraph {
                        run,
                        alignment: element.alignment,
                    });
                    out.push(LayoutPrimitive::Spacer {
                        height: paragraph_spacing(),
                    });
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse;

    fn compile_str(markup: &str) -> Vec<LayoutPrimitive> {
        compile(&parse(markup))
    }

    #[test]
    fn heading_spacers_shrink_with_level() {
        let out = compile_str("<h1>a</h1><h2>b</h2><h3>c</h3>");
        let spacers: Vec<f32> = out
            .iter()
            .filter_map(|p| match p {
                LayoutPrimitive::Spacer { height } => Some(*height),
                _ => None,
            })
            .collect();
        assert_eq!(spacers.len(), 3);
        assert!(spacers[0] > spacers[1] && spacers[1] > spacers[2]);
    }

    #[test]
    fn each_block_followed_by_spacer() {
        let out = compile_str("<p>a</p><ul><li>x</li><li>y</li></ul>");
        assert_eq!(out.len(), 5);
        assert!(matches!(out[0], LayoutPrimitive::Paragraph { .. }));
        assert!(matches!(out[1], LayoutPrimitive::Spacer { .. }));
        assert!(matches!(out[2], LayoutPrimitive::ListItem { .. }));
        assert!(matches!(out[3], LayoutPrimitive::ListItem { .. }));
        assert!(matches!(out[4], LayoutPrimitive::Spacer { .. }));
    }

    #[test]
    fn empty_blocks_emit_nothing() {
        assert!(compile_str("<p>  </p><h1></h1><ul><li></li></ul>").is_empty());
    }

    #[test]
    fn alignment_carried_to_primitive() {
        let out = compile_str(r#"<h2 style="text-align:right">T</h2>"#);
        assert_eq!(out[0].alignment(), Alignment::Right);
    }

    #[test]
    fn duplicates_are_kept() {
        let out = compile_str("<p>same</p><p>same</p>");
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn list_item_indent_uses_depth() {
        let out = compile_str("<ul><li>a<ul><li>b</li></ul></li></ul>");
        assert!(out[1].indent() > out[0].indent());
    }

    #[test]
    fn primitives_serialise_with_kind_tag() {
        let out = compile_str("<p>x</p>");
        let json = serde_json::to_string(&out[0]).unwrap();
        assert!(json.contains("\"kind\":\"paragraph\""));
    }
}
