//! List renderer – expands (possibly nested) lists into a flat, pre-order
//! sequence of indented list-item blocks.

use serde::{Deserialize, Serialize};

use crate::blocks::LayoutPrimitive;
use crate::inline::format;
use crate::layout_config::PT_PER_MM;
use crate::markup::{Alignment, ElementKind, MarkupElement, MarkupNode};

pub const BULLET: &str = "\u{2022}";

/// Indent of a top-level item, in points.
pub const LIST_BASE_INDENT_PT: f32 = 10.0 * PT_PER_MM;

/// Additional indent per nesting level, in points.
pub const LIST_LEVEL_INDENT_PT: f32 = 6.0 * PT_PER_MM;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ListMarker {
    Bullet,
    Ordinal(u32),
    /// Item text that resumes after a nested list; drawn without a marker.
    Continuation,
}

impl ListMarker {
    pub fn label(&self) -> String {
        match self {
            ListMarker::Bullet => BULLET.to_string(),
            ListMarker::Ordinal(n) => format!("{n}."),
            ListMarker::Continuation => String::new(),
        }
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self, ListMarker::Continuation)
    }
}

/// Left indentation of an item at `depth` (0 = top-level list).
pub fn indent_for_depth(depth: usize) -> f32 {
    LIST_BASE_INDENT_PT + depth as f32 * LIST_LEVEL_INDENT_PT
}

/// Render a list node. Anything that is not a list renders to nothing.
pub fn render(list: &MarkupNode, depth: usize) -> Vec<LayoutPrimitive> {
    let mut out = Vec::new();
    if let Some(list) = list.as_element().filter(|e| e.kind.is_list()) {
        render_into(list, depth, &mut out);
    }
    out
}

/// Each list gets its own counter; ordinals advance only for emitted items.
///
/// An item's own text is what precedes its first nested list. Text that
/// follows a nested list is emitted after the nested items, at the item's
/// depth, as a [`ListMarker::Continuation`].
fn render_into(list: &MarkupElement, depth: usize, out: &mut Vec<LayoutPrimitive>) {
    let ordered = list.kind == ElementKind::OrderedList;
    let mut counter = 0u32;

    for child in &list.children {
        let Some(item) = child.as_element() else {
            continue;
        };

        let mut segment_start = 0;
        let mut lead = true;
        for (i, node) in item.children.iter().enumerate() {
            let Some(nested) = node.as_element().filter(|e| e.kind.is_list()) else {
                continue;
            };
            let segment = &item.children[segment_start..i];
            push_segment(segment, lead, ordered, &mut counter, depth, out);
            lead = false;
            segment_start = i + 1;
            render_into(nested, depth + 1, out);
        }
        let segment = &item.children[segment_start..];
        push_segment(segment, lead, ordered, &mut counter, depth, out);
    }
}

fn push_segment(
    nodes: &[MarkupNode],
    lead: bool,
    ordered: bool,
    counter: &mut u32,
    depth: usize,
    out: &mut Vec<LayoutPrimitive>,
) {
    let run = format(&MarkupNode::element(
        ElementKind::ListItem,
        Alignment::Left,
        nodes.to_vec(),
    ));
    if run.is_empty() {
        return;
    }
    let marker = if !lead {
        ListMarker::Continuation
    } else if ordered {
        *counter += 1;
        ListMarker::Ordinal(*counter)
    } else {
        ListMarker::Bullet
    };
    out.push(LayoutPrimitive::ListItem { run, depth, marker });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse;

    fn items(markup: &str) -> Vec<(String, usize, String)> {
        render(&parse(markup)[0], 0)
            .into_iter()
            .map(|p| match p {
                LayoutPrimitive::ListItem { run, depth, marker } => {
                    (run.plain_text(), depth, marker.label())
                }
                other => panic!("unexpected primitive {other:?}"),
            })
            .collect()
    }

    #[test]
    fn nested_bullets_pre_order() {
        let html = r#"
            <ul>
                <li>bullet
                    <ul>
                        <li>bullet down</li>
                        <li>bullown2</li>
                    </ul>
                </li>
                <li>nex tlbt</li>
            </ul>"#;
        assert_eq!(
            items(html),
            vec![
                ("bullet".into(), 0, BULLET.into()),
                ("bullet down".into(), 1, BULLET.into()),
                ("bullown2".into(), 1, BULLET.into()),
                ("nex tlbt".into(), 0, BULLET.into()),
            ]
        );
    }

    #[test]
    fn ordinals_reset_per_list() {
        let html = "<ol><li>a<ol><li>x</li><li>y</li></ol></li><li>b</li></ol>";
        let labels: Vec<_> = items(html).into_iter().map(|(t, _, m)| format!("{m} {t}")).collect();
        assert_eq!(labels, vec!["1. a", "1. x", "2. y", "2. b"]);
    }

    #[test]
    fn empty_items_are_skipped_without_consuming_numbers() {
        let html = "<ol><li> </li><li>first</li><li></li><li>second</li></ol>";
        let labels: Vec<_> = items(html).into_iter().map(|(_, _, m)| m).collect();
        assert_eq!(labels, vec!["1.", "2."]);
    }

    #[test]
    fn empty_item_still_renders_nested_list() {
        let html = "<ul><li><ol><li>inner</li></ol></li></ul>";
        assert_eq!(items(html), vec![("inner".into(), 1, "1.".into())]);
    }

    #[test]
    fn text_after_nested_list_follows_nested_items() {
        let html = "<ol><li>a<ul><li>x</li></ul>tail</li><li>b</li></ol>";
        assert_eq!(
            items(html),
            vec![
                ("a".into(), 0, "1.".into()),
                ("x".into(), 1, BULLET.into()),
                ("tail".into(), 0, String::new()),
                ("b".into(), 0, "2.".into()),
            ]
        );
    }

    #[test]
    fn item_opening_with_nested_list_gets_no_number() {
        let html = "<ol><li><ol><li>x</li></ol>tail</li><li>b</li></ol>";
        let got = render(&parse(html)[0], 0);
        let markers: Vec<_> = got
            .iter()
            .map(|p| match p {
                LayoutPrimitive::ListItem { depth, marker, .. } => (*depth, *marker),
                other => panic!("unexpected primitive {other:?}"),
            })
            .collect();
        assert_eq!(
            markers,
            vec![
                (1, ListMarker::Ordinal(1)),
                (0, ListMarker::Continuation),
                (0, ListMarker::Ordinal(1)),
            ]
        );
    }

    #[test]
    fn text_between_two_nested_lists_stays_in_place() {
        let html = "<ul><li>a<ul><li>x</li></ul>mid<ol><li>y</li></ol></li></ul>";
        let texts: Vec<_> = items(html).into_iter().map(|(t, d, _)| (t, d)).collect();
        assert_eq!(
            texts,
            vec![
                ("a".into(), 0),
                ("x".into(), 1),
                ("mid".into(), 0),
                ("y".into(), 1),
            ]
        );
    }

    #[test]
    fn all_empty_list_renders_nothing() {
        assert!(render(&parse("<ul><li></li><li>  </li></ul>")[0], 0).is_empty());
    }

    #[test]
    fn indentation_grows_with_depth() {
        assert!(indent_for_depth(0) > 0.0);
        assert!(indent_for_depth(1) > indent_for_depth(0));
        assert!(
            (indent_for_depth(2) - indent_for_depth(1) - (indent_for_depth(1) - indent_for_depth(0)))
                .abs()
                < 1e-4
        );
    }

    #[test]
    fn non_list_renders_nothing() {
        assert!(render(&parse("<p>x</p>")[0], 0).is_empty());
    }
}
