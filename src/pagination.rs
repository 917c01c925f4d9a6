//! Pagination – splits the flat list of positioned boxes into pages.
//!
//! Handles:
//! - page boundaries under per-side margins
//! - text boxes taller than the remaining space (split between lines)
//! - spacers that would open a page (dropped)
//! - per-line alignment and list-marker placement

use serde::{Deserialize, Serialize};

use crate::fonts::{FontManager, WrappedLine};
use crate::inline::TextStyle;
use crate::layout::{BoxContent, PositionedBox};
use crate::layout_config::*;
use crate::markup::Alignment;

/// Gap between a list marker and its item text, in points.
pub const MARKER_GAP_PT: f32 = 6.0;

/// Page margins in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageMargins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Default for PageMargins {
    fn default() -> Self {
        Self {
            top: mm(20.0),
            right: mm(20.0),
            bottom: mm(30.0),
            left: mm(20.0),
        }
    }
}

/// Convert positioned boxes into a paginated LayoutConfig.
pub fn paginate(
    boxes: &[PositionedBox],
    page_width: f32,
    page_height: f32,
    margins: &PageMargins,
    fonts: &FontManager,
    color: [f32; 4],
) -> LayoutConfig {
    let mut config = LayoutConfig {
        page_width_pt: page_width,
        page_height_pt: page_height,
        ..LayoutConfig::a4()
    };

    let content_height = page_height - margins.top - margins.bottom;

    let mut current_page = PageLayout {
        page_index: 0,
        boxes: Vec::new(),
    };

    // Document-space y at which the current page begins. All PositionedBox.y
    // values are absolute document coordinates, so `pbox.y - page_start_doc_y`
    // gives the y-on-page for any box.
    let mut page_start_doc_y = 0.0f32;

    for pbox in boxes {
        let mut pending = pbox.clone();
        loop {
            let y_on_page = (pending.y - page_start_doc_y).max(0.0);
            if y_on_page + pending.height <= content_height {
                place(
                    &mut current_page,
                    &mut page_start_doc_y,
                    &pending,
                    margins.top + y_on_page,
                    fonts,
                    color,
                );
                break;
            }
            match split_text_box(&pending, content_height - y_on_page) {
                Some((head, tail)) => {
                    place(
                        &mut current_page,
                        &mut page_start_doc_y,
                        &head,
                        margins.top + y_on_page,
                        fonts,
                        color,
                    );
                    start_page(&mut config, &mut current_page);
                    page_start_doc_y = tail.y;
                    pending = tail;
                }
                None if !current_page.boxes.is_empty() => {
                    start_page(&mut config, &mut current_page);
                    page_start_doc_y = pending.y;
                }
                None => {
                    // Unsplittable and taller than an empty page.
                    place(
                        &mut current_page,
                        &mut page_start_doc_y,
                        &pending,
                        margins.top + y_on_page,
                        fonts,
                        color,
                    );
                    break;
                }
            }
        }
    }

    if !current_page.boxes.is_empty() {
        config.pages.push(current_page);
    }
    if config.pages.is_empty() {
        config.pages.push(PageLayout {
            page_index: 0,
            boxes: Vec::new(),
        });
    }
    config
}

fn start_page(config: &mut LayoutConfig, current_page: &mut PageLayout) {
    config.pages.push(std::mem::replace(
        current_page,
        PageLayout {
            page_index: config.pages.len() + 1,
            boxes: Vec::new(),
        },
    ));
}

fn place(
    current_page: &mut PageLayout,
    page_start_doc_y: &mut f32,
    pbox: &PositionedBox,
    abs_y: f32,
    fonts: &FontManager,
    color: [f32; 4],
) {
    match positioned_to_layout_box(pbox, abs_y, fonts, color) {
        Some(layout_box) => current_page.boxes.push(layout_box),
        None if current_page.boxes.is_empty() => {
            // Spacer at the top of a page: let the next box take its place.
            *page_start_doc_y = pbox.y + pbox.height;
        }
        None => {}
    }
}

/// Split a text box at a line boundary so the head fits in `available`
/// points. The tail keeps document-space y and loses the list marker.
/// Returns `None` for spacers and when not even one line fits.
fn split_text_box(pbox: &PositionedBox, available: f32) -> Option<(PositionedBox, PositionedBox)> {
    let BoxContent::Text {
        lines,
        font_size,
        line_height,
        alignment,
        marker,
    } = &pbox.content
    else {
        return None;
    };
    if *line_height <= 0.0 {
        return None;
    }
    let fit = ((available + 1e-3) / line_height).floor().max(0.0) as usize;
    if fit == 0 || fit >= lines.len() {
        return None;
    }

    let piece = |lines: &[WrappedLine], y: f32, marker: Option<String>| PositionedBox {
        x: pbox.x,
        y,
        width: pbox.width,
        height: lines.len() as f32 * line_height,
        content: BoxContent::Text {
            lines: lines.to_vec(),
            font_size: *font_size,
            line_height: *line_height,
            alignment: *alignment,
            marker,
        },
    };
    let head = piece(&lines[..fit], pbox.y, marker.clone());
    let tail = piece(&lines[fit..], pbox.y + head.height, None);
    Some((head, tail))
}

/// Convert a text box to a LayoutBox at page-absolute `abs_y`; spacers
/// produce nothing.
fn positioned_to_layout_box(
    pbox: &PositionedBox,
    abs_y: f32,
    fonts: &FontManager,
    color: [f32; 4],
) -> Option<LayoutBox> {
    let BoxContent::Text {
        lines,
        font_size,
        line_height,
        alignment,
        marker,
    } = &pbox.content
    else {
        return None;
    };

    let text_lines = lines
        .iter()
        .enumerate()
        .map(|(i, line)| TextLine {
            fragments: line
                .fragments
                .iter()
                .map(|f| TextFragment {
                    text: f.text.clone(),
                    x: f.x,
                    width: f.width,
                    bold: f.style.bold,
                    italic: f.style.italic,
                    underline: f.style.underline,
                })
                .collect(),
            x_offset: match alignment {
                Alignment::Left => 0.0,
                Alignment::Center => ((pbox.width - line.width) / 2.0).max(0.0),
                Alignment::Right => (pbox.width - line.width).max(0.0),
            },
            y_offset: i as f32 * line_height,
        })
        .collect();

    let list_marker = marker.as_ref().map(|label| {
        let width = fonts.measure_text_width(label, *font_size, TextStyle::PLAIN);
        MarkerContent {
            text: label.clone(),
            x: pbox.x - MARKER_GAP_PT - width,
        }
    });

    Some(LayoutBox {
        x: pbox.x,
        y: abs_y,
        width: pbox.width,
        height: pbox.height,
        text: TextContent {
            lines: text_lines,
            font_size: *font_size,
            line_height: *line_height,
            color,
            list_marker,
        },
    })
}

/// Footer text centred on the page, measured with builtin Helvetica metrics
/// since the footer is always drawn in Helvetica.
pub fn footer_content(text: &str, page_width: f32) -> FooterContent {
    let font_size = 9.0;
    let width = FontManager::builtin().measure_text_width(text, font_size, TextStyle::PLAIN);
    FooterContent {
        text: text.to_string(),
        font_size,
        color: [0.5, 0.5, 0.5, 1.0],
        x: ((page_width - width) / 2.0).max(0.0),
        baseline_from_bottom: mm(15.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cover::{cover_primitives, ConversionRequest};
    use crate::layout::{compute_layout, Typography};

    const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

    fn paginate_markup(markup: &str) -> LayoutConfig {
        let fonts = FontManager::default();
        let margins = PageMargins::default();
        let width = 595.28 - margins.left - margins.right;
        let primitives = cover_primitives(&ConversionRequest::new(markup, vec![]));
        let boxes = compute_layout(
            &primitives,
            width,
            margins.left,
            &fonts,
            &Typography::default(),
        )
        .unwrap();
        paginate(&boxes, 595.28, 841.89, &margins, &fonts, BLACK)
    }

    #[test]
    fn single_page() {
        let config = paginate_markup("<p>Short text</p>");
        assert_eq!(config.pages.len(), 1);
        assert_eq!(config.pages[0].boxes.len(), 1, "spacers are not boxes");
    }

    #[test]
    fn empty_input_gives_one_blank_page() {
        let config = paginate_markup("");
        assert_eq!(config.pages.len(), 1);
        assert!(config.pages[0].boxes.is_empty());
    }

    #[test]
    fn multiple_pages() {
        let mut html = String::new();
        for i in 0..120 {
            html.push_str(&format!("<p>Paragraph {} with some text</p>", i));
        }
        let config = paginate_markup(&html);
        assert!(
            config.pages.len() > 1,
            "Expected multiple pages, got {}",
            config.pages.len()
        );
        let margins = PageMargins::default();
        for page in &config.pages {
            for b in &page.boxes {
                assert!(b.y >= margins.top - 1e-3);
                assert!(b.y + b.height <= config.page_height_pt - margins.bottom + 1e-3);
            }
        }
    }

    fn assert_within_margins(config: &LayoutConfig) {
        let margins = PageMargins::default();
        for page in &config.pages {
            for b in &page.boxes {
                assert!(b.y >= margins.top - 1e-3);
                assert!(
                    b.y + b.height <= config.page_height_pt - margins.bottom + 1e-3,
                    "box at y={} with height {} runs into the bottom margin",
                    b.y,
                    b.height
                );
            }
        }
    }

    fn word_count(config: &LayoutConfig) -> usize {
        config
            .pages
            .iter()
            .flat_map(|p| &p.boxes)
            .flat_map(|b| &b.text.lines)
            .flat_map(|l| &l.fragments)
            .map(|f| f.text.split_whitespace().count())
            .sum()
    }

    #[test]
    fn oversized_paragraph_is_split_between_lines() {
        let config = paginate_markup(&format!("<p>{}</p>", "word ".repeat(3000)));
        assert!(config.pages.len() > 1);
        assert_within_margins(&config);
        assert_eq!(word_count(&config), 3000, "no line may be dropped");
        for (i, page) in config.pages.iter().enumerate() {
            assert_eq!(page.page_index, i);
        }
        let first = &config.pages[1].boxes[0];
        assert!((first.y - PageMargins::default().top).abs() < 1e-3);
        assert_eq!(first.text.lines[0].y_offset, 0.0);
    }

    #[test]
    fn split_paragraph_fills_the_current_page_first() {
        let config = paginate_markup(&format!(
            "<p>intro</p><p>{}</p>",
            "word ".repeat(3000)
        ));
        assert_eq!(config.pages[0].boxes.len(), 2);
        assert_within_margins(&config);
    }

    #[test]
    fn split_list_item_keeps_marker_on_first_piece() {
        let config = paginate_markup(&format!("<ol><li>{}</li></ol>", "word ".repeat(3000)));
        assert!(config.pages.len() > 1);
        assert_within_margins(&config);
        let boxes: Vec<_> = config.pages.iter().flat_map(|p| &p.boxes).collect();
        assert_eq!(boxes[0].text.list_marker.as_ref().map(|m| m.text.as_str()), Some("1."));
        assert!(boxes[1..].iter().all(|b| b.text.list_marker.is_none()));
        assert_eq!(word_count(&config), 3000);
    }

    #[test]
    fn centered_and_right_lines_are_offset() {
        let config = paginate_markup(
            r#"<p style="text-align:center">c</p><p style="text-align:right">r</p><p>l</p>"#,
        );
        let boxes = &config.pages[0].boxes;
        let offset = |i: usize| boxes[i].text.lines[0].x_offset;
        assert!(offset(0) > 0.0);
        assert!(offset(1) > offset(0));
        assert_eq!(offset(2), 0.0);
    }

    #[test]
    fn markers_sit_left_of_item_box() {
        let config = paginate_markup("<ol><li>one</li></ol>");
        let item = &config.pages[0].boxes[0];
        let marker = item.text.list_marker.as_ref().unwrap();
        assert_eq!(marker.text, "1.");
        assert!(marker.x < item.x);
        assert!(marker.x >= PageMargins::default().left - 1e-3);
    }

    #[test]
    fn footer_is_centred() {
        let footer = footer_content("Generated on: 01.01.2026 10:00", 595.28);
        let width = FontManager::builtin().measure_text_width(&footer.text, 9.0, TextStyle::PLAIN);
        assert!((footer.x * 2.0 + width - 595.28).abs() < 1e-2);
    }
}
