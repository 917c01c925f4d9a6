//! PDF renderer – takes a [`LayoutConfig`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).
//!
//! Body text uses the embedded font family when the [`FontManager`] carries
//! real font programs, otherwise builtin Helvetica. The footer is always
//! builtin Helvetica.

use std::collections::HashMap;

use printpdf::*;

use crate::error::{Error, Result};
use crate::fonts::{FontManager, FontVariant};
use crate::inline::TextStyle;
use crate::layout_config::{FooterContent, LayoutBox, LayoutConfig};

/// Font handle for one style variant.
#[derive(Clone)]
enum PdfFont {
    Builtin(BuiltinFont),
    Embedded(FontId),
}

impl PdfFont {
    fn builtin(variant: FontVariant) -> Self {
        PdfFont::Builtin(match (variant.bold, variant.italic) {
            (true, true) => BuiltinFont::HelveticaBoldOblique,
            (true, false) => BuiltinFont::HelveticaBold,
            (false, true) => BuiltinFont::HelveticaOblique,
            (false, false) => BuiltinFont::Helvetica,
        })
    }

    fn push_text(&self, ops: &mut Vec<Op>, text: &str, size: f32) {
        match self {
            PdfFont::Builtin(font) => {
                ops.push(Op::SetFontSizeBuiltinFont {
                    size: Pt(size),
                    font: *font,
                });
                ops.push(Op::WriteTextBuiltinFont {
                    items: vec![TextItem::Text(to_winlatin(text))],
                    font: *font,
                });
            }
            PdfFont::Embedded(id) => {
                ops.push(Op::SetFontSize {
                    size: Pt(size),
                    font: id.clone(),
                });
                ops.push(Op::WriteText {
                    items: vec![TextItem::Text(text.to_string())],
                    font: id.clone(),
                });
            }
        }
    }
}

/// Render a LayoutConfig into PDF bytes.
pub fn render_pdf(config: &LayoutConfig, fonts: &FontManager) -> Result<Vec<u8>> {
    let page_w = Mm(config.page_width_pt * 0.352778); // pt → mm
    let page_h = Mm(config.page_height_pt * 0.352778);

    let mut doc = PdfDocument::new(&config.title);
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();

    // ── Register fonts ────────────────────────────────────────────────────
    let mut registered: HashMap<FontVariant, PdfFont> = HashMap::new();
    for variant in FontVariant::ALL {
        let font = match fonts.font_bytes(variant) {
            Some(bytes) => match ParsedFont::from_bytes(bytes, 0, &mut warnings) {
                Some(parsed) => PdfFont::Embedded(doc.add_font(&parsed)),
                None => {
                    log::warn!("Could not embed {variant:?} font, using builtin Helvetica");
                    PdfFont::builtin(variant)
                }
            },
            None => PdfFont::builtin(variant),
        };
        registered.insert(variant, font);
    }

    // ── Render pages ──────────────────────────────────────────────────────
    let mut pages = Vec::new();

    for page_layout in &config.pages {
        let mut ops = Vec::new();

        for lbox in &page_layout.boxes {
            render_box(&mut ops, lbox, config.page_height_pt, &registered, fonts);
        }
        if let Some(footer) = &config.footer {
            render_footer(&mut ops, footer);
        }

        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    // Ensure at least one page.
    if pages.is_empty() {
        let mut ops = Vec::new();
        if let Some(footer) = &config.footer {
            render_footer(&mut ops, footer);
        }
        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    doc.with_pages(pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        log::debug!("printpdf reported {} warnings", warnings.len());
    }
    if bytes.is_empty() {
        return Err(Error::Render("printpdf produced an empty document".into()));
    }

    Ok(bytes)
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF).
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{201A}' => 0x82, // single low-9 quote
            '\u{201E}' => 0x84, // double low-9 quote
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91, // left single quote
            '\u{2019}' => 0x92, // right single quote
            '\u{201C}' => 0x93, // left double quote
            '\u{201D}' => 0x94, // right double quote
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en-dash
            '\u{2014}' => 0x97, // em-dash
            '\u{2122}' => 0x99, // trademark
            '\u{00A0}' => 0x20, // non-breaking space -> space
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: intentionally non-UTF-8 for 0x80-0xFF; printpdf passes these
    // bytes straight to the PDF stream, decoded by WinAnsiEncoding.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}

fn rgb(c: [f32; 4]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn horizontal_line(x1: f32, x2: f32, y: f32) -> Line {
    Line {
        points: vec![
            LinePoint {
                p: Point { x: Pt(x1), y: Pt(y) },
                bezier: false,
            },
            LinePoint {
                p: Point { x: Pt(x2), y: Pt(y) },
                bezier: false,
            },
        ],
        is_closed: false,
    }
}

fn write_at(ops: &mut Vec<Op>, font: &PdfFont, text: &str, size: f32, x: f32, y: f32, color: [f32; 4]) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point { x: Pt(x), y: Pt(y) },
    });
    ops.push(Op::SetFillColor { col: rgb(color) });
    font.push_text(ops, text, size);
    ops.push(Op::EndTextSection);
}

/// Render one text box into PDF ops.
fn render_box(
    ops: &mut Vec<Op>,
    lbox: &LayoutBox,
    page_height: f32,
    registered: &HashMap<FontVariant, PdfFont>,
    fonts: &FontManager,
) {
    // PDF coordinate system: origin at bottom-left.
    // Our layout uses origin at top-left. Convert:
    let pdf_y = page_height - lbox.y;
    let text = &lbox.text;
    let regular = FontVariant::of(TextStyle::PLAIN);

    for tline in &text.lines {
        for frag in &tline.fragments {
            let style = TextStyle {
                bold: frag.bold,
                italic: frag.italic,
                underline: frag.underline,
            };
            let Some(font) = registered.get(&FontVariant::of(style)) else {
                continue;
            };
            let text_x = lbox.x + tline.x_offset + frag.x;
            let text_y = pdf_y - tline.y_offset - fonts.ascender_pt(text.font_size, style);

            write_at(ops, font, &frag.text, text.font_size, text_x, text_y, text.color);

            if frag.underline {
                // Leading spaces are part of the fragment but not underlined.
                let lead = frag.text.len() - frag.text.trim_start().len();
                let skip = if lead > 0 {
                    fonts.measure_text_width(&frag.text[..lead], text.font_size, style)
                } else {
                    0.0
                };
                let underline_y = text_y - text.font_size * 0.1;
                ops.push(Op::SetOutlineThickness { pt: Pt(0.5) });
                ops.push(Op::SetOutlineColor { col: rgb(text.color) });
                ops.push(Op::DrawLine {
                    line: horizontal_line(text_x + skip, text_x + frag.width, underline_y),
                });
            }
        }
    }

    // List marker, aligned with the first line.
    if let (Some(marker), Some(font)) = (&text.list_marker, registered.get(&regular)) {
        let marker_y =
            pdf_y - fonts.ascender_pt(text.font_size, TextStyle::PLAIN);
        write_at(ops, font, &marker.text, text.font_size, marker.x, marker_y, text.color);
    }
}

fn render_footer(ops: &mut Vec<Op>, footer: &FooterContent) {
    ops.push(Op::SaveGraphicsState);
    write_at(
        ops,
        &PdfFont::Builtin(BuiltinFont::Helvetica),
        &footer.text,
        footer.font_size,
        footer.x,
        footer.baseline_from_bottom,
        footer.color,
    );
    ops.push(Op::RestoreGraphicsState);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_empty_page() {
        let config = LayoutConfig::a4();
        let bytes = render_pdf(&config, &FontManager::default()).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        // PDF magic number
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn winlatin_maps_bullet_and_umlaut() {
        let s = to_winlatin("\u{2022}ä\u{4e2d}");
        assert_eq!(s.as_bytes(), &[0x95, 0xE4, b'?']);
    }
}
