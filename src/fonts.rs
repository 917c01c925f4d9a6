//! Font loading and text measurement using `ttf-parser`.
//!
//! The font family is resolved once at startup: DejaVu Sans when its files
//! are available (it covers umlauts and most of Latin), otherwise builtin
//! Helvetica with heuristic metrics. The resulting [`FontManager`] is passed
//! explicitly to layout and rendering.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::inline::{StyledRun, TextStyle};

/// Where Debian-style systems install DejaVu.
pub const DEFAULT_FONT_DIR: &str = "/usr/share/fonts/truetype/dejavu";

pub const BUILTIN_FAMILY: &str = "Helvetica";

const EMBEDDED_FAMILY: &str = "DejaVu";

/// A loaded font face with metrics.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes (kept alive for ttf-parser's zero-copy API).
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
    pub line_gap: f32,
}

impl FontData {
    fn parse(bytes: Vec<u8>) -> Result<Self> {
        let face = ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| Error::Font(format!("failed to parse font: {e}")))?;
        Ok(Self {
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender() as f32,
            descender: face.descender() as f32,
            line_gap: face.line_gap() as f32,
            bytes,
        })
    }

    /// Helvetica-like metrics for when no TTF is available.
    fn builtin() -> Self {
        Self {
            bytes: Vec::new(),
            units_per_em: 1000.0,
            ascender: 750.0,
            descender: -250.0,
            line_gap: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct FontVariant {
    pub bold: bool,
    pub italic: bool,
}

impl FontVariant {
    pub const ALL: [FontVariant; 4] = [
        FontVariant { bold: false, italic: false },
        FontVariant { bold: true, italic: false },
        FontVariant { bold: false, italic: true },
        FontVariant { bold: true, italic: true },
    ];

    pub fn of(style: TextStyle) -> Self {
        Self {
            bold: style.bold,
            italic: style.italic,
        }
    }
}

/// Manages the cover page's font family.
pub struct FontManager {
    family: String,
    fonts: HashMap<FontVariant, FontData>,
}

impl FontManager {
    /// Builtin Helvetica, no embedded font program.
    pub fn builtin() -> Self {
        let fonts = FontVariant::ALL
            .into_iter()
            .map(|v| (v, FontData::builtin()))
            .collect();
        Self {
            family: BUILTIN_FAMILY.to_string(),
            fonts,
        }
    }

    /// Load a family from TTF/OTF bytes. Missing variants fall back: italic
    /// to regular, bold-italic to bold.
    pub fn load_family(
        family: &str,
        regular: Vec<u8>,
        bold: Option<Vec<u8>>,
        italic: Option<Vec<u8>>,
        bold_italic: Option<Vec<u8>>,
    ) -> Result<Self> {
        let regular = FontData::parse(regular)?;
        let bold = match bold {
            Some(bytes) => FontData::parse(bytes)?,
            None => regular.clone(),
        };
        let italic = match italic {
            Some(bytes) => FontData::parse(bytes)?,
            None => regular.clone(),
        };
        let bold_italic = match bold_italic {
            Some(bytes) => FontData::parse(bytes)?,
            None => bold.clone(),
        };

        let mut fonts = HashMap::new();
        fonts.insert(FontVariant { bold: false, italic: false }, regular);
        fonts.insert(FontVariant { bold: true, italic: false }, bold);
        fonts.insert(FontVariant { bold: false, italic: true }, italic);
        fonts.insert(FontVariant { bold: true, italic: true }, bold_italic);
        Ok(Self {
            family: family.to_string(),
            fonts,
        })
    }

    /// Load DejaVu Sans from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let read_optional = |name: &str| fs::read(dir.join(name)).ok();
        let regular = fs::read(dir.join("DejaVuSans.ttf"))?;
        Self::load_family(
            EMBEDDED_FAMILY,
            regular,
            read_optional("DejaVuSans-Bold.ttf"),
            read_optional("DejaVuSans-Oblique.ttf"),
            read_optional("DejaVuSans-BoldOblique.ttf"),
        )
    }

    /// Resolve the process-wide font choice, never failing.
    pub fn resolve(dir: Option<&Path>) -> Self {
        let dir = dir.unwrap_or_else(|| Path::new(DEFAULT_FONT_DIR));
        match Self::from_dir(dir) {
            Ok(fonts) => {
                log::info!("Registered {} fonts from {}", fonts.family, dir.display());
                fonts
            }
            Err(e) => {
                log::warn!(
                    "Could not register fonts from {}: {e}, using {BUILTIN_FAMILY}",
                    dir.display()
                );
                Self::builtin()
            }
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// Whether text is drawn with an embedded font program.
    pub fn has_real_fonts(&self) -> bool {
        self.fonts.values().any(|d| !d.bytes.is_empty())
    }

    fn get(&self, variant: FontVariant) -> Option<&FontData> {
        self.fonts.get(&variant)
    }

    /// Get font bytes for embedding in PDF.
    pub fn font_bytes(&self, variant: FontVariant) -> Option<&[u8]> {
        self.get(variant)
            .filter(|d| !d.bytes.is_empty())
            .map(|d| d.bytes.as_slice())
    }

    /// Measure the width of a string at a given font size (in pt).
    /// With real font bytes we sum glyph advances; otherwise we use an
    /// average character width heuristic (0.5 × font_size per char).
    pub fn measure_text_width(&self, text: &str, font_size: f32, style: TextStyle) -> f32 {
        let heuristic = || {
            // Bold is ~10 % wider.
            let avg = if style.bold { 0.55 } else { 0.5 };
            text.chars().count() as f32 * font_size * avg
        };

        let Some(data) = self.get(FontVariant::of(style)).filter(|d| !d.bytes.is_empty()) else {
            return heuristic();
        };

        match ttf_parser::Face::parse(&data.bytes, 0) {
            Ok(face) => {
                let scale = font_size / data.units_per_em;
                text.chars()
                    .map(|ch| match face.glyph_index(ch) {
                        Some(gid) => face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale,
                        // Fallback for missing glyph
                        None => font_size * 0.5,
                    })
                    .sum()
            }
            Err(_) => heuristic(),
        }
    }

    /// Distance from the top of a line box to the baseline.
    pub fn ascender_pt(&self, font_size: f32, style: TextStyle) -> f32 {
        match self.get(FontVariant::of(style)) {
            Some(data) => data.ascender * font_size / data.units_per_em,
            None => font_size * 0.75,
        }
    }
}

impl Default for FontManager {
    fn default() -> Self {
        Self::builtin()
    }
}

// ---------------------------------------------------------------------------
// Styled word wrapping
// ---------------------------------------------------------------------------

/// A same-styled piece of a wrapped line.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub style: TextStyle,
    /// Offset from the line start.
    pub x: f32,
    pub width: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WrappedLine {
    pub fragments: Vec<Fragment>,
    pub width: f32,
}

impl WrappedLine {
    fn append(&mut self, text: &str, style: TextStyle, width: f32) {
        match self.fragments.last_mut() {
            Some(last) if last.style == style => {
                last.text.push_str(text);
                last.width += width;
            }
            _ => self.fragments.push(Fragment {
                text: text.to_string(),
                style,
                x: self.width,
                width,
            }),
        }
        self.width += width;
    }

    pub fn text(&self) -> String {
        self.fragments.iter().map(|f| f.text.as_str()).collect()
    }
}

/// Split a run into words; a word may span several styles (`a<b>b</b>`).
/// Any whitespace run separates words, except no-break space.
fn split_words(run: &StyledRun) -> Vec<Vec<(String, TextStyle)>> {
    let mut words: Vec<Vec<(String, TextStyle)>> = Vec::new();
    let mut in_word = false;
    for seg in run.segments() {
        for ch in seg.text.chars() {
            if ch.is_whitespace() && ch != '\u{00A0}' {
                in_word = false;
                continue;
            }
            if !in_word {
                words.push(Vec::new());
                in_word = true;
            }
            if let Some(word) = words.last_mut() {
                match word.last_mut() {
                    Some((text, style)) if *style == seg.style => text.push(ch),
                    _ => word.push((ch.to_string(), seg.style)),
                }
            }
        }
    }
    words
}

/// Word-wrap a styled run to fit within `max_width` points. Whitespace is
/// normalised to single spaces; a word wider than the line gets a line of
/// its own.
pub fn wrap_run(
    run: &StyledRun,
    font_size: f32,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<WrappedLine> {
    let mut lines = Vec::new();
    let mut current = WrappedLine::default();

    for word in split_words(run) {
        let widths: Vec<f32> = word
            .iter()
            .map(|(text, style)| fonts.measure_text_width(text, font_size, *style))
            .collect();
        let word_width: f32 = widths.iter().sum();
        let lead_style = word.first().map(|(_, s)| *s).unwrap_or_default();

        let mut space = if current.fragments.is_empty() {
            0.0
        } else {
            fonts.measure_text_width(" ", font_size, lead_style)
        };
        if !current.fragments.is_empty() && current.width + space + word_width > max_width {
            lines.push(std::mem::take(&mut current));
            space = 0.0;
        }

        for (i, ((text, style), width)) in word.iter().zip(widths).enumerate() {
            if i == 0 && space > 0.0 {
                current.append(&format!(" {text}"), *style, space + width);
            } else {
                current.append(text, *style, width);
            }
        }
    }

    if !current.fragments.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_text_width() {
        let mgr = FontManager::default();
        let w = mgr.measure_text_width("Hello", 16.0, TextStyle::PLAIN);
        // 5 chars × 16 × 0.5 = 40
        assert!((w - 40.0).abs() < 0.1);
        assert!(mgr.measure_text_width("Hello", 16.0, TextStyle::BOLD) > w);
    }

    #[test]
    fn word_wrap_basic() {
        let mgr = FontManager::default();
        let lines = wrap_run(&StyledRun::plain("Hello world foo bar"), 16.0, 60.0, &mgr);
        assert!(lines.len() >= 2, "Expected wrapping, got {:?}", lines);
        assert!(lines.iter().all(|l| l.width <= 60.0 || l.fragments.len() == 1));
    }

    #[test]
    fn whitespace_is_normalised() {
        let mgr = FontManager::default();
        let lines = wrap_run(&StyledRun::plain("a\n   b\tc"), 10.0, 1000.0, &mgr);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text(), "a b c");
    }

    #[test]
    fn mixed_styles_inside_one_word_stay_together() {
        let mgr = FontManager::default();
        let mut run = StyledRun::plain("ab");
        run.push("cd", TextStyle::BOLD);
        run.push(" ef", TextStyle::PLAIN);
        let lines = wrap_run(&run, 10.0, 1000.0, &mgr);
        let frags = &lines[0].fragments;
        assert_eq!(frags.len(), 3);
        assert_eq!(frags[0].text, "ab");
        assert_eq!(frags[1].text, "cd");
        assert!(frags[1].style.bold);
        assert_eq!(frags[2].text, " ef");
        assert!((frags[1].x - frags[0].width).abs() < 1e-3);
    }

    #[test]
    fn empty_run_has_no_lines() {
        let mgr = FontManager::default();
        assert!(wrap_run(&StyledRun::default(), 10.0, 100.0, &mgr).is_empty());
    }

    #[test]
    fn missing_font_dir_falls_back_to_builtin() {
        let mgr = FontManager::resolve(Some(Path::new("/nonexistent/fonts")));
        assert_eq!(mgr.family(), BUILTIN_FAMILY);
        assert!(!mgr.has_real_fonts());
    }

    #[test]
    fn garbage_font_bytes_rejected() {
        let err = FontManager::load_family("X", vec![0, 1, 2, 3], None, None, None);
        assert!(err.is_err());
    }
}
