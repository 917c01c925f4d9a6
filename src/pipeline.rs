//! Pipeline – ties together markup conversion, layout, pagination,
//! rendering and merging into single function calls.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};

use crate::cover::{cover_primitives, ConversionRequest};
use crate::error::Result;
use crate::fonts::{FontManager, DEFAULT_FONT_DIR};
use crate::layout::{compute_layout, Typography};
use crate::layout_config::LayoutConfig;
use crate::merge::merge_pdfs;
use crate::pagination::{footer_content, paginate, PageMargins};
use crate::render::render_pdf;

/// Footer timestamp format. The UTC offset names the zone of the local
/// clock, e.g. `16.10.2026 14:05 UTC+02:00`.
pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M UTC%:z";

/// Source name the generated cover page is merged under.
const COVER_SOURCE_NAME: &str = "cover page";

/// Configuration for the PDF generation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Document title embedded in the PDF metadata (default: "Cover page").
    pub title: String,
    /// Page width in points (default: A4 = 595.28).
    pub page_width: f32,
    /// Page height in points (default: A4 = 841.89).
    pub page_height: f32,
    pub margins: PageMargins,
    pub typography: Typography,
    /// Footer timestamp; `None` means local time when the page is composed.
    pub timestamp: Option<String>,
    /// Directory searched for the DejaVu Sans family.
    pub font_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            title: "Cover page".to_string(),
            page_width: 595.28,
            page_height: 841.89,
            margins: PageMargins::default(),
            typography: Typography::default(),
            timestamp: None,
            font_dir: PathBuf::from(DEFAULT_FONT_DIR),
        }
    }
}

impl PipelineConfig {
    /// Width available to cover-page content between the side margins.
    pub fn content_width(&self) -> f32 {
        (self.page_width - self.margins.left - self.margins.right).max(1.0)
    }

    /// Resolve the font family for this configuration. Call once and reuse.
    pub fn load_fonts(&self) -> FontManager {
        FontManager::resolve(Some(self.font_dir.as_path()))
    }

    fn footer_text(&self) -> String {
        let timestamp = self.timestamp.clone().unwrap_or_else(current_timestamp);
        format!("Generated on: {timestamp}")
    }
}

/// Local time with its UTC offset, formatted for the cover-page footer.
pub fn current_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Default download name for a merge produced on `date`.
pub fn output_file_name(date: NaiveDate) -> String {
    format!("merged-document-{}.pdf", date.format("%Y-%m-%d"))
}

/// Generate only the layout config (no PDF rendering) – useful for testing.
pub fn compute_layout_config(
    request: &ConversionRequest,
    config: &PipelineConfig,
    fonts: &FontManager,
) -> Result<LayoutConfig> {
    let primitives = cover_primitives(request);
    let boxes = compute_layout(
        &primitives,
        config.content_width(),
        config.margins.left,
        fonts,
        &config.typography,
    )?;

    let mut layout = paginate(
        &boxes,
        config.page_width,
        config.page_height,
        &config.margins,
        fonts,
        config.typography.color,
    );
    layout.title = config.title.clone();
    layout.footer = Some(footer_content(&config.footer_text(), config.page_width));
    Ok(layout)
}

/// Cover page: request → PDF bytes.
///
/// Returns `(pdf_bytes, layout_config)`.
pub fn compose_cover_page(
    request: &ConversionRequest,
    config: &PipelineConfig,
    fonts: &FontManager,
) -> Result<(Vec<u8>, LayoutConfig)> {
    let layout = compute_layout_config(request, config, fonts)?;
    log::info!(
        "Composed cover page: {} page(s), {} font family",
        layout.pages.len(),
        fonts.family()
    );
    let bytes = render_pdf(&layout, fonts)?;
    Ok((bytes, layout))
}

/// One uploaded PDF.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Display name of a document read from disk: its file name.
pub fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read documents from disk in the given order. Paths that cannot be read
/// are skipped and returned by name next to the documents that were read.
pub fn read_documents(paths: &[PathBuf]) -> (Vec<UploadedDocument>, Vec<String>) {
    let mut documents = Vec::with_capacity(paths.len());
    let mut unreadable = Vec::new();
    for path in paths {
        let name = document_name(path);
        match fs::read(path) {
            Ok(bytes) => documents.push(UploadedDocument::new(name, bytes)),
            Err(e) => {
                log::warn!("Could not read '{}': {e}", path.display());
                unreadable.push(name);
            }
        }
    }
    (documents, unreadable)
}

/// Cover note plus the documents to append after it.
#[derive(Debug, Clone, Default)]
pub struct MergeRequest {
    pub markup: String,
    /// Uploaded documents in upload order.
    pub documents: Vec<UploadedDocument>,
    /// Explicit merge order by name; `None` or empty keeps upload order.
    pub order: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub pdf: Vec<u8>,
    pub page_count: usize,
    pub cover_pages: usize,
    /// Documents that could not be read and were left out.
    pub failed: Vec<String>,
}

/// Parse an order list given as a JSON array of names. Blank input means
/// no explicit order.
pub fn parse_order(json: &str) -> Result<Vec<String>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(json)?)
}

/// Upload-order names with their bytes; a repeated name keeps its first
/// position and its last upload.
fn by_name(documents: &[UploadedDocument]) -> Vec<(&str, &[u8])> {
    let mut files: Vec<(&str, &[u8])> = Vec::with_capacity(documents.len());
    for doc in documents {
        match files.iter_mut().find(|(name, _)| *name == doc.name) {
            Some(entry) => entry.1 = doc.bytes.as_slice(),
            None => files.push((doc.name.as_str(), doc.bytes.as_slice())),
        }
    }
    files
}

/// Compose the cover page for `request` and append its documents.
///
/// The cover lists every name in the effective order, including names with
/// no uploaded document; those are skipped when merging.
pub fn merge_documents(
    request: &MergeRequest,
    config: &PipelineConfig,
    fonts: &FontManager,
) -> Result<MergeOutcome> {
    let files = by_name(&request.documents);
    let names: Vec<String> = match &request.order {
        Some(order) if !order.is_empty() => order.clone(),
        _ => files.iter().map(|(name, _)| name.to_string()).collect(),
    };

    let cover_request = ConversionRequest::new(request.markup.clone(), names.clone());
    let (cover, layout) = compose_cover_page(&cover_request, config, fonts)?;

    let mut sources: Vec<(&str, &[u8])> = vec![(COVER_SOURCE_NAME, cover.as_slice())];
    for name in &names {
        match files.iter().find(|(file, _)| *file == name.as_str()) {
            Some(&source) => sources.push(source),
            None => log::debug!("No uploaded document named {name}, skipping"),
        }
    }

    let merged = merge_pdfs(sources)?;
    Ok(MergeOutcome {
        pdf: merged.bytes,
        page_count: merged.page_count,
        cover_pages: layout.pages.len(),
        failed: merged.failed,
    })
}
