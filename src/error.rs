//! Error types for the page composer and document merge.
//!
//! Markup conversion itself is infallible; only the collaborators around it
//! (fonts, layout, rendering, page concatenation) report errors.

use std::io;
use thiserror::Error;

/// Result type alias for cover-forge operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A PDF could not be read or written.
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Font bytes could not be parsed.
    #[error("Font error: {0}")]
    Font(String),

    /// The layout engine rejected the block tree.
    #[error("Layout error: {0}")]
    Layout(String),

    /// Error while producing the cover page PDF.
    #[error("Rendering error: {0}")]
    Render(String),

    /// The document order list is not a JSON array of names.
    #[error("Invalid document order: {0}")]
    Order(#[from] serde_json::Error),

    /// Merging produced no pages at all.
    #[error("Merged document has no pages")]
    NoOutput,
}
