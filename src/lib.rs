//! # cover-forge – rich-text cover note → PDF, merged with attached documents
//!
//! A short note written in a rich-text editor becomes the first page of a
//! combined PDF, followed by the attached documents in the requested order.
//! The pipeline stages are:
//!
//! 1. **Parse** – tolerant HTML scan into a raw tree ([`dom`]), then block
//!    classification into a [`markup::MarkupNode`] forest ([`markup`])
//! 2. **Format** – inline emphasis flattened into styled runs ([`inline`])
//! 3. **Compile** – blocks and nested lists into layout primitives
//!    ([`blocks`], [`lists`], [`cover`])
//! 4. **Layout** – word-wrapped boxes stacked with Taffy ([`layout`])
//! 5. **Paginate** – split into A4 pages under fixed margins ([`pagination`])
//! 6. **Render** – emit PDF bytes via printpdf ([`render`])
//! 7. **Merge** – cover page plus documents via lopdf ([`merge`])
//!
//! Steps 1–3 never fail: any input string yields a (possibly empty) list of
//! primitives.

pub mod blocks;
pub mod cover;
pub mod dom;
pub mod error;
pub mod fonts;
pub mod inline;
pub mod layout;
pub mod layout_config;
pub mod lists;
pub mod markup;
pub mod merge;
pub mod pagination;
pub mod pipeline;
pub mod render;
pub mod templates;

// Re-exports for convenience
pub use blocks::{compile, LayoutPrimitive};
pub use cover::{cover_primitives, ConversionRequest};
pub use error::{Error, Result};
pub use inline::{format, StyledRun, TextStyle};
pub use markup::{parse, Alignment, HeadingLevel, MarkupNode};
pub use pipeline::{compose_cover_page, merge_documents, MergeRequest, PipelineConfig};
