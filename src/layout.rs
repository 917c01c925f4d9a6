//! Layout engine – stacks the cover-page primitives in a Taffy flex column
//! and converts the result into a flat list of positioned boxes.

use std::collections::HashMap;
use std::fmt::Debug;

use taffy::prelude::*;

use crate::blocks::LayoutPrimitive;
use crate::error::{Error, Result};
use crate::fonts::{wrap_run, FontManager, WrappedLine};
use crate::inline::TextStyle;
use crate::markup::{Alignment, HeadingLevel};

/// Narrowest text column a deeply indented list item is squeezed into.
pub const MIN_TEXT_WIDTH_PT: f32 = 120.0;

/// Font sizes and leading of the cover page, in points.
#[derive(Debug, Clone)]
pub struct Typography {
    pub body_size: f32,
    pub h1_size: f32,
    pub h2_size: f32,
    pub h3_size: f32,
    /// Line height as a multiple of the font size.
    pub line_height: f32,
    pub color: [f32; 4],
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            body_size: 10.0,
            h1_size: 18.0,
            h2_size: 14.0,
            h3_size: 12.0,
            line_height: 1.2,
            color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl Typography {
    pub fn font_size(&self, primitive: &LayoutPrimitive) -> f32 {
        match primitive {
            LayoutPrimitive::Heading { level, .. } => match level {
                HeadingLevel::H1 => self.h1_size,
                HeadingLevel::H2 => self.h2_size,
                HeadingLevel::H3 => self.h3_size,
            },
            _ => self.body_size,
        }
    }
}

// ---------------------------------------------------------------------------
// Intermediate layout tree (pre-pagination)
// ---------------------------------------------------------------------------

/// A positioned box in document coordinates (before page splitting).
#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub content: BoxContent,
}

#[derive(Debug, Clone)]
pub enum BoxContent {
    Spacer,
    Text {
        lines: Vec<WrappedLine>,
        font_size: f32,
        line_height: f32,
        alignment: Alignment,
        /// List bullet/number label
        marker: Option<String>,
    },
}

fn layout_err(e: impl Debug) -> Error {
    Error::Layout(format!("{e:?}"))
}

// ---------------------------------------------------------------------------
// Build Taffy tree from primitives
// ---------------------------------------------------------------------------

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    fonts: &'a FontManager,
    typography: &'a Typography,
    node_content: HashMap<NodeId, BoxContent>,
}

impl<'a> LayoutBuilder<'a> {
    fn new(fonts: &'a FontManager, typography: &'a Typography) -> Self {
        Self {
            taffy: TaffyTree::new(),
            fonts,
            typography,
            node_content: HashMap::new(),
        }
    }

    fn build_node(&mut self, primitive: &LayoutPrimitive, content_width: f32) -> Result<NodeId> {
        let Some(run) = primitive.run() else {
            let height = match primitive {
                LayoutPrimitive::Spacer { height } => height.max(0.0),
                _ => 0.0,
            };
            let node = self
                .taffy
                .new_leaf(fixed_leaf(content_width, height, 0.0))
                .map_err(layout_err)?;
            self.node_content.insert(node, BoxContent::Spacer);
            return Ok(node);
        };

        let font_size = self.typography.font_size(primitive);
        let line_height = font_size * self.typography.line_height;
        let indent = primitive
            .indent()
            .min((content_width - MIN_TEXT_WIDTH_PT).max(0.0));
        let width = (content_width - indent).max(1.0);

        let run = match primitive {
            LayoutPrimitive::Heading { .. } => run.with_style(TextStyle::BOLD),
            _ => run.clone(),
        };
        let lines = wrap_run(&run, font_size, width, self.fonts);
        let height = lines.len() as f32 * line_height;

        let marker = match primitive {
            LayoutPrimitive::ListItem { marker, .. } if marker.is_visible() => {
                Some(marker.label())
            }
            _ => None,
        };

        let node = self
            .taffy
            .new_leaf(fixed_leaf(width, height, indent))
            .map_err(layout_err)?;
        self.node_content.insert(
            node,
            BoxContent::Text {
                lines,
                font_size,
                line_height,
                alignment: primitive.alignment(),
                marker,
            },
        );
        Ok(node)
    }

    /// Extract positioned boxes after layout computation.
    fn extract(&self, node: NodeId, offset_x: f32) -> Result<PositionedBox> {
        let layout = self.taffy.layout(node).map_err(layout_err)?;
        let content = self
            .node_content
            .get(&node)
            .cloned()
            .unwrap_or(BoxContent::Spacer);
        Ok(PositionedBox {
            x: offset_x + layout.location.x,
            y: layout.location.y,
            width: layout.size.width,
            height: layout.size.height,
            content,
        })
    }
}

/// A non-shrinking leaf of fixed size, pushed right by `indent`.
fn fixed_leaf(width: f32, height: f32, indent: f32) -> Style {
    Style {
        size: Size {
            width: Dimension::Length(width),
            height: Dimension::Length(height),
        },
        margin: Rect {
            top: LengthPercentageAuto::Length(0.0),
            right: LengthPercentageAuto::Length(0.0),
            bottom: LengthPercentageAuto::Length(0.0),
            left: LengthPercentageAuto::Length(indent),
        },
        flex_shrink: 0.0,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Lay out primitives top to bottom inside a column of `content_width`
/// starting at page x `origin_x`. Returned boxes are in emission order with
/// document-space y coordinates starting at 0.
pub fn compute_layout(
    primitives: &[LayoutPrimitive],
    content_width: f32,
    origin_x: f32,
    fonts: &FontManager,
    typography: &Typography,
) -> Result<Vec<PositionedBox>> {
    let mut builder = LayoutBuilder::new(fonts, typography);

    let child_ids = primitives
        .iter()
        .map(|p| builder.build_node(p, content_width))
        .collect::<Result<Vec<_>>>()?;

    let root_style = Style {
        display: taffy::Display::Flex,
        flex_direction: taffy::FlexDirection::Column,
        size: Size {
            width: Dimension::Length(content_width),
            height: Dimension::Auto,
        },
        ..Default::default()
    };

    let root = builder
        .taffy
        .new_with_children(root_style, &child_ids)
        .map_err(layout_err)?;

    builder
        .taffy
        .compute_layout(
            root,
            Size {
                width: AvailableSpace::Definite(content_width),
                height: AvailableSpace::MaxContent,
            },
        )
        .map_err(layout_err)?;

    child_ids
        .iter()
        .map(|&id| builder.extract(id, origin_x))
        .collect()
}
