//! Layout output: positioned, styled content blocks
//!
//! Blocks use absolute canvas coordinates and semantic [`Paint`] roles. They are
//! listed in paint order (back to front).

use crate::geometry::{Point, Rect};
use crate::text::{FontKey, PositionedGlyph};
use crate::theme::Paint;

/// Horizontal anchoring of a text run relative to its origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
  /// Origin is the left end of the run
  #[default]
  Start,
  /// Origin is the middle of the run
  Center,
  /// Origin is the right end of the run
  End,
}

impl Align {
  /// Left edge of a run of `width` anchored at `origin_x`
  pub fn start_x(self, origin_x: f32, width: f32) -> f32 {
    match self {
      Align::Start => origin_x,
      Align::Center => origin_x - width / 2.0,
      Align::End => origin_x - width,
    }
  }
}

/// One line of fitted text
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
  pub content: String,
  /// Resolved face (an exact registry key)
  pub font: FontKey,
  /// Font size in pixels
  pub size: f32,
  pub color: Paint,
  pub max_width: f32,
  /// Anchor point on the baseline
  pub origin: Point,
  pub align: Align,
  /// Measured advance width, never above `max_width`
  pub width: f32,
  /// Glyphs shaped while fitting; offsets are relative to the run start
  pub glyphs: Vec<PositionedGlyph>,
}

impl TextBlock {
  /// Horizontal extent of the run on the canvas
  pub fn span(&self) -> (f32, f32) {
    let start = self.align.start_x(self.origin.x, self.width);
    (start, start + self.width)
  }
}

/// Filled, optionally rounded rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct RectBlock {
  pub bounds: Rect,
  pub fill: Paint,
  pub corner_radius: f32,
}

/// Ring-shaped progress indicator
///
/// The stroke is centred on a circle inscribed in `bounds` and inset by half
/// the stroke width.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcBlock {
  pub bounds: Rect,
  /// Filled share of the ring in `[0, 1]`
  pub fraction: f32,
  pub stroke_color: Paint,
  pub track_color: Paint,
  pub stroke_width: f32,
}

impl ArcBlock {
  pub fn radius(&self) -> f32 {
    ((self.bounds.width().min(self.bounds.height()) - self.stroke_width) / 2.0).max(0.0)
  }
}

/// A single drawing primitive produced by layout
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
  Text(TextBlock),
  Rect(RectBlock),
  ProgressArc(ArcBlock),
}

impl ContentBlock {
  pub fn kind(&self) -> &'static str {
    match self {
      ContentBlock::Text(_) => "text",
      ContentBlock::Rect(_) => "rect",
      ContentBlock::ProgressArc(_) => "progress-arc",
    }
  }

  pub fn as_text(&self) -> Option<&TextBlock> {
    match self {
      ContentBlock::Text(text) => Some(text),
      _ => None,
    }
  }

  pub fn as_rect(&self) -> Option<&RectBlock> {
    match self {
      ContentBlock::Rect(rect) => Some(rect),
      _ => None,
    }
  }

  pub fn as_arc(&self) -> Option<&ArcBlock> {
    match self {
      ContentBlock::ProgressArc(arc) => Some(arc),
      _ => None,
    }
  }
}

/// Layout result for one card: the canvas and its blocks in paint order
#[derive(Debug, Clone, PartialEq)]
pub struct BlockTree {
  pub width: u32,
  pub height: u32,
  /// Plain-text summary of the card for accessibility
  pub title: String,
  /// Progress fraction drawn by the card, if any
  pub progress: Option<f32>,
  pub blocks: Vec<ContentBlock>,
}

impl BlockTree {
  pub fn canvas(&self) -> Rect {
    Rect::from_xywh(0.0, 0.0, self.width as f32, self.height as f32)
  }

  pub fn texts(&self) -> impl Iterator<Item = &TextBlock> {
    self.blocks.iter().filter_map(ContentBlock::as_text)
  }

  pub fn rects(&self) -> impl Iterator<Item = &RectBlock> {
    self.blocks.iter().filter_map(ContentBlock::as_rect)
  }

  pub fn arcs(&self) -> impl Iterator<Item = &ArcBlock> {
    self.blocks.iter().filter_map(ContentBlock::as_arc)
  }
}
