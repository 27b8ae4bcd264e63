//! Single-line text shaping
//!
//! Card text is always one line in one face, so shaping reduces to a single
//! rustybuzz call per run. Positions are converted from design units to pixels
//! at the requested font size; the run origin is the left end of the baseline.

use super::font_registry::FontAsset;
use crate::error::{FontError, Result};

/// A glyph positioned relative to the run origin, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedGlyph {
  pub glyph_id: u16,
  /// Offset along the baseline
  pub x: f32,
  /// Offset from the baseline, y-down
  pub y: f32,
}

/// Result of shaping one line of text
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedRun {
  pub glyphs: Vec<PositionedGlyph>,
  /// Total advance in pixels
  pub width: f32,
  pub font_size: f32,
}

impl ShapedRun {
  pub fn empty(font_size: f32) -> Self {
    Self {
      glyphs: Vec::new(),
      width: 0.0,
      font_size,
    }
  }
}

/// Shapes `text` with `font` at `font_size` pixels.
pub fn shape_text(font: &FontAsset, text: &str, font_size: f32) -> Result<ShapedRun> {
  if text.is_empty() {
    return Ok(ShapedRun::empty(font_size));
  }

  let face = rustybuzz::Face::from_slice(&font.data, font.index).ok_or_else(|| {
    FontError::LoadFailed {
      family: font.family.clone(),
      weight: font.weight.value(),
      reason: "shaper rejected font data".to_string(),
    }
  })?;

  let mut buffer = rustybuzz::UnicodeBuffer::new();
  buffer.push_str(text);
  buffer.guess_segment_properties();
  let output = rustybuzz::shape(&face, &[], buffer);

  let scale = font.scale(font_size);
  let mut glyphs = Vec::with_capacity(output.len());
  let mut pen_x = 0.0f32;
  for (info, pos) in output
    .glyph_infos()
    .iter()
    .zip(output.glyph_positions().iter())
  {
    glyphs.push(PositionedGlyph {
      glyph_id: info.glyph_id as u16,
      x: pen_x + pos.x_offset as f32 * scale,
      y: -(pos.y_offset as f32) * scale,
    });
    pen_x += pos.x_advance as f32 * scale;
  }

  Ok(ShapedRun {
    glyphs,
    width: pen_x,
    font_size,
  })
}

/// Advance width of `text` in pixels
pub fn measure_text(font: &FontAsset, text: &str, font_size: f32) -> Result<f32> {
  Ok(shape_text(font, text, font_size)?.width)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::text::{FontRegistry, FontStyle, FontWeight, DEFAULT_FAMILY};

  fn regular(fonts: &FontRegistry) -> &FontAsset {
    fonts
      .resolve(DEFAULT_FAMILY, FontWeight::NORMAL, FontStyle::Normal)
      .unwrap()
  }

  #[test]
  fn empty_text_has_no_glyphs() {
    let fonts = FontRegistry::bundled().unwrap();
    let run = shape_text(regular(&fonts), "", 16.0).unwrap();
    assert!(run.glyphs.is_empty());
    assert_eq!(run.width, 0.0);
  }

  #[test]
  fn width_scales_linearly_with_size() {
    let fonts = FontRegistry::bundled().unwrap();
    let font = regular(&fonts);
    let small = measure_text(font, "Progress 42%", 10.0).unwrap();
    let large = measure_text(font, "Progress 42%", 20.0).unwrap();
    assert!(small > 0.0);
    assert!((large - small * 2.0).abs() < 0.01);
  }

  #[test]
  fn glyph_positions_advance_monotonically() {
    let fonts = FontRegistry::bundled().unwrap();
    let run = shape_text(regular(&fonts), "abc", 16.0).unwrap();
    assert_eq!(run.glyphs.len(), 3);
    assert!(run.glyphs[0].x < run.glyphs[1].x);
    assert!(run.glyphs[1].x < run.glyphs[2].x);
    assert!(run.glyphs[2].x < run.width);
  }

  #[test]
  fn bold_text_is_wider() {
    let fonts = FontRegistry::bundled().unwrap();
    let bold = fonts
      .resolve(DEFAULT_FAMILY, FontWeight::BOLD, FontStyle::Normal)
      .unwrap();
    let regular_width = measure_text(regular(&fonts), "Weekly goal", 16.0).unwrap();
    let bold_width = measure_text(bold, "Weekly goal", 16.0).unwrap();
    assert!(bold_width > regular_width);
  }
}
