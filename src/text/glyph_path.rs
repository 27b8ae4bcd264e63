//! Glyph outline extraction
//!
//! Both output formats draw text as filled glyph outlines taken from the same
//! font bytes. [`RasterOutlineBuilder`] records an outline as a tiny-skia path
//! in font design units (y-up), to be placed with [`glyph_transform`].
//! [`SvgOutlineWriter`] writes the same outline straight into SVG path data,
//! already scaled and flipped into canvas pixels.

use crate::vector::document::push_number;
use tiny_skia::{Path, PathBuilder, Transform};
use ttf_parser::{GlyphId, OutlineBuilder};

/// Converts ttf-parser glyph outlines to tiny-skia paths.
pub struct RasterOutlineBuilder {
  builder: PathBuilder,
}

impl RasterOutlineBuilder {
  pub fn new() -> Self {
    Self {
      builder: PathBuilder::new(),
    }
  }

  /// Returns `None` for glyphs without contours (e.g. spaces).
  pub fn finish(self) -> Option<Path> {
    self.builder.finish()
  }
}

impl Default for RasterOutlineBuilder {
  fn default() -> Self {
    Self::new()
  }
}

impl OutlineBuilder for RasterOutlineBuilder {
  fn move_to(&mut self, x: f32, y: f32) {
    self.builder.move_to(x, y);
  }

  fn line_to(&mut self, x: f32, y: f32) {
    self.builder.line_to(x, y);
  }

  fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
    self.builder.quad_to(x1, y1, x, y);
  }

  fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
    self.builder.cubic_to(x1, y1, x2, y2, x, y);
  }

  fn close(&mut self) {
    self.builder.close();
  }
}

/// Builds the design-unit outline of one glyph.
pub fn raster_glyph_path(face: &ttf_parser::Face<'_>, glyph_id: u16) -> Option<Path> {
  let mut builder = RasterOutlineBuilder::new();
  face.outline_glyph(GlyphId(glyph_id), &mut builder)?;
  builder.finish()
}

/// Transform used for mapping font design units to device pixels.
///
/// `scale` converts design units to pixels; translation is applied after
/// scaling. The Y axis is flipped to match the y-down canvas, exactly as
/// [`SvgOutlineWriter`] does for vector output.
#[inline]
pub fn glyph_transform(scale: f32, x: f32, y: f32) -> Transform {
  Transform::from_row(scale, 0.0, 0.0, -scale, x, y)
}

/// Writes glyph outlines as SVG path data in canvas pixels.
///
/// Several glyphs can be appended to one writer; the result is a single
/// `d` attribute for the whole text run.
pub struct SvgOutlineWriter {
  data: String,
  scale: f32,
  origin_x: f32,
  origin_y: f32,
}

impl SvgOutlineWriter {
  pub fn new() -> Self {
    Self {
      data: String::new(),
      scale: 1.0,
      origin_x: 0.0,
      origin_y: 0.0,
    }
  }

  /// Places the next glyph with its origin (on the baseline) at `(x, y)`.
  pub fn place(&mut self, scale: f32, x: f32, y: f32) {
    self.scale = scale;
    self.origin_x = x;
    self.origin_y = y;
  }

  /// Appends the outline of `glyph_id` at the current placement.
  ///
  /// Returns false when the glyph has no outline.
  pub fn append_glyph(&mut self, face: &ttf_parser::Face<'_>, glyph_id: u16) -> bool {
    face.outline_glyph(GlyphId(glyph_id), self).is_some()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  pub fn finish(self) -> String {
    self.data
  }

  fn command(&mut self, cmd: char, points: &[(f32, f32)]) {
    if !self.data.is_empty() {
      self.data.push(' ');
    }
    self.data.push(cmd);
    for (i, &(x, y)) in points.iter().enumerate() {
      if i > 0 {
        self.data.push(' ');
      }
      push_number(&mut self.data, self.origin_x + x * self.scale);
      self.data.push(' ');
      push_number(&mut self.data, self.origin_y - y * self.scale);
    }
  }
}

impl Default for SvgOutlineWriter {
  fn default() -> Self {
    Self::new()
  }
}

impl OutlineBuilder for SvgOutlineWriter {
  fn move_to(&mut self, x: f32, y: f32) {
    self.command('M', &[(x, y)]);
  }

  fn line_to(&mut self, x: f32, y: f32) {
    self.command('L', &[(x, y)]);
  }

  fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
    self.command('Q', &[(x1, y1), (x, y)]);
  }

  fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
    self.command('C', &[(x1, y1), (x2, y2), (x, y)]);
  }

  fn close(&mut self) {
    if !self.data.is_empty() {
      self.data.push(' ');
    }
    self.data.push('Z');
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn svg_writer_scales_and_flips() {
    let mut writer = SvgOutlineWriter::new();
    writer.place(0.5, 10.0, 20.0);
    OutlineBuilder::move_to(&mut writer, 0.0, 0.0);
    OutlineBuilder::line_to(&mut writer, 10.0, 10.0);
    OutlineBuilder::quad_to(&mut writer, 20.0, 0.0, 30.0, -4.0);
    OutlineBuilder::close(&mut writer);
    assert_eq!(writer.finish(), "M10 20 L15 15 Q20 20 25 22 Z");
  }

  #[test]
  fn raster_builder_produces_path() {
    let mut builder = RasterOutlineBuilder::new();
    OutlineBuilder::move_to(&mut builder, 0.0, 0.0);
    OutlineBuilder::line_to(&mut builder, 10.0, 0.0);
    OutlineBuilder::curve_to(&mut builder, 20.0, 5.0, 25.0, 5.0, 30.0, 0.0);
    OutlineBuilder::close(&mut builder);
    let path = builder.finish().unwrap();
    assert_eq!(path.bounds().right(), 30.0);
  }

  #[test]
  fn empty_raster_builder_yields_none() {
    assert!(RasterOutlineBuilder::new().finish().is_none());
  }

  #[test]
  fn glyph_transform_flips_y() {
    let transform = glyph_transform(2.0, 10.0, 20.0);
    assert!((transform.sx - 2.0).abs() < 1e-6);
    assert_eq!((transform.kx, transform.ky), (0.0, 0.0));
    assert!((transform.sy + 2.0).abs() < 1e-6);
    assert_eq!(transform.tx, 10.0);
    assert_eq!(transform.ty, 20.0);
  }

  #[test]
  fn raster_placement_matches_svg_outline_coordinates() {
    let (scale, origin_x, origin_y) = (0.5, 12.0, 30.0);
    let transform = glyph_transform(scale, origin_x, origin_y);

    let mut writer = SvgOutlineWriter::new();
    writer.place(scale, origin_x, origin_y);
    writer.move_to(100.0, 40.0);
    assert_eq!(writer.finish(), "M62 10");

    let x = transform.sx * 100.0 + transform.kx * 40.0 + transform.tx;
    let y = transform.ky * 100.0 + transform.sy * 40.0 + transform.ty;
    assert_eq!((x, y), (62.0, 10.0));
  }
}
