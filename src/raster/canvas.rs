//! Drawing surface used by the rasterizer
//!
//! Wraps a tiny-skia pixmap and a base transform mapping canvas coordinates
//! to device pixels. All drawing is anti-aliased and source-over.

use super::pixmap::new_pixmap;
use crate::error::Result;
use crate::geometry::{arc_segments, Point, Rect};
use crate::text::glyph_path::{glyph_transform, raster_glyph_path};
use crate::text::{FontAsset, PositionedGlyph};
use crate::theme::Rgba;
use crate::vector::StrokeCap;
use std::f32::consts::TAU;
use tiny_skia::{FillRule, LineCap, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};

/// Magic number for circle approximation: 4/3 * tan(π/8)
const KAPPA: f32 = 0.552_284_8;

pub struct Canvas {
  pixmap: Pixmap,
  transform: Transform,
}

impl Canvas {
  /// Transparent canvas of `width` x `height` device pixels
  pub fn new(width: u32, height: u32, transform: Transform) -> Result<Self> {
    Ok(Self {
      pixmap: new_pixmap(width, height)?,
      transform,
    })
  }

  pub fn width(&self) -> u32 {
    self.pixmap.width()
  }

  pub fn height(&self) -> u32 {
    self.pixmap.height()
  }

  pub fn pixmap(&self) -> &Pixmap {
    &self.pixmap
  }

  pub fn into_pixmap(self) -> Pixmap {
    self.pixmap
  }

  fn paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
  }

  /// Fills a rectangle, rounding its corners when `corner_radius > 0`.
  pub fn fill_rect(&mut self, bounds: Rect, corner_radius: f32, color: Rgba) {
    if color.is_transparent() || bounds.size.is_empty() {
      return;
    }
    let path = if corner_radius > 0.0 {
      rounded_rect_path(bounds, corner_radius)
    } else {
      tiny_skia::Rect::from_xywh(bounds.x(), bounds.y(), bounds.width(), bounds.height())
        .map(PathBuilder::from_rect)
    };
    if let Some(path) = path {
      self.pixmap.fill_path(
        &path,
        &Self::paint(color),
        FillRule::Winding,
        self.transform,
        None,
      );
    }
  }

  /// Strokes a circular arc; a full turn is drawn as a closed circle.
  #[allow(clippy::too_many_arguments)]
  pub fn stroke_arc(
    &mut self,
    center: Point,
    radius: f32,
    start: f32,
    sweep: f32,
    stroke_width: f32,
    color: Rgba,
    cap: StrokeCap,
  ) {
    if color.is_transparent() || radius <= 0.0 || stroke_width <= 0.0 {
      return;
    }
    let Some(path) = arc_path(center, radius, start, sweep) else {
      return;
    };
    let stroke = Stroke {
      width: stroke_width,
      line_cap: match cap {
        StrokeCap::Butt => LineCap::Butt,
        StrokeCap::Round => LineCap::Round,
      },
      ..Stroke::default()
    };
    self
      .pixmap
      .stroke_path(&path, &Self::paint(color), &stroke, self.transform, None);
  }

  /// Fills shaped glyphs whose run starts at `origin` on the baseline.
  ///
  /// Glyphs without an outline (spaces) are skipped.
  pub fn fill_glyphs(
    &mut self,
    font: &FontAsset,
    glyphs: &[PositionedGlyph],
    origin: Point,
    size: f32,
    color: Rgba,
  ) -> Result<()> {
    if color.is_transparent() || glyphs.is_empty() {
      return Ok(());
    }
    let face = font.as_ttf_face()?;
    let scale = font.scale(size);
    let paint = Self::paint(color);
    for glyph in glyphs {
      let Some(path) = raster_glyph_path(&face, glyph.glyph_id) else {
        continue;
      };
      let placement = glyph_transform(scale, origin.x + glyph.x, origin.y + glyph.y);
      self.pixmap.fill_path(
        &path,
        &paint,
        FillRule::Winding,
        self.transform.pre_concat(placement),
        None,
      );
    }
    Ok(())
  }
}

fn arc_path(center: Point, radius: f32, start: f32, sweep: f32) -> Option<Path> {
  let segments = arc_segments(center, radius, start, sweep);
  let first = segments.first()?;
  let mut pb = PathBuilder::new();
  pb.move_to(first.from.x, first.from.y);
  for segment in &segments {
    pb.cubic_to(
      segment.ctrl1.x,
      segment.ctrl1.y,
      segment.ctrl2.x,
      segment.ctrl2.y,
      segment.to.x,
      segment.to.y,
    );
  }
  if sweep.abs() >= TAU - 1e-4 {
    pb.close();
  }
  pb.finish()
}

fn rounded_rect_path(bounds: Rect, radius: f32) -> Option<Path> {
  let r = radius
    .min(bounds.width() / 2.0)
    .min(bounds.height() / 2.0)
    .max(0.0);
  let k = r * (1.0 - KAPPA);
  let (x0, y0, x1, y1) = (bounds.min_x(), bounds.min_y(), bounds.max_x(), bounds.max_y());

  let mut pb = PathBuilder::new();
  pb.move_to(x0 + r, y0);
  pb.line_to(x1 - r, y0);
  pb.cubic_to(x1 - k, y0, x1, y0 + k, x1, y0 + r);
  pb.line_to(x1, y1 - r);
  pb.cubic_to(x1, y1 - k, x1 - k, y1, x1 - r, y1);
  pb.line_to(x0 + r, y1);
  pb.cubic_to(x0 + k, y1, x0, y1 - k, x0, y1 - r);
  pb.line_to(x0, y0 + r);
  pb.cubic_to(x0, y0 + k, x0 + k, y0, x0 + r, y0);
  pb.close();
  pb.finish()
}
