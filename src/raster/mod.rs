//! Rasterization
//!
//! Draws a [`VectorDocument`] into a fixed-size pixmap with tiny-skia and
//! encodes it as PNG. Glyph outlines are rebuilt from the registry's font
//! bytes, so raster and vector output draw the same shapes.
//!
//! The document is validated before any pixel is touched. A failure here
//! means the compositor produced something it should not have, so it is
//! reported as a [`RasterizeError`] and logged along with the document.
//!
//! # Module Organization
//!
//! - `canvas` - drawing surface (rects, arcs, glyphs)
//! - `encode` - PNG encoding and decoding
//! - `pixmap` - guarded pixmap allocation
//! - `pool` - dedicated thread pool for raster work

pub mod canvas;
pub mod encode;
mod pixmap;
pub mod pool;

pub use canvas::Canvas;
pub use encode::{decode_png, encode_png};
pub use pool::RasterPool;

use crate::error::{RasterizeError, Result};
use crate::geometry::{Point, Rect, ARC_START_ANGLE};
use crate::layout::{BlockTree, ContentBlock};
use crate::svg::{map_svg_aspect_ratio, SvgPreserveAspectRatio};
use crate::text::FontRegistry;
use crate::theme::{Palette, Theme};
use crate::vector::{GlyphRun, Primitive, StrokeCap, StrokedArc, VectorDocument, ViewBox};
use std::f32::consts::TAU;
use tiny_skia::{Pixmap, Transform};

/// Rasterizes a document to PNG bytes of exactly `target_width` x
/// `target_height` pixels.
///
/// The viewBox is fitted into the target with `xMidYMid meet`.
pub fn rasterize(
  doc: &VectorDocument,
  fonts: &FontRegistry,
  target_width: u32,
  target_height: u32,
) -> Result<Vec<u8>> {
  let pixmap = rasterize_pixmap(doc, fonts, target_width, target_height)?;
  encode_png(&pixmap)
}

/// Like [`rasterize`], returning the pixmap instead of encoded bytes.
pub fn rasterize_pixmap(
  doc: &VectorDocument,
  fonts: &FontRegistry,
  target_width: u32,
  target_height: u32,
) -> Result<Pixmap> {
  let result = draw_document(doc, fonts, target_width, target_height);
  if let Err(err) = &result {
    log::error!("rasterization failed: {err}; document: {}", doc.to_svg());
  }
  result
}

fn draw_document(
  doc: &VectorDocument,
  fonts: &FontRegistry,
  target_width: u32,
  target_height: u32,
) -> Result<Pixmap> {
  validate_document(doc, fonts)?;
  let transform = fit_transform(doc.view_box, target_width, target_height);
  let mut canvas = Canvas::new(target_width, target_height, transform)?;

  for primitive in &doc.primitives {
    match primitive {
      Primitive::Rect {
        bounds,
        corner_radius,
        fill,
      } => canvas.fill_rect(*bounds, *corner_radius, *fill),
      Primitive::Arc(arc) => canvas.stroke_arc(
        arc.center,
        arc.radius,
        arc.start,
        arc.sweep,
        arc.stroke_width,
        arc.color,
        arc.cap,
      ),
      Primitive::Glyphs(run) => {
        let font = fonts.get(&run.font).ok_or_else(|| unknown_font(run))?;
        canvas.fill_glyphs(font, &run.glyphs, run.origin, run.size, run.color)?;
      }
    }
  }

  Ok(canvas.into_pixmap())
}

/// Paints a block tree straight to PNG, without building a vector document.
///
/// Used to cross-check the document path: both should agree up to
/// anti-aliasing noise.
pub fn render_blocks(
  tree: &BlockTree,
  theme: Theme,
  fonts: &FontRegistry,
  target_width: u32,
  target_height: u32,
) -> Result<Vec<u8>> {
  let palette = Palette::for_theme(theme);
  let view_box = ViewBox::new(0.0, 0.0, tree.width as f32, tree.height as f32);
  let transform = fit_transform(view_box, target_width, target_height);
  let mut canvas = Canvas::new(target_width, target_height, transform)?;

  for block in &tree.blocks {
    match block {
      ContentBlock::Rect(rect) => {
        canvas.fill_rect(rect.bounds, rect.corner_radius, palette.resolve(rect.fill))
      }
      ContentBlock::ProgressArc(arc) => {
        let center = arc.bounds.center();
        let radius = arc.radius();
        canvas.stroke_arc(
          center,
          radius,
          ARC_START_ANGLE,
          TAU,
          arc.stroke_width,
          palette.resolve(arc.track_color),
          StrokeCap::Butt,
        );
        let fraction = arc.fraction.clamp(0.0, 1.0);
        if fraction > 0.0 {
          let cap = if fraction >= 1.0 {
            StrokeCap::Butt
          } else {
            StrokeCap::Round
          };
          canvas.stroke_arc(
            center,
            radius,
            ARC_START_ANGLE,
            fraction * TAU,
            arc.stroke_width,
            palette.resolve(arc.stroke_color),
            cap,
          );
        }
      }
      ContentBlock::Text(text) => {
        let font = fonts.resolve_key(&text.font)?;
        let origin = Point::new(text.align.start_x(text.origin.x, text.width), text.origin.y);
        canvas.fill_glyphs(font, &text.glyphs, origin, text.size, palette.resolve(text.color))?;
      }
    }
  }

  encode_png(canvas.pixmap())
}

fn fit_transform(view_box: ViewBox, target_width: u32, target_height: u32) -> Transform {
  map_svg_aspect_ratio(
    view_box,
    SvgPreserveAspectRatio::default(),
    target_width as f32,
    target_height as f32,
  )
}

fn malformed(reason: impl Into<String>) -> RasterizeError {
  RasterizeError::MalformedDocument {
    reason: reason.into(),
  }
}

fn unknown_font(run: &GlyphRun) -> RasterizeError {
  RasterizeError::UnsupportedPrimitive {
    primitive: "glyphs".to_string(),
    reason: format!("font {} is not registered", run.font),
  }
}

fn finite_rect(rect: Rect) -> bool {
  rect.is_finite() && rect.width() >= 0.0 && rect.height() >= 0.0
}

/// Rejects documents the rasterizer cannot draw faithfully.
pub fn validate_document(doc: &VectorDocument, fonts: &FontRegistry) -> Result<()> {
  if !doc.view_box.is_valid() {
    return Err(malformed("viewBox is empty or not finite").into());
  }

  for (index, primitive) in doc.primitives.iter().enumerate() {
    match primitive {
      Primitive::Rect {
        bounds,
        corner_radius,
        ..
      } => {
        if !finite_rect(*bounds) || !corner_radius.is_finite() || *corner_radius < 0.0 {
          return Err(malformed(format!("rect #{index} has invalid geometry")).into());
        }
      }
      Primitive::Arc(arc) => validate_arc(index, arc)?,
      Primitive::Glyphs(run) => {
        if !run.origin.is_finite() || !run.size.is_finite() || run.size <= 0.0 {
          return Err(malformed(format!("glyph run #{index} has invalid placement")).into());
        }
        let font = fonts.get(&run.font).ok_or_else(|| unknown_font(run))?;
        let glyph_count = font.glyph_count();
        if let Some(glyph) = run.glyphs.iter().find(|g| g.glyph_id >= glyph_count) {
          return Err(
            RasterizeError::UnsupportedPrimitive {
              primitive: "glyphs".to_string(),
              reason: format!(
                "glyph id {} is outside font {} ({} glyphs)",
                glyph.glyph_id, run.font, glyph_count
              ),
            }
            .into(),
          );
        }
        if run.glyphs.iter().any(|g| !g.x.is_finite() || !g.y.is_finite()) {
          return Err(malformed(format!("glyph run #{index} has non-finite offsets")).into());
        }
      }
    }
  }
  Ok(())
}

fn validate_arc(index: usize, arc: &StrokedArc) -> Result<()> {
  let finite = arc.center.is_finite()
    && [arc.radius, arc.start, arc.sweep, arc.stroke_width]
      .iter()
      .all(|v| v.is_finite());
  if !finite || arc.radius < 0.0 || arc.stroke_width < 0.0 {
    return Err(malformed(format!("arc #{index} has invalid geometry")).into());
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::text::{FontKey, FontStyle, FontWeight, PositionedGlyph, DEFAULT_FAMILY};
  use crate::theme::Rgba;
  use crate::Error;

  fn square_doc() -> VectorDocument {
    let mut doc = VectorDocument::new(10, 10, "square");
    doc.push(Primitive::Rect {
      bounds: Rect::from_xywh(0.0, 0.0, 10.0, 10.0),
      corner_radius: 0.0,
      fill: Rgba::rgb(0, 0, 255),
    });
    doc
  }

  #[test]
  fn output_matches_target_size() {
    let fonts = FontRegistry::bundled().unwrap();
    let pixmap = rasterize_pixmap(&square_doc(), &fonts, 30, 20).unwrap();
    assert_eq!((pixmap.width(), pixmap.height()), (30, 20));
    // Meet-fitting a square into 30x20 leaves 5px bars left and right.
    let center = pixmap.pixel(15, 10).unwrap().demultiply();
    assert_eq!((center.blue(), center.alpha()), (255, 255));
    assert_eq!(pixmap.pixel(2, 10).unwrap().alpha(), 0);
  }

  #[test]
  fn empty_view_box_is_malformed() {
    let fonts = FontRegistry::bundled().unwrap();
    let mut doc = square_doc();
    doc.view_box = ViewBox::new(0.0, 0.0, 0.0, 10.0);
    let err = rasterize(&doc, &fonts, 10, 10).unwrap_err();
    assert!(matches!(
      err,
      Error::Rasterize(RasterizeError::MalformedDocument { .. })
    ));
  }

  #[test]
  fn non_finite_geometry_is_malformed() {
    let fonts = FontRegistry::bundled().unwrap();
    let mut doc = square_doc();
    doc.push(Primitive::Rect {
      bounds: Rect::from_xywh(f32::NAN, 0.0, 1.0, 1.0),
      corner_radius: 0.0,
      fill: Rgba::BLACK,
    });
    assert!(matches!(
      rasterize(&doc, &fonts, 10, 10),
      Err(Error::Rasterize(RasterizeError::MalformedDocument { .. }))
    ));
  }

  fn glyph_doc(font: FontKey, glyph_id: u16) -> VectorDocument {
    let mut doc = square_doc();
    doc.push(Primitive::Glyphs(GlyphRun {
      text: "x".to_string(),
      font,
      size: 8.0,
      origin: Point::new(1.0, 8.0),
      glyphs: vec![PositionedGlyph {
        glyph_id,
        x: 0.0,
        y: 0.0,
      }],
      color: Rgba::BLACK,
      path_data: String::new(),
    }));
    doc
  }

  #[test]
  fn unknown_font_is_unsupported() {
    let fonts = FontRegistry::bundled().unwrap();
    let doc = glyph_doc(
      FontKey::new("Nope", FontWeight::NORMAL, FontStyle::Normal),
      1,
    );
    assert!(matches!(
      rasterize(&doc, &fonts, 10, 10),
      Err(Error::Rasterize(RasterizeError::UnsupportedPrimitive { .. }))
    ));
  }

  #[test]
  fn out_of_range_glyph_is_unsupported() {
    let fonts = FontRegistry::bundled().unwrap();
    let doc = glyph_doc(
      FontKey::new(DEFAULT_FAMILY, FontWeight::NORMAL, FontStyle::Normal),
      u16::MAX,
    );
    assert!(matches!(
      rasterize(&doc, &fonts, 10, 10),
      Err(Error::Rasterize(RasterizeError::UnsupportedPrimitive { .. }))
    ));
  }

  #[test]
  fn zero_target_is_rejected() {
    let fonts = FontRegistry::bundled().unwrap();
    assert!(matches!(
      rasterize(&square_doc(), &fonts, 0, 10),
      Err(Error::Rasterize(RasterizeError::InvalidTargetSize { .. }))
    ));
  }

  #[test]
  fn rasterize_is_deterministic() {
    let fonts = FontRegistry::bundled().unwrap();
    let doc = square_doc();
    assert_eq!(
      rasterize(&doc, &fonts, 64, 64).unwrap(),
      rasterize(&doc, &fonts, 64, 64).unwrap()
    );
  }
}
