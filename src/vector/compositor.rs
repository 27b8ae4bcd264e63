//! Block tree to vector document
//!
//! This is the one place where semantic paint roles become concrete colours.
//! Text is written as outline paths of the glyphs shaped during layout, so the
//! document does not depend on fonts installed on the viewer.

use super::document::{GlyphRun, Primitive, StrokeCap, StrokedArc, VectorDocument};
use crate::error::Result;
use crate::geometry::{Point, ARC_START_ANGLE};
use crate::layout::{ArcBlock, BlockTree, ContentBlock, TextBlock};
use crate::text::glyph_path::SvgOutlineWriter;
use crate::text::FontRegistry;
use crate::theme::{Palette, Theme};
use std::f32::consts::TAU;

/// Converts a laid-out card into a vector document for `theme`.
pub fn compose(tree: &BlockTree, theme: Theme, fonts: &FontRegistry) -> Result<VectorDocument> {
  let palette = Palette::for_theme(theme);
  let mut doc = VectorDocument::new(tree.width, tree.height, tree.title.clone());

  for block in &tree.blocks {
    match block {
      ContentBlock::Rect(rect) => doc.push(Primitive::Rect {
        bounds: rect.bounds,
        corner_radius: rect.corner_radius,
        fill: palette.resolve(rect.fill),
      }),
      ContentBlock::ProgressArc(arc) => {
        for primitive in arc_primitives(arc, palette) {
          doc.push(primitive);
        }
      }
      ContentBlock::Text(text) => doc.push(Primitive::Glyphs(glyph_run(text, palette, fonts)?)),
    }
  }

  log::debug!(
    "composed {}x{} document with {} primitives ({})",
    tree.width,
    tree.height,
    doc.primitives.len(),
    theme
  );
  Ok(doc)
}

/// Track circle, then the progress arc from the top, clockwise
pub(crate) fn arc_primitives(arc: &ArcBlock, palette: &Palette) -> Vec<Primitive> {
  let center = arc.bounds.center();
  let radius = arc.radius();
  let mut primitives = vec![Primitive::Arc(StrokedArc {
    center,
    radius,
    start: ARC_START_ANGLE,
    sweep: TAU,
    stroke_width: arc.stroke_width,
    color: palette.resolve(arc.track_color),
    cap: StrokeCap::Butt,
  })];

  let fraction = arc.fraction.clamp(0.0, 1.0);
  if fraction > 0.0 {
    primitives.push(Primitive::Arc(StrokedArc {
      center,
      radius,
      start: ARC_START_ANGLE,
      sweep: fraction * TAU,
      stroke_width: arc.stroke_width,
      color: palette.resolve(arc.stroke_color),
      cap: if fraction >= 1.0 {
        StrokeCap::Butt
      } else {
        StrokeCap::Round
      },
    }));
  }
  primitives
}

fn glyph_run(text: &TextBlock, palette: &Palette, fonts: &FontRegistry) -> Result<GlyphRun> {
  let font = fonts.resolve_key(&text.font)?;
  let origin = Point::new(text.align.start_x(text.origin.x, text.width), text.origin.y);

  let face = font.as_ttf_face()?;
  let scale = font.scale(text.size);
  let mut writer = SvgOutlineWriter::new();
  for glyph in &text.glyphs {
    writer.place(scale, origin.x + glyph.x, origin.y + glyph.y);
    writer.append_glyph(&face, glyph.glyph_id);
  }

  Ok(GlyphRun {
    text: text.content.clone(),
    font: font.key(),
    size: text.size,
    origin,
    glyphs: text.glyphs.clone(),
    color: palette.resolve(text.color),
    path_data: writer.finish(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::layout::{LayoutBuilder, LayoutConfig, MetricsData, Variant, WidgetSpec};
  use crate::theme::Rgba;

  fn tree(variant: Variant) -> BlockTree {
    let fonts = FontRegistry::bundled().unwrap();
    let config = LayoutConfig::default();
    let metrics = MetricsData::new("Pages Read", 120.0)
      .with_target(300.0)
      .with_unit("pages");
    LayoutBuilder::new(&fonts, &config)
      .build(&WidgetSpec::new("w1", variant, 400, 120), &metrics)
      .unwrap()
  }

  #[test]
  fn palette_is_applied_per_theme() {
    let fonts = FontRegistry::bundled().unwrap();
    let tree = tree(Variant::Bar);
    let light = compose(&tree, Theme::Light, &fonts).unwrap();
    let dark = compose(&tree, Theme::Dark, &fonts).unwrap();

    let background = |doc: &VectorDocument| match &doc.primitives[1] {
      Primitive::Rect { fill, .. } => *fill,
      other => panic!("unexpected primitive {}", other.kind()),
    };
    assert_eq!(background(&light), Palette::LIGHT.background);
    assert_eq!(background(&dark), Palette::DARK.background);
    assert_ne!(light.to_svg(), dark.to_svg());
  }

  #[test]
  fn text_becomes_outline_paths() {
    let fonts = FontRegistry::bundled().unwrap();
    let doc = compose(&tree(Variant::Bar), Theme::Light, &fonts).unwrap();
    let runs: Vec<&GlyphRun> = doc
      .primitives
      .iter()
      .filter_map(|p| match p {
        Primitive::Glyphs(run) => Some(run),
        _ => None,
      })
      .collect();
    assert!(runs.iter().any(|r| r.text == "Pages Read"));
    assert!(runs.iter().all(|r| !r.path_data.is_empty()));
    assert!(!doc.to_svg().contains("<text"));
  }

  #[test]
  fn glyph_runs_reuse_layout_shaping() {
    let fonts = FontRegistry::bundled().unwrap();
    let tree = tree(Variant::Bar);
    let doc = compose(&tree, Theme::Light, &fonts).unwrap();
    let runs: Vec<&GlyphRun> = doc
      .primitives
      .iter()
      .filter_map(|p| match p {
        Primitive::Glyphs(run) => Some(run),
        _ => None,
      })
      .collect();
    let texts: Vec<&TextBlock> = tree.texts().collect();
    assert_eq!(runs.len(), texts.len());
    for (run, text) in runs.iter().zip(texts) {
      assert_eq!(run.text, text.content);
      assert_eq!(run.glyphs, text.glyphs);
    }
  }

  #[test]
  fn composition_draws_the_glyphs_it_is_given() {
    let fonts = FontRegistry::bundled().unwrap();
    let mut tree = tree(Variant::Number);
    let first = tree
      .blocks
      .iter_mut()
      .find_map(|block| match block {
        ContentBlock::Text(text) => Some(text),
        _ => None,
      })
      .expect("a text block");
    first.glyphs.truncate(1);
    let doc = compose(&tree, Theme::Light, &fonts).unwrap();
    let run = doc
      .primitives
      .iter()
      .find_map(|p| match p {
        Primitive::Glyphs(run) => Some(run),
        _ => None,
      })
      .expect("a glyph run");
    assert_eq!(run.glyphs.len(), 1);
  }

  #[test]
  fn ring_arc_sweeps_fraction_of_circle() {
    let arc = ArcBlock {
      bounds: crate::geometry::Rect::from_xywh(0.0, 0.0, 100.0, 100.0),
      fraction: 0.25,
      stroke_color: crate::theme::Paint::Accent,
      track_color: crate::theme::Paint::Track,
      stroke_width: 10.0,
    };
    let primitives = arc_primitives(&arc, &Palette::LIGHT);
    assert_eq!(primitives.len(), 2);
    match &primitives[1] {
      Primitive::Arc(progress) => {
        assert!((progress.sweep - TAU / 4.0).abs() < 1e-6);
        assert_eq!(progress.start, ARC_START_ANGLE);
        assert_eq!(progress.radius, 45.0);
        assert_eq!(progress.color, Palette::LIGHT.accent);
      }
      other => panic!("unexpected primitive {}", other.kind()),
    }

    let empty = ArcBlock { fraction: 0.0, ..arc };
    assert_eq!(arc_primitives(&empty, &Palette::LIGHT).len(), 1);
  }

  #[test]
  fn composition_is_deterministic() {
    let fonts = FontRegistry::bundled().unwrap();
    let tree = tree(Variant::Ring);
    let a = compose(&tree, Theme::Dark, &fonts).unwrap().to_svg();
    let b = compose(&tree, Theme::Dark, &fonts).unwrap().to_svg();
    assert_eq!(a, b);
  }

  #[test]
  fn document_has_no_unresolved_colours() {
    let fonts = FontRegistry::bundled().unwrap();
    let doc = compose(&tree(Variant::Number), Theme::Light, &fonts).unwrap();
    for primitive in &doc.primitives {
      let color = match primitive {
        Primitive::Rect { fill, .. } => *fill,
        Primitive::Arc(arc) => arc.color,
        Primitive::Glyphs(run) => run.color,
      };
      assert_ne!(color, Rgba::TRANSPARENT);
    }
  }
}
