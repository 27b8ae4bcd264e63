//! Fixed per-variant card templates
//!
//! All geometry is derived from the padding-adjusted content area, so a card
//! scales with its canvas. Font sizes are fractions of the content height.

use super::blocks::{Align, ArcBlock, ContentBlock, RectBlock, TextBlock};
use super::format::{format_percent, format_value, format_value_text};
use super::text_fit::fit_text;
use super::widget::MetricsData;
use super::LayoutConfig;
use crate::error::Result;
use crate::geometry::{EdgeOffsets, Point, Rect};
use crate::text::{FontAsset, FontRegistry, FontStyle, FontWeight, ScaledMetrics};
use crate::theme::{Paint, HEAT_LEVELS};

const HEATMAP_ROWS: usize = 7;

/// Font role of a text run
#[derive(Debug, Clone, Copy)]
struct TextStyle {
  weight: FontWeight,
  size: f32,
  color: Paint,
}

impl TextStyle {
  fn heading(size: f32) -> Self {
    Self {
      weight: FontWeight::BOLD,
      size,
      color: Paint::TextPrimary,
    }
  }

  fn body(size: f32) -> Self {
    Self {
      weight: FontWeight::NORMAL,
      size,
      color: Paint::TextPrimary,
    }
  }

  fn caption(size: f32) -> Self {
    Self {
      weight: FontWeight::NORMAL,
      size,
      color: Paint::TextSecondary,
    }
  }
}

/// Canvas state shared by the templates
pub(super) struct Frame<'a> {
  fonts: &'a FontRegistry,
  config: &'a LayoutConfig,
  canvas: Rect,
  content: Rect,
  padding: f32,
  blocks: Vec<ContentBlock>,
}

impl<'a> Frame<'a> {
  pub(super) fn new(fonts: &'a FontRegistry, config: &'a LayoutConfig, width: u32, height: u32) -> Self {
    let canvas = Rect::from_xywh(0.0, 0.0, width as f32, height as f32);
    let shorter = canvas.width().min(canvas.height());
    let padding = (shorter * config.padding_ratio).max(config.min_padding);
    Self {
      fonts,
      config,
      canvas,
      content: canvas.inset(EdgeOffsets::all(padding)),
      padding,
      blocks: Vec::new(),
    }
  }

  pub(super) fn into_blocks(self) -> Vec<ContentBlock> {
    self.blocks
  }

  /// One-pixel border with the background inset inside it
  pub(super) fn card_background(&mut self) {
    let shorter = self.canvas.width().min(self.canvas.height());
    let radius = shorter * self.config.corner_radius_ratio;
    self.rect(self.canvas, Paint::Border, radius);
    self.rect(
      self.canvas.inset(EdgeOffsets::all(1.0)),
      Paint::Background,
      (radius - 1.0).max(0.0),
    );
  }

  fn font(&self, weight: FontWeight) -> Result<&'a FontAsset> {
    self
      .fonts
      .resolve(&self.config.font_family, weight, FontStyle::Normal)
  }

  fn metrics(&self, style: TextStyle) -> Result<ScaledMetrics> {
    Ok(self.font(style.weight)?.metrics(style.size))
  }

  /// Fits a run without adding it to the frame.
  fn fit(
    &self,
    style: TextStyle,
    content: &str,
    origin: Point,
    align: Align,
    max_width: f32,
  ) -> Result<TextBlock> {
    let font = self.font(style.weight)?;
    let max_width = max_width.max(0.0);
    let fitted = fit_text(font, content.trim(), style.size, max_width, self.config)?;
    Ok(TextBlock {
      content: fitted.content,
      font: font.key(),
      size: fitted.size,
      color: style.color,
      max_width,
      origin,
      align,
      width: fitted.width,
      glyphs: fitted.glyphs,
    })
  }

  fn push_text(&mut self, block: TextBlock) {
    if !block.content.is_empty() {
      self.blocks.push(ContentBlock::Text(block));
    }
  }

  fn text(
    &mut self,
    style: TextStyle,
    content: &str,
    origin: Point,
    align: Align,
    max_width: f32,
  ) -> Result<f32> {
    let block = self.fit(style, content, origin, align, max_width)?;
    let width = block.width;
    self.push_text(block);
    Ok(width)
  }

  fn rect(&mut self, bounds: Rect, fill: Paint, corner_radius: f32) {
    if bounds.size.is_empty() {
      return;
    }
    let corner_radius = corner_radius
      .min(bounds.width() / 2.0)
      .min(bounds.height() / 2.0)
      .max(0.0);
    self.blocks.push(ContentBlock::Rect(RectBlock {
      bounds,
      fill,
      corner_radius,
    }));
  }
}

/// Label and value on one row, label on the left
fn header_row(frame: &mut Frame<'_>, metrics: &MetricsData, value_text: &str, size: f32) -> Result<f32> {
  let content = frame.content;
  let heading = TextStyle::heading(size);
  let line = frame.metrics(heading)?;
  let baseline = content.y() + line.ascent;

  let value = frame.fit(
    TextStyle::body(size),
    value_text,
    Point::new(content.max_x(), baseline),
    Align::End,
    content.width() * 0.45,
  )?;
  let gap = if value.width > 0.0 { frame.padding / 2.0 } else { 0.0 };
  let label = frame.fit(
    heading,
    &metrics.label,
    Point::new(content.x(), baseline),
    Align::Start,
    content.width() - value.width - gap,
  )?;
  frame.push_text(label);
  frame.push_text(value);
  Ok(line.line_height())
}

pub(super) fn bar(frame: &mut Frame<'_>, metrics: &MetricsData) -> Result<Option<f64>> {
  let progress = metrics.progress().unwrap_or(0.0);
  let content = frame.content;
  let (w, h) = (content.width(), content.height());

  let value_text = format_value_text(metrics.current_value, metrics.target_value, &metrics.unit);
  header_row(frame, metrics, &value_text, h * 0.24)?;

  let track_height = (h * 0.2).max(2.0);
  let track = Rect::from_xywh(content.x(), content.y() + h * 0.42, w, track_height);
  let radius = track_height / 2.0;
  frame.rect(track, Paint::Track, radius);
  let fill_width = w * progress as f32;
  if fill_width > 0.0 {
    frame.rect(
      Rect::from_xywh(track.x(), track.y(), fill_width, track_height),
      Paint::Accent,
      radius,
    );
  }

  let caption = TextStyle::caption(h * 0.17);
  let line = frame.metrics(caption)?;
  frame.text(
    caption,
    &format!("{} complete", format_percent(progress)),
    Point::new(content.x(), content.max_y() - line.descent),
    Align::Start,
    w,
  )?;

  Ok(Some(progress))
}

pub(super) fn ring(frame: &mut Frame<'_>, metrics: &MetricsData) -> Result<Option<f64>> {
  let progress = metrics.progress().unwrap_or(0.0);
  let content = frame.content;
  let (w, h) = (content.width(), content.height());

  let side = h.min(w * 0.45);
  let bounds = Rect::from_xywh(content.x(), content.y() + (h - side) / 2.0, side, side);
  let stroke_width = (side * 0.12).max(1.0);
  frame.blocks.push(ContentBlock::ProgressArc(ArcBlock {
    bounds,
    fraction: progress as f32,
    stroke_color: Paint::Accent,
    track_color: Paint::Track,
    stroke_width,
  }));

  let center = bounds.center();
  let percent = TextStyle::heading(side * 0.24);
  let line = frame.metrics(percent)?;
  frame.text(
    percent,
    &format_percent(progress),
    Point::new(center.x, center.y + (line.ascent - line.descent) / 2.0),
    Align::Center,
    side - stroke_width * 3.0,
  )?;

  let text_x = bounds.max_x() + frame.padding;
  let text_width = content.max_x() - text_x;
  frame.text(
    TextStyle::heading(h * 0.22),
    &metrics.label,
    Point::new(text_x, content.y() + h * 0.45),
    Align::Start,
    text_width,
  )?;
  frame.text(
    TextStyle::caption(h * 0.2),
    &format_value_text(metrics.current_value, metrics.target_value, &metrics.unit),
    Point::new(text_x, content.y() + h * 0.78),
    Align::Start,
    text_width,
  )?;

  Ok(Some(progress))
}

pub(super) fn number(frame: &mut Frame<'_>, metrics: &MetricsData) -> Result<Option<f64>> {
  let progress = metrics.progress();
  let content = frame.content;
  let (w, h) = (content.width(), content.height());

  let label = TextStyle::caption(h * 0.2);
  let line = frame.metrics(label)?;
  frame.text(
    label,
    &metrics.label,
    Point::new(content.x(), content.y() + line.ascent),
    Align::Start,
    w,
  )?;

  frame.text(
    TextStyle::heading(h * 0.44),
    &format_value_text(metrics.current_value, None, &metrics.unit),
    Point::new(content.x(), content.y() + h * 0.72),
    Align::Start,
    w,
  )?;

  if let (Some(target), Some(progress)) = (metrics.target_value, progress) {
    let caption = TextStyle::caption(h * 0.16);
    let line = frame.metrics(caption)?;
    let mut text = format!("of {}", format_value_text(target, None, &metrics.unit));
    text.push_str(&format!(" ({})", format_percent(progress)));
    frame.text(
      caption,
      &text,
      Point::new(content.x(), content.max_y() - line.descent),
      Align::Start,
      w,
    )?;
  }

  Ok(progress)
}

pub(super) fn heatmap(frame: &mut Frame<'_>, metrics: &MetricsData) -> Result<Option<f64>> {
  let content = frame.content;
  let (w, h) = (content.width(), content.height());

  let value_text = format_value_text(metrics.current_value, None, &metrics.unit);
  let header_height = header_row(frame, metrics, &value_text, h * 0.2)?;

  let grid_top = content.y() + header_height + frame.padding / 2.0;
  let grid_height = content.max_y() - grid_top;
  let pitch = grid_height / HEATMAP_ROWS as f32;
  let cell = pitch * 0.8;
  if pitch < 1.0 || w < cell {
    log::debug!("heatmap grid does not fit {w}x{h}");
    return Ok(None);
  }

  let columns = ((w - cell) / pitch).floor() as usize + 1;
  let cells = columns * HEATMAP_ROWS;

  let mut history = metrics.history.clone();
  history.sort_by_key(|point| point.timestamp);
  let shown = &history[history.len().saturating_sub(cells)..];
  let max = shown.iter().map(|p| p.value).fold(0.0f64, f64::max);
  let offset = cells - shown.len();

  for index in 0..cells {
    let level = match index.checked_sub(offset) {
      Some(i) => heat_level(shown[i].value, max),
      None => 0,
    };
    let column = index / HEATMAP_ROWS;
    let row = index % HEATMAP_ROWS;
    frame.rect(
      Rect::from_xywh(
        content.x() + column as f32 * pitch,
        grid_top + row as f32 * pitch,
        cell,
        cell,
      ),
      Paint::Heat(level),
      cell * 0.2,
    );
  }

  Ok(None)
}

/// Quantises a value against the maximum in view; 0 means no activity.
fn heat_level(value: f64, max: f64) -> u8 {
  if value <= 0.0 || max <= 0.0 {
    return 0;
  }
  let top = (HEAT_LEVELS - 1) as f64;
  ((value / max * top).ceil() as u8).clamp(1, HEAT_LEVELS - 1)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::layout::{HistoryPoint, LayoutBuilder, Variant, WidgetSpec};

  #[test]
  fn heat_levels_are_relative_to_max() {
    assert_eq!(heat_level(0.0, 10.0), 0);
    assert_eq!(heat_level(-3.0, 10.0), 0);
    assert_eq!(heat_level(0.1, 10.0), 1);
    assert_eq!(heat_level(5.0, 10.0), 2);
    assert_eq!(heat_level(10.0, 10.0), 4);
    assert_eq!(heat_level(3.0, 0.0), 0);
  }

  #[test]
  fn heatmap_shows_most_recent_history_last() {
    let fonts = FontRegistry::bundled().unwrap();
    let config = LayoutConfig::default();
    // Out of order on purpose: the newest entry is the only non-zero one.
    let history = vec![
      HistoryPoint::new(300, 9.0),
      HistoryPoint::new(100, 0.0),
      HistoryPoint::new(200, 0.0),
    ];
    let metrics = MetricsData::new("Commits", 9.0).with_history(history);
    let tree = LayoutBuilder::new(&fonts, &config)
      .build(&WidgetSpec::new("w", Variant::Heatmap, 400, 120), &metrics)
      .unwrap();

    let cells: Vec<&RectBlock> = tree
      .rects()
      .filter(|r| matches!(r.fill, Paint::Heat(_)))
      .collect();
    assert_eq!(cells.len() % HEATMAP_ROWS, 0);
    assert_eq!(cells.last().unwrap().fill, Paint::Heat(HEAT_LEVELS - 1));
    assert!(cells[..cells.len() - 1]
      .iter()
      .all(|c| c.fill == Paint::Heat(0)));
    assert_eq!(tree.progress, None);
  }

  #[test]
  fn ring_percentage_is_centred_in_ring() {
    let fonts = FontRegistry::bundled().unwrap();
    let config = LayoutConfig::default();
    let metrics = MetricsData::new("Goal", 3.0).with_target(4.0);
    let tree = LayoutBuilder::new(&fonts, &config)
      .build(&WidgetSpec::new("w", Variant::Ring, 300, 100), &metrics)
      .unwrap();
    let arc = tree.arcs().next().unwrap();
    assert_eq!(arc.fraction, 0.75);
    let percent = tree.texts().find(|t| t.content == "75%").unwrap();
    assert_eq!(percent.align, Align::Center);
    assert_eq!(percent.origin.x, arc.bounds.center().x);
  }

  #[test]
  fn number_caption_only_with_target() {
    let fonts = FontRegistry::bundled().unwrap();
    let config = LayoutConfig::default();
    let builder = LayoutBuilder::new(&fonts, &config);
    let spec = WidgetSpec::new("w", Variant::Number, 300, 120);

    let plain = builder.build(&spec, &MetricsData::new("Stars", 1234.0)).unwrap();
    assert_eq!(plain.texts().count(), 2);
    assert!(plain.texts().any(|t| t.content == "1,234"));

    let with_target = builder
      .build(&spec, &MetricsData::new("Stars", 1234.0).with_target(2000.0))
      .unwrap();
    assert_eq!(with_target.texts().count(), 3);
    assert!(with_target.texts().any(|t| t.content.starts_with("of 2,000")));
  }
}
