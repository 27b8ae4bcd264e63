//! Typed vector document and its SVG serialisation
//!
//! A [`VectorDocument`] holds concrete colours and canvas-space geometry only.
//! [`VectorDocument::to_svg`] writes it with fixed number formatting and in
//! primitive order, so identical documents serialise to identical bytes.

use crate::geometry::{arc_segments, Point, Rect};
use crate::text::{FontKey, PositionedGlyph};
use crate::theme::Rgba;
use std::f32::consts::TAU;
use std::fmt::Write as _;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Appends `value` rounded to two decimals, without trailing zeros.
pub(crate) fn push_number(out: &mut String, value: f32) {
  let rounded = (value * 100.0).round() / 100.0;
  if rounded == 0.0 || !rounded.is_finite() {
    out.push('0');
  } else {
    let _ = write!(out, "{}", rounded);
  }
}

fn number(value: f32) -> String {
  let mut out = String::new();
  push_number(&mut out, value);
  out
}

/// Characters XML 1.0 forbids even as character references
fn is_xml_forbidden(ch: char) -> bool {
  (ch < '\u{20}' && !matches!(ch, '\t' | '\n' | '\r')) || matches!(ch, '\u{FFFE}' | '\u{FFFF}')
}

/// Escapes text for use in attribute values and character data.
///
/// Characters XML cannot carry at all are dropped.
pub(crate) fn escape_xml(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for ch in text.chars() {
    match ch {
      c if is_xml_forbidden(c) => {}
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&apos;"),
      c => out.push(c),
    }
  }
  out
}

/// Declared width or height of the root element
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SvgLength {
  Px(f32),
  Percent(f32),
  /// Attribute omitted; size follows the viewBox aspect ratio
  Auto,
}

impl SvgLength {
  /// Attribute value, or `None` when the attribute is omitted
  pub fn attribute(self) -> Option<String> {
    match self {
      SvgLength::Px(value) => Some(number(value)),
      SvgLength::Percent(value) => Some(format!("{}%", number(value))),
      SvgLength::Auto => None,
    }
  }
}

/// Document coordinate system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
  pub min_x: f32,
  pub min_y: f32,
  pub width: f32,
  pub height: f32,
}

impl ViewBox {
  pub fn new(min_x: f32, min_y: f32, width: f32, height: f32) -> Self {
    Self {
      min_x,
      min_y,
      width,
      height,
    }
  }

  pub fn is_valid(&self) -> bool {
    [self.min_x, self.min_y, self.width, self.height]
      .iter()
      .all(|v| v.is_finite())
      && self.width > 0.0
      && self.height > 0.0
  }

  fn attribute(&self) -> String {
    format!(
      "{} {} {} {}",
      number(self.min_x),
      number(self.min_y),
      number(self.width),
      number(self.height)
    )
  }
}

/// Line cap of a stroked arc
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeCap {
  Butt,
  Round,
}

impl StrokeCap {
  fn as_str(self) -> &'static str {
    match self {
      StrokeCap::Butt => "butt",
      StrokeCap::Round => "round",
    }
  }
}

/// Circular arc drawn as a stroke
#[derive(Debug, Clone, PartialEq)]
pub struct StrokedArc {
  pub center: Point,
  pub radius: f32,
  /// Start angle in radians (y-down, clockwise positive)
  pub start: f32,
  pub sweep: f32,
  pub stroke_width: f32,
  pub color: Rgba,
  pub cap: StrokeCap,
}

impl StrokedArc {
  pub fn is_full_circle(&self) -> bool {
    self.sweep.abs() >= TAU - 1e-4
  }

  /// Cubic path data shared with the rasterizer's geometry
  pub fn path_data(&self) -> String {
    let segments = arc_segments(self.center, self.radius, self.start, self.sweep);
    let mut d = String::new();
    if let Some(first) = segments.first() {
      d.push('M');
      push_point(&mut d, first.from);
    }
    for segment in &segments {
      d.push_str(" C");
      push_point(&mut d, segment.ctrl1);
      d.push(' ');
      push_point(&mut d, segment.ctrl2);
      d.push(' ');
      push_point(&mut d, segment.to);
    }
    if self.is_full_circle() && !segments.is_empty() {
      d.push_str(" Z");
    }
    d
  }
}

fn push_point(out: &mut String, point: Point) {
  push_number(out, point.x);
  out.push(' ');
  push_number(out, point.y);
}

/// One shaped line of text, drawn as glyph outlines
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
  /// Source text, kept for accessibility and debugging
  pub text: String,
  /// Exact registry key of the face the glyphs come from
  pub font: FontKey,
  pub size: f32,
  /// Left end of the baseline
  pub origin: Point,
  pub glyphs: Vec<PositionedGlyph>,
  pub color: Rgba,
  /// Outline path data in canvas pixels
  pub path_data: String,
}

/// Drawing primitive of a vector document
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
  Rect {
    bounds: Rect,
    corner_radius: f32,
    fill: Rgba,
  },
  Arc(StrokedArc),
  Glyphs(GlyphRun),
}

impl Primitive {
  pub fn kind(&self) -> &'static str {
    match self {
      Primitive::Rect { .. } => "rect",
      Primitive::Arc(_) => "arc",
      Primitive::Glyphs(_) => "glyphs",
    }
  }
}

/// A scalable card document
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDocument {
  pub width: SvgLength,
  pub height: SvgLength,
  pub view_box: ViewBox,
  /// Accessible name of the card
  pub title: String,
  pub primitives: Vec<Primitive>,
}

impl VectorDocument {
  /// Empty document with a fixed pixel size and a matching viewBox
  pub fn new(width: u32, height: u32, title: impl Into<String>) -> Self {
    Self {
      width: SvgLength::Px(width as f32),
      height: SvgLength::Px(height as f32),
      view_box: ViewBox::new(0.0, 0.0, width as f32, height as f32),
      title: title.into(),
      primitives: Vec::new(),
    }
  }

  pub fn push(&mut self, primitive: Primitive) {
    self.primitives.push(primitive);
  }

  pub fn is_responsive(&self) -> bool {
    matches!(self.width, SvgLength::Percent(_)) && self.height == SvgLength::Auto
  }

  /// Serialises the document as standalone SVG markup.
  pub fn to_svg(&self) -> String {
    let mut out = String::with_capacity(256 + self.primitives.len() * 128);
    let title = escape_xml(&self.title);

    let _ = write!(out, "<svg xmlns=\"{SVG_NAMESPACE}\"");
    if let Some(width) = self.width.attribute() {
      let _ = write!(out, " width=\"{width}\"");
    }
    if let Some(height) = self.height.attribute() {
      let _ = write!(out, " height=\"{height}\"");
    }
    let _ = write!(
      out,
      " viewBox=\"{}\" role=\"img\" aria-label=\"{title}\">",
      self.view_box.attribute()
    );
    let _ = write!(out, "<title>{title}</title>");

    for primitive in &self.primitives {
      match primitive {
        Primitive::Rect {
          bounds,
          corner_radius,
          fill,
        } => {
          let _ = write!(
            out,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"",
            number(bounds.x()),
            number(bounds.y()),
            number(bounds.width()),
            number(bounds.height())
          );
          if *corner_radius > 0.0 {
            let _ = write!(out, " rx=\"{}\"", number(*corner_radius));
          }
          push_fill(&mut out, "fill", *fill);
          out.push_str("/>");
        }
        Primitive::Arc(arc) => {
          let _ = write!(out, "<path d=\"{}\" fill=\"none\"", arc.path_data());
          push_fill(&mut out, "stroke", arc.color);
          let _ = write!(
            out,
            " stroke-width=\"{}\" stroke-linecap=\"{}\"/>",
            number(arc.stroke_width),
            arc.cap.as_str()
          );
        }
        Primitive::Glyphs(run) => {
          if run.path_data.is_empty() {
            continue;
          }
          let _ = write!(out, "<path d=\"{}\"", run.path_data);
          push_fill(&mut out, "fill", run.color);
          out.push_str("/>");
        }
      }
    }

    out.push_str("</svg>");
    out
  }
}

fn push_fill(out: &mut String, attribute: &str, color: Rgba) {
  let _ = write!(out, " {attribute}=\"{}\"", color.to_hex());
  if !color.is_opaque() {
    let _ = write!(out, " {attribute}-opacity=\"{}\"", number(color.opacity()));
  }
}
