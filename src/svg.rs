//! SVG post-processing and root-element helpers
//!
//! [`make_responsive`] and [`make_responsive_markup`] rewrite the declared
//! size of a document so it fills its container's width and keeps its aspect
//! ratio through the viewBox. Neither touches the viewBox or any content.
//!
//! The remaining helpers read viewBox, length and `preserveAspectRatio`
//! values and map a viewBox onto a target pixel size.

use crate::vector::document::{SvgLength, VectorDocument, ViewBox};
use regex::{Captures, Regex};
use roxmltree::Document;
use std::sync::OnceLock;
use tiny_skia::Transform;

fn regex(pattern: &'static str, desc: &'static str) -> Regex {
  Regex::new(pattern).unwrap_or_else(|err| panic!("invalid {desc} regex: {err}"))
}

fn root_tag_regex() -> &'static Regex {
  static ROOT_TAG: OnceLock<Regex> = OnceLock::new();
  ROOT_TAG.get_or_init(|| regex(r"<svg(?:\s[^>]*)?/?>", "svg root tag"))
}

fn size_attr_regex() -> &'static Regex {
  static SIZE_ATTR: OnceLock<Regex> = OnceLock::new();
  SIZE_ATTR.get_or_init(|| {
    regex(
      r#"\s(width|height)\s*=\s*(?:"[^"]*"|'[^']*')"#,
      "svg size attribute",
    )
  })
}

/// Makes a document scale to its container: width `100%`, height omitted.
///
/// The viewBox and primitives are left as they are, and applying it twice is
/// the same as applying it once.
///
/// # Examples
///
/// ```
/// use progress_card::svg::make_responsive;
/// use progress_card::vector::{SvgLength, VectorDocument};
///
/// let doc = make_responsive(VectorDocument::new(400, 120, "card"));
/// assert_eq!(doc.width, SvgLength::Percent(100.0));
/// assert_eq!(doc.height, SvgLength::Auto);
/// ```
pub fn make_responsive(mut doc: VectorDocument) -> VectorDocument {
  doc.width = SvgLength::Percent(100.0);
  doc.height = SvgLength::Auto;
  doc
}

/// Applies the responsive rewrite to serialised markup.
///
/// Only the root `<svg>` start tag changes: its `width` becomes `100%` (added
/// if missing) and its `height` is removed. Markup without a root `<svg>` tag
/// is returned unchanged.
pub fn make_responsive_markup(svg: &str) -> String {
  let Some(root) = root_tag_regex().find(svg) else {
    return svg.to_string();
  };

  let tag = root.as_str();
  let mut saw_width = false;
  let rewritten = size_attr_regex().replace_all(tag, |caps: &Captures<'_>| {
    if &caps[1] == "width" && !saw_width {
      saw_width = true;
      " width=\"100%\"".to_string()
    } else {
      String::new()
    }
  });

  let mut tag = rewritten.into_owned();
  if !saw_width {
    // "<svg" is four bytes; insert right after the element name.
    tag.insert_str(4, " width=\"100%\"");
  }

  let mut out = String::with_capacity(svg.len() + 16);
  out.push_str(&svg[..root.start()]);
  out.push_str(&tag);
  out.push_str(&svg[root.end()..]);
  out
}

/// Attributes of a parsed root `<svg>` element
#[derive(Debug, Clone, PartialEq)]
pub struct SvgRoot {
  pub width: Option<String>,
  pub height: Option<String>,
  pub view_box: Option<ViewBox>,
  pub title: Option<String>,
}

impl SvgRoot {
  /// Parses markup and reads its root element; `None` if the markup is not
  /// well-formed XML or the root is not `<svg>`.
  pub fn parse(svg: &str) -> Option<Self> {
    let doc = Document::parse(svg).ok()?;
    let root = doc.root_element();
    if !root.tag_name().name().eq_ignore_ascii_case("svg") {
      return None;
    }
    let title = root
      .children()
      .find(|child| child.has_tag_name("title"))
      .and_then(|title| title.text())
      .map(str::to_string);
    Some(Self {
      width: root.attribute("width").map(str::to_string),
      height: root.attribute("height").map(str::to_string),
      view_box: root.attribute("viewBox").and_then(parse_svg_view_box),
      title,
    })
  }

  /// Declared width and height in pixels, when both are absolute lengths
  pub fn intrinsic_size(&self) -> Option<(f32, f32)> {
    let width = parse_svg_length_px(self.width.as_deref()?)?;
    let height = parse_svg_length_px(self.height.as_deref()?)?;
    Some((width, height))
  }
}

/// Parses an absolute SVG length into pixels. Percentages are not absolute.
pub fn parse_svg_length_px(value: &str) -> Option<f32> {
  let trimmed = value.trim();
  if trimmed.is_empty() || trimmed.ends_with('%') {
    return None;
  }

  let end = trimmed
    .char_indices()
    .take_while(|(_, ch)| matches!(ch, '0'..='9' | '+' | '-' | '.' | 'e' | 'E'))
    .last()
    .map(|(idx, ch)| idx + ch.len_utf8())?;
  let number = trimmed[..end].parse::<f32>().ok()?;

  let unit = trimmed[end..].trim_start();
  let per_unit = match unit.to_ascii_lowercase().as_str() {
    "" | "px" => 1.0,
    "in" => 96.0,
    "cm" => 96.0 / 2.54,
    "mm" => 96.0 / 25.4,
    "pt" => 96.0 / 72.0,
    "pc" => 96.0 / 6.0,
    _ => return None,
  };

  Some(number * per_unit).filter(|px| px.is_finite())
}

/// Parses `min-x min-y width height`; rejects empty or non-finite boxes.
pub fn parse_svg_view_box(value: &str) -> Option<ViewBox> {
  let mut nums = value
    .split(|c: char| c == ',' || c.is_whitespace())
    .filter(|s| !s.is_empty())
    .map(|s| s.parse::<f32>().ok());
  let view_box = ViewBox::new(nums.next()??, nums.next()??, nums.next()??, nums.next()??);
  view_box.is_valid().then_some(view_box)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SvgAlign {
  XMinYMin,
  XMidYMin,
  XMaxYMin,
  XMinYMid,
  XMidYMid,
  XMaxYMid,
  XMinYMax,
  XMidYMax,
  XMaxYMax,
}

impl SvgAlign {
  /// Horizontal and vertical alignment factors (0, 0.5 or 1)
  fn factors(self) -> (f32, f32) {
    match self {
      SvgAlign::XMinYMin => (0.0, 0.0),
      SvgAlign::XMidYMin => (0.5, 0.0),
      SvgAlign::XMaxYMin => (1.0, 0.0),
      SvgAlign::XMinYMid => (0.0, 0.5),
      SvgAlign::XMidYMid => (0.5, 0.5),
      SvgAlign::XMaxYMid => (1.0, 0.5),
      SvgAlign::XMinYMax => (0.0, 1.0),
      SvgAlign::XMidYMax => (0.5, 1.0),
      SvgAlign::XMaxYMax => (1.0, 1.0),
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SvgMeetOrSlice {
  Meet,
  Slice,
}

/// Parsed `preserveAspectRatio`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SvgPreserveAspectRatio {
  pub none: bool,
  pub align: SvgAlign,
  pub meet_or_slice: SvgMeetOrSlice,
}

impl Default for SvgPreserveAspectRatio {
  fn default() -> Self {
    Self {
      none: false,
      align: SvgAlign::XMidYMid,
      meet_or_slice: SvgMeetOrSlice::Meet,
    }
  }
}

impl SvgPreserveAspectRatio {
  /// Parses the attribute; missing or unknown values give `xMidYMid meet`.
  pub fn parse(value: Option<&str>) -> Self {
    let mut parsed = Self::default();
    let mut parts = value.unwrap_or("").split_whitespace();
    let Some(first) = parts.next() else {
      return parsed;
    };
    if first.eq_ignore_ascii_case("none") {
      parsed.none = true;
      return parsed;
    }

    parsed.align = match first {
      "xMinYMin" => SvgAlign::XMinYMin,
      "xMidYMin" => SvgAlign::XMidYMin,
      "xMaxYMin" => SvgAlign::XMaxYMin,
      "xMinYMid" => SvgAlign::XMinYMid,
      "xMaxYMid" => SvgAlign::XMaxYMid,
      "xMinYMax" => SvgAlign::XMinYMax,
      "xMidYMax" => SvgAlign::XMidYMax,
      "xMaxYMax" => SvgAlign::XMaxYMax,
      _ => SvgAlign::XMidYMid,
    };
    if parts
      .next()
      .is_some_and(|second| second.eq_ignore_ascii_case("slice"))
    {
      parsed.meet_or_slice = SvgMeetOrSlice::Slice;
    }
    parsed
  }
}

/// Transform mapping viewBox coordinates onto a `render_width` x
/// `render_height` pixel area.
pub fn map_svg_aspect_ratio(
  view_box: ViewBox,
  preserve: SvgPreserveAspectRatio,
  render_width: f32,
  render_height: f32,
) -> Transform {
  let sx = render_width / view_box.width;
  let sy = render_height / view_box.height;
  if preserve.none {
    return Transform::from_row(sx, 0.0, 0.0, sy, -view_box.min_x * sx, -view_box.min_y * sy);
  }

  let scale = match preserve.meet_or_slice {
    SvgMeetOrSlice::Meet => sx.min(sy),
    SvgMeetOrSlice::Slice => sx.max(sy),
  };
  let (fx, fy) = preserve.align.factors();
  let offset_x = (render_width - view_box.width * scale) * fx;
  let offset_y = (render_height - view_box.height * scale) * fy;

  Transform::from_row(
    scale,
    0.0,
    0.0,
    scale,
    offset_x - view_box.min_x * scale,
    offset_y - view_box.min_y * scale,
  )
}
