//! Fitting a single line of text into a maximum width
//!
//! The size shrinks in fixed steps from the role's default down to a floor.
//! If the text still overflows at the floor it is truncated at a character
//! boundary and an ellipsis is appended. A fitted run never exceeds its
//! maximum width; in the worst case it becomes empty.
//!
//! The fitter keeps the shaped glyphs of the run it settles on, so later
//! stages draw exactly what was measured.

use super::LayoutConfig;
use crate::error::Result;
use crate::text::{FontAsset, PositionedGlyph, ShapedRun};

const ELLIPSIS: &str = "\u{2026}";
const ASCII_ELLIPSIS: &str = "...";

/// A run that fits its box
#[derive(Debug, Clone, PartialEq)]
pub struct FittedText {
  pub content: String,
  pub size: f32,
  pub width: f32,
  /// Shaped glyphs of `content` at `size`
  pub glyphs: Vec<PositionedGlyph>,
}

impl FittedText {
  fn empty(size: f32) -> Self {
    Self {
      content: String::new(),
      size,
      width: 0.0,
      glyphs: Vec::new(),
    }
  }

  fn shaped(content: String, run: ShapedRun) -> Self {
    Self {
      content,
      size: run.font_size,
      width: run.width,
      glyphs: run.glyphs,
    }
  }

  pub fn is_truncated(&self, original: &str) -> bool {
    self.content != original
  }
}

/// Smallest size the fitter shrinks a role's text to
pub fn floor_size(default_size: f32, config: &LayoutConfig) -> f32 {
  (default_size * config.shrink_floor_ratio)
    .max(config.min_font_size)
    .min(default_size)
}

/// Fits `text` into `max_width` pixels.
pub fn fit_text(
  font: &FontAsset,
  text: &str,
  default_size: f32,
  max_width: f32,
  config: &LayoutConfig,
) -> Result<FittedText> {
  let floor = floor_size(default_size, config);
  if text.is_empty() || max_width <= 0.0 {
    return Ok(FittedText::empty(default_size));
  }

  let step = config.shrink_step.max(0.1);
  let mut size = default_size;
  loop {
    let run = font.shape(text, size)?;
    if run.width <= max_width {
      return Ok(FittedText::shaped(text.to_string(), run));
    }
    if size <= floor {
      break;
    }
    size = (size - step).max(floor);
  }

  truncate_to_fit(font, text, floor, max_width)
}

fn truncate_to_fit(font: &FontAsset, text: &str, size: f32, max_width: f32) -> Result<FittedText> {
  let ellipsis = if font.has_ellipsis() {
    ELLIPSIS
  } else {
    ASCII_ELLIPSIS
  };
  let boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();

  let candidate = |keep: usize| -> String {
    let prefix = &text[..boundaries.get(keep).copied().unwrap_or(text.len())];
    format!("{}{}", prefix.trim_end(), ellipsis)
  };

  // Width grows with the kept prefix (up to kerning noise), so binary search
  // for the longest prefix, then walk down until the run really fits.
  let (mut lo, mut hi) = (0usize, boundaries.len());
  while lo < hi {
    let mid = (lo + hi + 1) / 2;
    if font.measure(&candidate(mid), size)? <= max_width {
      lo = mid;
    } else {
      hi = mid - 1;
    }
  }

  let mut keep = lo;
  loop {
    let content = candidate(keep);
    let run = font.shape(&content, size)?;
    if run.width <= max_width {
      return Ok(FittedText::shaped(content, run));
    }
    if keep == 0 {
      log::debug!("text '{text}' does not fit {max_width}px even as an ellipsis");
      return Ok(FittedText::empty(size));
    }
    keep -= 1;
  }
}
