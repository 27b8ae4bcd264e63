//! Card layout
//!
//! Turns a [`WidgetSpec`] and its [`MetricsData`] into a [`BlockTree`]: an
//! ordered list of typed content blocks with absolute canvas geometry and
//! semantic paint roles.
//!
//! # Architecture
//!
//! 1. **Validation**: canvas dimensions and the metrics the variant depends on
//! 2. **Frame**: padding-adjusted content area and the card background
//! 3. **Template**: one fixed template per variant places text, rects and arcs
//! 4. **Text fitting**: every run is measured with its resolved face and shrunk
//!    or truncated to its box
//!
//! Layout is pure: no I/O, no clocks, and identical inputs produce identical
//! trees.
//!
//! # Example
//!
//! ```rust
//! use progress_card::layout::{LayoutBuilder, LayoutConfig, MetricsData, Variant, WidgetSpec};
//! use progress_card::text::FontRegistry;
//!
//! let fonts = FontRegistry::bundled().unwrap();
//! let config = LayoutConfig::default();
//! let spec = WidgetSpec::new("w1", Variant::Bar, 400, 120);
//! let metrics = MetricsData::new("Pages Read", 120.0).with_target(300.0);
//!
//! let tree = LayoutBuilder::new(&fonts, &config).build(&spec, &metrics).unwrap();
//! assert_eq!(tree.progress, Some(0.4));
//! ```

pub mod blocks;
pub mod format;
mod templates;
pub mod text_fit;
pub mod widget;

pub use blocks::{Align, ArcBlock, BlockTree, ContentBlock, RectBlock, TextBlock};
pub use format::{format_percent, format_value, format_value_text};
pub use text_fit::{fit_text, FittedText};
pub use widget::{HistoryPoint, MetricsData, Variant, WidgetSpec};

use crate::error::{ConfigError, LayoutError, Result};
use crate::text::{FontRegistry, DEFAULT_FAMILY};
use serde::{Deserialize, Serialize};

/// Smallest supported canvas width in pixels
pub const MIN_CANVAS_WIDTH: u32 = 32;
/// Smallest supported canvas height in pixels
pub const MIN_CANVAS_HEIGHT: u32 = 16;
/// Largest supported canvas side in pixels
pub const MAX_CANVAS_SIDE: u32 = 4096;

/// Layout tuning knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
  /// Family used for every text role
  pub font_family: String,
  /// Card padding as a share of the shorter canvas side
  pub padding_ratio: f32,
  /// Lower bound for the padding in pixels
  pub min_padding: f32,
  /// Size decrement used when shrinking text
  pub shrink_step: f32,
  /// Shrink floor as a share of the role's default size
  pub shrink_floor_ratio: f32,
  /// Absolute shrink floor in pixels
  pub min_font_size: f32,
  /// Card corner radius as a share of the shorter canvas side
  pub corner_radius_ratio: f32,
}

impl Default for LayoutConfig {
  fn default() -> Self {
    Self {
      font_family: DEFAULT_FAMILY.to_string(),
      padding_ratio: 0.08,
      min_padding: 4.0,
      shrink_step: 1.0,
      shrink_floor_ratio: 0.6,
      min_font_size: 8.0,
      corner_radius_ratio: 0.08,
    }
  }
}

impl LayoutConfig {
  pub fn validate(&self) -> std::result::Result<(), ConfigError> {
    if self.font_family.trim().is_empty() {
      return Err(invalid_value("layout.font_family", "must not be empty"));
    }
    let ratios = [
      ("layout.padding_ratio", self.padding_ratio, 0.0, 0.4),
      ("layout.shrink_floor_ratio", self.shrink_floor_ratio, 0.0, 1.0),
      ("layout.corner_radius_ratio", self.corner_radius_ratio, 0.0, 0.5),
    ];
    for (key, value, min, max) in ratios {
      if !value.is_finite() || value < min || value > max {
        return Err(invalid_value(key, &format!("must be within [{min}, {max}]")));
      }
    }
    let positives = [
      ("layout.shrink_step", self.shrink_step),
      ("layout.min_font_size", self.min_font_size),
    ];
    for (key, value) in positives {
      if !value.is_finite() || value <= 0.0 {
        return Err(invalid_value(key, "must be greater than zero"));
      }
    }
    if !self.min_padding.is_finite() || self.min_padding < 0.0 {
      return Err(invalid_value("layout.min_padding", "must not be negative"));
    }
    Ok(())
  }
}

fn invalid_value(key: &str, reason: &str) -> ConfigError {
  ConfigError::InvalidValue {
    key: key.to_string(),
    reason: reason.to_string(),
  }
}

/// Checks a canvas against the supported size range.
pub fn check_dimensions(width: u32, height: u32) -> std::result::Result<(), LayoutError> {
  let in_range = (MIN_CANVAS_WIDTH..=MAX_CANVAS_SIDE).contains(&width)
    && (MIN_CANVAS_HEIGHT..=MAX_CANVAS_SIDE).contains(&height);
  if in_range {
    Ok(())
  } else {
    Err(LayoutError::InvalidDimensions { width, height })
  }
}

/// Builds block trees against a font registry
pub struct LayoutBuilder<'a> {
  fonts: &'a FontRegistry,
  config: &'a LayoutConfig,
}

impl<'a> LayoutBuilder<'a> {
  pub fn new(fonts: &'a FontRegistry, config: &'a LayoutConfig) -> Self {
    Self { fonts, config }
  }

  /// Lays out one card.
  pub fn build(&self, spec: &WidgetSpec, metrics: &MetricsData) -> Result<BlockTree> {
    check_dimensions(spec.width, spec.height)?;
    metrics.validate_for(spec.variant)?;

    let mut frame = templates::Frame::new(self.fonts, self.config, spec.width, spec.height);
    frame.card_background();
    let progress = match spec.variant {
      Variant::Bar => templates::bar(&mut frame, metrics)?,
      Variant::Ring => templates::ring(&mut frame, metrics)?,
      Variant::Number => templates::number(&mut frame, metrics)?,
      Variant::Heatmap => templates::heatmap(&mut frame, metrics)?,
    };

    let tree = BlockTree {
      width: spec.width,
      height: spec.height,
      title: card_title(metrics, progress),
      progress: progress.map(|p| p as f32),
      blocks: frame.into_blocks(),
    };
    log::debug!(
      "laid out {} card '{}' with {} blocks",
      spec.variant,
      spec.id,
      tree.blocks.len()
    );
    Ok(tree)
  }
}

fn card_title(metrics: &MetricsData, progress: Option<f64>) -> String {
  let value = format_value_text(metrics.current_value, metrics.target_value, &metrics.unit);
  let mut title = if metrics.label.trim().is_empty() {
    value
  } else {
    format!("{}: {}", metrics.label.trim(), value)
  };
  if let Some(progress) = progress {
    title.push_str(&format!(" ({})", format_percent(progress)));
  }
  title
}
