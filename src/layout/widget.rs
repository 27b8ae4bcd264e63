//! Layout inputs: the widget description and its metric values

use crate::error::LayoutError;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Card template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
  /// Horizontal progress bar
  Bar,
  /// Circular progress ring
  Ring,
  /// Single headline number
  Number,
  /// Activity grid of recent history
  Heatmap,
}

impl Variant {
  pub fn as_str(self) -> &'static str {
    match self {
      Variant::Bar => "bar",
      Variant::Ring => "ring",
      Variant::Number => "number",
      Variant::Heatmap => "heatmap",
    }
  }

  /// Whether the variant draws a progress fraction and so needs a target
  pub fn requires_target(self) -> bool {
    matches!(self, Variant::Bar | Variant::Ring)
  }
}

impl fmt::Display for Variant {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Declarative description of a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetSpec {
  pub id: String,
  pub variant: Variant,
  #[serde(default)]
  pub theme: Theme,
  pub width: u32,
  pub height: u32,
}

impl WidgetSpec {
  pub fn new(id: impl Into<String>, variant: Variant, width: u32, height: u32) -> Self {
    Self {
      id: id.into(),
      variant,
      theme: Theme::default(),
      width,
      height,
    }
  }

  pub fn with_theme(mut self, theme: Theme) -> Self {
    self.theme = theme;
    self
  }
}

/// One entry of a metric's history (timestamp in seconds since the epoch)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
  pub timestamp: i64,
  pub value: f64,
}

impl HistoryPoint {
  pub const fn new(timestamp: i64, value: f64) -> Self {
    Self { timestamp, value }
  }
}

/// Values driving a card's content
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsData {
  pub label: String,
  #[serde(default)]
  pub unit: String,
  pub current_value: f64,
  #[serde(default)]
  pub target_value: Option<f64>,
  #[serde(default)]
  pub history: Vec<HistoryPoint>,
}

impl MetricsData {
  pub fn new(label: impl Into<String>, current_value: f64) -> Self {
    Self {
      label: label.into(),
      current_value,
      ..Self::default()
    }
  }

  pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
    self.unit = unit.into();
    self
  }

  pub fn with_target(mut self, target: f64) -> Self {
    self.target_value = Some(target);
    self
  }

  pub fn with_history(mut self, history: Vec<HistoryPoint>) -> Self {
    self.history = history;
    self
  }

  /// `clamp(current / target, 0, 1)`, or `None` without a target
  ///
  /// # Examples
  ///
  /// ```
  /// use progress_card::layout::MetricsData;
  ///
  /// let metrics = MetricsData::new("Pages Read", 120.0).with_target(300.0);
  /// assert_eq!(metrics.progress(), Some(0.4));
  /// ```
  pub fn progress(&self) -> Option<f64> {
    let target = self.target_value?;
    if target <= 0.0 || !target.is_finite() || !self.current_value.is_finite() {
      return None;
    }
    Some((self.current_value / target).clamp(0.0, 1.0))
  }

  /// Checks the values a variant depends on.
  pub fn validate_for(&self, variant: Variant) -> Result<(), LayoutError> {
    if !self.current_value.is_finite() {
      return Err(invalid("current_value", "value is not finite"));
    }

    match self.target_value {
      Some(target) if !target.is_finite() => {
        return Err(invalid("target_value", "value is not finite"));
      }
      Some(target) if target <= 0.0 => {
        return Err(invalid("target_value", "target must be greater than zero"));
      }
      Some(_) => {}
      None if variant.requires_target() => {
        return Err(missing(variant, "target_value"));
      }
      None => {}
    }

    if let Some(index) = self.history.iter().position(|p| !p.value.is_finite()) {
      return Err(invalid(
        &format!("history[{index}]"),
        "value is not finite",
      ));
    }
    if variant == Variant::Heatmap && self.history.is_empty() {
      return Err(missing(variant, "history"));
    }

    Ok(())
  }
}

fn missing(variant: Variant, field: &str) -> LayoutError {
  LayoutError::MissingMetric {
    variant: variant.as_str().to_string(),
    field: field.to_string(),
  }
}

fn invalid(field: &str, reason: &str) -> LayoutError {
  LayoutError::InvalidMetric {
    field: field.to_string(),
    reason: reason.to_string(),
  }
}
