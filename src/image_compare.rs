//! Tolerance-based image comparison
//!
//! Used to check that two raster paths agree (document rasterization versus
//! direct block painting) and that outputs stay stable. Exact equality is too
//! strict across anti-aliasing differences, so a comparison combines a
//! per-channel tolerance, a cap on the share of differing pixels and a
//! windowed SSIM distance on luminance.

use crate::error::Result;
use crate::raster::decode_png;
use image::RgbaImage;

const SSIM_WINDOW: u32 = 8;

/// Configuration for comparing two images.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareConfig {
  /// Maximum allowed difference per colour channel (0-255).
  pub channel_tolerance: u8,
  /// Maximum percentage of pixels that can differ (0.0-100.0).
  pub max_different_percent: f64,
  /// Whether to compare the alpha channel.
  pub compare_alpha: bool,
  /// Optional perceptual distance threshold (0.0 = identical).
  pub max_perceptual_distance: Option<f64>,
}

impl Default for CompareConfig {
  fn default() -> Self {
    Self::strict()
  }
}

impl CompareConfig {
  /// Exact match required.
  pub fn strict() -> Self {
    Self {
      channel_tolerance: 0,
      max_different_percent: 0.0,
      compare_alpha: true,
      max_perceptual_distance: None,
    }
  }

  /// Allows anti-aliasing noise along edges.
  pub fn fuzzy() -> Self {
    Self {
      channel_tolerance: 16,
      max_different_percent: 2.0,
      compare_alpha: true,
      max_perceptual_distance: Some(0.05),
    }
  }

  pub fn with_channel_tolerance(mut self, tolerance: u8) -> Self {
    self.channel_tolerance = tolerance;
    self
  }

  pub fn with_max_different_percent(mut self, percent: f64) -> Self {
    self.max_different_percent = percent;
    self
  }
}

/// Statistics about pixel and perceptual differences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffStatistics {
  pub total_pixels: u64,
  /// Pixels with any compared channel above the tolerance
  pub different_pixels: u64,
  pub different_percent: f64,
  /// Largest difference seen on any compared channel
  pub max_channel_diff: u8,
  /// Mean SSIM over all windows (1.0 = identical)
  pub perceptual_similarity: f64,
  /// `1 - similarity`, clamped to `[0, 1]`
  pub perceptual_distance: f64,
}

/// Result of comparing two images.
#[derive(Debug, Clone)]
pub struct ImageDiff {
  pub matches: bool,
  pub statistics: DiffStatistics,
  pub actual_dimensions: (u32, u32),
  pub expected_dimensions: (u32, u32),
}

impl ImageDiff {
  pub fn is_match(&self) -> bool {
    self.matches
  }

  pub fn dimensions_match(&self) -> bool {
    self.actual_dimensions == self.expected_dimensions
  }

  /// Human-readable summary for test failures.
  pub fn summary(&self) -> String {
    if !self.dimensions_match() {
      return format!(
        "dimension mismatch: actual {}x{}, expected {}x{}",
        self.actual_dimensions.0,
        self.actual_dimensions.1,
        self.expected_dimensions.0,
        self.expected_dimensions.1
      );
    }
    let stats = &self.statistics;
    format!(
      "{}: {} of {} pixels differ ({:.4}%), max channel diff {}, perceptual distance {:.4}",
      if self.matches { "match" } else { "differ" },
      stats.different_pixels,
      stats.total_pixels,
      stats.different_percent,
      stats.max_channel_diff,
      stats.perceptual_distance
    )
  }
}

fn luma(px: &image::Rgba<u8>, compare_alpha: bool) -> f64 {
  let alpha = if compare_alpha { px[3] as f64 / 255.0 } else { 1.0 };
  (0.2126 * px[0] as f64 + 0.7152 * px[1] as f64 + 0.0722 * px[2] as f64) * alpha
}

/// Compares two RGBA images according to `config`.
pub fn compare_images(actual: &RgbaImage, expected: &RgbaImage, config: &CompareConfig) -> ImageDiff {
  let actual_dimensions = actual.dimensions();
  let expected_dimensions = expected.dimensions();
  if actual_dimensions != expected_dimensions {
    return ImageDiff {
      matches: false,
      statistics: DiffStatistics::default(),
      actual_dimensions,
      expected_dimensions,
    };
  }

  let channels = if config.compare_alpha { 4 } else { 3 };
  let mut different_pixels = 0u64;
  let mut max_channel_diff = 0u8;
  for (a, e) in actual.pixels().zip(expected.pixels()) {
    let worst = (0..channels)
      .map(|c| a[c].abs_diff(e[c]))
      .max()
      .unwrap_or(0);
    max_channel_diff = max_channel_diff.max(worst);
    if worst > config.channel_tolerance {
      different_pixels += 1;
    }
  }

  let total_pixels = actual.width() as u64 * actual.height() as u64;
  let different_percent = if total_pixels > 0 {
    different_pixels as f64 / total_pixels as f64 * 100.0
  } else {
    0.0
  };
  let perceptual_similarity = windowed_ssim(actual, expected, config.compare_alpha);
  let perceptual_distance = 1.0 - perceptual_similarity.clamp(0.0, 1.0);

  let passes_pixels = different_percent <= config.max_different_percent + f64::EPSILON;
  let passes_perceptual = config
    .max_perceptual_distance
    .map_or(true, |max| perceptual_distance <= max + f64::EPSILON);

  ImageDiff {
    matches: passes_pixels && passes_perceptual,
    statistics: DiffStatistics {
      total_pixels,
      different_pixels,
      different_percent,
      max_channel_diff,
      perceptual_similarity,
      perceptual_distance,
    },
    actual_dimensions,
    expected_dimensions,
  }
}

/// Compares two PNG byte buffers.
pub fn compare_png(actual: &[u8], expected: &[u8], config: &CompareConfig) -> Result<ImageDiff> {
  let actual = decode_png(actual)?;
  let expected = decode_png(expected)?;
  Ok(compare_images(&actual, &expected, config))
}

/// Mean SSIM over non-overlapping windows of equally sized images.
fn windowed_ssim(actual: &RgbaImage, expected: &RgbaImage, compare_alpha: bool) -> f64 {
  let (width, height) = actual.dimensions();
  let mut total = 0.0;
  let mut windows = 0u32;

  let mut wa = Vec::with_capacity((SSIM_WINDOW * SSIM_WINDOW) as usize);
  let mut we = Vec::with_capacity((SSIM_WINDOW * SSIM_WINDOW) as usize);
  for wy in (0..height).step_by(SSIM_WINDOW as usize) {
    for wx in (0..width).step_by(SSIM_WINDOW as usize) {
      wa.clear();
      we.clear();
      for y in wy..(wy + SSIM_WINDOW).min(height) {
        for x in wx..(wx + SSIM_WINDOW).min(width) {
          wa.push(luma(actual.get_pixel(x, y), compare_alpha));
          we.push(luma(expected.get_pixel(x, y), compare_alpha));
        }
      }
      total += ssim(&wa, &we);
      windows += 1;
    }
  }

  if windows == 0 {
    1.0
  } else {
    total / windows as f64
  }
}

fn ssim(actual: &[f64], expected: &[f64]) -> f64 {
  let n = actual.len().min(expected.len());
  if n == 0 {
    return 1.0;
  }
  let n_f = n as f64;
  let mean_a = actual[..n].iter().sum::<f64>() / n_f;
  let mean_e = expected[..n].iter().sum::<f64>() / n_f;

  let (mut var_a, mut var_e, mut cov) = (0.0, 0.0, 0.0);
  for (a, e) in actual[..n].iter().zip(&expected[..n]) {
    let da = a - mean_a;
    let de = e - mean_e;
    var_a += da * da;
    var_e += de * de;
    cov += da * de;
  }
  var_a /= n_f;
  var_e /= n_f;
  cov /= n_f;

  let c1 = (0.01 * 255.0f64).powi(2);
  let c2 = (0.03 * 255.0f64).powi(2);
  let numerator = (2.0 * mean_a * mean_e + c1) * (2.0 * cov + c2);
  let denominator = (mean_a.powi(2) + mean_e.powi(2) + c1) * (var_a + var_e + c2);
  (numerator / denominator).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgba;

  fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(color))
  }

  #[test]
  fn identical_images_match_strictly() {
    let img = solid(16, 16, [10, 20, 30, 255]);
    let diff = compare_images(&img, &img, &CompareConfig::strict());
    assert!(diff.is_match(), "{}", diff.summary());
    assert_eq!(diff.statistics.different_pixels, 0);
    assert!((diff.statistics.perceptual_similarity - 1.0).abs() < 1e-9);
  }

  #[test]
  fn dimension_mismatch_never_matches() {
    let diff = compare_images(
      &solid(4, 4, [0; 4]),
      &solid(4, 5, [0; 4]),
      &CompareConfig::fuzzy(),
    );
    assert!(!diff.is_match());
    assert!(diff.summary().contains("dimension mismatch"));
  }

  #[test]
  fn tolerance_absorbs_small_differences() {
    let a = solid(10, 10, [100, 100, 100, 255]);
    let b = solid(10, 10, [104, 100, 100, 255]);
    assert!(!compare_images(&a, &b, &CompareConfig::strict()).is_match());
    let config = CompareConfig::strict().with_channel_tolerance(5);
    assert!(compare_images(&a, &b, &config).is_match());
  }

  #[test]
  fn differing_share_is_capped() {
    let a = solid(10, 10, [0, 0, 0, 255]);
    let mut b = a.clone();
    b.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
    let diff = compare_images(&a, &b, &CompareConfig::strict().with_max_different_percent(1.0));
    assert_eq!(diff.statistics.different_pixels, 1);
    assert!((diff.statistics.different_percent - 1.0).abs() < 1e-9);
    assert_eq!(diff.statistics.max_channel_diff, 255);
    assert!(diff.is_match());
  }

  #[test]
  fn perceptual_distance_grows_with_change() {
    let a = solid(16, 16, [0, 0, 0, 255]);
    let b = solid(16, 16, [255, 255, 255, 255]);
    let diff = compare_images(&a, &b, &CompareConfig::fuzzy());
    assert!(diff.statistics.perceptual_distance > 0.5);
    assert!(!diff.is_match());
  }
}
