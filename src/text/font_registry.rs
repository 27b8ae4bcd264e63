//! Font registry - embedded font assets with weight/style selection
//!
//! The registry owns a fixed set of font faces, each declared with an explicit
//! family, weight and style. It is built once at process start and then shared
//! read-only (behind an `Arc`) by the layout builder, the vector compositor and
//! the rasterizer, so every stage draws glyphs from the same bytes.
//!
//! # Matching
//!
//! [`FontRegistry::resolve`] follows a simplified CSS font-matching rule:
//! 1. Families match ASCII case-insensitively; an unknown family is an error.
//! 2. Faces in the requested style are preferred; if the family has none,
//!    faces of the other style are considered instead.
//! 3. Among those, the face with the smallest absolute weight difference wins,
//!    ties going to the heavier face.
//!
//! # Example
//!
//! ```rust
//! use progress_card::text::{FontRegistry, FontStyle, FontWeight};
//!
//! let fonts = FontRegistry::bundled().expect("bundled fonts load");
//! let face = fonts
//!   .resolve("DejaVu Sans", FontWeight::SEMI_BOLD, FontStyle::Normal)
//!   .expect("family is bundled");
//! assert_eq!(face.weight, FontWeight::BOLD);
//! ```

use super::shaping::{shape_text, ShapedRun};
use crate::error::{FontError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;

/// Family name of the bundled faces.
pub const DEFAULT_FAMILY: &str = "DejaVu Sans";

struct BundledFace {
  weight: FontWeight,
  style: FontStyle,
  data: &'static [u8],
}

const BUNDLED_FACES: &[BundledFace] = &[
  BundledFace {
    weight: FontWeight::EXTRA_LIGHT,
    style: FontStyle::Normal,
    data: include_bytes!("../../resources/fonts/DejaVuSans-ExtraLight.ttf"),
  },
  BundledFace {
    weight: FontWeight::NORMAL,
    style: FontStyle::Normal,
    data: include_bytes!("../../resources/fonts/DejaVuSans.ttf"),
  },
  BundledFace {
    weight: FontWeight::BOLD,
    style: FontStyle::Normal,
    data: include_bytes!("../../resources/fonts/DejaVuSans-Bold.ttf"),
  },
  BundledFace {
    weight: FontWeight::NORMAL,
    style: FontStyle::Italic,
    data: include_bytes!("../../resources/fonts/DejaVuSans-Oblique.ttf"),
  },
];

/// Font weight (100-900)
///
/// # Examples
///
/// ```
/// use progress_card::text::FontWeight;
///
/// assert_eq!(FontWeight::BOLD.value(), 700);
/// assert_eq!(FontWeight::new(1200), FontWeight::BLACK);
/// ```
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FontWeight(pub u16);

impl FontWeight {
  pub const THIN: Self = Self(100);
  pub const EXTRA_LIGHT: Self = Self(200);
  pub const LIGHT: Self = Self(300);
  pub const NORMAL: Self = Self(400);
  pub const MEDIUM: Self = Self(500);
  pub const SEMI_BOLD: Self = Self(600);
  pub const BOLD: Self = Self(700);
  pub const EXTRA_BOLD: Self = Self(800);
  pub const BLACK: Self = Self(900);

  /// Creates a new font weight, clamping to valid range [100, 900]
  #[inline]
  pub fn new(weight: u16) -> Self {
    Self(weight.clamp(100, 900))
  }

  #[inline]
  pub fn value(self) -> u16 {
    self.0
  }

  fn distance(self, other: FontWeight) -> u16 {
    self.0.abs_diff(other.0)
  }
}

impl Default for FontWeight {
  fn default() -> Self {
    Self::NORMAL
  }
}

impl From<u16> for FontWeight {
  fn from(weight: u16) -> Self {
    Self::new(weight)
  }
}

/// Font style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
  #[default]
  Normal,
  Italic,
}

impl FontStyle {
  pub fn as_str(self) -> &'static str {
    match self {
      FontStyle::Normal => "normal",
      FontStyle::Italic => "italic",
    }
  }
}

/// Identifies one face: family, weight and style.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontKey {
  pub family: String,
  pub weight: FontWeight,
  pub style: FontStyle,
}

impl FontKey {
  pub fn new(family: impl Into<String>, weight: FontWeight, style: FontStyle) -> Self {
    Self {
      family: family.into(),
      weight,
      style,
    }
  }

  fn matches(&self, other: &FontKey) -> bool {
    self.weight == other.weight
      && self.style == other.style
      && self.family.eq_ignore_ascii_case(&other.family)
  }
}

impl fmt::Display for FontKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} {} {}",
      self.family,
      self.weight.value(),
      self.style.as_str()
    )
  }
}

/// A font asset before validation: declared identity plus raw bytes.
#[derive(Debug, Clone)]
pub struct FontAssetSource {
  pub family: String,
  pub weight: FontWeight,
  pub style: FontStyle,
  pub data: Cow<'static, [u8]>,
}

impl FontAssetSource {
  /// Source backed by bytes embedded in the binary
  pub fn from_static(
    family: impl Into<String>,
    weight: FontWeight,
    style: FontStyle,
    data: &'static [u8],
  ) -> Self {
    Self {
      family: family.into(),
      weight,
      style,
      data: Cow::Borrowed(data),
    }
  }

  /// Source backed by owned bytes (e.g. read from disk by the caller)
  pub fn from_vec(
    family: impl Into<String>,
    weight: FontWeight,
    style: FontStyle,
    data: Vec<u8>,
  ) -> Self {
    Self {
      family: family.into(),
      weight,
      style,
      data: Cow::Owned(data),
    }
  }
}

/// Vertical metrics scaled to a font size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledMetrics {
  /// Distance from baseline to the top of the em box (positive)
  pub ascent: f32,
  /// Distance from baseline to the bottom of the em box (positive)
  pub descent: f32,
  pub line_gap: f32,
}

impl ScaledMetrics {
  pub fn line_height(&self) -> f32 {
    self.ascent + self.descent + self.line_gap
  }
}

/// A validated, immutable font face
///
/// Font bytes are shared through an `Arc`, so cloning an asset is cheap.
#[derive(Debug, Clone)]
pub struct FontAsset {
  pub family: String,
  pub weight: FontWeight,
  pub style: FontStyle,
  /// Font binary data (shared via Arc for efficiency)
  pub data: Arc<Vec<u8>>,
  /// Face index within the file
  pub index: u32,
  units_per_em: u16,
  ascender: i16,
  descender: i16,
  line_gap: i16,
  glyph_count: u16,
  has_ellipsis: bool,
}

impl FontAsset {
  fn from_source(source: FontAssetSource) -> Result<Self> {
    let load_failed = |reason: String| FontError::LoadFailed {
      family: source.family.clone(),
      weight: source.weight.value(),
      reason,
    };

    if source.family.trim().is_empty() {
      return Err(load_failed("family name is empty".to_string()).into());
    }

    let data = source.data.clone().into_owned();
    let face = ttf_parser::Face::parse(&data, 0)
      .map_err(|e| load_failed(format!("failed to parse font: {e}")))?;

    let tables = face.tables();
    if tables.glyf.is_none() && tables.cff.is_none() {
      return Err(load_failed("font has no outline table".to_string()).into());
    }
    if tables.cmap.is_none() {
      return Err(load_failed("font has no character map".to_string()).into());
    }
    let units_per_em = face.units_per_em();
    if units_per_em == 0 {
      return Err(load_failed("units per em is zero".to_string()).into());
    }

    let ascender = face.ascender();
    let descender = face.descender();
    let line_gap = face.line_gap();
    let glyph_count = face.number_of_glyphs();
    let has_ellipsis = face.glyph_index('\u{2026}').is_some();
    drop(face);

    Ok(Self {
      family: source.family,
      weight: source.weight,
      style: source.style,
      data: Arc::new(data),
      index: 0,
      units_per_em,
      ascender,
      descender,
      line_gap,
      glyph_count,
      has_ellipsis,
    })
  }

  pub fn key(&self) -> FontKey {
    FontKey::new(self.family.clone(), self.weight, self.style)
  }

  /// Get a ttf-parser Face for outline access
  pub fn as_ttf_face(&self) -> Result<ttf_parser::Face<'_>> {
    ttf_parser::Face::parse(&self.data, self.index).map_err(|e| {
      FontError::LoadFailed {
        family: self.family.clone(),
        weight: self.weight.value(),
        reason: format!("failed to parse font: {e}"),
      }
      .into()
    })
  }

  #[inline]
  pub fn units_per_em(&self) -> u16 {
    self.units_per_em
  }

  #[inline]
  pub fn glyph_count(&self) -> u16 {
    self.glyph_count
  }

  /// Whether the face maps U+2026 HORIZONTAL ELLIPSIS to a glyph
  #[inline]
  pub fn has_ellipsis(&self) -> bool {
    self.has_ellipsis
  }

  /// Design units to pixels at the given font size
  #[inline]
  pub fn scale(&self, font_size: f32) -> f32 {
    font_size / self.units_per_em as f32
  }

  pub fn metrics(&self, font_size: f32) -> ScaledMetrics {
    let scale = self.scale(font_size);
    ScaledMetrics {
      ascent: self.ascender as f32 * scale,
      descent: -(self.descender as f32) * scale,
      line_gap: self.line_gap as f32 * scale,
    }
  }

  /// Shapes one line of text with this face
  pub fn shape(&self, text: &str, font_size: f32) -> Result<ShapedRun> {
    shape_text(self, text, font_size)
  }

  /// Advance width of one line of text in pixels
  pub fn measure(&self, text: &str, font_size: f32) -> Result<f32> {
    Ok(self.shape(text, font_size)?.width)
  }
}

/// Read-only collection of validated font faces
///
/// Faces keep their load order; lookups never mutate the registry, so a
/// shared `Arc<FontRegistry>` needs no locking.
#[derive(Debug, Clone)]
pub struct FontRegistry {
  assets: Vec<FontAsset>,
}

impl FontRegistry {
  /// Validates and loads every source; the first malformed asset fails the load.
  pub fn load(sources: Vec<FontAssetSource>) -> Result<Self> {
    if sources.is_empty() {
      return Err(FontError::NoFontsAvailable.into());
    }

    let mut assets: Vec<FontAsset> = Vec::with_capacity(sources.len());
    for source in sources {
      let asset = FontAsset::from_source(source)?;
      let key = asset.key();
      if assets.iter().any(|existing| existing.key().matches(&key)) {
        return Err(
          FontError::LoadFailed {
            family: asset.family,
            weight: asset.weight.value(),
            reason: format!("duplicate face for {key}"),
          }
          .into(),
        );
      }
      assets.push(asset);
    }

    log::debug!("font registry loaded {} faces", assets.len());
    Ok(Self { assets })
  }

  /// Loads the faces embedded in the crate
  pub fn bundled() -> Result<Self> {
    Self::load(Self::bundled_sources())
  }

  /// Loads the embedded faces followed by caller-provided assets
  pub fn bundled_with(extra: Vec<FontAssetSource>) -> Result<Self> {
    let mut sources = Self::bundled_sources();
    sources.extend(extra);
    Self::load(sources)
  }

  fn bundled_sources() -> Vec<FontAssetSource> {
    BUNDLED_FACES
      .iter()
      .map(|face| FontAssetSource::from_static(DEFAULT_FAMILY, face.weight, face.style, face.data))
      .collect()
  }

  /// Resolves the best face for a family, weight and style.
  ///
  /// Fails only when the family is not registered.
  pub fn resolve(&self, family: &str, weight: FontWeight, style: FontStyle) -> Result<&FontAsset> {
    let candidates: Vec<&FontAsset> = self
      .assets
      .iter()
      .filter(|asset| asset.family.eq_ignore_ascii_case(family))
      .collect();
    if candidates.is_empty() {
      return Err(
        FontError::FontNotFound {
          family: family.to_string(),
        }
        .into(),
      );
    }

    let has_style = candidates.iter().any(|asset| asset.style == style);
    candidates
      .into_iter()
      .filter(|asset| !has_style || asset.style == style)
      .min_by_key(|asset| (asset.weight.distance(weight), Reverse(asset.weight)))
      .ok_or_else(|| {
        FontError::FontNotFound {
          family: family.to_string(),
        }
        .into()
      })
  }

  /// Resolves a requested key
  pub fn resolve_key(&self, key: &FontKey) -> Result<&FontAsset> {
    self.resolve(&key.family, key.weight, key.style)
  }

  /// Exact lookup of an already-resolved key (no fallback)
  pub fn get(&self, key: &FontKey) -> Option<&FontAsset> {
    self.assets.iter().find(|asset| asset.key().matches(key))
  }

  /// Distinct family names in load order
  pub fn families(&self) -> Vec<&str> {
    let mut families: Vec<&str> = Vec::new();
    for asset in &self.assets {
      if !families
        .iter()
        .any(|family| family.eq_ignore_ascii_case(&asset.family))
      {
        families.push(&asset.family);
      }
    }
    families
  }

  pub fn assets(&self) -> impl Iterator<Item = &FontAsset> {
    self.assets.iter()
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.assets.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.assets.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Error;

  fn regular_bytes() -> &'static [u8] {
    BUNDLED_FACES[1].data
  }

  #[test]
  fn bundled_registry_loads_every_face() {
    let fonts = FontRegistry::bundled().unwrap();
    assert_eq!(fonts.len(), BUNDLED_FACES.len());
    assert_eq!(fonts.families(), vec![DEFAULT_FAMILY]);
  }

  #[test]
  fn exact_match_is_preferred() {
    let fonts = FontRegistry::bundled().unwrap();
    let face = fonts
      .resolve(DEFAULT_FAMILY, FontWeight::BOLD, FontStyle::Normal)
      .unwrap();
    assert_eq!(face.weight, FontWeight::BOLD);
    assert_eq!(face.style, FontStyle::Normal);
  }

  #[test]
  fn nearest_weight_ties_go_heavier() {
    let fonts = FontRegistry::bundled().unwrap();
    // 300 is 100 away from both 200 and 400.
    let face = fonts
      .resolve(DEFAULT_FAMILY, FontWeight::LIGHT, FontStyle::Normal)
      .unwrap();
    assert_eq!(face.weight, FontWeight::NORMAL);
    // 550 is 150 from 400 and 150 from 700.
    let face = fonts
      .resolve(DEFAULT_FAMILY, FontWeight(550), FontStyle::Normal)
      .unwrap();
    assert_eq!(face.weight, FontWeight::BOLD);
    let face = fonts
      .resolve(DEFAULT_FAMILY, FontWeight::BLACK, FontStyle::Normal)
      .unwrap();
    assert_eq!(face.weight, FontWeight::BOLD);
  }

  #[test]
  fn italic_request_stays_within_italic_faces() {
    let fonts = FontRegistry::bundled().unwrap();
    let face = fonts
      .resolve(DEFAULT_FAMILY, FontWeight::BOLD, FontStyle::Italic)
      .unwrap();
    assert_eq!(face.style, FontStyle::Italic);
    assert_eq!(face.weight, FontWeight::NORMAL);
  }

  #[test]
  fn missing_style_falls_back_to_other_style() {
    let fonts = FontRegistry::load(vec![FontAssetSource::from_static(
      "Solo",
      FontWeight::NORMAL,
      FontStyle::Normal,
      regular_bytes(),
    )])
    .unwrap();
    let face = fonts
      .resolve("solo", FontWeight::BOLD, FontStyle::Italic)
      .unwrap();
    assert_eq!(face.family, "Solo");
    assert_eq!(face.style, FontStyle::Normal);
  }

  #[test]
  fn unknown_family_is_not_found() {
    let fonts = FontRegistry::bundled().unwrap();
    let err = fonts
      .resolve("Comic Sans MS", FontWeight::NORMAL, FontStyle::Normal)
      .unwrap_err();
    assert!(matches!(err, Error::Font(FontError::FontNotFound { .. })));
  }

  #[test]
  fn malformed_asset_fails_load() {
    let err = FontRegistry::load(vec![FontAssetSource::from_vec(
      "Broken",
      FontWeight::NORMAL,
      FontStyle::Normal,
      b"definitely not a font".to_vec(),
    )])
    .unwrap_err();
    assert!(matches!(err, Error::Font(FontError::LoadFailed { .. })));
  }

  #[test]
  fn empty_source_list_is_rejected() {
    let err = FontRegistry::load(Vec::new()).unwrap_err();
    assert!(matches!(err, Error::Font(FontError::NoFontsAvailable)));
  }

  #[test]
  fn duplicate_faces_are_rejected() {
    let face = FontAssetSource::from_static(
      "Twice",
      FontWeight::NORMAL,
      FontStyle::Normal,
      regular_bytes(),
    );
    let err = FontRegistry::load(vec![face.clone(), face]).unwrap_err();
    assert!(matches!(err, Error::Font(FontError::LoadFailed { .. })));
  }

  #[test]
  fn exact_get_does_not_fall_back() {
    let fonts = FontRegistry::bundled().unwrap();
    let missing = FontKey::new(DEFAULT_FAMILY, FontWeight::BLACK, FontStyle::Normal);
    assert!(fonts.get(&missing).is_none());
    let present = FontKey::new("dejavu sans", FontWeight::BOLD, FontStyle::Normal);
    assert!(fonts.get(&present).is_some());
  }

  #[test]
  fn metrics_scale_with_size() {
    let fonts = FontRegistry::bundled().unwrap();
    let face = fonts
      .resolve(DEFAULT_FAMILY, FontWeight::NORMAL, FontStyle::Normal)
      .unwrap();
    let small = face.metrics(10.0);
    let large = face.metrics(20.0);
    assert!(small.ascent > 0.0 && small.descent > 0.0);
    assert!((large.ascent - small.ascent * 2.0).abs() < 1e-3);
    assert!(face.has_ellipsis());
  }
}
