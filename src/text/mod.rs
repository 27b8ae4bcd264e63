//! Fonts, shaping and glyph outlines
//!
//! # Responsibilities
//!
//! - **Font Registry**: Load embedded font assets, resolve family/weight/style
//! - **Shaping**: Convert one line of text to positioned glyphs (rustybuzz)
//! - **Glyph Paths**: Extract outlines for the SVG writer and the rasterizer
//!
//! Everything here is read-only after start-up; a single
//! `Arc<FontRegistry>` is shared by every render.

pub mod font_registry;
pub mod glyph_path;
pub mod shaping;

pub use font_registry::{
  FontAsset, FontAssetSource, FontKey, FontRegistry, FontStyle, FontWeight, ScaledMetrics,
  DEFAULT_FAMILY,
};
pub use shaping::{measure_text, shape_text, PositionedGlyph, ShapedRun};
