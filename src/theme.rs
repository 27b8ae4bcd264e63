//! Themes, colours and palette lookup
//!
//! Layout blocks carry semantic [`Paint`] roles rather than concrete colours.
//! The vector compositor is the single place where a role is turned into an
//! [`Rgba`] value, through [`Palette::for_theme`]. Everything downstream of the
//! compositor (SVG serialisation, rasterization) only sees concrete colours, so
//! vector and raster output cannot disagree about the theme.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Colour scheme of a rendered card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
  #[default]
  Light,
  Dark,
}

impl Theme {
  pub fn as_str(self) -> &'static str {
    match self {
      Theme::Light => "light",
      Theme::Dark => "dark",
    }
  }

  /// Parses a theme name (case-insensitive)
  pub fn parse(value: &str) -> Option<Self> {
    match value.trim().to_ascii_lowercase().as_str() {
      "light" => Some(Theme::Light),
      "dark" => Some(Theme::Dark),
      _ => None,
    }
  }
}

impl fmt::Display for Theme {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// 8-bit RGBA colour (straight alpha)
///
/// Alpha is stored as a byte so colours compare and hash exactly, which keeps
/// serialised output stable.
///
/// # Examples
///
/// ```
/// use progress_card::Rgba;
///
/// let accent = Rgba::rgb(0x2d, 0xa4, 0x4e);
/// assert_eq!(accent.to_hex(), "#2da44e");
/// assert!(accent.is_opaque());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}

impl Rgba {
  pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
  pub const BLACK: Self = Self::rgb(0, 0, 0);
  pub const WHITE: Self = Self::rgb(255, 255, 255);

  pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
    Self { r, g, b, a }
  }

  /// Opaque colour from RGB components
  pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
    Self::new(r, g, b, 255)
  }

  /// Returns `#rrggbb`; alpha is written separately as an opacity.
  pub fn to_hex(self) -> String {
    format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
  }

  /// Alpha as a 0.0-1.0 opacity
  pub fn opacity(self) -> f32 {
    self.a as f32 / 255.0
  }

  pub fn is_opaque(self) -> bool {
    self.a == 255
  }

  pub fn is_transparent(self) -> bool {
    self.a == 0
  }
}

/// Number of distinct heatmap intensity levels (level 0 = no activity).
pub const HEAT_LEVELS: u8 = 5;

/// Semantic colour role assigned by the layout builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Paint {
  /// Card background
  Background,
  /// One-pixel card outline
  Border,
  /// Unfilled part of bars and rings
  Track,
  /// Filled progress
  Accent,
  /// Headline text (values)
  TextPrimary,
  /// Labels and captions
  TextSecondary,
  /// Heatmap cell intensity, `0..HEAT_LEVELS`
  Heat(u8),
}

/// Concrete colours for one theme.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
  pub background: Rgba,
  pub border: Rgba,
  pub track: Rgba,
  pub accent: Rgba,
  pub text_primary: Rgba,
  pub text_secondary: Rgba,
  pub heat: [Rgba; HEAT_LEVELS as usize],
}

impl Palette {
  pub const LIGHT: Palette = Palette {
    background: Rgba::rgb(0xff, 0xff, 0xff),
    border: Rgba::rgb(0xd0, 0xd7, 0xde),
    track: Rgba::rgb(0xea, 0xee, 0xf2),
    accent: Rgba::rgb(0x2d, 0xa4, 0x4e),
    text_primary: Rgba::rgb(0x1f, 0x23, 0x28),
    text_secondary: Rgba::rgb(0x59, 0x63, 0x6e),
    heat: [
      Rgba::rgb(0xeb, 0xed, 0xf0),
      Rgba::rgb(0x9b, 0xe9, 0xa8),
      Rgba::rgb(0x40, 0xc4, 0x63),
      Rgba::rgb(0x30, 0xa1, 0x4e),
      Rgba::rgb(0x21, 0x6e, 0x39),
    ],
  };

  pub const DARK: Palette = Palette {
    background: Rgba::rgb(0x0d, 0x11, 0x17),
    border: Rgba::rgb(0x30, 0x36, 0x3d),
    track: Rgba::rgb(0x21, 0x26, 0x2d),
    accent: Rgba::rgb(0x3f, 0xb9, 0x50),
    text_primary: Rgba::rgb(0xe6, 0xed, 0xf3),
    text_secondary: Rgba::rgb(0x8d, 0x96, 0xa0),
    heat: [
      Rgba::rgb(0x16, 0x1b, 0x22),
      Rgba::rgb(0x0e, 0x44, 0x29),
      Rgba::rgb(0x00, 0x6d, 0x32),
      Rgba::rgb(0x26, 0xa6, 0x41),
      Rgba::rgb(0x39, 0xd3, 0x53),
    ],
  };

  /// Pure palette lookup
  pub fn for_theme(theme: Theme) -> &'static Palette {
    match theme {
      Theme::Light => &Self::LIGHT,
      Theme::Dark => &Self::DARK,
    }
  }

  /// Maps a semantic role to its colour; heat levels saturate at the top level.
  pub fn resolve(&self, paint: Paint) -> Rgba {
    match paint {
      Paint::Background => self.background,
      Paint::Border => self.border,
      Paint::Track => self.track,
      Paint::Accent => self.accent,
      Paint::TextPrimary => self.text_primary,
      Paint::TextSecondary => self.text_secondary,
      Paint::Heat(level) => self.heat[level.min(HEAT_LEVELS - 1) as usize],
    }
  }
}
