//! Error types for progress-card
//!
//! This module provides the error taxonomy for every stage of the pipeline:
//! - Font errors (asset loading, family resolution)
//! - Layout errors (malformed widget specs or metrics)
//! - Rasterize errors (documents the rasterizer cannot draw)
//! - Render errors (pixmap allocation, image encoding)
//! - Store errors (render cache persistence)
//! - Config errors (invalid configuration values)
//!
//! All errors use the `thiserror` crate for minimal boilerplate and
//! proper error trait implementations.
//!
//! Errors are also grouped into an [`ErrorClass`] so the surrounding service
//! can decide how to surface them: startup errors abort process start, caller
//! errors map to a 4xx-style response and internal errors to a 5xx-style one.

use thiserror::Error;

/// Result type alias for progress-card operations
///
/// # Examples
///
/// ```
/// use progress_card::Result;
///
/// fn render_nothing() -> Result<()> {
///   Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for progress-card
///
/// Each variant wraps a more specific error type for that subsystem.
///
/// # Examples
///
/// ```
/// use progress_card::Error;
/// use progress_card::error::LayoutError;
///
/// fn build() -> Result<(), Error> {
///   Err(Error::Layout(LayoutError::InvalidDimensions { width: 0, height: 120 }))
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
  /// Font loading or resolution error
  #[error("Font error: {0}")]
  Font(#[from] FontError),

  /// Widget spec or metrics could not be laid out
  #[error("Layout error: {0}")]
  Layout(#[from] LayoutError),

  /// Vector document could not be rasterized
  #[error("Rasterize error: {0}")]
  Rasterize(#[from] RasterizeError),

  /// Pixmap allocation or image encoding error
  #[error("Render error: {0}")]
  Render(#[from] RenderError),

  /// Render cache persistence error
  #[error("Store error: {0}")]
  Store(#[from] StoreError),

  /// Invalid configuration
  #[error("Config error: {0}")]
  Config(#[from] ConfigError),

  /// The widget source has no record for the requested widget/version
  #[error("Widget '{widget_id}' version '{version}' not found")]
  WidgetNotFound { widget_id: String, version: String },

  /// Generic error for miscellaneous issues
  #[error("{0}")]
  Other(String),
}

/// How an error should be surfaced by the surrounding service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
  /// Configuration or asset problem detected at initialisation; abort start.
  Startup,
  /// Malformed input from the caller (4xx-equivalent).
  Caller,
  /// Broken internal invariant or infrastructure failure (5xx-equivalent).
  Internal,
}

impl Error {
  /// Classifies the error for the caller.
  pub fn class(&self) -> ErrorClass {
    match self {
      Error::Font(_) | Error::Config(_) => ErrorClass::Startup,
      Error::Layout(_) | Error::WidgetNotFound { .. } => ErrorClass::Caller,
      Error::Rasterize(_) | Error::Render(_) | Error::Store(_) | Error::Other(_) => {
        ErrorClass::Internal
      }
    }
  }

  /// HTTP-style status code a service would typically answer with.
  pub fn status_hint(&self) -> u16 {
    match self {
      Error::WidgetNotFound { .. } => 404,
      Error::Layout(_) => 422,
      _ => 500,
    }
  }
}

/// Errors that occur during font loading and resolution
///
/// These are startup-class errors: a registry that cannot load its assets
/// must not silently serve the wrong glyphs.
///
/// # Examples
///
/// ```
/// use progress_card::error::FontError;
///
/// let error = FontError::FontNotFound {
///   family: "Inter".to_string(),
/// };
/// assert!(error.to_string().contains("Inter"));
/// ```
#[derive(Error, Debug, Clone)]
pub enum FontError {
  /// Font family not registered
  #[error("Font family not found: '{family}'")]
  FontNotFound { family: String },

  /// Registry was built without any assets
  #[error("No font assets were provided")]
  NoFontsAvailable,

  /// Font asset is malformed or undecodable
  #[error("Failed to load font '{family}' (weight {weight}): {reason}")]
  LoadFailed {
    family: String,
    weight: u16,
    reason: String,
  },
}

/// Errors raised while turning a widget spec and metrics into content blocks
///
/// These are caller-class errors: the widget description or its metrics are
/// malformed for the chosen variant.
///
/// # Examples
///
/// ```
/// use progress_card::error::LayoutError;
///
/// let error = LayoutError::MissingMetric {
///   variant: "bar".to_string(),
///   field: "target_value".to_string(),
/// };
/// assert!(error.to_string().contains("target_value"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
  /// Canvas dimensions are zero or outside the supported range
  #[error("Invalid canvas dimensions: {width}x{height}")]
  InvalidDimensions { width: u32, height: u32 },

  /// A metric required by the variant is absent
  #[error("Variant '{variant}' requires metric '{field}'")]
  MissingMetric { variant: String, field: String },

  /// A metric value is present but unusable
  #[error("Invalid metric '{field}': {reason}")]
  InvalidMetric { field: String, reason: String },
}

/// Errors raised by the rasterizer
///
/// A document produced by the compositor should never trigger these; they
/// indicate a broken contract between the pipeline stages.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RasterizeError {
  /// The document itself is malformed (bad viewBox, non-finite geometry)
  #[error("Malformed document: {reason}")]
  MalformedDocument { reason: String },

  /// A primitive cannot be drawn with the available resources
  #[error("Unsupported primitive '{primitive}': {reason}")]
  UnsupportedPrimitive { primitive: String, reason: String },

  /// Requested output size is unusable
  #[error("Invalid target size {width}x{height}")]
  InvalidTargetSize { width: u32, height: u32 },
}

/// Errors that occur while allocating pixel buffers or encoding images
#[derive(Error, Debug, Clone)]
pub enum RenderError {
  /// Image encoding failed
  #[error("Failed to encode image as {format}: {reason}")]
  EncodeFailed { format: String, reason: String },

  /// Invalid paint parameters
  #[error("Invalid paint parameters: {message}")]
  InvalidParameters { message: String },

  /// The rasterization pool could not be started
  #[error("Raster pool unavailable: {reason}")]
  PoolUnavailable { reason: String },
}

/// Errors raised by render cache backends
#[derive(Error, Debug)]
pub enum StoreError {
  /// Filesystem access failed
  #[error("Store I/O failed for '{path}': {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },

  /// Stored metadata could not be decoded
  #[error("Corrupt store entry '{path}': {reason}")]
  Corrupt { path: String, reason: String },
}

/// Errors raised while loading configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
  /// A config value is out of range or unparsable
  #[error("Invalid value for '{key}': {reason}")]
  InvalidValue { key: String, reason: String },

  /// The config document could not be parsed
  #[error("Failed to parse config: {reason}")]
  Parse { reason: String },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn font_error_not_found_names_family() {
    let error = FontError::FontNotFound {
      family: "Inter".to_string(),
    };
    assert!(format!("{}", error).contains("Inter"));
  }

  #[test]
  fn font_error_load_failed_includes_weight() {
    let error = FontError::LoadFailed {
      family: "DejaVu Sans".to_string(),
      weight: 700,
      reason: "bad magic".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("DejaVu Sans"));
    assert!(display.contains("700"));
    assert!(display.contains("bad magic"));
  }

  #[test]
  fn layout_error_dimensions() {
    let error = LayoutError::InvalidDimensions {
      width: 0,
      height: 120,
    };
    assert!(format!("{}", error).contains("0x120"));
  }

  #[test]
  fn error_from_layout_error_is_caller_class() {
    let error: Error = LayoutError::MissingMetric {
      variant: "ring".to_string(),
      field: "target_value".to_string(),
    }
    .into();
    assert_eq!(error.class(), ErrorClass::Caller);
    assert_eq!(error.status_hint(), 422);
    assert!(format!("{}", error).contains("Layout error"));
  }

  #[test]
  fn rasterize_error_is_internal() {
    let error: Error = RasterizeError::MalformedDocument {
      reason: "empty viewBox".to_string(),
    }
    .into();
    assert_eq!(error.class(), ErrorClass::Internal);
    assert_eq!(error.status_hint(), 500);
  }

  #[test]
  fn font_and_config_errors_are_startup_class() {
    let font: Error = FontError::NoFontsAvailable.into();
    assert_eq!(font.class(), ErrorClass::Startup);

    let config: Error = ConfigError::InvalidValue {
      key: "raster_scale".to_string(),
      reason: "must be positive".to_string(),
    }
    .into();
    assert_eq!(config.class(), ErrorClass::Startup);
  }

  #[test]
  fn widget_not_found_maps_to_404() {
    let error = Error::WidgetNotFound {
      widget_id: "w1".to_string(),
      version: "v1".to_string(),
    };
    assert_eq!(error.status_hint(), 404);
    assert_eq!(error.class(), ErrorClass::Caller);
  }

  #[test]
  fn store_error_keeps_source() {
    let error = StoreError::Io {
      path: "/tmp/cache".to_string(),
      source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    };
    assert!(std::error::Error::source(&error).is_some());
    assert!(format!("{}", error).contains("/tmp/cache"));
  }
}
