//! Render cache
//!
//! Rendered outputs are addressed by `(widget id, version, theme, format)`.
//! Entries never expire; they are removed only by explicit invalidation of a
//! widget or when a newer version supersedes them.
//!
//! - `memory` - in-process store behind a read/write lock
//! - `disk` - file-backed store with JSON sidecars and atomic replace

mod disk;
mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

/// `Cache-Control` value for rendered outputs: a key's bytes never change.
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Delivery format of a rendered card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
  #[default]
  Svg,
  Png,
}

impl OutputFormat {
  pub fn content_type(self) -> &'static str {
    match self {
      OutputFormat::Svg => "image/svg+xml",
      OutputFormat::Png => "image/png",
    }
  }

  pub fn extension(self) -> &'static str {
    match self {
      OutputFormat::Svg => "svg",
      OutputFormat::Png => "png",
    }
  }

  /// Parses a format name or file extension (case-insensitive)
  pub fn parse(value: &str) -> Option<Self> {
    match value.trim().to_ascii_lowercase().as_str() {
      "svg" => Some(OutputFormat::Svg),
      "png" => Some(OutputFormat::Png),
      _ => None,
    }
  }
}

impl fmt::Display for OutputFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.extension())
  }
}

/// Final bytes of a render; never mutated after creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedOutput {
  pub format: OutputFormat,
  pub bytes: Arc<[u8]>,
  pub content_type: &'static str,
}

impl RenderedOutput {
  pub fn new(format: OutputFormat, bytes: Vec<u8>) -> Self {
    Self {
      format,
      bytes: Arc::from(bytes),
      content_type: format.content_type(),
    }
  }

  pub fn cache_control(&self) -> &'static str {
    IMMUTABLE_CACHE_CONTROL
  }

  pub fn len(&self) -> usize {
    self.bytes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }
}

/// Identity of a cached render
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
  pub widget_id: String,
  pub version: String,
  pub theme: Theme,
  pub format: OutputFormat,
}

impl CacheKey {
  pub fn new(
    widget_id: impl Into<String>,
    version: impl Into<String>,
    theme: Theme,
    format: OutputFormat,
  ) -> Self {
    Self {
      widget_id: widget_id.into(),
      version: version.into(),
      theme,
      format,
    }
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}@{}/{}.{}",
      self.widget_id, self.version, self.theme, self.format
    )
  }
}

/// A stored render
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
  pub key: CacheKey,
  pub value: RenderedOutput,
  pub stored_at: SystemTime,
}

/// Backend for rendered outputs.
///
/// Implementations must make `put` and `invalidate` atomic with respect to
/// `get`: a reader sees either the old entry, the new one or none, never a
/// partial one.
pub trait RenderStore: Send + Sync {
  fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>>;

  /// Stores `value`, replacing any existing entry for `key`.
  fn put(&self, key: CacheKey, value: RenderedOutput) -> Result<CacheEntry>;

  /// Removes every version, theme and format of a widget.
  fn invalidate(&self, widget_id: &str) -> Result<usize>;

  /// Removes entries of a widget whose version differs from `current_version`.
  fn supersede(&self, widget_id: &str, current_version: &str) -> Result<usize>;

  fn len(&self) -> Result<usize>;

  fn is_empty(&self) -> Result<bool> {
    Ok(self.len()? == 0)
  }
}
