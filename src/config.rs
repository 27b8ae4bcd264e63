//! Renderer configuration
//!
//! A [`RenderConfig`] is read from JSON (every field optional) and can then be
//! overridden from the environment:
//!
//! | Variable | Field |
//! |---|---|
//! | `CARD_RASTER_SCALE` | `raster_scale` |
//! | `CARD_RASTER_THREADS` | `raster_threads` |
//! | `CARD_CACHE_DIR` | `cache_dir` |
//!
//! Invalid values, including variables that are set but blank, are reported
//! as [`ConfigError`] rather than ignored, so a misconfigured deployment fails
//! at startup.

use crate::error::{ConfigError, Result};
use crate::layout::LayoutConfig;
use crate::raster::pool::{parse_raster_threads_env, RASTER_THREADS_ENV};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const RASTER_SCALE_ENV: &str = "CARD_RASTER_SCALE";
pub const CACHE_DIR_ENV: &str = "CARD_CACHE_DIR";

/// Largest accepted raster scale factor
pub const MAX_RASTER_SCALE: f32 = 8.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
  /// Output pixels per canvas pixel for PNG renders
  pub raster_scale: f32,
  /// Raster pool size; all available cores when unset
  pub raster_threads: Option<usize>,
  /// Selects the disk store rooted here instead of the in-memory store
  pub cache_dir: Option<PathBuf>,
  pub layout: LayoutConfig,
}

impl Default for RenderConfig {
  fn default() -> Self {
    Self {
      raster_scale: 2.0,
      raster_threads: None,
      cache_dir: None,
      layout: LayoutConfig::default(),
    }
  }
}

impl RenderConfig {
  /// Parses and validates a JSON config document.
  ///
  /// # Examples
  ///
  /// ```
  /// use progress_card::config::RenderConfig;
  ///
  /// let config = RenderConfig::from_json(r#"{"raster_scale": 3.0}"#).unwrap();
  /// assert_eq!(config.raster_scale, 3.0);
  /// assert_eq!(config.raster_threads, None);
  /// ```
  pub fn from_json(json: &str) -> Result<Self> {
    let config: Self = serde_json::from_str(json).map_err(|err| ConfigError::Parse {
      reason: err.to_string(),
    })?;
    config.validate()?;
    Ok(config)
  }

  /// Defaults overridden by the `CARD_*` environment variables.
  pub fn from_env() -> Result<Self> {
    Self::default().with_env_overrides()
  }

  /// Applies the `CARD_*` environment variables on top of `self`.
  pub fn with_env_overrides(mut self) -> Result<Self> {
    if let Some(raw) = read_env(RASTER_SCALE_ENV)? {
      self.raster_scale = raw.parse::<f32>().map_err(|_| ConfigError::InvalidValue {
        key: RASTER_SCALE_ENV.to_string(),
        reason: format!("{raw:?} is not a number"),
      })?;
    }
    if let Some(threads) = parse_raster_threads_env().map_err(|reason| {
      ConfigError::InvalidValue {
        key: RASTER_THREADS_ENV.to_string(),
        reason,
      }
    })? {
      self.raster_threads = Some(threads);
    }
    if let Some(dir) = read_env(CACHE_DIR_ENV)? {
      self.cache_dir = Some(PathBuf::from(dir));
    }
    self.validate()?;
    Ok(self)
  }

  pub fn validate(&self) -> std::result::Result<(), ConfigError> {
    if !self.raster_scale.is_finite()
      || self.raster_scale <= 0.0
      || self.raster_scale > MAX_RASTER_SCALE
    {
      return Err(ConfigError::InvalidValue {
        key: "raster_scale".to_string(),
        reason: format!("must be within (0, {MAX_RASTER_SCALE}]"),
      });
    }
    if self.raster_threads == Some(0) {
      return Err(ConfigError::InvalidValue {
        key: "raster_threads".to_string(),
        reason: "must be greater than zero".to_string(),
      });
    }
    self.layout.validate()
  }
}

/// Reads a variable; `Ok(None)` when unset. A blank value is an error, as
/// for `CARD_RASTER_THREADS`.
fn read_env(name: &str) -> std::result::Result<Option<String>, ConfigError> {
  match std::env::var(name) {
    Ok(raw) => {
      let raw = raw.trim();
      if raw.is_empty() {
        return Err(ConfigError::InvalidValue {
          key: name.to_string(),
          reason: format!("{name} is set but empty"),
        });
      }
      Ok(Some(raw.to_string()))
    }
    Err(std::env::VarError::NotPresent) => Ok(None),
    Err(err) => Err(ConfigError::InvalidValue {
      key: name.to_string(),
      reason: err.to_string(),
    }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::Error;
  use std::sync::Mutex;

  static ENV_LOCK: Mutex<()> = Mutex::new(());

  struct EnvGuard {
    saved: Vec<(&'static str, Option<String>)>,
  }

  impl EnvGuard {
    fn set(vars: &[(&'static str, Option<&str>)]) -> Self {
      let saved = vars
        .iter()
        .map(|(name, _)| (*name, std::env::var(name).ok()))
        .collect();
      for (name, value) in vars {
        match value {
          Some(value) => std::env::set_var(name, value),
          None => std::env::remove_var(name),
        }
      }
      Self { saved }
    }
  }

  impl Drop for EnvGuard {
    fn drop(&mut self) {
      for (name, value) in &self.saved {
        match value {
          Some(value) => std::env::set_var(name, value),
          None => std::env::remove_var(name),
        }
      }
    }
  }

  #[test]
  fn defaults_are_valid() {
    let config = RenderConfig::default();
    assert_eq!(config.raster_scale, 2.0);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn json_fills_missing_fields_with_defaults() {
    let config =
      RenderConfig::from_json(r#"{"cache_dir": "/tmp/cards", "layout": {"shrink_step": 2.0}}"#)
        .unwrap();
    assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/cards")));
    assert_eq!(config.layout.shrink_step, 2.0);
    assert_eq!(config.layout.shrink_floor_ratio, 0.6);
    assert_eq!(config.raster_scale, 2.0);
  }

  #[test]
  fn json_rejects_bad_values() {
    assert!(matches!(
      RenderConfig::from_json(r#"{"raster_scale": 0}"#),
      Err(Error::Config(ConfigError::InvalidValue { .. }))
    ));
    assert!(matches!(
      RenderConfig::from_json("{not json"),
      Err(Error::Config(ConfigError::Parse { .. }))
    ));
    assert!(matches!(
      RenderConfig::from_json(r#"{"layout": {"shrink_step": -1}}"#),
      Err(Error::Config(ConfigError::InvalidValue { key, .. })) if key == "layout.shrink_step"
    ));
  }

  #[test]
  fn env_overrides_apply() {
    let _lock = ENV_LOCK.lock().unwrap();
    let _env = EnvGuard::set(&[
      (RASTER_SCALE_ENV, Some("1.5")),
      (RASTER_THREADS_ENV, Some("3")),
      (CACHE_DIR_ENV, Some("/var/cache/cards")),
    ]);
    let config = RenderConfig::from_env().unwrap();
    assert_eq!(config.raster_scale, 1.5);
    assert_eq!(config.raster_threads, Some(3));
    assert_eq!(config.cache_dir, Some(PathBuf::from("/var/cache/cards")));
  }

  #[test]
  fn env_rejects_garbage() {
    let _lock = ENV_LOCK.lock().unwrap();
    let _env = EnvGuard::set(&[
      (RASTER_SCALE_ENV, Some("big")),
      (RASTER_THREADS_ENV, None),
      (CACHE_DIR_ENV, None),
    ]);
    assert!(matches!(
      RenderConfig::from_env(),
      Err(Error::Config(ConfigError::InvalidValue { key, .. })) if key == RASTER_SCALE_ENV
    ));

    let _env = EnvGuard::set(&[(RASTER_SCALE_ENV, None), (RASTER_THREADS_ENV, Some("0"))]);
    assert!(matches!(
      RenderConfig::from_env(),
      Err(Error::Config(ConfigError::InvalidValue { key, .. })) if key == RASTER_THREADS_ENV
    ));
  }

  #[test]
  fn blank_variables_are_rejected_alike() {
    let _lock = ENV_LOCK.lock().unwrap();
    for name in [RASTER_SCALE_ENV, RASTER_THREADS_ENV, CACHE_DIR_ENV] {
      let others: Vec<_> = [RASTER_SCALE_ENV, RASTER_THREADS_ENV, CACHE_DIR_ENV]
        .into_iter()
        .filter(|other| *other != name)
        .map(|other| (other, None))
        .collect();
      let _unset = EnvGuard::set(&others);
      let _blank = EnvGuard::set(&[(name, Some("  "))]);
      assert!(
        matches!(
          RenderConfig::from_env(),
          Err(Error::Config(ConfigError::InvalidValue { ref key, .. })) if key == name
        ),
        "blank {name} should be rejected"
      );
    }
  }
}
