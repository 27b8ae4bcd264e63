//! Card renderer
//!
//! The main entry point: resolves a widget, renders it and keeps the result
//! in a [`RenderStore`].
//!
//! # Pipeline
//!
//! 1. **Lookup**: `(widget, version, theme, format)` in the store; a hit is
//!    returned as is
//! 2. **Resolve**: the caller's [`WidgetSource`] supplies spec and metrics
//! 3. **Layout**: spec + metrics → block tree
//! 4. **Compose**: block tree + theme → vector document
//! 5. **Deliver**: responsive SVG markup, or PNG rasterized on the raster pool
//! 6. **Store**: the finished output is stored under its key
//!
//! Nothing is written to the store unless every step succeeded.
//!
//! Each widget carries an invalidation generation. A render reads it before
//! resolving and skips the store step if [`CardRenderer::invalidate`] or
//! [`CardRenderer::supersede`] ran in the meantime, so output built from data
//! that was invalidated mid-render never lands in the store.

use crate::cache::{CacheKey, DiskStore, MemoryStore, OutputFormat, RenderStore, RenderedOutput};
use crate::config::RenderConfig;
use crate::error::{Error, RenderError, Result};
use crate::layout::{LayoutBuilder, MetricsData, WidgetSpec};
use crate::raster::{rasterize, RasterPool};
use crate::svg::make_responsive;
use crate::text::FontRegistry;
use crate::theme::Theme;
use crate::vector::compose;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Resolves a widget id and version to the data it is rendered from.
pub trait WidgetSource: Send + Sync {
  /// `Ok(None)` when the widget or version does not exist.
  fn resolve(&self, widget_id: &str, version: &str) -> Result<Option<(WidgetSpec, MetricsData)>>;
}

/// In-memory [`WidgetSource`] keyed by `(widget id, version)`.
#[derive(Debug, Default)]
pub struct WidgetTable {
  widgets: RwLock<HashMap<(String, String), (WidgetSpec, MetricsData)>>,
}

impl WidgetTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `spec` under its own id and `version`.
  pub fn insert(&self, version: impl Into<String>, spec: WidgetSpec, metrics: MetricsData) {
    self
      .widgets
      .write()
      .insert((spec.id.clone(), version.into()), (spec, metrics));
  }

  pub fn remove(&self, widget_id: &str, version: &str) -> bool {
    self
      .widgets
      .write()
      .remove(&(widget_id.to_string(), version.to_string()))
      .is_some()
  }
}

impl WidgetSource for WidgetTable {
  fn resolve(&self, widget_id: &str, version: &str) -> Result<Option<(WidgetSpec, MetricsData)>> {
    Ok(
      self
        .widgets
        .read()
        .get(&(widget_id.to_string(), version.to_string()))
        .cloned(),
    )
  }
}

/// A render call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderRequest {
  pub widget_id: String,
  pub version: String,
  /// Overrides the theme stored in the widget spec
  pub theme: Theme,
  pub format: OutputFormat,
}

impl RenderRequest {
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

  pub fn cache_key(&self) -> CacheKey {
    CacheKey::new(&self.widget_id, &self.version, self.theme, self.format)
  }
}

/// Work counters, for tests and diagnostics
#[derive(Debug, Default)]
pub struct RenderStats {
  layouts: AtomicU64,
  compositions: AtomicU64,
  rasterizations: AtomicU64,
  cache_hits: AtomicU64,
  cache_misses: AtomicU64,
}

/// Point-in-time copy of [`RenderStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStatsSnapshot {
  pub layouts: u64,
  pub compositions: u64,
  pub rasterizations: u64,
  pub cache_hits: u64,
  pub cache_misses: u64,
}

impl RenderStats {
  pub fn snapshot(&self) -> RenderStatsSnapshot {
    RenderStatsSnapshot {
      layouts: self.layouts.load(Ordering::Relaxed),
      compositions: self.compositions.load(Ordering::Relaxed),
      rasterizations: self.rasterizations.load(Ordering::Relaxed),
      cache_hits: self.cache_hits.load(Ordering::Relaxed),
      cache_misses: self.cache_misses.load(Ordering::Relaxed),
    }
  }

  fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
  }
}

/// Renders cards and caches the results.
pub struct CardRenderer {
  fonts: Arc<FontRegistry>,
  config: RenderConfig,
  store: Arc<dyn RenderStore>,
  pool: RasterPool,
  stats: RenderStats,
  /// Bumped on every invalidation of a widget; absent means zero
  generations: RwLock<HashMap<String, u64>>,
}

impl std::fmt::Debug for CardRenderer {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CardRenderer")
      .field("fonts", &self.fonts.len())
      .field("config", &self.config)
      .field("pool", &self.pool)
      .finish_non_exhaustive()
  }
}

impl CardRenderer {
  pub fn builder() -> CardRendererBuilder {
    CardRendererBuilder::new()
  }

  pub fn fonts(&self) -> &Arc<FontRegistry> {
    &self.fonts
  }

  pub fn config(&self) -> &RenderConfig {
    &self.config
  }

  pub fn store(&self) -> &Arc<dyn RenderStore> {
    &self.store
  }

  pub fn stats(&self) -> RenderStatsSnapshot {
    self.stats.snapshot()
  }

  /// Returns the cached output for `request`, rendering and storing it on a
  /// miss.
  pub fn render(&self, source: &dyn WidgetSource, request: &RenderRequest) -> Result<RenderedOutput> {
    let key = request.cache_key();
    match self.store.get(&key) {
      Ok(Some(entry)) => {
        RenderStats::bump(&self.stats.cache_hits);
        log::debug!("render cache hit for {key}");
        return Ok(entry.value);
      }
      Ok(None) => log::debug!("render cache miss for {key}"),
      Err(err) => log::warn!("render cache lookup for {key} failed, rendering anyway: {err}"),
    }
    RenderStats::bump(&self.stats.cache_misses);

    let generation = self.generation(&request.widget_id);
    let (spec, metrics) = source
      .resolve(&request.widget_id, &request.version)?
      .ok_or_else(|| Error::WidgetNotFound {
        widget_id: request.widget_id.clone(),
        version: request.version.clone(),
      })?;

    let output = self.render_uncached(&spec, &metrics, request.theme, request.format)?;

    // Held across the put so an invalidation either sees the entry or is seen.
    let generations = self.generations.read();
    if generations.get(&request.widget_id).copied().unwrap_or(0) != generation {
      log::debug!("widget {} was invalidated during render, not storing {key}", request.widget_id);
    } else if let Err(err) = self.store.put(key.clone(), output.clone()) {
      log::warn!("failed to store render {key}: {err}");
    }
    Ok(output)
  }

  /// Renders without consulting or filling the store.
  pub fn render_uncached(
    &self,
    spec: &WidgetSpec,
    metrics: &MetricsData,
    theme: Theme,
    format: OutputFormat,
  ) -> Result<RenderedOutput> {
    let tree = LayoutBuilder::new(&self.fonts, &self.config.layout).build(spec, metrics)?;
    RenderStats::bump(&self.stats.layouts);

    let doc = compose(&tree, theme, &self.fonts)?;
    RenderStats::bump(&self.stats.compositions);

    let bytes = match format {
      OutputFormat::Svg => make_responsive(doc).to_svg().into_bytes(),
      OutputFormat::Png => {
        let (width, height) = self.raster_size(tree.width, tree.height)?;
        let fonts = &self.fonts;
        let png = self.pool.install(|| rasterize(&doc, fonts, width, height))?;
        RenderStats::bump(&self.stats.rasterizations);
        png
      }
    };
    Ok(RenderedOutput::new(format, bytes))
  }

  /// Drops every stored render of a widget.
  pub fn invalidate(&self, widget_id: &str) -> Result<usize> {
    self.bump_generation(widget_id);
    self.store.invalidate(widget_id)
  }

  /// Drops stored renders of a widget made from versions other than
  /// `current_version`.
  pub fn supersede(&self, widget_id: &str, current_version: &str) -> Result<usize> {
    self.bump_generation(widget_id);
    self.store.supersede(widget_id, current_version)
  }

  fn generation(&self, widget_id: &str) -> u64 {
    self.generations.read().get(widget_id).copied().unwrap_or(0)
  }

  fn bump_generation(&self, widget_id: &str) {
    let mut generations = self.generations.write();
    let generation = generations.entry(widget_id.to_string()).or_insert(0);
    *generation = generation.wrapping_add(1);
  }

  fn raster_size(&self, width: u32, height: u32) -> Result<(u32, u32)> {
    let scale = self.config.raster_scale;
    let scaled = |side: u32| (side as f32 * scale).round();
    let (w, h) = (scaled(width), scaled(height));
    if !(w >= 1.0 && h >= 1.0 && w <= u32::MAX as f32 && h <= u32::MAX as f32) {
      return Err(
        RenderError::InvalidParameters {
          message: format!("raster scale {scale} gives an unusable size for {width}x{height}"),
        }
        .into(),
      );
    }
    Ok((w as u32, h as u32))
  }
}

/// Builder for [`CardRenderer`]
#[derive(Default)]
pub struct CardRendererBuilder {
  fonts: Option<Arc<FontRegistry>>,
  config: RenderConfig,
  store: Option<Arc<dyn RenderStore>>,
}

impl CardRendererBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Font registry to render with; the bundled faces when not set.
  pub fn fonts(mut self, fonts: Arc<FontRegistry>) -> Self {
    self.fonts = Some(fonts);
    self
  }

  pub fn config(mut self, config: RenderConfig) -> Self {
    self.config = config;
    self
  }

  /// Overrides the store picked from the config's `cache_dir`.
  pub fn store(mut self, store: Arc<dyn RenderStore>) -> Self {
    self.store = Some(store);
    self
  }

  pub fn raster_scale(mut self, scale: f32) -> Self {
    self.config.raster_scale = scale;
    self
  }

  pub fn build(self) -> Result<CardRenderer> {
    self.config.validate()?;
    let fonts = match self.fonts {
      Some(fonts) => fonts,
      None => Arc::new(FontRegistry::bundled()?),
    };
    let store: Arc<dyn RenderStore> = match (self.store, &self.config.cache_dir) {
      (Some(store), _) => store,
      (None, Some(dir)) => {
        log::debug!("render store: disk at {}", dir.display());
        Arc::new(DiskStore::new(dir)?)
      }
      (None, None) => Arc::new(MemoryStore::new()),
    };
    let pool = RasterPool::new(self.config.raster_threads)?;
    Ok(CardRenderer {
      fonts,
      config: self.config,
      store,
      pool,
      stats: RenderStats::default(),
      generations: RwLock::new(HashMap::new()),
    })
  }
}
