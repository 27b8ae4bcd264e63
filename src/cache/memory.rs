use super::{CacheEntry, CacheKey, RenderStore, RenderedOutput};
use crate::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::SystemTime;

/// In-process render store.
///
/// Entries share their bytes through `Arc`, so a `get` is a map lookup plus a
/// reference-count bump. Writers replace whole entries under the write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
  entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl RenderStore for MemoryStore {
  fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
    Ok(self.entries.read().get(key).cloned())
  }

  fn put(&self, key: CacheKey, value: RenderedOutput) -> Result<CacheEntry> {
    let entry = CacheEntry {
      key: key.clone(),
      value,
      stored_at: SystemTime::now(),
    };
    self.entries.write().insert(key, entry.clone());
    Ok(entry)
  }

  fn invalidate(&self, widget_id: &str) -> Result<usize> {
    let mut entries = self.entries.write();
    let before = entries.len();
    entries.retain(|key, _| key.widget_id != widget_id);
    Ok(before - entries.len())
  }

  fn supersede(&self, widget_id: &str, current_version: &str) -> Result<usize> {
    let mut entries = self.entries.write();
    let before = entries.len();
    entries.retain(|key, _| key.widget_id != widget_id || key.version == current_version);
    Ok(before - entries.len())
  }

  fn len(&self) -> Result<usize> {
    Ok(self.entries.read().len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::OutputFormat;
  use crate::theme::Theme;
  use std::sync::Arc;

  fn key(widget: &str, version: &str, theme: Theme, format: OutputFormat) -> CacheKey {
    CacheKey::new(widget, version, theme, format)
  }

  #[test]
  fn miss_then_hit() {
    let store = MemoryStore::new();
    let k = key("w1", "v1", Theme::Light, OutputFormat::Svg);
    assert!(store.get(&k).unwrap().is_none());
    store
      .put(k.clone(), RenderedOutput::new(OutputFormat::Svg, b"<svg/>".to_vec()))
      .unwrap();
    let entry = store.get(&k).unwrap().unwrap();
    assert_eq!(&*entry.value.bytes, b"<svg/>");
    assert_eq!(entry.key, k);
  }

  #[test]
  fn put_overwrites() {
    let store = MemoryStore::new();
    let k = key("w1", "v1", Theme::Light, OutputFormat::Png);
    store.put(k.clone(), RenderedOutput::new(OutputFormat::Png, vec![1])).unwrap();
    store.put(k.clone(), RenderedOutput::new(OutputFormat::Png, vec![2])).unwrap();
    assert_eq!(&*store.get(&k).unwrap().unwrap().value.bytes, &[2]);
    assert_eq!(store.len().unwrap(), 1);
  }

  #[test]
  fn invalidate_removes_every_variant_of_widget() {
    let store = MemoryStore::new();
    for theme in [Theme::Light, Theme::Dark] {
      for format in [OutputFormat::Svg, OutputFormat::Png] {
        for version in ["v1", "v2"] {
          store
            .put(key("w1", version, theme, format), RenderedOutput::new(format, vec![0]))
            .unwrap();
        }
      }
    }
    store
      .put(
        key("w2", "v1", Theme::Light, OutputFormat::Svg),
        RenderedOutput::new(OutputFormat::Svg, vec![0]),
      )
      .unwrap();

    assert_eq!(store.invalidate("w1").unwrap(), 8);
    assert_eq!(store.len().unwrap(), 1);
    assert_eq!(store.invalidate("missing").unwrap(), 0);
  }

  #[test]
  fn supersede_keeps_current_version() {
    let store = MemoryStore::new();
    for version in ["v1", "v2", "v3"] {
      store
        .put(
          key("w1", version, Theme::Light, OutputFormat::Svg),
          RenderedOutput::new(OutputFormat::Svg, vec![0]),
        )
        .unwrap();
    }
    assert_eq!(store.supersede("w1", "v3").unwrap(), 2);
    assert!(store
      .get(&key("w1", "v3", Theme::Light, OutputFormat::Svg))
      .unwrap()
      .is_some());
  }

  #[test]
  fn concurrent_readers_see_whole_entries() {
    let store = Arc::new(MemoryStore::new());
    let k = key("w1", "v1", Theme::Light, OutputFormat::Png);
    let writers: Vec<_> = (0..4u8)
      .map(|i| {
        let store = Arc::clone(&store);
        let k = k.clone();
        std::thread::spawn(move || {
          for _ in 0..50 {
            store
              .put(k.clone(), RenderedOutput::new(OutputFormat::Png, vec![i; 64]))
              .unwrap();
            if let Some(entry) = store.get(&k).unwrap() {
              let first = entry.value.bytes[0];
              assert!(entry.value.bytes.iter().all(|&b| b == first));
            }
          }
        })
      })
      .collect();
    for writer in writers {
      writer.join().unwrap();
    }
    assert_eq!(store.len().unwrap(), 1);
  }
}
