use super::{CacheEntry, CacheKey, OutputFormat, RenderStore, RenderedOutput};
use crate::error::{Result, StoreError};
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const META_SUFFIX: &str = ".json";
const TRASH_PREFIX: &str = ".trash-";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredMetadata {
  widget_id: String,
  version: String,
  theme: Theme,
  format: OutputFormat,
  content_type: String,
  len: usize,
  stored_at: u64,
  #[serde(default)]
  stored_at_nanos: u32,
}

/// File-backed render store.
///
/// Entries live at `<root>/<widget>/<version>/<theme>.<ext>` with a JSON
/// sidecar next to each payload. Path components are percent-escaped so any
/// widget id or version maps to exactly one directory. Writes go to a
/// temporary file and are renamed into place; invalidation renames the
/// widget directory away before deleting it.
#[derive(Debug, Clone)]
pub struct DiskStore {
  root: PathBuf,
}

impl DiskStore {
  pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
    let root = root.into();
    fs::create_dir_all(&root).map_err(|source| io_error(&root, source))?;
    Ok(Self { root })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn widget_dir(&self, widget_id: &str) -> PathBuf {
    self.root.join(escape_component(widget_id))
  }

  fn data_path(&self, key: &CacheKey) -> PathBuf {
    self
      .widget_dir(&key.widget_id)
      .join(escape_component(&key.version))
      .join(format!("{}.{}", key.theme.as_str(), key.format.extension()))
  }

  /// Moves `dir` out of the namespace and deletes it; returns the number of
  /// entries it held.
  fn remove_dir(&self, dir: &Path) -> Result<usize> {
    let trash = self.root.join(format!(
      "{TRASH_PREFIX}{}-{}",
      std::process::id(),
      TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    match fs::rename(dir, &trash) {
      Ok(()) => {}
      Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
      Err(source) => return Err(io_error(dir, source).into()),
    }
    let removed = count_entries(&trash)?;
    if let Err(err) = fs::remove_dir_all(&trash) {
      log::warn!("failed to delete {}: {err}", trash.display());
    }
    Ok(removed)
  }
}

impl RenderStore for DiskStore {
  fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
    let data_path = self.data_path(key);
    let meta_path = meta_path_for(&data_path);

    let meta_bytes = match read_optional(&meta_path)? {
      Some(bytes) => bytes,
      None => return Ok(None),
    };
    let meta: StoredMetadata =
      serde_json::from_slice(&meta_bytes).map_err(|err| StoreError::Corrupt {
        path: meta_path.display().to_string(),
        reason: err.to_string(),
      })?;
    if meta.widget_id != key.widget_id
      || meta.version != key.version
      || meta.theme != key.theme
      || meta.format != key.format
    {
      return Err(
        StoreError::Corrupt {
          path: meta_path.display().to_string(),
          reason: format!("metadata does not describe {key}"),
        }
        .into(),
      );
    }

    let data = match read_optional(&data_path)? {
      Some(bytes) => bytes,
      None => return Ok(None),
    };
    if data.len() != meta.len {
      // A concurrent put replaced the payload between the two reads.
      log::debug!(
        "store entry {key} changed while reading ({} != {} bytes)",
        data.len(),
        meta.len
      );
      return Ok(None);
    }

    Ok(Some(CacheEntry {
      key: key.clone(),
      value: RenderedOutput::new(key.format, data),
      stored_at: UNIX_EPOCH + Duration::new(meta.stored_at, meta.stored_at_nanos),
    }))
  }

  fn put(&self, key: CacheKey, value: RenderedOutput) -> Result<CacheEntry> {
    let data_path = self.data_path(&key);
    let meta_path = meta_path_for(&data_path);
    if let Some(parent) = data_path.parent() {
      fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
    }

    let stored_at = SystemTime::now();
    let since_epoch = stored_at.duration_since(UNIX_EPOCH).unwrap_or_default();
    let meta = StoredMetadata {
      widget_id: key.widget_id.clone(),
      version: key.version.clone(),
      theme: key.theme,
      format: key.format,
      content_type: value.content_type.to_string(),
      len: value.len(),
      stored_at: since_epoch.as_secs(),
      stored_at_nanos: since_epoch.subsec_nanos(),
    };
    let meta_bytes = serde_json::to_vec(&meta).map_err(|err| StoreError::Corrupt {
      path: meta_path.display().to_string(),
      reason: err.to_string(),
    })?;

    write_atomic(&data_path, &value.bytes)?;
    write_atomic(&meta_path, &meta_bytes)?;

    Ok(CacheEntry {
      key,
      value,
      stored_at,
    })
  }

  fn invalidate(&self, widget_id: &str) -> Result<usize> {
    let dir = self.widget_dir(widget_id);
    let removed = self.remove_dir(&dir)?;
    log::debug!("invalidated {removed} stored renders of {widget_id}");
    Ok(removed)
  }

  fn supersede(&self, widget_id: &str, current_version: &str) -> Result<usize> {
    let dir = self.widget_dir(widget_id);
    let current = escape_component(current_version);
    let versions = match fs::read_dir(&dir) {
      Ok(entries) => entries,
      Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
      Err(source) => return Err(io_error(&dir, source).into()),
    };

    let mut removed = 0;
    for entry in versions {
      let entry = entry.map_err(|source| io_error(&dir, source))?;
      if entry.file_name().to_string_lossy() == current {
        continue;
      }
      if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
        removed += self.remove_dir(&entry.path())?;
      }
    }
    Ok(removed)
  }

  fn len(&self) -> Result<usize> {
    let widgets = fs::read_dir(&self.root).map_err(|source| io_error(&self.root, source))?;
    let mut total = 0;
    for widget in widgets {
      let widget = widget.map_err(|source| io_error(&self.root, source))?;
      if widget.file_name().to_string_lossy().starts_with(TRASH_PREFIX) {
        continue;
      }
      if widget.file_type().map(|t| t.is_dir()).unwrap_or(false) {
        total += count_entries(&widget.path())?;
      }
    }
    Ok(total)
  }
}

/// Escapes a key component into a single, reversible path segment.
///
/// ASCII letters, digits, `-` and `_` pass through; every other byte becomes
/// `%XX`. The empty string maps to a bare `%`, which no escaped value can
/// produce.
fn escape_component(value: &str) -> String {
  if value.is_empty() {
    return "%".to_string();
  }
  let mut out = String::with_capacity(value.len());
  for byte in value.bytes() {
    if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
      out.push(byte as char);
    } else {
      out.push_str(&format!("%{byte:02X}"));
    }
  }
  out
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
  let mut name = path.as_os_str().to_owned();
  name.push(suffix);
  PathBuf::from(name)
}

fn meta_path_for(data_path: &Path) -> PathBuf {
  append_suffix(data_path, META_SUFFIX)
}

fn tmp_path(path: &Path) -> PathBuf {
  append_suffix(
    path,
    &format!(
      ".tmp-{}-{}",
      std::process::id(),
      TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ),
  )
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
  let tmp = tmp_path(path);
  if let Err(source) = fs::write(&tmp, bytes) {
    let _ = fs::remove_file(&tmp);
    return Err(io_error(&tmp, source).into());
  }
  if let Err(source) = fs::rename(&tmp, path) {
    let _ = fs::remove_file(&tmp);
    return Err(io_error(path, source).into());
  }
  Ok(())
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
  match fs::read(path) {
    Ok(bytes) => Ok(Some(bytes)),
    Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
    Err(source) => Err(io_error(path, source).into()),
  }
}

/// Counts metadata sidecars below `dir`.
fn count_entries(dir: &Path) -> Result<usize> {
  let entries = match fs::read_dir(dir) {
    Ok(entries) => entries,
    Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
    Err(source) => return Err(io_error(dir, source).into()),
  };
  let mut total = 0;
  for entry in entries {
    let entry = entry.map_err(|source| io_error(dir, source))?;
    let file_type = entry.file_type().map_err(|source| io_error(&entry.path(), source))?;
    if file_type.is_dir() {
      total += count_entries(&entry.path())?;
    } else if entry.file_name().to_string_lossy().ends_with(META_SUFFIX) {
      total += 1;
    }
  }
  Ok(total)
}

fn io_error(path: &Path, source: io::Error) -> StoreError {
  StoreError::Io {
    path: path.display().to_string(),
    source,
  }
}
