use crate::error::RasterizeError;
use tiny_skia::Pixmap;

const BYTES_PER_PIXEL: u64 = 4;
/// Upper bound on a single pixmap allocation to avoid process aborts on OOM.
pub(crate) const MAX_PIXMAP_BYTES: u64 = 512 * 1024 * 1024;

fn invalid_size(width: u32, height: u32) -> RasterizeError {
  RasterizeError::InvalidTargetSize { width, height }
}

/// Byte size of a `width` x `height` RGBA pixmap, if it is allowed.
pub(crate) fn guard_dimensions(width: u32, height: u32) -> Result<u64, RasterizeError> {
  if width == 0 || height == 0 {
    return Err(invalid_size(width, height));
  }

  let bytes = (width as u64)
    .checked_mul(height as u64)
    .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL))
    .ok_or_else(|| invalid_size(width, height))?;
  if bytes > MAX_PIXMAP_BYTES {
    log::warn!(
      "pixmap {width}x{height} would allocate {bytes} bytes (limit {MAX_PIXMAP_BYTES})"
    );
    return Err(invalid_size(width, height));
  }

  Ok(bytes)
}

/// Allocates a transparent pixmap after checking its size.
pub(crate) fn new_pixmap(width: u32, height: u32) -> Result<Pixmap, RasterizeError> {
  guard_dimensions(width, height)?;
  Pixmap::new(width, height).ok_or_else(|| invalid_size(width, height))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn zero_sized_pixmaps_are_rejected() {
    assert_eq!(
      guard_dimensions(0, 10),
      Err(RasterizeError::InvalidTargetSize {
        width: 0,
        height: 10
      })
    );
    assert!(new_pixmap(10, 0).is_err());
  }

  #[test]
  fn oversized_pixmaps_are_rejected_before_allocating() {
    assert!(guard_dimensions(20_000, 20_000).is_err());
    assert!(guard_dimensions(u32::MAX, u32::MAX).is_err());
  }

  #[test]
  fn small_pixmaps_allocate() {
    assert_eq!(guard_dimensions(800, 240), Ok(800 * 240 * 4));
    let pixmap = new_pixmap(800, 240).unwrap();
    assert_eq!((pixmap.width(), pixmap.height()), (800, 240));
  }
}
