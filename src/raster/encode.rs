use crate::error::{RenderError, Result};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use tiny_skia::Pixmap;

fn encode_failed(reason: impl Into<String>) -> RenderError {
  RenderError::EncodeFailed {
    format: "PNG".to_string(),
    reason: reason.into(),
  }
}

/// Straight-alpha RGBA bytes of a pixmap (tiny-skia stores premultiplied RGBA).
pub fn pixmap_to_rgba(pixmap: &Pixmap) -> Vec<u8> {
  let mut rgba = Vec::with_capacity(pixmap.data().len());
  for pixel in pixmap.pixels() {
    let color = pixel.demultiply();
    rgba.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
  }
  rgba
}

/// Encodes a pixmap as PNG with fixed encoder settings.
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>> {
  let img = RgbaImage::from_raw(pixmap.width(), pixmap.height(), pixmap_to_rgba(pixmap))
    .ok_or_else(|| encode_failed("pixel buffer does not match image size"))?;

  let mut buffer = Vec::new();
  img
    .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
    .map_err(|e| encode_failed(e.to_string()))?;
  Ok(buffer)
}

/// Decodes PNG bytes to straight-alpha RGBA.
pub fn decode_png(bytes: &[u8]) -> Result<RgbaImage> {
  let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)
    .map_err(|e| encode_failed(format!("decode: {e}")))?;
  Ok(decoded.to_rgba8())
}

#[cfg(test)]
mod tests {
  use super::*;
  use tiny_skia::Color;

  #[test]
  fn png_round_trip_keeps_straight_colours() {
    let mut pixmap = Pixmap::new(4, 3).unwrap();
    pixmap.fill(Color::from_rgba8(0x2d, 0xa4, 0x4e, 255));
    let png = encode_png(&pixmap).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

    let decoded = decode_png(&png).unwrap();
    assert_eq!(decoded.dimensions(), (4, 3));
    assert_eq!(decoded.get_pixel(1, 1).0, [0x2d, 0xa4, 0x4e, 255]);
  }

  #[test]
  fn transparent_pixels_stay_transparent() {
    let pixmap = Pixmap::new(2, 2).unwrap();
    let rgba = pixmap_to_rgba(&pixmap);
    assert!(rgba.iter().all(|&b| b == 0));
  }

  #[test]
  fn encoding_is_deterministic() {
    let mut pixmap = Pixmap::new(16, 16).unwrap();
    pixmap.fill(Color::from_rgba8(10, 20, 30, 128));
    assert_eq!(encode_png(&pixmap).unwrap(), encode_png(&pixmap).unwrap());
  }

  #[test]
  fn garbage_does_not_decode() {
    assert!(decode_png(b"not a png").is_err());
  }
}
