//! Vector output
//!
//! - `document` - typed document model and deterministic SVG writer
//! - `compositor` - block tree to document, with theme colours applied

pub mod compositor;
pub mod document;

pub use compositor::compose;
pub use document::{GlyphRun, Primitive, StrokeCap, StrokedArc, SvgLength, VectorDocument, ViewBox};
