pub mod cache;
pub mod config;
pub mod error;
pub mod geometry;
pub mod image_compare;
pub mod layout;
pub mod raster;
pub mod renderer;
pub mod svg;
pub mod text;
pub mod theme;
pub mod vector;

pub use cache::{CacheKey, OutputFormat, RenderStore, RenderedOutput, IMMUTABLE_CACHE_CONTROL};
pub use config::RenderConfig;
pub use error::{Error, ErrorClass, Result};
pub use geometry::{EdgeOffsets, Point, Rect, Size};
pub use renderer::{CardRenderer, RenderRequest, WidgetSource, WidgetTable};
pub use theme::{Rgba, Theme};
