//! Core geometry types for layout and painting
//!
//! This module provides the geometric primitives shared by the layout builder,
//! the vector compositor and the rasterizer. All units are canvas pixels of the
//! widget's declared size.
//!
//! # Coordinate System
//!
//! The origin is the top-left corner of the card:
//! - Positive X extends to the right
//! - Positive Y extends downward
//!
//! Angles follow the same convention, so a positive sweep runs clockwise on
//! screen and `-90°` points at the top of a circle.

use std::f32::consts::FRAC_PI_2;
use std::fmt;

/// A 2D point in canvas space
///
/// # Examples
///
/// ```
/// use progress_card::Point;
///
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::ZERO;
///
/// assert_eq!(p1.x, 10.0);
/// assert_eq!(p2, Point::new(0.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
  /// X coordinate (increases to the right)
  pub x: f32,
  /// Y coordinate (increases downward)
  pub y: f32,
}

impl Point {
  /// The zero point at the origin (0, 0)
  pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

  /// Creates a new point at the given coordinates
  pub const fn new(x: f32, y: f32) -> Self {
    Self { x, y }
  }

  /// Translates this point by another point's coordinates
  ///
  /// # Examples
  ///
  /// ```
  /// use progress_card::Point;
  ///
  /// let result = Point::new(10.0, 20.0).translate(Point::new(5.0, 3.0));
  /// assert_eq!(result, Point::new(15.0, 23.0));
  /// ```
  pub fn translate(self, other: Point) -> Self {
    Self {
      x: self.x + other.x,
      y: self.y + other.y,
    }
  }

  /// Returns true if both coordinates are finite
  pub fn is_finite(self) -> bool {
    self.x.is_finite() && self.y.is_finite()
  }
}

impl fmt::Display for Point {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({}, {})", self.x, self.y)
  }
}

/// A 2D size in canvas pixels
///
/// # Examples
///
/// ```
/// use progress_card::Size;
///
/// let size = Size::new(100.0, 50.0);
/// assert_eq!(size.area(), 5000.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
  /// Width (horizontal extent)
  pub width: f32,
  /// Height (vertical extent)
  pub height: f32,
}

impl Size {
  /// A zero size (0 × 0)
  pub const ZERO: Self = Self {
    width: 0.0,
    height: 0.0,
  };

  /// Creates a new size
  pub const fn new(width: f32, height: f32) -> Self {
    Self { width, height }
  }

  /// Returns the area (width × height)
  pub fn area(self) -> f32 {
    self.width * self.height
  }

  /// Returns true if either dimension is zero or negative
  pub fn is_empty(self) -> bool {
    self.width <= 0.0 || self.height <= 0.0
  }

  /// Scales both dimensions by a factor
  pub fn scale(self, factor: f32) -> Self {
    Self {
      width: self.width * factor,
      height: self.height * factor,
    }
  }
}

impl fmt::Display for Size {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}x{}", self.width, self.height)
  }
}

/// An axis-aligned rectangle
///
/// Defined by its top-left origin and its size.
///
/// # Examples
///
/// ```
/// use progress_card::Rect;
///
/// let rect = Rect::from_xywh(10.0, 20.0, 100.0, 50.0);
/// assert_eq!(rect.max_x(), 110.0);
/// assert_eq!(rect.max_y(), 70.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
  /// The top-left corner of the rectangle
  pub origin: Point,
  /// The size (width and height) of the rectangle
  pub size: Size,
}

impl Rect {
  /// A zero-sized rectangle at the origin
  pub const ZERO: Self = Self {
    origin: Point::ZERO,
    size: Size::ZERO,
  };

  /// Creates a new rectangle from an origin point and size
  pub const fn new(origin: Point, size: Size) -> Self {
    Self { origin, size }
  }

  /// Creates a rectangle from x, y, width, height components
  pub const fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
    Self {
      origin: Point::new(x, y),
      size: Size::new(width, height),
    }
  }

  pub fn x(self) -> f32 {
    self.origin.x
  }

  pub fn y(self) -> f32 {
    self.origin.y
  }

  pub fn width(self) -> f32 {
    self.size.width
  }

  pub fn height(self) -> f32 {
    self.size.height
  }

  pub fn min_x(self) -> f32 {
    self.origin.x
  }

  pub fn max_x(self) -> f32 {
    self.origin.x + self.size.width
  }

  pub fn min_y(self) -> f32 {
    self.origin.y
  }

  pub fn max_y(self) -> f32 {
    self.origin.y + self.size.height
  }

  /// Returns the center point of the rectangle
  pub fn center(self) -> Point {
    Point::new(
      self.origin.x + self.size.width / 2.0,
      self.origin.y + self.size.height / 2.0,
    )
  }

  /// Checks if this rectangle fully contains another (edges inclusive)
  pub fn contains_rect(self, other: Rect) -> bool {
    other.min_x() >= self.min_x()
      && other.min_y() >= self.min_y()
      && other.max_x() <= self.max_x()
      && other.max_y() <= self.max_y()
  }

  /// Shrinks the rectangle by the given edge offsets
  ///
  /// # Examples
  ///
  /// ```
  /// use progress_card::geometry::{EdgeOffsets, Rect};
  ///
  /// let inner = Rect::from_xywh(0.0, 0.0, 100.0, 50.0).inset(EdgeOffsets::all(10.0));
  /// assert_eq!(inner, Rect::from_xywh(10.0, 10.0, 80.0, 30.0));
  /// ```
  pub fn inset(self, edges: EdgeOffsets) -> Rect {
    Rect::from_xywh(
      self.origin.x + edges.left,
      self.origin.y + edges.top,
      (self.size.width - edges.horizontal()).max(0.0),
      (self.size.height - edges.vertical()).max(0.0),
    )
  }

  /// Returns true if every component is finite
  pub fn is_finite(self) -> bool {
    self.origin.is_finite() && self.size.width.is_finite() && self.size.height.is_finite()
  }
}

impl fmt::Display for Rect {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Rect({}, {})", self.origin, self.size)
  }
}

/// Edge offsets on all four sides, used for card padding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeOffsets {
  pub top: f32,
  pub right: f32,
  pub bottom: f32,
  pub left: f32,
}

impl EdgeOffsets {
  pub const ZERO: Self = Self::all(0.0);

  /// Same offset on every edge
  pub const fn all(value: f32) -> Self {
    Self {
      top: value,
      right: value,
      bottom: value,
      left: value,
    }
  }

  /// Total horizontal offset (left + right)
  pub fn horizontal(self) -> f32 {
    self.left + self.right
  }

  /// Total vertical offset (top + bottom)
  pub fn vertical(self) -> f32 {
    self.top + self.bottom
  }
}

/// One cubic Bézier segment of a flattened arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicSegment {
  pub from: Point,
  pub ctrl1: Point,
  pub ctrl2: Point,
  pub to: Point,
}

/// Angle (radians) where progress arcs start: the top of the circle.
pub const ARC_START_ANGLE: f32 = -FRAC_PI_2;

/// Approximates a circular arc with cubic Béziers of at most 90° each.
///
/// `start` and `sweep` are radians; a positive sweep runs clockwise in the
/// y-down canvas space. Both the SVG writer and the rasterizer draw arcs from
/// these segments, so the two outputs share one geometry.
pub fn arc_segments(center: Point, radius: f32, start: f32, sweep: f32) -> Vec<CubicSegment> {
  if radius <= 0.0 || sweep == 0.0 || !sweep.is_finite() {
    return Vec::new();
  }

  let count = (sweep.abs() / FRAC_PI_2).ceil().max(1.0) as usize;
  let step = sweep / count as f32;
  let k = 4.0 / 3.0 * (step / 4.0).tan();
  let point_at = |angle: f32| {
    Point::new(
      center.x + radius * angle.cos(),
      center.y + radius * angle.sin(),
    )
  };

  (0..count)
    .map(|i| {
      let a0 = start + step * i as f32;
      let a1 = a0 + step;
      let from = point_at(a0);
      let to = point_at(a1);
      CubicSegment {
        from,
        ctrl1: Point::new(from.x - k * radius * a0.sin(), from.y + k * radius * a0.cos()),
        ctrl2: Point::new(to.x + k * radius * a1.sin(), to.y - k * radius * a1.cos()),
        to,
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_point_translate() {
    let result = Point::new(10.0, 20.0).translate(Point::new(5.0, 3.0));
    assert_eq!(result, Point::new(15.0, 23.0));
  }

  #[test]
  fn test_size_is_empty() {
    assert!(Size::ZERO.is_empty());
    assert!(Size::new(0.0, 10.0).is_empty());
    assert!(!Size::new(10.0, 10.0).is_empty());
  }

  #[test]
  fn test_rect_edges_and_center() {
    let rect = Rect::from_xywh(10.0, 20.0, 100.0, 50.0);
    assert_eq!(rect.max_x(), 110.0);
    assert_eq!(rect.max_y(), 70.0);
    assert_eq!(rect.center(), Point::new(60.0, 45.0));
  }

  #[test]
  fn test_rect_inset_never_negative() {
    let rect = Rect::from_xywh(0.0, 0.0, 10.0, 10.0).inset(EdgeOffsets::all(8.0));
    assert_eq!(rect.width(), 0.0);
    assert_eq!(rect.height(), 0.0);
  }

  #[test]
  fn test_rect_contains_rect() {
    let outer = Rect::from_xywh(0.0, 0.0, 100.0, 100.0);
    assert!(outer.contains_rect(Rect::from_xywh(10.0, 10.0, 90.0, 90.0)));
    assert!(!outer.contains_rect(Rect::from_xywh(10.0, 10.0, 91.0, 10.0)));
  }

  #[test]
  fn arc_segments_split_per_quadrant() {
    let center = Point::new(50.0, 50.0);
    assert!(arc_segments(center, 10.0, ARC_START_ANGLE, 0.0).is_empty());
    assert_eq!(arc_segments(center, 10.0, ARC_START_ANGLE, 1.0).len(), 1);
    let full = arc_segments(center, 10.0, ARC_START_ANGLE, std::f32::consts::TAU);
    assert_eq!(full.len(), 4);
  }

  #[test]
  fn arc_starts_at_top_and_runs_clockwise() {
    let center = Point::new(50.0, 50.0);
    let quarter = arc_segments(center, 10.0, ARC_START_ANGLE, FRAC_PI_2);
    let first = quarter[0];
    assert!((first.from.x - 50.0).abs() < 1e-4);
    assert!((first.from.y - 40.0).abs() < 1e-4);
    // Clockwise from the top ends at the right-hand side.
    assert!((first.to.x - 60.0).abs() < 1e-4);
    assert!((first.to.y - 50.0).abs() < 1e-4);
  }

  #[test]
  fn arc_segments_are_continuous() {
    let segments = arc_segments(Point::new(0.0, 0.0), 5.0, ARC_START_ANGLE, 5.0);
    for pair in segments.windows(2) {
      assert!((pair[0].to.x - pair[1].from.x).abs() < 1e-4);
      assert!((pair[0].to.y - pair[1].from.y).abs() < 1e-4);
    }
  }
}
