//! Geometry primitives in natural image pixel space.

use serde::{Deserialize, Serialize};

use crate::error::{AnnotationError, ensure_finite};

/// A 2D point. Whether it lives in natural or display space depends on the
/// caller; everything stored on a detection is natural space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Clamp the point into `[0, width] x [0, height]`.
    pub fn clamped(&self, size: ImageSize) -> Self {
        Self::new(self.x.clamp(0.0, size.width), self.y.clamp(0.0, size.height))
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Pixel dimensions of an image, natural or as displayed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

impl ImageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both dimensions are finite and strictly positive.
    ///
    /// A zero size is what the display surface reports before the image has
    /// loaded, so this doubles as the "image is ready" check.
    pub fn is_known(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// An axis-aligned bounding box in natural pixel units.
///
/// Always satisfies `x1 <= x2`, `y1 <= y2`, `width == x2 - x1` and
/// `height == y2 - y1`; the fields are private so the only way in is through
/// [`BoundingBox::from_corners`] (or deserialization, which goes through the
/// same path).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBoundingBox")]
pub struct BoundingBox {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    width: f64,
    height: f64,
}

impl BoundingBox {
    /// Create a normalized bounding box from two corner points.
    ///
    /// Corners may be given in any order. Fails if any coordinate is not a
    /// finite number.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, AnnotationError> {
        let x1 = ensure_finite("x1", x1)?;
        let y1 = ensure_finite("y1", y1)?;
        let x2 = ensure_finite("x2", x2)?;
        let y2 = ensure_finite("y2", y2)?;
        Ok(Self::normalized(x1, y1, x2, y2))
    }

    /// Create a bounding box spanning two points.
    pub fn from_points(a: Point, b: Point) -> Result<Self, AnnotationError> {
        Self::from_corners(a.x, a.y, b.x, b.y)
    }

    // Callers guarantee finite input.
    fn normalized(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let (x1, x2) = (x1.min(x2), x1.max(x2));
        let (y1, y2) = (y1.min(y2), y1.max(y2));
        Self {
            x1,
            y1,
            x2,
            y2,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    pub fn x1(&self) -> f64 {
        self.x1
    }

    pub fn y1(&self) -> f64 {
        self.y1
    }

    pub fn x2(&self) -> f64 {
        self.x2
    }

    pub fn y2(&self) -> f64 {
        self.y2
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Get the top-left corner.
    pub fn top_left(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    /// Get the bottom-right corner.
    pub fn bottom_right(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    /// Check if a point is inside the box (edges included).
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x1 && point.x <= self.x2 && point.y >= self.y1 && point.y <= self.y2
    }

    /// Clamp both corners into `[0, width] x [0, height]`.
    pub fn clamped(&self, size: ImageSize) -> Self {
        let tl = self.top_left().clamped(size);
        let br = self.bottom_right().clamped(size);
        Self::normalized(tl.x, tl.y, br.x, br.y)
    }
}

/// Bounding box as it arrives from outside: corners in any order, with
/// `width`/`height` optional and never trusted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawBoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl RawBoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            width: None,
            height: None,
        }
    }

    /// Corners were given out of order on at least one axis.
    pub fn is_inverted(&self) -> bool {
        self.x1 > self.x2 || self.y1 > self.y2
    }

    /// A supplied width/height disagrees with the corners.
    pub fn has_stale_extent(&self) -> bool {
        const TOLERANCE: f64 = 1e-6;
        let stale = |given: Option<f64>, a: f64, b: f64| {
            given.is_some_and(|g| (g - (b - a).abs()).abs() > TOLERANCE)
        };
        stale(self.width, self.x1, self.x2) || stale(self.height, self.y1, self.y2)
    }
}

impl TryFrom<RawBoundingBox> for BoundingBox {
    type Error = AnnotationError;

    fn try_from(raw: RawBoundingBox) -> Result<Self, Self::Error> {
        Self::from_corners(raw.x1, raw.y1, raw.x2, raw.y2)
    }
}

impl From<BoundingBox> for RawBoundingBox {
    fn from(bbox: BoundingBox) -> Self {
        Self {
            x1: bbox.x1,
            y1: bbox.y1,
            x2: bbox.x2,
            y2: bbox.y2,
            width: Some(bbox.width),
            height: Some(bbox.height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_normalizes_order() {
        let bbox = BoundingBox::from_corners(300.0, 200.0, 100.0, 100.0).unwrap();
        assert_eq!(bbox.x1(), 100.0);
        assert_eq!(bbox.y1(), 100.0);
        assert_eq!(bbox.x2(), 300.0);
        assert_eq!(bbox.y2(), 200.0);
        assert_eq!(bbox.width(), 200.0);
        assert_eq!(bbox.height(), 100.0);
    }

    #[test]
    fn test_from_corners_rejects_non_finite() {
        let err = BoundingBox::from_corners(f64::NAN, 0.0, 10.0, 10.0).unwrap_err();
        assert!(err.is_validation());
        assert!(BoundingBox::from_corners(0.0, 0.0, f64::INFINITY, 10.0).is_err());
    }

    #[test]
    fn test_clamped() {
        let size = ImageSize::new(800.0, 600.0);
        let bbox = BoundingBox::from_corners(-20.0, 50.0, 900.0, 700.0).unwrap();
        let clamped = bbox.clamped(size);
        assert_eq!(clamped.x1(), 0.0);
        assert_eq!(clamped.y1(), 50.0);
        assert_eq!(clamped.x2(), 800.0);
        assert_eq!(clamped.y2(), 600.0);
        assert_eq!(clamped.width(), 800.0);
        assert_eq!(clamped.height(), 550.0);
    }

    #[test]
    fn test_contains() {
        let bbox = BoundingBox::from_corners(10.0, 10.0, 20.0, 30.0).unwrap();
        assert!(bbox.contains(Point::new(15.0, 15.0)));
        assert!(bbox.contains(Point::new(10.0, 30.0)));
        assert!(!bbox.contains(Point::new(21.0, 15.0)));
    }

    #[test]
    fn test_image_size_is_known() {
        assert!(ImageSize::new(800.0, 600.0).is_known());
        assert!(!ImageSize::new(0.0, 600.0).is_known());
        assert!(!ImageSize::default().is_known());
        assert!(!ImageSize::new(f64::NAN, 600.0).is_known());
    }

    #[test]
    fn test_deserialize_recomputes_extent() {
        let json = r#"{"x1": 30, "y1": 40, "x2": 10, "y2": 20, "width": 999, "height": 1}"#;
        let bbox: BoundingBox = serde_json::from_str(json).unwrap();
        assert_eq!(bbox.x1(), 10.0);
        assert_eq!(bbox.width(), 20.0);
        assert_eq!(bbox.height(), 20.0);
    }

    #[test]
    fn test_raw_stale_extent() {
        let mut raw = RawBoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(!raw.has_stale_extent());
        raw.width = Some(10.0);
        assert!(!raw.has_stale_extent());
        raw.height = Some(3.0);
        assert!(raw.has_stale_extent());
        assert!(!raw.is_inverted());
    }
}
