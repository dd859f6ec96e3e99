//! Natural-to-display coordinate mathematics.
//!
//! Detections are stored in natural image pixels. The image is shown at
//! whatever size the viewport allows, so points are scaled into display
//! space at render time and back into natural space at input capture.
//! Nothing here mutates stored data; resizing the viewport only changes the
//! transform.

use crate::error::{AnnotationError, Result};
use crate::model::{BoundingBox, ImageSize, Point};

/// Scale a natural-space point into display space.
///
/// Refuses to run until both sizes are known, and rejects non-finite points.
pub fn to_display(point: Point, natural: ImageSize, display: ImageSize) -> Result<Point> {
    ViewTransform::new(natural, display)?.checked_to_display(point)
}

/// Scale a display-space point back into natural space.
///
/// Refuses to run until both sizes are known, and rejects non-finite points.
pub fn to_natural(point: Point, natural: ImageSize, display: ImageSize) -> Result<Point> {
    ViewTransform::new(natural, display)?.checked_to_natural(point)
}

fn finite_point(point: Point) -> Result<Point> {
    if point.is_finite() {
        Ok(point)
    } else {
        Err(AnnotationError::validation(format!(
            "point ({}, {}) is not finite",
            point.x, point.y
        )))
    }
}

/// Validated pair of natural and display sizes.
///
/// Holding one proves the image has loaded, so the conversions themselves
/// cannot fail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    natural: ImageSize,
    display: ImageSize,
}

impl ViewTransform {
    /// Create a transform, failing with [`AnnotationError::ImageNotLoaded`]
    /// if either size is zero or unknown.
    pub fn new(natural: ImageSize, display: ImageSize) -> Result<Self> {
        if !natural.is_known() || !display.is_known() {
            return Err(AnnotationError::ImageNotLoaded);
        }
        Ok(Self { natural, display })
    }

    /// Identity transform for an image shown at its natural size.
    pub fn identity(natural: ImageSize) -> Result<Self> {
        Self::new(natural, natural)
    }

    pub fn natural(&self) -> ImageSize {
        self.natural
    }

    pub fn display(&self) -> ImageSize {
        self.display
    }

    /// Horizontal display pixels per natural pixel.
    pub fn scale_x(&self) -> f64 {
        self.display.width / self.natural.width
    }

    /// Vertical display pixels per natural pixel.
    pub fn scale_y(&self) -> f64 {
        self.display.height / self.natural.height
    }

    pub fn to_display(&self, point: Point) -> Point {
        Point::new(point.x * self.scale_x(), point.y * self.scale_y())
    }

    pub fn to_natural(&self, point: Point) -> Point {
        Point::new(point.x / self.scale_x(), point.y / self.scale_y())
    }

    /// [`Self::to_display`] for untrusted input.
    pub fn checked_to_display(&self, point: Point) -> Result<Point> {
        finite_point(point).map(|p| self.to_display(p))
    }

    /// [`Self::to_natural`] for untrusted input such as pointer positions.
    pub fn checked_to_natural(&self, point: Point) -> Result<Point> {
        finite_point(point).map(|p| self.to_natural(p))
    }

    /// Display-space rectangle `(x, y, width, height)` of a stored box.
    pub fn bbox_to_display(&self, bbox: &BoundingBox) -> DisplayRect {
        let tl = self.to_display(bbox.top_left());
        let br = self.to_display(bbox.bottom_right());
        DisplayRect {
            x: tl.x,
            y: tl.y,
            width: br.x - tl.x,
            height: br.y - tl.y,
        }
    }
}

/// Axis-aligned rectangle in display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DisplayRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}
