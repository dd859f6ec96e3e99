//! Data models for the detection annotation engine.

mod detection;
mod geometry;

pub use detection::{
    ClassId, Detection, DetectionId, DetectionPatch, RawDetection, RawSegmentation, Segmentation,
};
pub use geometry::{BoundingBox, ImageSize, Point, RawBoundingBox};
