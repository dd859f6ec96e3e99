//! detmark - interactive detection annotation engine
//!
//! Holds the detections of one image, converts between natural image pixels
//! and on-screen coordinates, drives pointer-based box drawing, single
//! selection and in-place editing, and imports/exports the normalized
//! one-line-per-box text format.
//!
//! The UI layer feeds pointer events and sizes into an [`AnnotationSession`]
//! and draws whatever [`AnnotationSession::render`] returns.

pub mod color;
pub mod config;
pub mod constants;
pub mod detector;
pub mod drawing;
pub mod edit;
pub mod error;
pub mod format;
pub mod model;
pub mod render;
pub mod session;
pub mod store;
pub mod transform;

pub use color::{ColorPair, OpacityTable, Palette, StateStyle, VisualState};
pub use config::{ConfigError, EngineConfig, LogLevel};
pub use detector::DetectorResponse;
pub use drawing::{DrawOutcome, DrawingMachine, DrawingState};
pub use edit::{EditField, EditSession, Selection};
pub use error::{AnnotationError, Result};
pub use format::{DirectorySink, ExportPayload, ExportSink, MemorySink};
pub use model::{
    BoundingBox, ClassId, Detection, DetectionId, DetectionPatch, ImageSize, Point,
    RawBoundingBox, RawDetection, Segmentation,
};
pub use render::{RenderBox, RenderContext};
pub use session::AnnotationSession;
pub use store::DetectionStore;
pub use transform::{DisplayRect, ViewTransform};
