//! Normalized bounding-box text format and export plumbing.
//!
//! Detections are written one per line as
//! `<class_id> <center_x> <center_y> <width> <height>` with the four floats
//! normalized to `[0, 1]` by the image dimensions.
//!
//! ## Usage
//!
//! ```rust
//! use detmark::format::{decode, encode};
//! use detmark::model::{BoundingBox, Detection};
//!
//! let bbox = BoundingBox::from_corners(100.0, 100.0, 300.0, 200.0)?;
//! let det = Detection::new(1, bbox, 0, "person", 0.9);
//! let line = encode(&det, 800.0, 600.0)?;
//! assert_eq!(line, "0 0.250000 0.250000 0.250000 0.166667");
//!
//! let record = decode(&line, 800.0, 600.0)?;
//! assert!((record.bbox.x2() - 300.0).abs() < 1e-3);
//! # Ok::<(), detmark::AnnotationError>(())
//! ```

mod export;
mod yolo;

#[cfg(test)]
mod tests;

pub use export::{DirectorySink, ExportPayload, ExportSink, MemorySink, export_filename};
pub use yolo::{DecodedRecord, decode, decode_all, encode, encode_all, encode_corners};
