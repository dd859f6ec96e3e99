//! Global constants for the detection annotation engine

use crate::model::{ClassId, DetectionId};

/// First ID handed out by a fresh store; keeps locally created records clear
/// of the small IDs the detector service assigns.
pub const DEFAULT_ID_OFFSET: DetectionId = 1000;

/// Minimum drag extent (natural pixels, per axis) for a drawn box to be kept
pub const DEFAULT_MIN_DRAW_SIZE: f64 = 10.0;

/// Class assigned to interactively drawn detections
pub const DRAW_CLASS_ID: ClassId = 0;

/// Label assigned to interactively drawn detections
pub const DRAW_CLASS_NAME: &str = "object";

/// Confidence assigned to interactively drawn detections
pub const DRAW_CONFIDENCE: f64 = 0.5;

/// Confidence assigned to records imported from normalized text
pub const IMPORT_CONFIDENCE: f64 = 1.0;

/// Decimal digits written per normalized field
pub const EXPORT_DECIMALS: usize = 6;

/// Number of tokens in one normalized text record
pub const RECORD_FIELDS: usize = 5;

/// Extension given to exported annotation files
pub const EXPORT_EXTENSION: &str = "txt";

/// Entries in the generated default palette
pub const DEFAULT_PALETTE_SIZE: usize = 12;
