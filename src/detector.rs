//! Detector service response model.
//!
//! The detector is an external collaborator; this is only the shape of what
//! it returns for one image. Everything in it is treated as untrusted and
//! normalized by the store on ingestion.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::RawDetection;

/// One detection request's result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectorResponse {
    /// Path of the image the detector ran on.
    #[serde(default)]
    pub image_path: String,
    /// Rendered preview produced by the detector, if saved.
    #[serde(default)]
    pub annotated_path: Option<String>,
    /// Raw detections, in detector order.
    #[serde(default)]
    pub detections: Vec<RawDetection>,
    /// Count reported by the detector.
    #[serde(default)]
    pub num_detections: Option<usize>,
    /// Model identifier.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub confidence_threshold: Option<f64>,
    #[serde(default)]
    pub iou_threshold: Option<f64>,
}

impl DetectorResponse {
    /// Parse a response from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let response: Self = serde_json::from_str(json)?;
        let sent = response.detections.len();
        if let Some(reported) = response.num_detections.filter(|&n| n != sent) {
            log::warn!(
                "Detector reported {} detections but sent {}",
                reported,
                sent
            );
        }
        log::debug!(
            "Parsed detector response for {:?} ({} detections, model {:?})",
            response.image_path,
            response.detections.len(),
            response.model
        );
        Ok(response)
    }

    /// Read and parse a response file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// File name of the source image (final path component), if any.
    pub fn image_name(&self) -> Option<&str> {
        Path::new(&self.image_path)
            .file_name()
            .and_then(|n| n.to_str())
    }
}
