//! Detection records and their untrusted raw counterparts.

use serde::{Deserialize, Serialize};

use super::geometry::{BoundingBox, ImageSize, Point, RawBoundingBox};
use crate::error::{AnnotationError, ensure_finite};

/// Unique identifier for a detection within a session.
pub type DetectionId = u64;

/// Semantic object category index.
pub type ClassId = u32;

/// Segmentation outline attached to a detection.
///
/// Always present on a [`Detection`]; "no mask" is an empty polygon with
/// `mask_available == false`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Segmentation {
    /// Outline vertices in natural pixel units, in order.
    pub polygon: Vec<Point>,
    /// Whether the detector produced a mask for this record.
    pub mask_available: bool,
}

impl Segmentation {
    /// A segmentation with no mask.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a segmentation from an outline. An empty outline means no mask.
    pub fn from_polygon(polygon: Vec<Point>) -> Self {
        let mask_available = !polygon.is_empty();
        Self {
            polygon,
            mask_available,
        }
    }

    /// Clamp every vertex into the image bounds.
    pub fn clamped(&self, size: ImageSize) -> Self {
        Self {
            polygon: self.polygon.iter().map(|p| p.clamped(size)).collect(),
            mask_available: self.mask_available,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), AnnotationError> {
        match self.polygon.iter().position(|p| !p.is_finite()) {
            Some(idx) => Err(AnnotationError::validation(format!(
                "segmentation vertex {idx} is not finite"
            ))),
            None => Ok(()),
        }
    }
}

/// One object-instance record owned by the detection store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Unique identifier, never reused within a session.
    pub id: DetectionId,
    /// Category index.
    pub class_id: ClassId,
    /// Display label, editable independently of `class_id`.
    pub class_name: String,
    /// Detector confidence, normally in `[0, 1]`.
    pub confidence: f64,
    /// Box in natural pixel units.
    pub bbox: BoundingBox,
    /// Segmentation outline (possibly empty).
    pub segmentation: Segmentation,
}

impl Detection {
    /// Create a detection with an empty segmentation.
    pub fn new(
        id: DetectionId,
        bbox: BoundingBox,
        class_id: ClassId,
        class_name: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            id,
            class_id,
            class_name: class_name.into(),
            confidence,
            bbox,
            segmentation: Segmentation::empty(),
        }
    }

    /// Attach a segmentation outline.
    pub fn with_segmentation(mut self, segmentation: Segmentation) -> Self {
        self.segmentation = segmentation;
        self
    }

    /// Label shown next to the box, e.g. `"person 87%"`.
    pub fn label(&self) -> String {
        format!("{} {:.0}%", self.class_name, self.confidence * 100.0)
    }

    /// Clamp the box and outline into the image bounds.
    pub(crate) fn clamp_to(&mut self, size: ImageSize) {
        self.bbox = self.bbox.clamped(size);
        self.segmentation = self.segmentation.clamped(size);
    }
}

/// Partial update for a stored detection. Unset fields keep their value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionPatch {
    pub class_id: Option<ClassId>,
    pub class_name: Option<String>,
    pub confidence: Option<f64>,
    pub bbox: Option<BoundingBox>,
    pub segmentation: Option<Segmentation>,
}

impl DetectionPatch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch replacing every mutable field with the values of `detection`.
    pub fn replace_with(detection: &Detection) -> Self {
        Self {
            class_id: Some(detection.class_id),
            class_name: Some(detection.class_name.clone()),
            confidence: Some(detection.confidence),
            bbox: Some(detection.bbox),
            segmentation: Some(detection.segmentation.clone()),
        }
    }

    pub fn class_id(mut self, class_id: ClassId) -> Self {
        self.class_id = Some(class_id);
        self
    }

    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn segmentation(mut self, segmentation: Segmentation) -> Self {
        self.segmentation = Some(segmentation);
        self
    }

    /// Check if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.class_id.is_none()
            && self.class_name.is_none()
            && self.confidence.is_none()
            && self.bbox.is_none()
            && self.segmentation.is_none()
    }
}

/// Segmentation as the detector service sends it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawSegmentation {
    /// Outline as `[x, y]` pairs.
    #[serde(default)]
    pub polygon: Option<Vec<[f64; 2]>>,
    #[serde(default)]
    pub mask_available: Option<bool>,
}

/// Detection as the detector service sends it. Untrusted: any of `id`,
/// bbox extent and segmentation may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DetectionId>,
    pub class_id: ClassId,
    #[serde(default)]
    pub class_name: String,
    pub confidence: f64,
    pub bbox: RawBoundingBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmentation: Option<RawSegmentation>,
}

impl RawDetection {
    /// Create a raw detection without an ID or segmentation.
    pub fn new(
        class_id: ClassId,
        class_name: impl Into<String>,
        confidence: f64,
        bbox: RawBoundingBox,
    ) -> Self {
        Self {
            id: None,
            class_id,
            class_name: class_name.into(),
            confidence,
            bbox,
            segmentation: None,
        }
    }

    /// Set a detector-assigned ID.
    pub fn with_id(mut self, id: DetectionId) -> Self {
        self.id = Some(id);
        self
    }

    /// Attach a raw segmentation.
    pub fn with_segmentation(mut self, segmentation: RawSegmentation) -> Self {
        self.segmentation = Some(segmentation);
        self
    }

    /// Build a store-owned detection under `id`.
    ///
    /// Fills the segmentation, reorders corners and recomputes the extent.
    /// Clamping to the image is left to the store, which knows the size.
    pub fn normalize(&self, id: DetectionId) -> Result<Detection, AnnotationError> {
        let bbox = BoundingBox::try_from(self.bbox)?;
        let confidence = ensure_finite("confidence", self.confidence)?;

        let segmentation = match &self.segmentation {
            None => Segmentation::empty(),
            Some(raw) => {
                let polygon: Vec<Point> = raw
                    .polygon
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .map(|[x, y]| Point::new(*x, *y))
                    .collect();
                let mask_available = raw.mask_available.unwrap_or(!polygon.is_empty());
                Segmentation {
                    polygon,
                    mask_available,
                }
            }
        };
        segmentation.validate()?;

        Ok(Detection {
            id,
            class_id: self.class_id,
            class_name: self.class_name.clone(),
            confidence,
            bbox,
            segmentation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_fills_segmentation() {
        let raw = RawDetection::new(3, "dog", 0.8, RawBoundingBox::new(10.0, 20.0, 30.0, 60.0));
        let det = raw.normalize(7).unwrap();
        assert_eq!(det.id, 7);
        assert_eq!(det.segmentation, Segmentation::empty());
        assert_eq!(det.bbox.width(), 20.0);
        assert_eq!(det.bbox.height(), 40.0);
    }

    #[test]
    fn test_normalize_polygon_pairs() {
        let raw = RawDetection::new(0, "cat", 0.9, RawBoundingBox::new(0.0, 0.0, 10.0, 10.0))
            .with_segmentation(RawSegmentation {
                polygon: Some(vec![[1.0, 2.0], [3.0, 4.0], [5.0, 1.0]]),
                mask_available: None,
            });
        let det = raw.normalize(1).unwrap();
        assert!(det.segmentation.mask_available);
        assert_eq!(det.segmentation.polygon[1], Point::new(3.0, 4.0));
    }

    #[test]
    fn test_normalize_missing_polygon() {
        let raw = RawDetection::new(0, "cat", 0.9, RawBoundingBox::new(0.0, 0.0, 10.0, 10.0))
            .with_segmentation(RawSegmentation {
                polygon: None,
                mask_available: Some(false),
            });
        let det = raw.normalize(1).unwrap();
        assert!(det.segmentation.polygon.is_empty());
        assert!(!det.segmentation.mask_available);
    }

    #[test]
    fn test_normalize_rejects_non_finite_confidence() {
        let raw = RawDetection::new(0, "cat", f64::NAN, RawBoundingBox::new(0.0, 0.0, 1.0, 1.0));
        assert!(raw.normalize(1).unwrap_err().is_validation());
    }

    #[test]
    fn test_raw_detection_from_detector_json() {
        let json = r#"{
            "id": 0,
            "class_id": 2,
            "class_name": "car",
            "confidence": 0.91,
            "bbox": {"x1": 10.5, "y1": 20.0, "x2": 110.5, "y2": 80.0}
        }"#;
        let raw: RawDetection = serde_json::from_str(json).unwrap();
        assert_eq!(raw.id, Some(0));
        assert_eq!(raw.bbox.width, None);
        assert!(raw.segmentation.is_none());
    }

    #[test]
    fn test_patch_builder() {
        let patch = DetectionPatch::new().class_name("truck").confidence(0.4);
        assert!(!patch.is_empty());
        assert_eq!(patch.class_name.as_deref(), Some("truck"));
        assert!(patch.bbox.is_none());
        assert!(DetectionPatch::new().is_empty());
    }

    #[test]
    fn test_label() {
        let bbox = BoundingBox::from_corners(0.0, 0.0, 1.0, 1.0).unwrap();
        let det = Detection::new(1, bbox, 0, "person", 0.874);
        assert_eq!(det.label(), "person 87%");
    }
}
