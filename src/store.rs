//! Detection storage for a single image.
//!
//! The store is the only writer of canonical detection state. Mutations
//! return the new list so callers can re-render from it directly.

use std::collections::HashSet;

use crate::constants::DEFAULT_ID_OFFSET;
use crate::error::{AnnotationError, Result, ensure_finite};
use crate::model::{
    BoundingBox, ClassId, Detection, DetectionId, DetectionPatch, ImageSize, Point, RawDetection,
};

/// Owns the detections of one annotation session.
///
/// IDs are allocated monotonically and never handed out twice, even after
/// the record that held one has been deleted.
#[derive(Debug, Clone)]
pub struct DetectionStore {
    /// Detections in insertion (render) order.
    detections: Vec<Detection>,
    /// Next ID to hand out. `None` once the ID space is used up.
    next_id: Option<DetectionId>,
    /// Floor for `next_id`.
    id_offset: DetectionId,
    /// Natural image size, once known. Coordinates are clamped to it.
    natural_size: Option<ImageSize>,
}

impl Default for DetectionStore {
    fn default() -> Self {
        Self::new(DEFAULT_ID_OFFSET)
    }
}

impl DetectionStore {
    /// Create an empty store whose first allocated ID is `id_offset`.
    pub fn new(id_offset: DetectionId) -> Self {
        Self {
            detections: Vec::new(),
            next_id: Some(id_offset),
            id_offset,
            natural_size: None,
        }
    }

    /// All detections, in render order.
    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    /// Get a detection by ID.
    pub fn get(&self, id: DetectionId) -> Option<&Detection> {
        self.detections.iter().find(|d| d.id == id)
    }

    /// Check whether a detection with this ID is live.
    pub fn contains(&self, id: DetectionId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// ID the next created detection will receive, or `None` if every ID
    /// has been handed out.
    pub fn next_id(&self) -> Option<DetectionId> {
        self.next_id
    }

    pub fn id_offset(&self) -> DetectionId {
        self.id_offset
    }

    pub fn natural_size(&self) -> Option<ImageSize> {
        self.natural_size
    }

    /// Record the natural image size and clamp every stored detection into
    /// it. An unknown (zero) size disables clamping.
    pub fn set_natural_size(&mut self, size: ImageSize) -> &[Detection] {
        if !size.is_known() {
            self.natural_size = None;
            return &self.detections;
        }

        self.natural_size = Some(size);
        let mut clamped = 0;
        for det in &mut self.detections {
            let before = det.bbox;
            det.clamp_to(size);
            if det.bbox != before {
                clamped += 1;
            }
        }
        if clamped > 0 {
            log::warn!(
                "Clamped {} detections to {}x{} image",
                clamped,
                size.width,
                size.height
            );
        }
        &self.detections
    }

    /// Replace the list with normalized copies of detector output.
    ///
    /// Records keep the ID they arrive with; records without one (or whose
    /// ID repeats an earlier record in the batch) get the next free ID.
    /// Afterwards the counter sits above every live ID and never below the
    /// configured offset. Any invalid record fails the whole batch and leaves
    /// the current list untouched.
    pub fn ingest(&mut self, raw: &[RawDetection]) -> Result<&[Detection]> {
        let floor = match raw.iter().filter_map(|r| r.id).max() {
            Some(max) => max.checked_add(1),
            None => Some(0),
        };
        let mut counter = self
            .next_id
            .zip(floor)
            .map(|(next, floor)| next.max(self.id_offset).max(floor));

        let mut used: HashSet<DetectionId> = HashSet::with_capacity(raw.len());
        let mut ingested = Vec::with_capacity(raw.len());

        for (idx, record) in raw.iter().enumerate() {
            let id = match record.id {
                Some(id) if used.insert(id) => id,
                other => {
                    if let Some(dup) = other {
                        log::warn!("Duplicate detection ID {} at index {}, reassigning", dup, idx);
                    }
                    let id = counter.ok_or_else(id_space_exhausted)?;
                    counter = id.checked_add(1);
                    used.insert(id);
                    id
                }
            };

            if record.bbox.is_inverted() {
                log::warn!("Detection {} has inverted corners, reordering", id);
            } else if record.bbox.has_stale_extent() {
                log::debug!("Detection {} width/height disagree with corners, recomputing", id);
            }

            let mut det = record.normalize(id)?;
            if let Some(size) = self.natural_size {
                det.clamp_to(size);
            }
            ingested.push(det);
        }

        self.detections = ingested;
        self.next_id = counter;

        log::info!(
            "Ingested {} detections (next id {:?})",
            self.detections.len(),
            self.next_id
        );
        Ok(&self.detections)
    }

    /// Append a new detection with an empty segmentation.
    ///
    /// Confidence is clamped to `[0, 1]` and the box to the image. Fails if
    /// the confidence is not a finite number.
    pub fn create(
        &mut self,
        bbox: BoundingBox,
        class_id: ClassId,
        class_name: impl Into<String>,
        confidence: f64,
    ) -> Result<&Detection> {
        let confidence = ensure_finite("confidence", confidence)?.clamp(0.0, 1.0);
        let bbox = match self.natural_size {
            Some(size) => bbox.clamped(size),
            None => bbox,
        };

        let id = self.allocate_id()?;
        let det = Detection::new(id, bbox, class_id, class_name, confidence);
        log::debug!(
            "Created detection {} (class {}) at ({:.1}, {:.1})-({:.1}, {:.1})",
            id,
            class_id,
            bbox.x1(),
            bbox.y1(),
            bbox.x2(),
            bbox.y2()
        );

        let idx = self.detections.len();
        self.detections.push(det);
        Ok(&self.detections[idx])
    }

    /// Apply a partial update to detection `id`.
    ///
    /// Unset patch fields keep their value. An unknown ID is a no-op: a
    /// stale edit racing a delete must not fail. Invalid values fail before
    /// anything is written.
    pub fn update(&mut self, id: DetectionId, patch: DetectionPatch) -> Result<&[Detection]> {
        if patch.is_empty() {
            log::debug!("Empty update for detection {}", id);
            return Ok(&self.detections);
        }
        if let Some(confidence) = patch.confidence {
            ensure_finite("confidence", confidence)?;
        }
        if let Some(segmentation) = &patch.segmentation {
            segmentation.validate()?;
        }

        let size = self.natural_size;
        let Some(det) = self.detections.iter_mut().find(|d| d.id == id) else {
            log::debug!("Update ignored: no detection with id {}", id);
            return Ok(&self.detections);
        };

        if let Some(class_id) = patch.class_id {
            det.class_id = class_id;
        }
        if let Some(class_name) = patch.class_name {
            det.class_name = class_name;
        }
        if let Some(confidence) = patch.confidence {
            det.confidence = confidence.clamp(0.0, 1.0);
        }
        if let Some(bbox) = patch.bbox {
            det.bbox = bbox;
        }
        if let Some(segmentation) = patch.segmentation {
            det.segmentation = segmentation;
        }
        if let Some(size) = size {
            det.clamp_to(size);
        }

        log::debug!("Updated detection {}", id);
        Ok(&self.detections)
    }

    /// Remove detection `id`. Unknown IDs are ignored.
    pub fn delete(&mut self, id: DetectionId) -> &[Detection] {
        let before = self.detections.len();
        self.detections.retain(|d| d.id != id);
        if self.detections.len() == before {
            log::debug!("Delete ignored: no detection with id {}", id);
        } else {
            log::debug!("Deleted detection {}", id);
        }
        &self.detections
    }

    /// Drop every detection. The ID counter keeps its value.
    pub fn clear(&mut self) {
        log::debug!("Cleared {} detections", self.detections.len());
        self.detections.clear();
    }

    /// Topmost detection whose box contains a natural-space point.
    pub fn detection_at(&self, point: Point) -> Option<&Detection> {
        self.detections.iter().rev().find(|d| d.bbox.contains(point))
    }

    fn allocate_id(&mut self) -> Result<DetectionId> {
        let id = self
            .next_id
            .ok_or_else(id_space_exhausted)?
            .max(self.id_offset);
        self.next_id = id.checked_add(1);
        Ok(id)
    }
}

fn id_space_exhausted() -> AnnotationError {
    AnnotationError::validation("detection id space exhausted")
}
