//! Selection and in-place editing of a single detection.
//!
//! Editing works on a snapshot: changes accumulate on the working copy and
//! only reach the store when the session facade saves them.

use crate::error::{Result, ensure_finite};
use crate::model::{BoundingBox, ClassId, Detection, DetectionId, ImageSize};

/// The single highlighted detection, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Option<DetectionId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<DetectionId> {
        self.selected
    }

    pub fn is_selected(&self, id: DetectionId) -> bool {
        self.selected == Some(id)
    }

    /// Select `id`, or clear the selection if `id` is already selected.
    /// Returns the new selection.
    pub fn toggle(&mut self, id: DetectionId) -> Option<DetectionId> {
        self.selected = if self.is_selected(id) { None } else { Some(id) };
        self.selected
    }

    /// Select `id` unconditionally.
    pub fn select(&mut self, id: DetectionId) {
        self.selected = Some(id);
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Clear the selection if it points at `id`. Returns whether it did.
    pub fn clear_if(&mut self, id: DetectionId) -> bool {
        if self.is_selected(id) {
            self.selected = None;
            true
        } else {
            false
        }
    }
}

/// A single field change on the working copy.
///
/// Width and height are absent on purpose: they always follow the corners.
#[derive(Debug, Clone, PartialEq)]
pub enum EditField {
    X1(f64),
    Y1(f64),
    X2(f64),
    Y2(f64),
    ClassId(ClassId),
    ClassName(String),
    Confidence(f64),
}

/// Working copy of the detection being edited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditSession {
    working: Option<Detection>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot `detection` as the new working copy, replacing any
    /// unsaved one.
    pub fn begin(&mut self, detection: &Detection) {
        if let Some(previous) = self.working.as_ref().filter(|p| p.id != detection.id) {
            log::debug!("Discarding unsaved edit of detection {}", previous.id);
        }
        self.working = Some(detection.clone());
    }

    pub fn is_editing(&self) -> bool {
        self.working.is_some()
    }

    pub fn editing_id(&self) -> Option<DetectionId> {
        self.working.as_ref().map(|d| d.id)
    }

    pub fn working(&self) -> Option<&Detection> {
        self.working.as_ref()
    }

    /// Apply one field change to the working copy.
    ///
    /// Moving `x1` clamps it to `[0, width]` and pushes `x2` along if needed;
    /// moving `x2` clamps it to `[x1, width]`. The y axis mirrors this. With
    /// no known image size only the lower bounds apply. Returns false if no
    /// edit is in progress; fails on non-finite numbers without touching the
    /// working copy.
    pub fn apply(&mut self, field: EditField, natural: Option<ImageSize>) -> Result<bool> {
        let Some(working) = self.working.as_mut() else {
            return Ok(false);
        };

        let max_x = natural.map_or(f64::INFINITY, |s| s.width);
        let max_y = natural.map_or(f64::INFINITY, |s| s.height);
        let b = working.bbox;

        match field {
            EditField::X1(value) => {
                let x1 = ensure_finite("x1", value)?.clamp(0.0, max_x);
                working.bbox = BoundingBox::from_corners(x1, b.y1(), b.x2().max(x1), b.y2())?;
            }
            EditField::Y1(value) => {
                let y1 = ensure_finite("y1", value)?.clamp(0.0, max_y);
                working.bbox = BoundingBox::from_corners(b.x1(), y1, b.x2(), b.y2().max(y1))?;
            }
            EditField::X2(value) => {
                let x2 = ensure_finite("x2", value)?.clamp(b.x1(), max_x.max(b.x1()));
                working.bbox = BoundingBox::from_corners(b.x1(), b.y1(), x2, b.y2())?;
            }
            EditField::Y2(value) => {
                let y2 = ensure_finite("y2", value)?.clamp(b.y1(), max_y.max(b.y1()));
                working.bbox = BoundingBox::from_corners(b.x1(), b.y1(), b.x2(), y2)?;
            }
            EditField::ClassId(class_id) => working.class_id = class_id,
            EditField::ClassName(name) => working.class_name = name,
            EditField::Confidence(value) => {
                working.confidence = ensure_finite("confidence", value)?.clamp(0.0, 1.0);
            }
        }
        Ok(true)
    }

    /// Drop the working copy. Returns whether there was one.
    pub fn cancel(&mut self) -> bool {
        self.working.take().is_some()
    }

    /// Drop the working copy if it belongs to `id`.
    pub fn clear_if(&mut self, id: DetectionId) -> bool {
        if self.editing_id() == Some(id) {
            self.working = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection() -> Detection {
        let bbox = BoundingBox::from_corners(100.0, 100.0, 300.0, 200.0).unwrap();
        Detection::new(7, bbox, 1, "car", 0.8)
    }

    fn size() -> Option<ImageSize> {
        Some(ImageSize::new(800.0, 600.0))
    }

    fn editing() -> EditSession {
        let mut edit = EditSession::new();
        edit.begin(&detection());
        edit
    }

    #[test]
    fn test_selection_toggle() {
        let mut selection = Selection::new();
        assert_eq!(selection.toggle(3), Some(3));
        assert_eq!(selection.toggle(4), Some(4));
        assert_eq!(selection.toggle(4), None);
        assert_eq!(selection.selected(), None);
    }

    #[test]
    fn test_selection_clear_if() {
        let mut selection = Selection::new();
        selection.select(3);
        assert!(!selection.clear_if(4));
        assert!(selection.clear_if(3));
        assert!(selection.selected().is_none());
    }

    #[test]
    fn test_x2_below_x1_gives_zero_width() {
        let mut edit = editing();
        assert!(edit.apply(EditField::X2(50.0), size()).unwrap());
        let bbox = edit.working().unwrap().bbox;
        assert_eq!(bbox.x2(), bbox.x1());
        assert_eq!(bbox.x1(), 100.0);
        assert_eq!(bbox.width(), 0.0);
    }

    #[test]
    fn test_y2_below_y1_gives_zero_height() {
        let mut edit = editing();
        edit.apply(EditField::Y2(-10.0), size()).unwrap();
        let bbox = edit.working().unwrap().bbox;
        assert_eq!(bbox.y2(), 100.0);
        assert_eq!(bbox.height(), 0.0);
    }

    #[test]
    fn test_x1_past_x2_drags_x2() {
        let mut edit = editing();
        edit.apply(EditField::X1(350.0), size()).unwrap();
        let bbox = edit.working().unwrap().bbox;
        assert_eq!(bbox.x1(), 350.0);
        assert_eq!(bbox.x2(), 350.0);
        assert_eq!(bbox.width(), 0.0);
    }

    #[test]
    fn test_x1_clamped_to_image() {
        let mut edit = editing();
        edit.apply(EditField::X1(-40.0), size()).unwrap();
        assert_eq!(edit.working().unwrap().bbox.x1(), 0.0);
        assert_eq!(edit.working().unwrap().bbox.width(), 300.0);

        edit.apply(EditField::X1(9000.0), size()).unwrap();
        let bbox = edit.working().unwrap().bbox;
        assert_eq!(bbox.x1(), 800.0);
        assert_eq!(bbox.x2(), 800.0);
    }

    #[test]
    fn test_x2_clamped_to_image_width() {
        let mut edit = editing();
        edit.apply(EditField::X2(1200.0), size()).unwrap();
        assert_eq!(edit.working().unwrap().bbox.x2(), 800.0);
        edit.apply(EditField::Y2(1200.0), size()).unwrap();
        assert_eq!(edit.working().unwrap().bbox.y2(), 600.0);
    }

    #[test]
    fn test_unknown_size_keeps_lower_bounds() {
        let mut edit = editing();
        edit.apply(EditField::X2(5000.0), None).unwrap();
        edit.apply(EditField::Y1(-3.0), None).unwrap();
        let bbox = edit.working().unwrap().bbox;
        assert_eq!(bbox.x2(), 5000.0);
        assert_eq!(bbox.y1(), 0.0);
    }

    #[test]
    fn test_width_height_recomputed() {
        let mut edit = editing();
        edit.apply(EditField::X1(150.0), size()).unwrap();
        edit.apply(EditField::Y2(260.0), size()).unwrap();
        let bbox = edit.working().unwrap().bbox;
        assert_eq!(bbox.width(), 150.0);
        assert_eq!(bbox.height(), 160.0);
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut edit = editing();
        let before = edit.working().cloned();
        assert!(edit.apply(EditField::X1(f64::NAN), size()).unwrap_err().is_validation());
        assert!(edit.apply(EditField::Confidence(f64::INFINITY), size()).is_err());
        assert_eq!(edit.working().cloned(), before);
    }

    #[test]
    fn test_label_fields() {
        let mut edit = editing();
        edit.apply(EditField::ClassName("truck".into()), size()).unwrap();
        edit.apply(EditField::ClassId(4), size()).unwrap();
        edit.apply(EditField::Confidence(1.4), size()).unwrap();
        let working = edit.working().unwrap();
        assert_eq!(working.class_name, "truck");
        assert_eq!(working.class_id, 4);
        assert_eq!(working.confidence, 1.0);
    }

    #[test]
    fn test_apply_without_session() {
        let mut edit = EditSession::new();
        assert!(!edit.apply(EditField::X1(1.0), size()).unwrap());
    }

    #[test]
    fn test_cancel_and_clear_if() {
        let mut edit = editing();
        assert_eq!(edit.editing_id(), Some(7));
        assert!(!edit.clear_if(8));
        assert!(edit.clear_if(7));
        assert!(!edit.is_editing());

        edit.begin(&detection());
        assert!(edit.cancel());
        assert!(!edit.cancel());
    }
}
