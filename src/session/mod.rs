//! Per-image annotation session.
//!
//! One session covers one loaded image. It owns the detection store, the
//! selection, the edit working copy and the drawing machine, and keeps them
//! consistent with each other: deleting a detection clears any selection or
//! edit that referenced it in the same call.

use crate::color::{OpacityTable, Palette};
use crate::config::EngineConfig;
use crate::constants::{
    DRAW_CLASS_ID, DRAW_CLASS_NAME, DRAW_CONFIDENCE, IMPORT_CONFIDENCE,
};
use crate::detector::DetectorResponse;
use crate::drawing::{DrawOutcome, DrawingMachine, DrawingState};
use crate::edit::{EditField, EditSession, Selection};
use crate::error::Result;
use crate::format::{ExportPayload, ExportSink, decode_all, encode_all};
use crate::model::{Detection, DetectionId, DetectionPatch, ImageSize, Point, RawDetection};
use crate::render::{RenderBox, RenderContext, render_detections};
use crate::store::DetectionStore;
use crate::transform::{DisplayRect, ViewTransform};

/// Interactive annotation state for one image.
#[derive(Debug, Clone)]
pub struct AnnotationSession {
    config: EngineConfig,
    store: DetectionStore,
    selection: Selection,
    edit: EditSession,
    drawing: DrawingMachine,
    natural_size: ImageSize,
    display_size: ImageSize,
}

impl Default for AnnotationSession {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl AnnotationSession {
    /// Create a session with no image loaded.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            store: DetectionStore::new(config.id_offset),
            drawing: DrawingMachine::new(config.min_draw_size),
            selection: Selection::new(),
            edit: EditSession::new(),
            natural_size: ImageSize::default(),
            display_size: ImageSize::default(),
            config,
        }
    }

    /// Start over for a newly loaded image.
    ///
    /// Discards every detection and all selection, edit and drawing state.
    /// The display size is reset too; the surface reports it again once the
    /// new image is laid out.
    pub fn load_image(&mut self, natural_size: ImageSize) {
        log::info!(
            "Loading image {}x{}",
            natural_size.width,
            natural_size.height
        );
        *self = Self::new(self.config.clone());
        self.natural_size = natural_size;
        self.store.set_natural_size(natural_size);
    }

    /// Record the current on-screen size of the image.
    pub fn set_display_size(&mut self, display_size: ImageSize) {
        self.display_size = display_size;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn palette(&self) -> &Palette {
        &self.config.palette
    }

    pub fn opacity(&self) -> &OpacityTable {
        &self.config.opacity
    }

    pub fn natural_size(&self) -> ImageSize {
        self.natural_size
    }

    pub fn display_size(&self) -> ImageSize {
        self.display_size
    }

    /// Transform for the current sizes; fails until both are known.
    pub fn view_transform(&self) -> Result<ViewTransform> {
        ViewTransform::new(self.natural_size, self.display_size)
    }

    pub fn store(&self) -> &DetectionStore {
        &self.store
    }

    pub fn detections(&self) -> &[Detection] {
        self.store.detections()
    }

    pub fn selected(&self) -> Option<DetectionId> {
        self.selection.selected()
    }

    /// Working copy of the detection being edited.
    pub fn editing(&self) -> Option<&Detection> {
        self.edit.working()
    }

    pub fn drawing_state(&self) -> DrawingState {
        self.drawing.state()
    }

    // ------------------------------------------------------------------
    // Ingestion
    // ------------------------------------------------------------------

    /// Replace the detection list with detector output.
    ///
    /// Detector IDs restart on every run, so an ID surviving a re-ingest does
    /// not mean the record did. Any edit in progress ends, and the selection
    /// is kept only if its record came back unchanged. On failure the current
    /// list and all transient state stay as they were.
    pub fn ingest(&mut self, raw: &[RawDetection]) -> Result<&[Detection]> {
        let selected_before = self
            .selection
            .selected()
            .and_then(|id| self.store.get(id))
            .cloned();

        self.store.ingest(raw)?;

        if self.edit.cancel() {
            log::debug!("Ended edit on re-ingest");
        }
        let still_same = selected_before
            .as_ref()
            .is_some_and(|before| self.store.get(before.id) == Some(before));
        if !still_same {
            self.selection.clear();
        }
        Ok(self.store.detections())
    }

    /// Ingest a parsed detector response.
    pub fn ingest_response(&mut self, response: &DetectorResponse) -> Result<&[Detection]> {
        self.ingest(&response.detections)
    }

    // ------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------

    /// Activate "add detection". Rejected while a draw is in progress.
    pub fn arm_draw(&mut self) -> bool {
        self.drawing.arm()
    }

    /// Pointer pressed on the image (display coordinates).
    pub fn pointer_down(&mut self, position: Point) -> Result<bool> {
        let transform = self.view_transform()?;
        Ok(self.drawing.pointer_down(position, &transform))
    }

    /// Pointer moved over the image (display coordinates).
    pub fn pointer_move(&mut self, position: Point) -> Result<bool> {
        let transform = self.view_transform()?;
        Ok(self.drawing.pointer_move(position, &transform))
    }

    /// Pointer released (display coordinates). Returns the ID of the
    /// created detection, if the drag produced one.
    pub fn pointer_up(&mut self, position: Point) -> Result<Option<DetectionId>> {
        let transform = self.view_transform()?;
        let outcome = self.drawing.pointer_up(position, &transform);
        self.finish_draw(outcome)
    }

    /// Pointer left the image surface. Finalizes an in-progress drag.
    pub fn pointer_leave(&mut self) -> Result<Option<DetectionId>> {
        let outcome = self.drawing.pointer_leave();
        self.finish_draw(outcome)
    }

    /// Abandon the current draw without side effects.
    pub fn cancel_draw(&mut self) -> bool {
        self.drawing.cancel()
    }

    /// Provisional box of the drag in progress, display space.
    pub fn draft_box(&self) -> Option<DisplayRect> {
        let transform = self.view_transform().ok()?;
        self.drawing
            .draft()
            .map(|bbox| transform.bbox_to_display(&bbox))
    }

    fn finish_draw(&mut self, outcome: DrawOutcome) -> Result<Option<DetectionId>> {
        match outcome {
            DrawOutcome::Completed(bbox) => {
                let det = self
                    .store
                    .create(bbox, DRAW_CLASS_ID, DRAW_CLASS_NAME, DRAW_CONFIDENCE)?;
                log::info!("Drew detection {}", det.id);
                Ok(Some(det.id))
            }
            DrawOutcome::Discarded | DrawOutcome::Ignored => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Selection and editing
    // ------------------------------------------------------------------

    /// Toggle selection of a live detection. Unknown IDs are ignored.
    pub fn toggle_selection(&mut self, id: DetectionId) -> Option<DetectionId> {
        if self.store.contains(id) {
            self.selection.toggle(id)
        } else {
            self.selection.selected()
        }
    }

    /// Click on the image (display coordinates).
    ///
    /// Toggles the topmost detection under the pointer; clicking empty image
    /// clears the selection. Ignored while a draw is in progress. A
    /// non-finite position fails without touching the selection.
    pub fn click(&mut self, position: Point) -> Result<Option<DetectionId>> {
        let transform = self.view_transform()?;
        if self.drawing.is_active() {
            return Ok(self.selection.selected());
        }

        let natural = transform.checked_to_natural(position)?;
        match self.store.detection_at(natural).map(|d| d.id) {
            Some(id) => Ok(self.selection.toggle(id)),
            None => {
                self.selection.clear();
                Ok(None)
            }
        }
    }

    /// Start editing detection `id`, selecting it. Returns false if there is
    /// no such detection.
    pub fn begin_edit(&mut self, id: DetectionId) -> bool {
        let Some(det) = self.store.get(id) else {
            log::debug!("Cannot edit missing detection {}", id);
            return false;
        };
        self.edit.begin(det);
        self.selection.select(id);
        true
    }

    /// Change one field of the working copy.
    pub fn edit_field(&mut self, field: EditField) -> Result<bool> {
        let natural = self.natural_size.is_known().then_some(self.natural_size);
        self.edit.apply(field, natural)
    }

    /// Commit the working copy to the store and end the edit. The selection
    /// stays. If the record was deleted meanwhile the save is a no-op.
    pub fn save_edit(&mut self) -> Result<Option<DetectionId>> {
        let Some(working) = self.edit.working() else {
            return Ok(None);
        };
        let id = working.id;
        let patch = DetectionPatch::replace_with(working);
        self.store.update(id, patch)?;
        self.edit.cancel();
        log::debug!("Saved edit of detection {}", id);
        Ok(Some(id))
    }

    /// Discard the working copy.
    pub fn cancel_edit(&mut self) -> bool {
        self.edit.cancel()
    }

    /// Partial update passthrough to the store.
    pub fn update(&mut self, id: DetectionId, patch: DetectionPatch) -> Result<&[Detection]> {
        self.store.update(id, patch)
    }

    /// Delete a detection along with any selection or edit pointing at it.
    pub fn delete(&mut self, id: DetectionId) -> &[Detection] {
        if self.edit.clear_if(id) {
            log::debug!("Dropped edit of deleted detection {}", id);
        }
        self.selection.clear_if(id);
        self.store.delete(id)
    }

    /// Drop every detection and all transient state. The image stays loaded.
    pub fn clear(&mut self) {
        self.store.clear();
        self.selection.clear();
        self.edit.cancel();
        self.drawing.cancel();
    }

    // ------------------------------------------------------------------
    // Import / export
    // ------------------------------------------------------------------

    /// Encode all detections for download as `<image stem>.txt`.
    pub fn export(&self, image_name: &str) -> Result<ExportPayload> {
        let contents = encode_all(
            self.store.detections(),
            self.natural_size.width,
            self.natural_size.height,
        )?;
        let payload = ExportPayload::for_image(image_name, contents);
        log::info!(
            "Exported {} detections as {}",
            self.store.len(),
            payload.filename
        );
        Ok(payload)
    }

    /// Encode all detections and hand them to `sink`.
    pub fn export_to(
        &self,
        sink: &mut dyn ExportSink,
        image_name: &str,
    ) -> Result<ExportPayload> {
        let payload = self.export(image_name)?;
        sink.accept(&payload)?;
        Ok(payload)
    }

    /// Add detections from normalized text.
    ///
    /// Each line becomes a new detection named after `class_names[class_id]`
    /// (or the drawing default when the list has no entry). Every line is
    /// decoded before anything is added.
    pub fn import_text(&mut self, text: &str, class_names: &[String]) -> Result<&[Detection]> {
        let records = decode_all(text, self.natural_size.width, self.natural_size.height)?;
        for record in &records {
            let name = class_names
                .get(record.class_id as usize)
                .map_or(DRAW_CLASS_NAME, String::as_str);
            self.store
                .create(record.bbox, record.class_id, name, IMPORT_CONFIDENCE)?;
        }
        log::info!("Imported {} detections", records.len());
        Ok(self.store.detections())
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Render model for the current state.
    pub fn render(&self) -> Result<Vec<RenderBox>> {
        let transform = self.view_transform()?;
        let ctx = RenderContext {
            transform: &transform,
            palette: &self.config.palette,
            opacity: &self.config.opacity,
            selected: self.selection.selected(),
            editing: self.edit.working(),
        };
        Ok(render_detections(self.store.detections(), &ctx))
    }
}

#[cfg(test)]
mod tests;
