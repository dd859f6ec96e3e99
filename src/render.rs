//! Display-space render model.
//!
//! Rendering is a pure function of the detection list plus the transform,
//! colors and selection. Any UI layer can paint the returned boxes without
//! reaching back into the store.

use crate::color::{ColorPair, OpacityTable, Palette, StateStyle, VisualState};
use crate::model::{Detection, DetectionId, Point};
use crate::transform::{DisplayRect, ViewTransform};

/// Everything besides the detections that affects how they are drawn.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub transform: &'a ViewTransform,
    pub palette: &'a Palette,
    pub opacity: &'a OpacityTable,
    /// Currently selected detection.
    pub selected: Option<DetectionId>,
    /// Working copy of the detection being edited; drawn in place of the
    /// stored record with the same ID.
    pub editing: Option<&'a Detection>,
}

/// One detection ready to paint.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderBox {
    pub id: DetectionId,
    /// Box in display pixels.
    pub rect: DisplayRect,
    /// Segmentation outline in display pixels (empty when there is no mask).
    pub polygon: Vec<Point>,
    /// `"<class_name> <confidence>%"`.
    pub label: String,
    pub colors: ColorPair,
    pub state: VisualState,
    pub style: StateStyle,
    /// Drawn from an unsaved working copy.
    pub editing: bool,
}

/// Build the render model for `detections`, in list order.
pub fn render_detections(detections: &[Detection], ctx: &RenderContext<'_>) -> Vec<RenderBox> {
    detections
        .iter()
        .map(|stored| {
            let (det, editing) = match ctx.editing {
                Some(working) if working.id == stored.id => (working, true),
                _ => (stored, false),
            };
            render_one(det, editing, ctx)
        })
        .collect()
}

fn render_one(det: &Detection, editing: bool, ctx: &RenderContext<'_>) -> RenderBox {
    let state = VisualState::of(det.id, ctx.selected);
    RenderBox {
        id: det.id,
        rect: ctx.transform.bbox_to_display(&det.bbox),
        polygon: det
            .segmentation
            .polygon
            .iter()
            .map(|p| ctx.transform.to_display(*p))
            .collect(),
        label: det.label(),
        colors: ctx.palette.color_for(det.class_id),
        state,
        style: ctx.opacity.style_for(state),
        editing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, ImageSize, Segmentation};

    fn detections() -> Vec<Detection> {
        vec![
            Detection::new(1, bbox(100.0, 100.0, 300.0, 200.0), 0, "person", 0.9),
            Detection::new(2, bbox(0.0, 0.0, 50.0, 50.0), 2, "car", 0.45).with_segmentation(
                Segmentation::from_polygon(vec![
                    Point::new(0.0, 0.0),
                    Point::new(50.0, 0.0),
                    Point::new(25.0, 50.0),
                ]),
            ),
        ]
    }

    fn bbox(x1: f64, y1: f64, x2: f64, y2: f64) -> BoundingBox {
        BoundingBox::from_corners(x1, y1, x2, y2).unwrap()
    }

    fn transform() -> ViewTransform {
        ViewTransform::new(ImageSize::new(800.0, 600.0), ImageSize::new(400.0, 300.0)).unwrap()
    }

    #[test]
    fn test_render_scales_to_display() {
        let (t, palette, opacity) = (transform(), Palette::default(), OpacityTable::default());
        let ctx = RenderContext {
            transform: &t,
            palette: &palette,
            opacity: &opacity,
            selected: None,
            editing: None,
        };
        let boxes = render_detections(&detections(), &ctx);

        assert_eq!(boxes.len(), 2);
        assert_eq!(
            boxes[0].rect,
            DisplayRect {
                x: 50.0,
                y: 50.0,
                width: 100.0,
                height: 50.0
            }
        );
        assert_eq!(boxes[1].polygon[2], Point::new(12.5, 25.0));
        assert_eq!(boxes[0].label, "person 90%");
        assert!(boxes.iter().all(|b| b.state == VisualState::Normal));
        assert_eq!(boxes[1].colors, palette.color_for(2));
    }

    #[test]
    fn test_render_selection_states() {
        let (t, palette, opacity) = (transform(), Palette::default(), OpacityTable::default());
        let ctx = RenderContext {
            transform: &t,
            palette: &palette,
            opacity: &opacity,
            selected: Some(2),
            editing: None,
        };
        let boxes = render_detections(&detections(), &ctx);
        assert_eq!(boxes[0].state, VisualState::Dimmed);
        assert_eq!(boxes[0].style, opacity.dimmed);
        assert_eq!(boxes[1].state, VisualState::Selected);
        assert_eq!(boxes[1].style, opacity.selected);
    }

    #[test]
    fn test_render_uses_working_copy() {
        let (t, palette, opacity) = (transform(), Palette::default(), OpacityTable::default());
        let mut working = detections()[0].clone();
        working.bbox = BoundingBox::from_corners(0.0, 0.0, 800.0, 600.0).unwrap();
        let ctx = RenderContext {
            transform: &t,
            palette: &palette,
            opacity: &opacity,
            selected: Some(1),
            editing: Some(&working),
        };
        let boxes = render_detections(&detections(), &ctx);
        assert!(boxes[0].editing);
        assert_eq!(boxes[0].rect.width, 400.0);
        assert!(!boxes[1].editing);
    }

    #[test]
    fn test_same_class_same_colors() {
        let (t, palette, opacity) = (transform(), Palette::default(), OpacityTable::default());
        let ctx = RenderContext {
            transform: &t,
            palette: &palette,
            opacity: &opacity,
            selected: None,
            editing: None,
        };
        let mut dets = detections();
        dets[1].class_id = 0;
        let first = render_detections(&dets, &ctx);
        let second = render_detections(&dets, &ctx);
        assert_eq!(first[0].colors, first[1].colors);
        assert_eq!(first, second);
    }
}
