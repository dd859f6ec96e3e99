//! Tests for the session's own bookkeeping.

use crate::edit::EditField;
use crate::model::{DetectionId, ImageSize, Point, RawBoundingBox, RawDetection};
use crate::session::AnnotationSession;

fn session() -> AnnotationSession {
    let mut session = AnnotationSession::default();
    session.load_image(ImageSize::new(800.0, 600.0));
    session.set_display_size(ImageSize::new(800.0, 600.0));
    session
}

fn draw(session: &mut AnnotationSession, from: (f64, f64), to: (f64, f64)) -> Option<DetectionId> {
    assert!(session.arm_draw());
    session.pointer_down(Point::new(from.0, from.1)).unwrap();
    session.pointer_move(Point::new(to.0, to.1)).unwrap();
    session.pointer_up(Point::new(to.0, to.1)).unwrap()
}

#[test]
fn test_pointer_refused_before_image_loaded() {
    let mut session = AnnotationSession::default();
    session.arm_draw();
    assert!(session.pointer_down(Point::new(1.0, 1.0)).is_err());
    assert!(session.render().is_err());
    assert!(session.click(Point::new(1.0, 1.0)).is_err());
}

#[test]
fn test_draw_creates_with_defaults() {
    let mut session = session();
    let id = draw(&mut session, (50.0, 50.0), (200.0, 150.0)).unwrap();
    let det = session.store().get(id).unwrap();
    assert_eq!(det.class_id, 0);
    assert_eq!(det.class_name, "object");
    assert_eq!(det.confidence, 0.5);
    assert_eq!(det.bbox.width(), 150.0);
}

#[test]
fn test_small_draw_creates_nothing() {
    let mut session = session();
    assert!(draw(&mut session, (0.0, 0.0), (5.0, 5.0)).is_none());
    assert!(session.detections().is_empty());
}

#[test]
fn test_begin_edit_selects() {
    let mut session = session();
    let id = draw(&mut session, (50.0, 50.0), (200.0, 150.0)).unwrap();
    assert!(session.begin_edit(id));
    assert_eq!(session.selected(), Some(id));
    assert!(!session.begin_edit(id + 100));
}

#[test]
fn test_cancel_edit_leaves_store() {
    let mut session = session();
    let id = draw(&mut session, (50.0, 50.0), (200.0, 150.0)).unwrap();
    session.begin_edit(id);
    session.edit_field(EditField::X1(10.0)).unwrap();
    assert!(session.cancel_edit());
    assert_eq!(session.store().get(id).unwrap().bbox.x1(), 50.0);
    assert_eq!(session.selected(), Some(id));
}

#[test]
fn test_save_after_delete_is_noop() {
    let mut session = session();
    let id = draw(&mut session, (50.0, 50.0), (200.0, 150.0)).unwrap();
    session.begin_edit(id);
    let stale = session.editing().cloned().unwrap();

    session.store.delete(id);
    session.edit.begin(&stale);
    assert_eq!(session.save_edit().unwrap(), Some(id));
    assert!(session.detections().is_empty());
    assert!(session.editing().is_none());
}

#[test]
fn test_ingest_drops_dangling_selection() {
    let mut session = session();
    let id = draw(&mut session, (50.0, 50.0), (200.0, 150.0)).unwrap();
    session.begin_edit(id);
    session
        .ingest(&[RawDetection::new(1, "cat", 0.7, RawBoundingBox::new(0.0, 0.0, 20.0, 20.0))])
        .unwrap();
    assert!(session.selected().is_none());
    assert!(session.editing().is_none());
}

#[test]
fn test_toggle_selection_ignores_unknown() {
    let mut session = session();
    let id = draw(&mut session, (50.0, 50.0), (200.0, 150.0)).unwrap();
    assert_eq!(session.toggle_selection(id), Some(id));
    assert_eq!(session.toggle_selection(9999), Some(id));
    assert_eq!(session.toggle_selection(id), None);
}

#[test]
fn test_click_ignored_while_drawing() {
    let mut session = session();
    let id = draw(&mut session, (50.0, 50.0), (200.0, 150.0)).unwrap();
    session.arm_draw();
    assert_eq!(session.click(Point::new(100.0, 100.0)).unwrap(), None);
    session.cancel_draw();
    assert_eq!(session.click(Point::new(100.0, 100.0)).unwrap(), Some(id));
}

#[test]
fn test_load_image_resets() {
    let mut session = session();
    let id = draw(&mut session, (50.0, 50.0), (200.0, 150.0)).unwrap();
    session.toggle_selection(id);
    session.load_image(ImageSize::new(640.0, 480.0));
    assert!(session.detections().is_empty());
    assert!(session.selected().is_none());
    assert_eq!(session.store().next_id(), Some(1000));
    assert!(session.view_transform().is_err());
}

#[test]
fn test_draft_box_in_display_space() {
    let mut session = session();
    session.set_display_size(ImageSize::new(400.0, 300.0));
    session.arm_draw();
    session.pointer_down(Point::new(10.0, 10.0)).unwrap();
    session.pointer_move(Point::new(60.0, 40.0)).unwrap();
    let draft = session.draft_box().unwrap();
    assert!((draft.x - 10.0).abs() < 1e-9);
    assert!((draft.width - 50.0).abs() < 1e-9);
    assert!((draft.height - 30.0).abs() < 1e-9);
}

#[test]
fn test_reingest_with_reused_id_ends_edit() {
    let mut session = session();
    let person = RawDetection::new(0, "person", 0.9, RawBoundingBox::new(10.0, 10.0, 60.0, 90.0))
        .with_id(0);
    session.ingest(&[person]).unwrap();
    assert!(session.begin_edit(0));
    session.edit_field(EditField::ClassName("cyclist".into())).unwrap();

    let car = RawDetection::new(2, "car", 0.8, RawBoundingBox::new(300.0, 300.0, 500.0, 400.0))
        .with_id(0);
    session.ingest(&[car]).unwrap();
    assert!(session.editing().is_none());
    assert!(session.selected().is_none());

    assert_eq!(session.save_edit().unwrap(), None);
    let stored = session.store().get(0).unwrap();
    assert_eq!(stored.class_name, "car");
    assert_eq!(stored.bbox.x1(), 300.0);
}

#[test]
fn test_reingest_keeps_selection_of_unchanged_record() {
    let mut session = session();
    let batch = [
        RawDetection::new(0, "person", 0.9, RawBoundingBox::new(10.0, 10.0, 60.0, 90.0)).with_id(0),
        RawDetection::new(2, "car", 0.8, RawBoundingBox::new(300.0, 300.0, 500.0, 400.0)).with_id(1),
    ];
    session.ingest(&batch).unwrap();
    session.toggle_selection(1);

    session.ingest(&batch).unwrap();
    assert_eq!(session.selected(), Some(1));

    let mut moved = batch.clone();
    moved[1].bbox.x1 = 320.0;
    session.ingest(&moved).unwrap();
    assert_eq!(session.selected(), None);
}

#[test]
fn test_failed_ingest_keeps_edit() {
    let mut session = session();
    let id = draw(&mut session, (50.0, 50.0), (200.0, 150.0)).unwrap();
    session.begin_edit(id);

    let bad = RawDetection::new(0, "x", 0.5, RawBoundingBox::new(f64::NAN, 0.0, 1.0, 1.0));
    assert!(session.ingest(&[bad]).is_err());
    assert_eq!(session.editing().map(|d| d.id), Some(id));
    assert_eq!(session.selected(), Some(id));
}

#[test]
fn test_click_rejects_non_finite_position() {
    let mut session = session();
    let id = draw(&mut session, (50.0, 50.0), (200.0, 150.0)).unwrap();
    session.toggle_selection(id);

    let err = session.click(Point::new(f64::NAN, 100.0)).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(session.selected(), Some(id));
}
