//! Pointer-driven bounding box drawing.
//!
//! A single enumerated state replaces separate "is drawing" / "is creating"
//! flags, so only `Idle -> Armed -> Dragging -> Idle` is representable.
//! Pointer positions arrive in display space and are converted to natural
//! space the moment they are captured.

use crate::constants::DEFAULT_MIN_DRAW_SIZE;
use crate::model::{BoundingBox, Point};
use crate::transform::ViewTransform;

/// State of the drawing interaction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DrawingState {
    /// Not drawing; pointer input goes to selection.
    #[default]
    Idle,
    /// "Add detection" was activated; waiting for pointer-down on the image.
    Armed,
    /// Dragging out a box. Both points are natural space.
    Dragging { start: Point, current: Point },
}

impl DrawingState {
    /// Check if a draw is in progress (armed or dragging).
    pub fn is_active(&self) -> bool {
        !matches!(self, DrawingState::Idle)
    }
}

/// Result of ending a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawOutcome {
    /// The drag was large enough; the box should become a detection.
    Completed(BoundingBox),
    /// The drag was below the minimum size and was dropped.
    Discarded,
    /// No drag was in progress.
    Ignored,
}

/// Drawing state machine. Exactly one draw can be in progress.
#[derive(Debug, Clone)]
pub struct DrawingMachine {
    state: DrawingState,
    /// Minimum extent per axis, natural pixels.
    min_size: f64,
}

impl Default for DrawingMachine {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DRAW_SIZE)
    }
}

impl DrawingMachine {
    pub fn new(min_size: f64) -> Self {
        Self {
            state: DrawingState::Idle,
            min_size,
        }
    }

    pub fn state(&self) -> DrawingState {
        self.state
    }

    pub fn min_size(&self) -> f64 {
        self.min_size
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Arm the machine for a new draw.
    ///
    /// Rejected (returns false) while another draw is armed or dragging.
    pub fn arm(&mut self) -> bool {
        if self.state.is_active() {
            log::debug!("Draw already in progress, ignoring arm");
            return false;
        }
        self.state = DrawingState::Armed;
        true
    }

    /// Start dragging at a display-space position. Only valid when armed.
    pub fn pointer_down(&mut self, position: Point, transform: &ViewTransform) -> bool {
        if self.state != DrawingState::Armed {
            return false;
        }
        let Some(start) = capture(position, transform) else {
            return false;
        };
        log::debug!("Draw started at ({:.1}, {:.1})", start.x, start.y);
        self.state = DrawingState::Dragging {
            start,
            current: start,
        };
        true
    }

    /// Move the provisional corner. Only valid while dragging.
    pub fn pointer_move(&mut self, position: Point, transform: &ViewTransform) -> bool {
        let DrawingState::Dragging { start, .. } = self.state else {
            return false;
        };
        let Some(current) = capture(position, transform) else {
            return false;
        };
        self.state = DrawingState::Dragging { start, current };
        true
    }

    /// Release the pointer at a display-space position and finalize.
    pub fn pointer_up(&mut self, position: Point, transform: &ViewTransform) -> DrawOutcome {
        self.pointer_move(position, transform);
        self.finish()
    }

    /// Pointer left the image surface; finalize at the last known corner.
    pub fn pointer_leave(&mut self) -> DrawOutcome {
        self.finish()
    }

    /// Abandon an armed or dragging draw. Returns whether one was active.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.state.is_active();
        if was_active {
            log::debug!("Draw cancelled");
        }
        self.state = DrawingState::Idle;
        was_active
    }

    /// Provisional box while dragging, natural space.
    pub fn draft(&self) -> Option<BoundingBox> {
        match self.state {
            DrawingState::Dragging { start, current } => {
                BoundingBox::from_points(start, current).ok()
            }
            _ => None,
        }
    }

    fn finish(&mut self) -> DrawOutcome {
        let DrawingState::Dragging { start, current } = self.state else {
            return DrawOutcome::Ignored;
        };
        self.state = DrawingState::Idle;

        let dx = (current.x - start.x).abs();
        let dy = (current.y - start.y).abs();
        if dx < self.min_size || dy < self.min_size {
            log::debug!(
                "Draw discarded: {:.1}x{:.1} below minimum {:.1}",
                dx,
                dy,
                self.min_size
            );
            return DrawOutcome::Discarded;
        }

        match BoundingBox::from_points(start, current) {
            Ok(bbox) => DrawOutcome::Completed(bbox),
            Err(e) => {
                log::warn!("Draw discarded: {}", e);
                DrawOutcome::Discarded
            }
        }
    }
}

/// Convert a display-space pointer position into a natural-space point
/// inside the image. Non-finite positions are dropped.
fn capture(position: Point, transform: &ViewTransform) -> Option<Point> {
    transform
        .checked_to_natural(position)
        .ok()
        .map(|p| p.clamped(transform.natural()))
}
