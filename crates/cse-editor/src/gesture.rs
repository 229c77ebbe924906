//! Single-click detection.
//!
//! A pointer sequence qualifies as a single click when it is a primary
//! button press that neither travels (drag, pan, marquee) nor lingers
//! (long-press). Two fixed thresholds decide it:
//!
//! | Threshold | Value | Breaks the click when |
//! |-----------|-------|-----------------------|
//! | move tolerance | 6 px | any axis moved further, at any point |
//! | long press | 350 ms | held at least this long |

use crate::input::{PointerButton, PointerEvent};
use cse_core::Point;
use std::time::Duration;

/// Displacement (per axis, screen px) beyond which a press becomes a drag.
pub const MOVE_TOLERANCE_PX: f64 = 6.0;

/// Press duration at which a press becomes a long-press.
pub const LONG_PRESS: Duration = Duration::from_millis(350);

/// Transient state of one pointer sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureState {
    pub down_at: Duration,
    pub down_position: Point,
    /// Sticky: once set it stays set until the next pointerdown.
    pub dragging: bool,
}

/// Result of a finished pointer sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub primary: bool,
    pub dragged: bool,
    pub moved_at_release: bool,
    pub long_press: bool,
    pub elapsed: Duration,
}

impl Classification {
    pub fn is_single_click(&self) -> bool {
        self.primary && !self.dragged && !self.moved_at_release && !self.long_press
    }
}

/// Two-state classifier: idle, or tracking one pointer sequence.
#[derive(Debug, Default)]
pub struct GestureClassifier {
    tracking: Option<GestureState>,
}

impl GestureClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<&GestureState> {
        self.tracking.as_ref()
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking.is_some()
    }

    /// Pointerdown: start tracking, replacing any unfinished sequence.
    pub fn pointer_down(&mut self, event: &PointerEvent) {
        self.tracking = Some(GestureState {
            down_at: event.time,
            down_position: event.position,
            dragging: false,
        });
    }

    /// Pointermove: latch the drag flag once the tolerance is exceeded.
    pub fn pointer_move(&mut self, event: &PointerEvent) {
        if let Some(state) = &mut self.tracking
            && exceeds_tolerance(state.down_position, event.position)
        {
            state.dragging = true;
        }
    }

    /// Pointerup: classify and return to idle. `None` when no pointerdown
    /// was seen.
    pub fn pointer_up(&mut self, event: &PointerEvent) -> Option<Classification> {
        let state = self.tracking.take()?;
        let elapsed = event.time.saturating_sub(state.down_at);
        let classification = Classification {
            primary: event.button == PointerButton::Primary,
            dragged: state.dragging,
            moved_at_release: exceeds_tolerance(state.down_position, event.position),
            long_press: elapsed >= LONG_PRESS,
            elapsed,
        };
        log::debug!("pointerup classified: {classification:?}");
        Some(classification)
    }

    /// Drop the current sequence without classifying it.
    pub fn abandon(&mut self) {
        self.tracking = None;
    }
}

fn exceeds_tolerance(from: Point, to: Point) -> bool {
    (to.x - from.x).abs() > MOVE_TOLERANCE_PX || (to.y - from.y).abs() > MOVE_TOLERANCE_PX
}
