//! Input abstraction layer.
//!
//! Normalizes DOM pointer events into a `PointerEvent` consumed by the
//! gesture classifier and the canvas attachment.

use cse_core::Point;
use std::time::Duration;

/// Which pointer button an event refers to (DOM `button` numbering).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Auxiliary,
    Secondary,
    Other(i16),
}

impl PointerButton {
    pub fn from_dom(button: i16) -> Self {
        match button {
            0 => Self::Primary,
            1 => Self::Auxiliary,
            2 => Self::Secondary,
            other => Self::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// A normalized pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    /// Position in screen (client) coordinates.
    pub position: Point,
    pub button: PointerButton,
    /// Monotonic event timestamp (DOM `timeStamp`).
    pub time: Duration,
    /// The event target lies inside the side editor panel.
    pub in_panel: bool,
}

impl PointerEvent {
    pub fn down(x: f64, y: f64, time: Duration) -> Self {
        Self::new(PointerPhase::Down, x, y, time)
    }

    pub fn moved(x: f64, y: f64, time: Duration) -> Self {
        Self::new(PointerPhase::Move, x, y, time)
    }

    pub fn up(x: f64, y: f64, time: Duration) -> Self {
        Self::new(PointerPhase::Up, x, y, time)
    }

    fn new(phase: PointerPhase, x: f64, y: f64, time: Duration) -> Self {
        Self {
            phase,
            position: Point::new(x, y),
            button: PointerButton::Primary,
            time,
            in_panel: false,
        }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    /// Mark the event as targeting the editor panel.
    pub fn inside_panel(mut self) -> Self {
        self.in_panel = true;
        self
    }
}
