//! Pointer events delivered by the host surface.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Pointer button identifiers. Pen and touch contacts arrive as `Primary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Pointer event in CSS pixels relative to the canvas origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: PointerButton,
    },
    Move {
        position: Point,
    },
    Up {
        position: Point,
        button: PointerButton,
    },
    /// The pointer left the host's control (capture lost, window unfocused).
    Cancel,
}

impl PointerEvent {
    /// Position carried by the event, if any.
    pub fn position(&self) -> Option<Point> {
        match *self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Move { position }
            | PointerEvent::Up { position, .. } => Some(position),
            PointerEvent::Cancel => None,
        }
    }

    /// Whether the event should start a stroke.
    pub fn starts_stroke(&self) -> bool {
        matches!(
            self,
            PointerEvent::Down {
                button: PointerButton::Primary,
                ..
            }
        )
    }

    /// Whether the event should finish a stroke.
    pub fn ends_stroke(&self) -> bool {
        matches!(self, PointerEvent::Up { .. } | PointerEvent::Cancel)
    }
}
