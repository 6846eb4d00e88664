//! Turns pointer gestures into strokes.

use crate::stroke::{Stroke, StrokeId, StrokeSet, Timestamp};
use kurbo::Point;

/// State of the capture engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    /// A stroke is being drawn.
    Active { stroke: StrokeId },
}

/// Appends pointer input to a stroke set.
///
/// The engine never owns strokes; it only remembers which stroke in the set
/// is in progress. If that stroke disappears (expired by the wall's
/// scheduler mid-gesture), further points are dropped until the gesture ends.
#[derive(Debug, Clone, Default)]
pub struct CaptureEngine {
    state: CaptureState,
}

impl CaptureEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, CaptureState::Active { .. })
    }

    /// Start a stroke at `point`. Silently ignored when write access is not
    /// granted or a stroke is already active. Returns whether a stroke started.
    pub fn begin_stroke(
        &mut self,
        strokes: &mut StrokeSet,
        granted: bool,
        point: Point,
        now: Timestamp,
    ) -> bool {
        if !granted {
            log::debug!("Ignoring stroke start without write access");
            return false;
        }
        if self.is_active() {
            return false;
        }

        let stroke = Stroke::begin(point, now);
        self.state = CaptureState::Active { stroke: stroke.id() };
        strokes.push(stroke);
        true
    }

    /// Append `point` to the stroke in progress. Returns whether the set changed.
    pub fn extend_stroke(&mut self, strokes: &mut StrokeSet, point: Point) -> bool {
        let CaptureState::Active { stroke } = self.state else {
            return false;
        };

        match strokes.get_mut(stroke) {
            Some(stroke) => {
                stroke.add_point(point);
                true
            }
            None => false,
        }
    }

    /// Finish the current gesture. Safe to call at any time.
    pub fn end_stroke(&mut self) {
        self.state = CaptureState::Idle;
    }
}
