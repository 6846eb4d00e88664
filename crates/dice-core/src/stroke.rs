//! Stroke primitives: timestamps, freehand strokes and ordered stroke sets.

use kurbo::{BezPath, Point};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(target_arch = "wasm32")]
use web_time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Read the wall clock.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self(millis)
    }

    /// Create a timestamp from milliseconds since the epoch.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Milliseconds since the epoch.
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Time elapsed between `earlier` and `self`, zero if `earlier` is later.
    pub fn since(self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }

    /// This timestamp shifted forward by `duration`.
    pub fn after(self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration.as_millis() as u64))
    }
}

/// In-memory identity of a stroke. Never persisted.
pub type StrokeId = Uuid;

/// One continuous freehand gesture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    #[serde(skip, default = "Uuid::new_v4")]
    pub(crate) id: StrokeId,
    /// Points in drawing order, in canvas units.
    pub points: Vec<Point>,
    /// When the gesture began.
    #[serde(default)]
    pub created_at: Timestamp,
}

impl Stroke {
    /// Start a stroke at `origin`.
    pub fn begin(origin: Point, created_at: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            points: vec![origin],
            created_at,
        }
    }

    /// Create from existing points.
    pub fn from_points(points: Vec<Point>, created_at: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            points,
            created_at,
        }
    }

    pub fn id(&self) -> StrokeId {
        self.id
    }

    /// Add a point to the end of the stroke.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Get the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the stroke has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether the stroke leaves a visible mark. Strokes with fewer than two
    /// points are kept but never drawn.
    pub fn is_renderable(&self) -> bool {
        self.points.len() >= 2
    }

    /// Age of the stroke at `now`.
    pub fn age(&self, now: Timestamp) -> Duration {
        now.since(self.created_at)
    }


    /// The stroke as an open polyline.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();

        let Some(first) = self.points.first() else {
            return path;
        };

        path.move_to(*first);
        for point in self.points.iter().skip(1) {
            path.line_to(*point);
        }

        path
    }
}

/// Structural equality: same points in the same order and the same start time.
impl PartialEq for Stroke {
    fn eq(&self, other: &Self) -> bool {
        self.created_at == other.created_at && self.points == other.points
    }
}

/// Strokes in drawing order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrokeSet {
    strokes: Vec<Stroke>,
}

impl StrokeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stroke on top of everything drawn so far.
    pub fn push(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }

    /// Find a stroke by id. Searches from the newest stroke since the one
    /// being captured is almost always last.
    pub fn get_mut(&mut self, id: StrokeId) -> Option<&mut Stroke> {
        self.strokes.iter_mut().rev().find(|s| s.id == id)
    }

    /// Keep only the strokes matching `keep`, preserving order.
    /// Returns the number of strokes dropped.
    pub fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&Stroke) -> bool,
    {
        let before = self.strokes.len();
        self.strokes.retain(keep);
        before - self.strokes.len()
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Strokes in drawing order.
    pub fn iter(&self) -> std::slice::Iter<'_, Stroke> {
        self.strokes.iter()
    }

    /// Strokes that leave a visible mark, in drawing order.
    pub fn renderable(&self) -> impl Iterator<Item = &Stroke> {
        self.strokes.iter().filter(|s| s.is_renderable())
    }
}

impl From<Vec<Stroke>> for StrokeSet {
    fn from(strokes: Vec<Stroke>) -> Self {
        Self { strokes }
    }
}

impl FromIterator<Stroke> for StrokeSet {
    fn from_iter<I: IntoIterator<Item = Stroke>>(iter: I) -> Self {
        Self {
            strokes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a StrokeSet {
    type Item = &'a Stroke;
    type IntoIter = std::slice::Iter<'a, Stroke>;

    fn into_iter(self) -> Self::IntoIter {
        self.strokes.iter()
    }
}
