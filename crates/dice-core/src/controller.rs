//! One canvas instance: the wall or a school's annotation board.
//!
//! The controller owns its stroke set exclusively and is driven by discrete
//! calls from the host: pointer events, resizes, timer ticks and explicit
//! saves. Each call runs to completion. Loading and saving are the only
//! asynchronous steps, so they are split into a request the host executes
//! and a completion it feeds back. Every request carries a ticket from the
//! mount it was issued under; completions for an older mount are dropped.

use crate::access::{Membership, SchoolId, WriteAccess};
use crate::capture::{CaptureEngine, CaptureState};
use crate::config::CanvasConfig;
use crate::document::StrokeDocument;
use crate::error::CanvasError;
use crate::expiry::ExpiryScheduler;
use crate::input::PointerEvent;
use crate::storage::{LoadOutcome, PersistenceAdapter, Storage, StorageResult};
use crate::stroke::{StrokeSet, Timestamp};
use crate::viewport::{CoordinateSpace, Viewport};
use kurbo::Point;
use std::fmt;

/// Which kind of canvas this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasMode {
    /// The public wall: anyone draws, strokes fade, nothing is saved.
    Ephemeral,
    /// A school's board: members draw and explicitly save.
    Persistent { school_id: SchoolId },
}

impl CanvasMode {
    pub fn write_access(&self) -> WriteAccess {
        match *self {
            CanvasMode::Ephemeral => WriteAccess::Public,
            CanvasMode::Persistent { school_id } => WriteAccess::Members(school_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Unmounted,
    Loading,
    Ready,
}

/// Identifies the mount an async request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
}

/// A load the host must run against the store.
#[derive(Debug, Clone, Copy)]
pub struct LoadRequest {
    pub school_id: SchoolId,
    pub ticket: Ticket,
}

/// A save the host must run against the store.
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub school_id: SchoolId,
    /// Snapshot of the strokes at request time.
    pub document: StrokeDocument,
    pub ticket: Ticket,
    revision: u64,
}

/// Latest user-facing outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvasStatus {
    Saved,
    Error(CanvasError),
    Warning(CanvasError),
}

impl CanvasStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, CanvasStatus::Error(_))
    }
}

impl fmt::Display for CanvasStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanvasStatus::Saved => write!(f, "Saved"),
            CanvasStatus::Error(e @ CanvasError::StoreUnavailable(_)) => {
                write!(f, "Save failed: {}", e)
            }
            CanvasStatus::Error(e) => write!(f, "{}", e),
            CanvasStatus::Warning(e) => write!(f, "{}", e),
        }
    }
}

/// Orchestrates capture, expiry, access and persistence for one canvas.
pub struct CanvasController {
    mode: CanvasMode,
    space: CoordinateSpace,
    viewport: Viewport,
    membership: Option<Membership>,
    strokes: StrokeSet,
    capture: CaptureEngine,
    expiry: Option<ExpiryScheduler>,
    lifecycle: Lifecycle,
    epoch: u64,
    /// Bumped on every stroke mutation.
    revision: u64,
    saved_revision: u64,
    save_in_flight: Option<Ticket>,
    status: Option<CanvasStatus>,
    redraw: bool,
}

impl CanvasController {
    /// Create an unmounted controller for `mode`.
    pub fn new(mode: CanvasMode, config: &CanvasConfig) -> Self {
        let (space, expiry) = match mode {
            CanvasMode::Ephemeral => (
                CoordinateSpace::Viewport,
                Some(ExpiryScheduler::new(config.wall.ttl(), config.wall.tick_interval())),
            ),
            CanvasMode::Persistent { .. } => (config.school.coordinate_space(), None),
        };

        Self {
            mode,
            space,
            viewport: Viewport::default(),
            membership: None,
            strokes: StrokeSet::new(),
            capture: CaptureEngine::new(),
            expiry,
            lifecycle: Lifecycle::Unmounted,
            epoch: 0,
            revision: 0,
            saved_revision: 0,
            save_in_flight: None,
            status: None,
            redraw: false,
        }
    }

    /// The public wall.
    pub fn wall(config: &CanvasConfig) -> Self {
        Self::new(CanvasMode::Ephemeral, config)
    }

    /// A school's annotation board.
    pub fn school(school_id: SchoolId, config: &CanvasConfig) -> Self {
        Self::new(CanvasMode::Persistent { school_id }, config)
    }

    /// Start a view of the canvas with the viewer's membership snapshot.
    ///
    /// The wall is ready immediately and starts expiring strokes. A school
    /// board returns the load the host must perform; input is ignored until
    /// [`finish_load`](Self::finish_load) is called with its result.
    pub fn mount(&mut self, membership: Option<Membership>, now: Timestamp) -> Option<LoadRequest> {
        if self.lifecycle != Lifecycle::Unmounted {
            self.unmount();
        }

        self.epoch += 1;
        self.membership = membership;
        self.strokes.clear();
        self.capture.end_stroke();
        self.status = None;
        self.save_in_flight = None;
        self.saved_revision = self.revision;
        self.redraw = true;

        match self.mode {
            CanvasMode::Ephemeral => {
                if let Some(expiry) = self.expiry.as_mut() {
                    expiry.start(now);
                }
                self.lifecycle = Lifecycle::Ready;
                log::info!("Mounted wall canvas");
                None
            }
            CanvasMode::Persistent { school_id } => {
                self.lifecycle = Lifecycle::Loading;
                log::info!(
                    "Mounting canvas for school {} (writable: {})",
                    school_id,
                    self.can_write()
                );
                Some(LoadRequest {
                    school_id,
                    ticket: self.ticket(),
                })
            }
        }
    }

    /// Apply the result of a [`LoadRequest`]. Returns whether it was applied;
    /// results for a previous mount are discarded.
    pub fn finish_load(&mut self, ticket: Ticket, result: StorageResult<LoadOutcome>) -> bool {
        if ticket != self.ticket() || self.lifecycle != Lifecycle::Loading {
            log::debug!("Discarding stale load result");
            return false;
        }

        let document = match result {
            Ok(LoadOutcome::Malformed { reason }) => {
                self.status = Some(CanvasStatus::Warning(CanvasError::MalformedDocument(reason)));
                StrokeDocument::default()
            }
            Ok(outcome) => outcome.into_document(),
            Err(e) => {
                log::warn!("Loading canvas failed, starting empty: {}", e);
                self.status = Some(CanvasStatus::Warning(CanvasError::from(e)));
                StrokeDocument::default()
            }
        };

        self.strokes = document.strokes;
        self.revision += 1;
        self.saved_revision = self.revision;
        self.lifecycle = Lifecycle::Ready;
        self.redraw = true;
        true
    }

    /// End the view. Timers stop and in-memory strokes are discarded; any
    /// in-flight load or save result will be ignored.
    pub fn unmount(&mut self) {
        if self.lifecycle == Lifecycle::Unmounted {
            return;
        }
        if self.has_unsaved_changes() {
            log::info!("Discarding {} unsaved stroke(s)", self.strokes.len());
        }

        if let Some(expiry) = self.expiry.as_mut() {
            expiry.stop();
        }
        self.capture.end_stroke();
        self.strokes.clear();
        self.membership = None;
        self.save_in_flight = None;
        self.lifecycle = Lifecycle::Unmounted;
        self.epoch += 1;
    }

    fn ticket(&self) -> Ticket {
        Ticket { epoch: self.epoch }
    }

    /// Replace the membership snapshot (e.g. after the profile loads late).
    pub fn set_membership(&mut self, membership: Option<Membership>) {
        self.membership = membership;
    }

    pub fn membership(&self) -> Option<&Membership> {
        self.membership.as_ref()
    }

    /// Whether the viewer may draw on and save this canvas right now.
    pub fn can_write(&self) -> bool {
        self.mode.write_access().grants(self.membership.as_ref())
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle == Lifecycle::Ready
    }

    /// Start a stroke at `point` (canvas units).
    pub fn begin_stroke(&mut self, point: Point, now: Timestamp) -> bool {
        if !self.is_ready() {
            return false;
        }
        let granted = self.can_write();
        let started = self.capture.begin_stroke(&mut self.strokes, granted, point, now);
        if started {
            self.touch();
        }
        started
    }

    /// Extend the stroke in progress with `point` (canvas units).
    pub fn extend_stroke(&mut self, point: Point) -> bool {
        let extended = self.capture.extend_stroke(&mut self.strokes, point);
        if extended {
            self.touch();
        }
        extended
    }

    pub fn end_stroke(&mut self) {
        self.capture.end_stroke();
    }

    /// Route a host pointer event (CSS pixels) into capture.
    /// Returns whether the stroke set changed.
    pub fn handle_pointer(&mut self, event: PointerEvent, now: Timestamp) -> bool {
        if event.ends_stroke() {
            self.end_stroke();
            return false;
        }

        let Some(css) = event.position() else {
            return false;
        };
        let point = self.space.css_to_canvas(&self.viewport, css);

        if event.starts_stroke() {
            self.begin_stroke(point, now)
        } else if matches!(event, PointerEvent::Move { .. }) {
            self.extend_stroke(point)
        } else {
            false
        }
    }

    /// The host surface changed size or pixel ratio. Stored strokes are not
    /// remapped; the next render simply replays them.
    pub fn resize(&mut self, viewport: Viewport) {
        if self.viewport != viewport {
            self.viewport = viewport;
            self.redraw = true;
        }
    }

    /// Drive the expiry scheduler. Returns whether a tick ran.
    pub fn tick(&mut self, now: Timestamp) -> bool {
        if !self.is_ready() {
            return false;
        }
        let Some(expiry) = self.expiry.as_mut() else {
            return false;
        };

        match expiry.tick(&mut self.strokes, now) {
            Some(dropped) => {
                if dropped > 0 {
                    self.revision += 1;
                }
                self.redraw = true;
                true
            }
            None => false,
        }
    }

    /// When the host should next call [`tick`](Self::tick).
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.expiry.as_ref().and_then(ExpiryScheduler::next_deadline)
    }

    /// Ask to persist the canvas. Rejections are also recorded as the status.
    pub fn request_save(&mut self) -> Result<SaveRequest, CanvasError> {
        let result = self.prepare_save();
        if let Err(e) = &result {
            log::warn!("Save rejected: {}", e);
            self.status = Some(CanvasStatus::Error(e.clone()));
        }
        result
    }

    fn prepare_save(&mut self) -> Result<SaveRequest, CanvasError> {
        let CanvasMode::Persistent { school_id } = self.mode else {
            return Err(CanvasError::NotPersistent);
        };
        if !self.is_ready() {
            return Err(CanvasError::NotReady);
        }
        if !self.can_write() {
            return Err(CanvasError::PermissionDenied);
        }
        if self.save_in_flight.is_some() {
            return Err(CanvasError::SaveInProgress);
        }

        let ticket = self.ticket();
        self.save_in_flight = Some(ticket);
        Ok(SaveRequest {
            school_id,
            document: StrokeDocument::new(self.strokes.clone()),
            ticket,
            revision: self.revision,
        })
    }

    /// Apply the result of a [`SaveRequest`]. Returns whether it was applied.
    /// On failure the strokes are left untouched so the user can retry.
    pub fn finish_save(&mut self, request: &SaveRequest, result: StorageResult<()>) -> bool {
        if request.ticket != self.ticket() || self.save_in_flight != Some(request.ticket) {
            log::debug!("Discarding stale save result");
            return false;
        }
        self.save_in_flight = None;

        match result {
            Ok(()) => {
                self.saved_revision = self.saved_revision.max(request.revision);
                self.status = Some(CanvasStatus::Saved);
            }
            Err(e) => {
                log::warn!("Saving canvas for school {} failed: {}", request.school_id, e);
                self.status = Some(CanvasStatus::Error(CanvasError::from(e)));
            }
        }
        true
    }

    pub fn is_saving(&self) -> bool {
        self.save_in_flight.is_some()
    }

    /// Mount and, for a school board, load it from `adapter` in one step.
    pub async fn mount_with<S: Storage>(
        &mut self,
        adapter: &PersistenceAdapter<S>,
        membership: Option<Membership>,
        now: Timestamp,
    ) {
        if let Some(request) = self.mount(membership, now) {
            let result = adapter.load(request.school_id).await;
            self.finish_load(request.ticket, result);
        }
    }

    /// Request a save and run it against `adapter` in one step.
    pub async fn save_with<S: Storage>(
        &mut self,
        adapter: &PersistenceAdapter<S>,
        now: Timestamp,
    ) -> Result<(), CanvasError> {
        let request = self.request_save()?;
        let result = adapter.save(request.school_id, &request.document, now).await;
        let outcome = result.as_ref().map_err(|e| CanvasError::StoreUnavailable(e.to_string())).copied();
        self.finish_save(&request, result);
        outcome
    }

    /// Whether a school board has strokes that were never saved.
    pub fn has_unsaved_changes(&self) -> bool {
        matches!(self.mode, CanvasMode::Persistent { .. }) && self.revision != self.saved_revision
    }

    pub fn status(&self) -> Option<&CanvasStatus> {
        self.status.as_ref()
    }

    /// Free-form status line for the surrounding UI.
    pub fn status_text(&self) -> Option<String> {
        self.status.as_ref().map(ToString::to_string)
    }

    pub fn mode(&self) -> CanvasMode {
        self.mode
    }

    pub fn strokes(&self) -> &StrokeSet {
        &self.strokes
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn coordinate_space(&self) -> CoordinateSpace {
        self.space
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture.state()
    }

    /// Whether the surface must be redrawn.
    pub fn needs_redraw(&self) -> bool {
        self.redraw
    }

    /// Clear and return the redraw flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.redraw = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PointerButton;
    use crate::storage::{BoxFuture, MemoryStorage, StorageError, school_key};
    use crate::stroke::Stroke;
    use kurbo::Size;
    use pollster::block_on;
    use std::sync::Arc;

    const SCHOOL: SchoolId = SchoolId(7);

    fn pt(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn member() -> Option<Membership> {
        Some(Membership::of(SCHOOL))
    }

    fn ready_school(membership: Option<Membership>) -> CanvasController {
        let mut canvas = CanvasController::school(SCHOOL, &CanvasConfig::default());
        let request = canvas.mount(membership, Timestamp(0)).unwrap();
        assert!(canvas.finish_load(request.ticket, Ok(LoadOutcome::Missing)));
        canvas
    }

    fn draw(canvas: &mut CanvasController, points: &[Point], now: Timestamp) {
        canvas.begin_stroke(points[0], now);
        for p in &points[1..] {
            canvas.extend_stroke(*p);
        }
        canvas.end_stroke();
    }

    struct Unreachable;

    impl Storage for Unreachable {
        fn save(&self, _key: &str, _json: &str) -> BoxFuture<'_, StorageResult<()>> {
            Box::pin(async { Err(StorageError::Io("connection reset".to_string())) })
        }

        fn load(&self, _key: &str) -> BoxFuture<'_, StorageResult<String>> {
            Box::pin(async { Err(StorageError::Io("connection reset".to_string())) })
        }
    }

    #[test]
    fn test_non_member_cannot_draw() {
        let mut canvas = ready_school(Some(Membership::of(SchoolId(5))));

        assert!(!canvas.can_write());
        assert!(!canvas.begin_stroke(pt(1.0, 1.0), Timestamp(1)));
        assert!(canvas.strokes().is_empty());
        assert_eq!(canvas.capture_state(), CaptureState::Idle);
    }

    #[test]
    fn test_anonymous_viewer_cannot_draw() {
        let mut canvas = ready_school(None);
        assert!(!canvas.begin_stroke(pt(1.0, 1.0), Timestamp(1)));
        assert!(canvas.strokes().is_empty());
    }

    #[test]
    fn test_member_draws_exact_points() {
        let mut canvas = ready_school(member());
        let points = [pt(1.0, 1.0), pt(2.0, 3.0), pt(5.0, 8.0)];

        draw(&mut canvas, &points, Timestamp(10));

        assert_eq!(canvas.strokes().len(), 1);
        assert_eq!(canvas.strokes().iter().next().unwrap().points, points.to_vec());
        assert!(canvas.has_unsaved_changes());
        assert!(canvas.take_redraw());
        assert!(!canvas.needs_redraw());
    }

    #[test]
    fn test_input_ignored_while_loading() {
        let mut canvas = CanvasController::school(SCHOOL, &CanvasConfig::default());
        let request = canvas.mount(member(), Timestamp(0)).unwrap();

        assert!(!canvas.begin_stroke(pt(1.0, 1.0), Timestamp(1)));

        let stored = StrokeDocument::new(StrokeSet::from(vec![Stroke::from_points(
            vec![pt(0.0, 0.0), pt(1.0, 1.0)],
            Timestamp(0),
        )]));
        assert!(canvas.finish_load(request.ticket, Ok(LoadOutcome::Found(stored.clone()))));
        assert_eq!(canvas.strokes(), &stored.strokes);
        assert!(!canvas.has_unsaved_changes());
    }

    #[test]
    fn test_load_failure_degrades_to_empty_with_warning() {
        let mut canvas = CanvasController::school(SCHOOL, &CanvasConfig::default());
        let request = canvas.mount(member(), Timestamp(0)).unwrap();

        canvas.finish_load(request.ticket, Err(StorageError::Io("timeout".to_string())));

        assert!(canvas.is_ready());
        assert!(canvas.strokes().is_empty());
        assert!(matches!(
            canvas.status(),
            Some(CanvasStatus::Warning(CanvasError::StoreUnavailable(_)))
        ));
        assert!(canvas.begin_stroke(pt(1.0, 1.0), Timestamp(1)));
    }

    #[test]
    fn test_malformed_load_degrades_to_empty() {
        let mut canvas = CanvasController::school(SCHOOL, &CanvasConfig::default());
        let request = canvas.mount(member(), Timestamp(0)).unwrap();

        canvas.finish_load(
            request.ticket,
            Ok(LoadOutcome::Malformed { reason: "bad".to_string() }),
        );

        assert!(canvas.strokes().is_empty());
        assert!(matches!(
            canvas.status(),
            Some(CanvasStatus::Warning(CanvasError::MalformedDocument(_)))
        ));
    }

    #[test]
    fn test_stale_load_is_discarded() {
        let mut canvas = CanvasController::school(SCHOOL, &CanvasConfig::default());
        let stale = canvas.mount(member(), Timestamp(0)).unwrap();
        canvas.unmount();

        let stored = StrokeDocument::new(StrokeSet::from(vec![Stroke::from_points(
            vec![pt(0.0, 0.0), pt(1.0, 1.0)],
            Timestamp(0),
        )]));
        assert!(!canvas.finish_load(stale.ticket, Ok(LoadOutcome::Found(stored.clone()))));
        assert!(canvas.strokes().is_empty());

        let fresh = canvas.mount(member(), Timestamp(1)).unwrap();
        assert!(!canvas.finish_load(stale.ticket, Ok(LoadOutcome::Found(stored))));
        assert!(!canvas.is_ready());
        assert!(canvas.finish_load(fresh.ticket, Ok(LoadOutcome::Missing)));
    }

    #[test]
    fn test_save_rejected_without_membership() {
        let mut canvas = ready_school(Some(Membership::of(SchoolId(5))));

        assert_eq!(canvas.request_save().unwrap_err(), CanvasError::PermissionDenied);
        assert!(canvas.status().unwrap().is_error());
        assert!(!canvas.is_saving());
    }

    #[test]
    fn test_save_checks_membership_at_call_time() {
        let mut canvas = ready_school(member());
        draw(&mut canvas, &[pt(0.0, 0.0), pt(1.0, 1.0)], Timestamp(1));

        canvas.set_membership(None);
        assert_eq!(canvas.request_save().unwrap_err(), CanvasError::PermissionDenied);

        canvas.set_membership(member());
        assert!(canvas.request_save().is_ok());
    }

    #[test]
    fn test_second_save_while_in_flight_is_busy() {
        let mut canvas = ready_school(member());
        draw(&mut canvas, &[pt(0.0, 0.0), pt(1.0, 1.0)], Timestamp(1));

        let first = canvas.request_save().unwrap();
        assert_eq!(canvas.request_save().unwrap_err(), CanvasError::SaveInProgress);

        assert!(canvas.finish_save(&first, Ok(())));
        assert_eq!(canvas.status(), Some(&CanvasStatus::Saved));
        assert!(!canvas.has_unsaved_changes());
        assert!(canvas.request_save().is_ok());
    }

    #[test]
    fn test_strokes_drawn_during_save_stay_unsaved() {
        let mut canvas = ready_school(member());
        draw(&mut canvas, &[pt(0.0, 0.0), pt(1.0, 1.0)], Timestamp(1));

        let request = canvas.request_save().unwrap();
        draw(&mut canvas, &[pt(5.0, 5.0), pt(6.0, 6.0)], Timestamp(2));
        canvas.finish_save(&request, Ok(()));

        assert_eq!(request.document.strokes.len(), 1);
        assert!(canvas.has_unsaved_changes());
    }

    #[test]
    fn test_failed_save_keeps_strokes_for_retry() {
        let mut canvas = ready_school(member());
        draw(&mut canvas, &[pt(0.0, 0.0), pt(1.0, 1.0)], Timestamp(1));

        let request = canvas.request_save().unwrap();
        canvas.finish_save(&request, Err(StorageError::Io("disk full".to_string())));

        assert_eq!(canvas.strokes().len(), 1);
        assert!(canvas.has_unsaved_changes());
        assert!(canvas.status_text().unwrap().starts_with("Save failed"));
        assert!(canvas.request_save().is_ok());
    }

    #[test]
    fn test_save_result_after_unmount_is_discarded() {
        let mut canvas = ready_school(member());
        draw(&mut canvas, &[pt(0.0, 0.0), pt(1.0, 1.0)], Timestamp(1));

        let request = canvas.request_save().unwrap();
        canvas.unmount();

        assert!(!canvas.finish_save(&request, Ok(())));
        assert!(canvas.status().is_none());
        assert!(canvas.strokes().is_empty());
    }

    #[test]
    fn test_wall_cannot_be_saved() {
        let mut canvas = CanvasController::wall(&CanvasConfig::default());
        canvas.mount(None, Timestamp(0));
        assert_eq!(canvas.request_save().unwrap_err(), CanvasError::NotPersistent);
    }

    #[test]
    fn test_save_before_load_completes() {
        let mut canvas = CanvasController::school(SCHOOL, &CanvasConfig::default());
        canvas.mount(member(), Timestamp(0));
        assert_eq!(canvas.request_save().unwrap_err(), CanvasError::NotReady);
    }

    #[test]
    fn test_wall_is_public_and_expires() {
        let mut wall = CanvasController::wall(&CanvasConfig::default());
        assert!(wall.mount(None, Timestamp(0)).is_none());
        assert!(wall.can_write());

        draw(&mut wall, &[pt(0.0, 0.0), pt(1.0, 1.0)], Timestamp(0));
        draw(&mut wall, &[pt(2.0, 2.0), pt(3.0, 3.0)], Timestamp(3_000));

        assert!(wall.tick(Timestamp(10_200)));
        assert_eq!(wall.strokes().len(), 1);
        assert_eq!(wall.strokes().iter().next().unwrap().created_at, Timestamp(3_000));
        assert!(!wall.has_unsaved_changes());
    }

    #[test]
    fn test_wall_tick_boundaries() {
        let mut wall = CanvasController::wall(&CanvasConfig::default());
        wall.mount(None, Timestamp(0));
        draw(&mut wall, &[pt(0.0, 0.0), pt(1.0, 1.0)], Timestamp(1_000));

        assert!(wall.tick(Timestamp(10_500)));
        assert_eq!(wall.strokes().len(), 1);

        assert!(wall.tick(Timestamp(11_500)));
        assert!(wall.strokes().is_empty());
    }

    #[test]
    fn test_long_gesture_can_expire_mid_draw() {
        let mut wall = CanvasController::wall(&CanvasConfig::default());
        wall.mount(None, Timestamp(0));

        wall.begin_stroke(pt(0.0, 0.0), Timestamp(0));
        wall.extend_stroke(pt(1.0, 1.0));
        assert!(wall.tick(Timestamp(10_000)));
        assert!(wall.strokes().is_empty());

        assert!(!wall.extend_stroke(pt(2.0, 2.0)));
        assert!(matches!(wall.capture_state(), CaptureState::Active { .. }));
        wall.end_stroke();
        assert!(wall.begin_stroke(pt(3.0, 3.0), Timestamp(10_100)));
    }

    #[test]
    fn test_school_board_never_expires() {
        let mut canvas = ready_school(member());
        draw(&mut canvas, &[pt(0.0, 0.0), pt(1.0, 1.0)], Timestamp(0));

        assert!(canvas.next_deadline().is_none());
        assert!(!canvas.tick(Timestamp(3_600_000)));
        assert_eq!(canvas.strokes().len(), 1);
    }

    #[test]
    fn test_unmount_stops_timer_and_discards() {
        let mut wall = CanvasController::wall(&CanvasConfig::default());
        wall.mount(None, Timestamp(0));
        draw(&mut wall, &[pt(0.0, 0.0), pt(1.0, 1.0)], Timestamp(0));

        wall.unmount();
        assert!(wall.next_deadline().is_none());
        assert!(wall.strokes().is_empty());
        assert!(!wall.tick(Timestamp(20_000)));
        assert!(!wall.begin_stroke(pt(0.0, 0.0), Timestamp(20_000)));
    }

    #[test]
    fn test_pointer_events_map_into_logical_space() {
        let mut canvas = ready_school(member());
        canvas.resize(Viewport::new(Size::new(450.0, 260.0), 2.0));

        let now = Timestamp(1);
        canvas.handle_pointer(
            PointerEvent::Down { position: pt(45.0, 26.0), button: PointerButton::Primary },
            now,
        );
        canvas.handle_pointer(PointerEvent::Move { position: pt(90.0, 52.0) }, now);
        canvas.handle_pointer(
            PointerEvent::Up { position: pt(90.0, 52.0), button: PointerButton::Primary },
            now,
        );
        canvas.handle_pointer(PointerEvent::Move { position: pt(100.0, 100.0) }, now);

        let stroke = canvas.strokes().iter().next().unwrap();
        assert_eq!(stroke.points, vec![pt(90.0, 52.0), pt(180.0, 104.0)]);
        assert_eq!(canvas.capture_state(), CaptureState::Idle);
    }

    #[test]
    fn test_secondary_button_does_not_draw() {
        let mut wall = CanvasController::wall(&CanvasConfig::default());
        wall.mount(None, Timestamp(0));
        wall.resize(Viewport::new(Size::new(800.0, 600.0), 1.0));

        wall.handle_pointer(
            PointerEvent::Down { position: pt(5.0, 5.0), button: PointerButton::Secondary },
            Timestamp(0),
        );
        assert!(wall.strokes().is_empty());
    }

    #[test]
    fn test_cancel_ends_stroke_and_keeps_points() {
        let mut wall = CanvasController::wall(&CanvasConfig::default());
        wall.mount(None, Timestamp(0));
        wall.resize(Viewport::new(Size::new(800.0, 600.0), 1.0));

        let now = Timestamp(1);
        wall.handle_pointer(
            PointerEvent::Down { position: pt(5.0, 5.0), button: PointerButton::Primary },
            now,
        );
        wall.handle_pointer(PointerEvent::Move { position: pt(795.0, 300.0) }, now);
        assert!(!wall.handle_pointer(PointerEvent::Cancel, now));
        assert_eq!(wall.capture_state(), CaptureState::Idle);

        // Moves after the cursor comes back do not reopen the stroke.
        assert!(!wall.handle_pointer(PointerEvent::Move { position: pt(400.0, 300.0) }, now));
        let stroke = wall.strokes().iter().next().unwrap();
        assert_eq!(stroke.points, vec![pt(5.0, 5.0), pt(795.0, 300.0)]);
    }

    #[test]
    fn test_resize_requests_redraw_without_remapping() {
        let mut wall = CanvasController::wall(&CanvasConfig::default());
        wall.mount(None, Timestamp(0));
        draw(&mut wall, &[pt(700.0, 500.0), pt(750.0, 550.0)], Timestamp(0));
        wall.take_redraw();

        wall.resize(Viewport::new(Size::new(400.0, 300.0), 2.0));
        assert!(wall.take_redraw());
        assert_eq!(
            wall.strokes().iter().next().unwrap().points,
            vec![pt(700.0, 500.0), pt(750.0, 550.0)]
        );

        wall.resize(Viewport::new(Size::new(400.0, 300.0), 2.0));
        assert!(!wall.needs_redraw());
    }

    #[test]
    fn test_round_trip_through_adapter() {
        let adapter = PersistenceAdapter::new(Arc::new(MemoryStorage::new()));

        let mut first = CanvasController::school(SCHOOL, &CanvasConfig::default());
        block_on(first.mount_with(&adapter, member(), Timestamp(0)));
        draw(&mut first, &[pt(0.0, 0.0), pt(4.0, 4.0)], Timestamp(5));
        draw(&mut first, &[pt(9.0, 9.0)], Timestamp(6));
        block_on(first.save_with(&adapter, Timestamp(7))).unwrap();
        let drawn = first.strokes().clone();
        first.unmount();

        let mut second = CanvasController::school(SCHOOL, &CanvasConfig::default());
        block_on(second.mount_with(&adapter, None, Timestamp(8)));
        assert_eq!(second.strokes(), &drawn);
        assert!(!second.can_write());
    }

    #[test]
    fn test_unsaved_strokes_are_lost_on_unmount() {
        let adapter = PersistenceAdapter::new(Arc::new(MemoryStorage::new()));

        let mut canvas = CanvasController::school(SCHOOL, &CanvasConfig::default());
        block_on(canvas.mount_with(&adapter, member(), Timestamp(0)));
        draw(&mut canvas, &[pt(0.0, 0.0), pt(4.0, 4.0)], Timestamp(5));
        canvas.unmount();

        block_on(canvas.mount_with(&adapter, member(), Timestamp(10)));
        assert!(canvas.strokes().is_empty());
        assert!(adapter.storage().is_empty().unwrap());
    }

    #[test]
    fn test_malformed_stored_document_via_adapter() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert_raw(&school_key(SCHOOL), "{\"strokes\": 12}").unwrap();
        let adapter = PersistenceAdapter::new(storage);

        let mut canvas = CanvasController::school(SCHOOL, &CanvasConfig::default());
        block_on(canvas.mount_with(&adapter, member(), Timestamp(0)));

        assert!(canvas.is_ready());
        assert!(canvas.strokes().is_empty());
        assert!(canvas.begin_stroke(pt(1.0, 1.0), Timestamp(1)));
    }

    #[test]
    fn test_save_with_unreachable_store() {
        let adapter = PersistenceAdapter::new(Arc::new(Unreachable));

        let mut canvas = CanvasController::school(SCHOOL, &CanvasConfig::default());
        block_on(canvas.mount_with(&adapter, member(), Timestamp(0)));
        draw(&mut canvas, &[pt(0.0, 0.0), pt(4.0, 4.0)], Timestamp(5));

        let err = block_on(canvas.save_with(&adapter, Timestamp(6))).unwrap_err();
        assert!(matches!(err, CanvasError::StoreUnavailable(_)));
        assert_eq!(canvas.strokes().len(), 1);
        assert!(!canvas.is_saving());
    }
}
