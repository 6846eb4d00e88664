//! Interval-driven pruning of aged strokes on the public wall.

use crate::stroke::{StrokeSet, Timestamp};
use std::time::Duration;

/// Default stroke lifetime on the wall.
pub const DEFAULT_STROKE_TTL: Duration = Duration::from_secs(10);

/// Default polling interval.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Polls on a fixed interval and drops strokes older than the TTL.
///
/// One deadline for the whole set, not one timer per stroke. Age is measured
/// from when a stroke began, so a gesture held longer than the TTL expires
/// while still being drawn.
#[derive(Debug, Clone)]
pub struct ExpiryScheduler {
    ttl: Duration,
    interval: Duration,
    next_tick: Option<Timestamp>,
}

impl Default for ExpiryScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_STROKE_TTL, DEFAULT_TICK_INTERVAL)
    }
}

impl ExpiryScheduler {
    /// Create a stopped scheduler. A zero interval is clamped to 1ms.
    pub fn new(ttl: Duration, interval: Duration) -> Self {
        Self {
            ttl,
            interval: interval.max(Duration::from_millis(1)),
            next_tick: None,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Arm the scheduler; the first tick is due one interval from `now`.
    pub fn start(&mut self, now: Timestamp) {
        self.next_tick = Some(now.after(self.interval));
    }

    pub fn stop(&mut self) {
        self.next_tick = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    /// When the next tick is due, if running.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.next_tick
    }

    /// Whether a tick is due at `now`. When it is, the deadline advances by
    /// one interval; ticks missed while the host was asleep collapse into one.
    pub fn poll(&mut self, now: Timestamp) -> bool {
        let Some(deadline) = self.next_tick else {
            return false;
        };
        if now < deadline {
            return false;
        }

        let mut next = deadline.after(self.interval);
        if next <= now {
            next = now.after(self.interval);
        }
        self.next_tick = Some(next);
        true
    }

    /// Drop strokes whose age at `now` is at least the TTL.
    /// Returns the number dropped.
    pub fn prune(&self, strokes: &mut StrokeSet, now: Timestamp) -> usize {
        strokes.retain(|s| s.age(now) < self.ttl)
    }

    /// Poll and prune in one step. Returns `Some(dropped)` if a tick ran.
    pub fn tick(&mut self, strokes: &mut StrokeSet, now: Timestamp) -> Option<usize> {
        if !self.poll(now) {
            return None;
        }
        let dropped = self.prune(strokes, now);
        if dropped > 0 {
            log::debug!("Expired {} stroke(s), {} remaining", dropped, strokes.len());
        }
        Some(dropped)
    }
}
