//! Wall-clock heartbeat deadline.
//!
//! The deadline is measured in elapsed time, not in poll cycles, so the
//! heartbeat cadence does not depend on the poll interval. Any digital
//! activity pushes the deadline out by a full interval.
//!
//! ```text
//! interval = 10s
//!
//! t=0        t=1 (DI change)                 t=11
//! |----------|-------------------------------|
//!            reset: due = 1 + 10             heartbeat fires
//! ```

use std::time::Duration;
use tokio::time::Instant;

/// When the next heartbeat is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatDeadline {
    interval: Duration,
    due: Instant,
}

impl HeartbeatDeadline {
    /// First heartbeat due one interval after `now`.
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            due: now + interval,
        }
    }

    /// Push the deadline to one interval after `now`.
    pub fn reset(&mut self, now: Instant) {
        self.due = now + self.interval;
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.due
    }

    /// If the deadline has passed, re-arm it and return `true`.
    ///
    /// At most one heartbeat is reported per call, however late the caller
    /// is, so a stalled loop does not produce a burst on recovery.
    pub fn fire(&mut self, now: Instant) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.reset(now);
        true
    }

    pub fn due(&self) -> Instant {
        self.due
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
