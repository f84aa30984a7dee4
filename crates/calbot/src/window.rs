//! Per-tick notify window.
//!
//! Boundaries are aligned to multiples of the interval since the Unix epoch,
//! so a 10 minute interval ticks at :00, :10, :20 ... of every hour. The
//! configured `start_time_of_day` plays no part here.

use std::time::Duration;

use chrono::{DateTime, DurationRound, TimeDelta, TimeZone, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyWindow {
    pub now: DateTime<Utc>,
    pub next: DateTime<Utc>,
}

impl NotifyWindow {
    /// Window from `now` to the next interval boundary strictly after the
    /// truncated `now`.
    pub fn starting_at(
        now: DateTime<Utc>,
        interval: TimeDelta,
    ) -> Result<Self, chrono::RoundingError> {
        let next = now.duration_trunc(interval)? + interval;
        Ok(Self { now, next })
    }

    /// Whether an event starting at `start` is due this tick.
    ///
    /// Both ends are inclusive and compared at whole-second precision.
    pub fn contains<Tz: TimeZone>(&self, start: &DateTime<Tz>) -> bool {
        let start = start.timestamp();
        self.now.timestamp() <= start && start <= self.next.timestamp()
    }

    /// Time left until `next`, measured from `now`. Zero once passed.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.next - now).to_std().unwrap_or(Duration::ZERO)
    }
}
