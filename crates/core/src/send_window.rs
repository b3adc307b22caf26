//! Time-of-day send windows.
//!
//! A due firing outside its rule's window is deferred to a later tick, never
//! dropped. Bounds are wall-clock times in the engine's fixed offset.

use chrono::{Duration, FixedOffset, NaiveTime, TimeZone, Utc};

use crate::types::Timestamp;

/// Half-open `[start, end)` range of local times.
///
/// `start > end` wraps midnight (`22:00..06:00`); `start == end` is always
/// open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl SendWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Build from the optional stored bounds. A missing start means
    /// midnight, a missing end means "until midnight"; no bounds at all
    /// means no window.
    pub fn from_bounds(start: Option<NaiveTime>, end: Option<NaiveTime>) -> Option<Self> {
        match (start, end) {
            (None, None) => None,
            (start, end) => Some(Self::new(
                start.unwrap_or(NaiveTime::MIN),
                end.unwrap_or(NaiveTime::MIN),
            )),
        }
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start == self.end {
            return true;
        }
        if self.start < self.end {
            time >= self.start && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }

    /// Whether `now` falls inside the window in `offset`.
    pub fn is_open(&self, now: Timestamp, offset: FixedOffset) -> bool {
        self.contains(now.with_timezone(&offset).time())
    }

    /// The next instant the window opens, `now` itself when already open.
    pub fn next_opening(&self, now: Timestamp, offset: FixedOffset) -> Timestamp {
        if self.is_open(now, offset) {
            return now;
        }
        let local = now.with_timezone(&offset);
        let today = local.date_naive();
        [today, today + Duration::days(1)]
            .into_iter()
            .filter_map(|date| offset.from_local_datetime(&date.and_time(self.start)).single())
            .map(|at| at.with_timezone(&Utc))
            .find(|at| *at > now)
            .unwrap_or(now)
    }
}
