//! Daily time-of-day windows and the containment check that decides whether
//! "now" falls inside one.
//!
//! All comparisons happen on bare hour/minute clock components within a
//! single synthetic day: no dates, no timezones. A window whose start lies
//! after its end wraps past midnight (e.g. 22:00–06:00).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WindowError;

/// A wall-clock time of day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClockTime {
    pub hour: u8,
    pub minute: u8,
}

impl ClockTime {
    /// Minutes since midnight (0–1439). The containment check compares these.
    pub const fn minute_of_day(self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ClockTime {
    type Err = WindowError;

    /// Parses `"HH:MM"`. Leading zeroes are optional, so `"9:30"` is accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hour, minute) = s
            .split_once(':')
            .ok_or_else(|| WindowError::Format(s.to_string()))?;
        let hour: u32 = hour
            .trim()
            .parse()
            .map_err(|_| WindowError::Format(s.to_string()))?;
        let minute: u32 = minute
            .trim()
            .parse()
            .map_err(|_| WindowError::Format(s.to_string()))?;
        if hour > 23 {
            return Err(WindowError::Hour(hour));
        }
        if minute > 59 {
            return Err(WindowError::Minute(minute));
        }
        Ok(ClockTime {
            hour: hour as u8,
            minute: minute as u8,
        })
    }
}

/// A window as written in configuration: raw `"HH:MM"` boundary strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSpec {
    pub start: String,
    pub end: String,
}

/// A validated daily window.
///
/// Built from a [`WindowSpec`] when a config is installed; immutable
/// afterwards. Replacing the engine's config re-parses every window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl TimeWindow {
    /// Parse and range-check both boundaries of `spec`.
    pub fn from_spec(spec: &WindowSpec) -> Result<Self, WindowError> {
        Ok(Self {
            start: spec.start.parse()?,
            end: spec.end.parse()?,
        })
    }

    /// Decide where `now` sits relative to this window.
    ///
    /// Boundary policy:
    /// - `start == end`: reports `started = true` and never `ended = true`.
    ///   Such a window never closes through this check alone; closing it is
    ///   the scheduler's business (in practice, shutdown).
    /// - `start < end` (same-day window): `started` once `now >= start`,
    ///   `ended` once `now >= end`.
    /// - `start > end` (wraps past midnight): `ended` once `now >= end`;
    ///   `started` while `now >= start` or `now < end` — inside the evening
    ///   half, or still inside yesterday's morning half. Whenever this case
    ///   reports `started` it forces `ended = false`, so both flags are
    ///   never set together.
    pub fn status_at(&self, now: ClockTime) -> WindowStatus {
        let start = self.start.minute_of_day();
        let end = self.end.minute_of_day();
        let now = now.minute_of_day();

        if start == end {
            return WindowStatus {
                started: true,
                ended: false,
            };
        }
        if start < end {
            return WindowStatus {
                started: now >= start,
                ended: now >= end,
            };
        }
        let ended = now >= end;
        if now >= start || !ended {
            WindowStatus {
                started: true,
                ended: false,
            }
        } else {
            WindowStatus {
                started: false,
                ended: true,
            }
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Result of a containment check: which boundaries `now` has crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowStatus {
    /// `now` has reached or passed the window's start boundary.
    pub started: bool,
    /// `now` has reached or passed the window's end boundary.
    pub ended: bool,
}
