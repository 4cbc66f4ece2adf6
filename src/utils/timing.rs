//! Timing helpers.
//!
//! Probe results report whole milliseconds; these helpers keep the rounding in
//! one place.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Converts a duration to whole milliseconds, saturating at `u64::MAX`.
pub fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Milliseconds elapsed since `start`.
pub fn elapsed_ms(start: Instant) -> u64 {
    duration_to_ms(start.elapsed())
}

/// Whole days from `now` until `deadline`, rounded down.
///
/// Rounds toward negative infinity so that anything already past reads as
/// negative: an expiry one hour ago is -1, not 0.
pub fn days_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (deadline - now).num_seconds().div_euclid(86_400)
}
