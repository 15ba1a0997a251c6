//! Market and session conventions shared across stages.
//!
//! The tape stamps trades in exchange time five hours ahead of the
//! reference clock, buckets are aligned to wall-clock boundaries, and
//! moneyness is quoted as simple strike over underlying.

use chrono::{DurationRound, NaiveDate, NaiveDateTime, TimeDelta};

/// Fixed shift applied to every tape timestamp (exchange → reference clock).
pub const TAPE_SHIFT_HOURS: i64 = -5;

/// Simple moneyness: m = K / S.
pub fn moneyness(strike: f64, underlying: f64) -> f64 {
    strike / underlying
}

/// Apply the fixed tape shift to a parsed timestamp.
pub fn shift_to_reference(ts: NaiveDateTime) -> NaiveDateTime {
    ts + TimeDelta::hours(TAPE_SHIFT_HOURS)
}

/// Truncate `ts` down to a multiple of `width_secs` counted from the Unix
/// epoch, so 5-minute buckets start at :00, :05, :10, … regardless of the
/// first trade's time.
///
/// Returns `None` for a zero width or an out-of-range timestamp.
pub fn bucket_floor(ts: NaiveDateTime, width_secs: u32) -> Option<NaiveDateTime> {
    if width_secs == 0 {
        return None;
    }
    ts.duration_trunc(TimeDelta::seconds(i64::from(width_secs))).ok()
}

/// Whole calendar days from `reference` to `expiration`.
pub fn days_between(reference: NaiveDate, expiration: NaiveDate) -> i64 {
    (expiration - reference).num_days()
}
