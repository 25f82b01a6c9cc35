//! QSH timestamps are counts of 100-nanosecond ticks since `0001-01-01
//! 00:00:00`. The source divides by 10 to get microseconds, which is the
//! precision we keep; timezone conversion is a caller policy, not ours
//! (see the PURPOSE & SCOPE non-goals).

use chrono::NaiveDateTime;

const TICKS_PER_MICROSECOND: i64 = 10;
const MILLIS_PER_TICK_GROUP: i64 = 1000;

fn epoch() -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(1, 1, 1)
        .expect("0001-01-01 is a valid proleptic Gregorian date")
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
}

/// A QSH timestamp, reconstructed at microsecond resolution.
pub type Timestamp = NaiveDateTime;

/// Converts a count of 100-nanosecond ticks since `0001-01-01` into a
/// [`Timestamp`].
pub fn from_ticks_100ns(ticks: i64) -> Timestamp {
    epoch() + chrono::Duration::microseconds(ticks / TICKS_PER_MICROSECOND)
}

/// Converts a [`Timestamp`] back into milliseconds since `0001-01-01`, the
/// unit the growing-delta frame and record timestamps are encoded in.
pub fn to_millis(ts: Timestamp) -> i64 {
    let delta = ts - epoch();
    delta.num_milliseconds()
}

/// Converts a millisecond count since `0001-01-01` into a [`Timestamp`].
pub fn from_millis(millis: i64) -> Timestamp {
    epoch() + chrono::Duration::milliseconds(millis)
}
