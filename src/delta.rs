//! The delta codec: `relative` and `growing` deltas layered over the
//! primitive LEB128 reads, plus the growing-delta millisecond timestamp
//! used for frame headers and several per-record datetime fields.

use crate::error::Result;
use crate::primitive::Reader;

/// The escape sentinel in a growing-delta stream: when the raw ULEB128
/// value equals this, the real (possibly negative) delta follows as a
/// signed LEB128 instead.
pub(crate) const GROWING_SENTINEL: u64 = 0x0FFF_FFFF;

/// Reads a signed LEB128 delta and adds it to `last`.
pub(crate) fn relative(r: &mut Reader, last: i64) -> Result<i64> {
    Ok(last + r.leb128()?)
}

/// Reads an unsigned LEB128 delta and adds it to `last`, unless the delta is
/// the [`GROWING_SENTINEL`] escape value, in which case a signed LEB128
/// correction follows instead.
pub(crate) fn growing(r: &mut Reader, last: i64) -> Result<i64> {
    let delta = r.uleb128()?;
    if delta == GROWING_SENTINEL {
        Ok(last + r.leb128()?)
    } else {
        Ok(last + delta as i64)
    }
}

/// [`growing`] specialized to a running millisecond counter (frame
/// timestamps, and several record-level datetime fields).
pub(crate) fn growing_millis(r: &mut Reader, last_ms: i64) -> Result<i64> {
    growing(r, last_ms)
}
