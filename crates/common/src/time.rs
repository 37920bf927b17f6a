//! Unix-seconds helpers. Timestamps travel on the wire as `i64` seconds.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as unix seconds.
///
/// A clock before the epoch maps to 0 rather than panicking.
#[must_use]
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
