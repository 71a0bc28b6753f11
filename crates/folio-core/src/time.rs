//! Wall-clock helpers.
//!
//! Folio timestamps are Unix milliseconds as `i64`; storage renewal is
//! measured in whole epochs as `u64`.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time in Unix milliseconds.
///
/// Returns 0 if the system clock is set before the Unix epoch.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
