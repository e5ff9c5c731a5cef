//! Wall-clock helpers. The tracker stores unix-second timestamps.
use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time in seconds.
///
/// # Panics
///
/// Will panic if the system clock is set before the unix epoch.
#[must_use]
pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("the system clock should be set after the unix epoch")
        .as_secs()
}
