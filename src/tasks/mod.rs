pub mod acquisition;
pub mod gps_feed;

use embassy_time::Instant;

/// Monotonic clock in the wrapping u32 millisecond domain the drivers use.
pub fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}
