//! Injectable time source for the periodic driver.

use peershare_types::Timestamp;
use std::time::Duration;

/// Where the driver gets the current time. Swapped out in tests so cycle
/// scheduling can be exercised without real delays.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Time until the next tick-interval boundary after `now`.
///
/// Cycles run on multiples of the interval measured from the epoch, so
/// nodes started at different times still tick at the same moments.
pub fn next_tick_delay(now: Timestamp, interval: Duration) -> Duration {
    let interval_ms = interval.as_millis() as i64;
    if interval_ms <= 0 {
        return Duration::ZERO;
    }
    let now_ms = now.as_millis();
    let next = (now_ms / interval_ms + 1) * interval_ms;
    Duration::from_millis((next - now_ms) as u64)
}
