//! Wall-clock time sources.

use std::time;

/// A trait that defines the minimum system clock interface for [`Generator`].
///
/// [`Generator`]: crate::Generator
pub trait TimeSource {
    /// Returns the current Unix time in milliseconds.
    fn unix_ts_ms(&mut self) -> u64;
}

/// The default [`TimeSource`] that uses [`std::time::SystemTime`].
///
/// A system clock set before the Unix epoch reads as zero, which the generator then reports as
/// a clock rollback or a timestamp overflow rather than panicking.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct StdSystemTime;

impl TimeSource for StdSystemTime {
    fn unix_ts_ms(&mut self) -> u64 {
        time::SystemTime::now()
            .duration_since(time::UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as u64)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &mut T {
    fn unix_ts_ms(&mut self) -> u64 {
        (**self).unix_ts_ms()
    }
}
