//! Per-millisecond sequence counter.

use std::{thread, time::Duration};

use crate::clock::TimeSource;
use crate::config::SequenceStart;
use crate::error::Error;
use crate::generator::RandSource;
use crate::id::MAX_SEQUENCE;

/// Pause between clock reads while waiting out an exhausted millisecond.
pub const OVERFLOW_BACKOFF: Duration = Duration::from_micros(100);

/// Tracks the last issued timestamp and the sequence value used within it.
///
/// At most `MAX_SEQUENCE + 1` values are handed out per millisecond. When a millisecond is
/// exhausted, [`advance`](Self::advance) blocks until the clock reaches the next one. A timestamp
/// earlier than the last issued one is rejected without touching the state.
///
/// The counter is not synchronized; callers sharing it across threads must serialize access, as
/// [`SyncGenerator`](crate::SyncGenerator) does.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct SequenceCounter {
    last_timestamp_ms: u64,
    sequence: u8,
}

impl SequenceCounter {
    /// Creates a counter in the `(0, 0)` state.
    pub const fn new() -> Self {
        Self {
            last_timestamp_ms: 0,
            sequence: 0,
        }
    }

    /// Returns the timestamp of the most recent successful advance.
    pub const fn last_timestamp_ms(&self) -> u64 {
        self.last_timestamp_ms
    }

    /// Returns the sequence value of the most recent successful advance.
    pub const fn sequence(&self) -> u8 {
        self.sequence
    }

    /// Moves the counter to `now_ms` and returns the `(timestamp, sequence)` pair to encode.
    ///
    /// - `now_ms` earlier than the last timestamp fails with [`Error::ClockRollback`].
    /// - `now_ms` equal to the last timestamp increments the sequence. If that exhausts the
    ///   millisecond, `clock` is polled until it passes the last timestamp and the sequence
    ///   restarts at zero for the new tick.
    /// - `now_ms` later than the last timestamp starts a new millisecond with a sequence chosen by
    ///   `start`.
    pub fn advance<T: TimeSource, R: RandSource>(
        &mut self,
        now_ms: u64,
        start: SequenceStart,
        clock: &mut T,
        rng: &mut R,
    ) -> Result<(u64, u8), Error> {
        if now_ms < self.last_timestamp_ms {
            tracing::warn!(
                last_ms = self.last_timestamp_ms,
                now_ms,
                "clock moved backwards, refusing to generate"
            );
            return Err(Error::ClockRollback {
                last_ms: self.last_timestamp_ms,
                now_ms,
            });
        }

        if now_ms == self.last_timestamp_ms {
            if self.sequence < MAX_SEQUENCE {
                self.sequence += 1;
            } else {
                tracing::trace!(
                    last_ms = self.last_timestamp_ms,
                    "sequence exhausted, waiting for next millisecond"
                );
                self.last_timestamp_ms = wait_for_next_tick(self.last_timestamp_ms, clock);
                self.sequence = 0;
            }
        } else {
            self.last_timestamp_ms = now_ms;
            self.sequence = match start {
                SequenceStart::Random => (rng.next_u32() & u32::from(MAX_SEQUENCE)) as u8,
                SequenceStart::Zero => 0,
            };
        }

        Ok((self.last_timestamp_ms, self.sequence))
    }
}

/// Polls `clock` until it reads later than `last_ms`, sleeping between reads.
fn wait_for_next_tick<T: TimeSource>(last_ms: u64, clock: &mut T) -> u64 {
    loop {
        let now_ms = clock.unix_ts_ms();
        if now_ms > last_ms {
            return now_ms;
        }
        thread::sleep(OVERFLOW_BACKOFF);
    }
}
