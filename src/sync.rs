//! Thread-safe wrapper around [`Generator`].

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::clock::{StdSystemTime, TimeSource};
use crate::error::Error;
use crate::generator::{Generator, RandSource};
use crate::node::NodeIdentity;
use crate::SnowflakeId;

/// A [`Generator`] that can be shared between threads.
///
/// Every call reads the clock, advances the counter, and packs the result while holding one lock,
/// so concurrent callers never observe or produce a half-updated `(timestamp, sequence)` pair.
///
/// # Examples
///
/// ```rust
/// use snowgen::{Generator, SyncGenerator};
/// use std::{sync, thread};
///
/// let g = sync::Arc::new(SyncGenerator::new(Generator::with_rand08(rand::rngs::OsRng)));
/// thread::scope(|s| {
///     for i in 0..4 {
///         let g = sync::Arc::clone(&g);
///         s.spawn(move || {
///             for _ in 0..8 {
///                 println!("{} by thread {}", g.generate().unwrap(), i);
///                 thread::yield_now();
///             }
///         });
///     }
/// });
/// ```
#[derive(Debug)]
pub struct SyncGenerator<R, T = StdSystemTime> {
    inner: Mutex<Generator<R, T>>,
}

impl<R: RandSource, T: TimeSource> SyncGenerator<R, T> {
    /// Wraps `generator` in a lock.
    pub const fn new(generator: Generator<R, T>) -> Self {
        Self {
            inner: Mutex::new(generator),
        }
    }

    /// Generates a new identifier from the current timestamp.
    ///
    /// See [`Generator::generate`].
    pub fn generate(&self) -> Result<SnowflakeId, Error> {
        self.lock().generate()
    }

    /// Generates a new identifier from the `unix_ts_ms` passed.
    ///
    /// See [`Generator::generate_core`].
    pub fn generate_core(&self, unix_ts_ms: u64) -> Result<SnowflakeId, Error> {
        self.lock().generate_core(unix_ts_ms)
    }

    /// Returns the node identity embedded in every identifier.
    pub fn identity(&self) -> NodeIdentity {
        self.lock().identity()
    }

    /// Unwraps the inner generator.
    pub fn into_inner(self) -> Generator<R, T> {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // The counter never holds a torn state, so a panic in another holder is safe to ignore.
    fn lock(&self) -> MutexGuard<'_, Generator<R, T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R: RandSource, T: TimeSource> From<Generator<R, T>> for SyncGenerator<R, T> {
    fn from(generator: Generator<R, T>) -> Self {
        Self::new(generator)
    }
}

#[cfg(test)]
mod tests {
    use super::SyncGenerator;
    use crate::generator::with_rand08::Adapter;
    use crate::test_util::TickingClock;
    use crate::{Config, Generator};
    use std::{collections::HashSet, sync::mpsc, thread};

    const TS: u64 = 1_483_200_000_000 + 0x0123_4567;

    /// Generates no duplicate ids under multithreading
    #[test]
    fn generates_no_duplicate_ids_under_multithreading() {
        let g = SyncGenerator::new(
            Generator::with_config_and_time_source(
                &Config::default(),
                Adapter(rand::rngs::OsRng),
                TickingClock::new(TS, 4),
            )
            .unwrap(),
        );

        let (tx, rx) = mpsc::channel();
        thread::scope(|s| {
            for _ in 0..4 {
                let tx = tx.clone();
                let g = &g;
                s.spawn(move || {
                    let mut prev = None;
                    for _ in 0..2_000 {
                        let id = g.generate().unwrap();
                        // each thread sees its own ids in increasing order
                        assert!(prev < Some(id));
                        prev = Some(id);
                        tx.send(id).unwrap();
                    }
                });
            }
        });
        drop(tx);

        let s: HashSet<_> = rx.iter().collect();
        assert_eq!(s.len(), 4 * 2_000);
    }

    /// Reports the same identity from every thread
    #[test]
    fn reports_the_same_identity_from_every_thread() {
        let g = SyncGenerator::from(Generator::with_rand08(rand::rngs::OsRng));
        let expected = g.identity();
        thread::scope(|s| {
            for _ in 0..4 {
                let g = &g;
                s.spawn(move || {
                    for _ in 0..100 {
                        let id = g.generate().unwrap();
                        assert_eq!(id.machine_id(), expected.machine_id());
                        assert_eq!(id.process_id(), expected.process_id());
                    }
                });
            }
        });
        assert_eq!(g.into_inner().identity(), expected);
    }
}
