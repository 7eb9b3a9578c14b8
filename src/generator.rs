//! Snowflake generator and related types.

use crate::clock::{StdSystemTime, TimeSource};
use crate::config::{Config, SequenceStart, DEFAULT_EPOCH_OFFSET_MS};
use crate::error::Error;
use crate::node::NodeIdentity;
use crate::sequence::SequenceCounter;
use crate::SnowflakeId;

pub mod with_rand08;

/// A trait that defines the minimum random number generator interface for [`Generator`].
pub trait RandSource {
    /// Returns the next random `u32`.
    fn next_u32(&mut self) -> u32;
}

impl<R: RandSource + ?Sized> RandSource for &mut R {
    fn next_u32(&mut self) -> u32 {
        (**self).next_u32()
    }
}

/// Represents a snowflake generator that owns a node identity and a sequence counter.
///
/// This type provides the interface to customize the random number generator, system clock,
/// epoch offset, and node identity of a generator. It is a plain `&mut self` value; share one
/// across threads through [`SyncGenerator`](crate::SyncGenerator) or an equivalent lock so that
/// every advance of the counter happens inside a single critical section.
///
/// # Examples
///
/// ```rust
/// use snowgen::generator::with_rand08::Adapter;
/// use snowgen::{Config, Generator};
///
/// let config = Config::default().with_machine_id(3);
/// let mut g = Generator::with_config(&config, Adapter(rand::rngs::OsRng))?;
/// let id = g.generate()?;
/// assert_eq!(id.machine_id(), 3);
/// # Ok::<(), snowgen::Error>(())
/// ```
///
/// # Generator functions
///
/// | Method            | Timestamp | On clock rollback          |
/// | ----------------- | --------- | -------------------------- |
/// | [`generate`]      | Now       | Returns `ClockRollback`    |
/// | [`generate_core`] | Argument  | Returns `ClockRollback`    |
///
/// Both block for up to about a millisecond when the current millisecond's sequence values are
/// used up, and neither retries on failure.
///
/// [`generate`]: Generator::generate
/// [`generate_core`]: Generator::generate_core
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Generator<R, T = StdSystemTime> {
    counter: SequenceCounter,
    identity: NodeIdentity,
    epoch_offset_ms: u64,
    sequence_start: SequenceStart,

    /// The random number generator used by the generator.
    rng: R,

    /// The system clock used by the generator.
    time_source: T,
}

impl<R: RandSource> Generator<R> {
    /// Creates a generator with the default configuration and the system clock, deriving the node
    /// identity from the host name and process id.
    pub fn new(rng: R) -> Self {
        Self::with_identity_and_time_source(
            NodeIdentity::detect(),
            DEFAULT_EPOCH_OFFSET_MS,
            SequenceStart::default(),
            rng,
            StdSystemTime,
        )
    }

    /// Creates a generator from `config` with the system clock.
    pub fn with_config(config: &Config, rng: R) -> Result<Self, Error> {
        Self::with_config_and_time_source(config, rng, StdSystemTime)
    }
}

impl<R: RandSource + Default> Default for Generator<R> {
    fn default() -> Self {
        Self::new(R::default())
    }
}

impl<R: RandSource, T: TimeSource> Generator<R, T> {
    /// Creates a generator from `config` with a specified clock.
    pub fn with_config_and_time_source(
        config: &Config,
        rng: R,
        time_source: T,
    ) -> Result<Self, Error> {
        Ok(Self::with_identity_and_time_source(
            config.node_identity()?,
            config.epoch_offset_ms(),
            config.sequence_start(),
            rng,
            time_source,
        ))
    }

    const fn with_identity_and_time_source(
        identity: NodeIdentity,
        epoch_offset_ms: u64,
        sequence_start: SequenceStart,
        rng: R,
        time_source: T,
    ) -> Self {
        Self {
            counter: SequenceCounter::new(),
            identity,
            epoch_offset_ms,
            sequence_start,
            rng,
            time_source,
        }
    }

    /// Returns the node identity embedded in every identifier.
    pub const fn identity(&self) -> NodeIdentity {
        self.identity
    }

    /// Returns the epoch offset elapsed time is measured from.
    pub const fn epoch_offset_ms(&self) -> u64 {
        self.epoch_offset_ms
    }

    /// Generates a new identifier from the current timestamp.
    ///
    /// See the [`Generator`] type documentation for the description.
    pub fn generate(&mut self) -> Result<SnowflakeId, Error> {
        let unix_ts_ms = self.time_source.unix_ts_ms();
        self.generate_core(unix_ts_ms)
    }

    /// Generates a new identifier from the `unix_ts_ms` passed.
    ///
    /// The clock is still consulted when the sequence for `unix_ts_ms` is exhausted, to wait for
    /// the next millisecond.
    ///
    /// See the [`Generator`] type documentation for the description.
    pub fn generate_core(&mut self, unix_ts_ms: u64) -> Result<SnowflakeId, Error> {
        let (timestamp, sequence) = self.counter.advance(
            unix_ts_ms,
            self.sequence_start,
            &mut self.time_source,
            &mut self.rng,
        )?;

        SnowflakeId::pack(
            timestamp,
            self.epoch_offset_ms,
            self.identity.machine_id(),
            self.identity.process_id(),
            sequence,
        )
        .map_err(|err| {
            tracing::error!(
                timestamp,
                epoch_offset_ms = self.epoch_offset_ms,
                error = %err,
                "failed to encode identifier"
            );
            err
        })
    }
}

/// Supports operations as an infinite iterator that produces a new identifier for each call of
/// `next()`.
///
/// # Examples
///
/// ```rust
/// use snowgen::Generator;
///
/// Generator::with_rand08(rand::thread_rng())
///     .enumerate()
///     .skip(4)
///     .take(4)
///     .for_each(|(i, e)| println!("[{}] {}", i, e.unwrap()));
/// ```
impl<R: RandSource, T: TimeSource> Iterator for Generator<R, T> {
    type Item = Result<SnowflakeId, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.generate())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

impl<R: RandSource, T: TimeSource> std::iter::FusedIterator for Generator<R, T> {}
