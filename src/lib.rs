//! A coordination-free generator of 63-bit, roughly time-sortable identifiers
//!
//! ```rust
//! let id = snowgen::generate_unique_id()?;
//! println!("{}", id); // e.g. "1342179397985"
//! println!("{}", id.as_i64()); // fits a signed 64-bit column
//! # Ok::<(), snowgen::Error>(())
//! ```
//!
//! # Field and bit layout
//!
//! This implementation produces identifiers with the following bit layout:
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |0|                        elapsed_ms                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |    elapsed_ms     |     machine_id    |     process_id    |seq|
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Where:
//!
//! - The sign bit is always zero, so every identifier is a non-negative `i64`.
//! - The 41-bit `elapsed_ms` field holds milliseconds since a fixed epoch offset
//!   (2017-01-01T00:00:00+08:00 by default), which lasts about 69 years.
//! - The 10-bit `machine_id` field is a hash of the host name modulo 1024, unless assigned
//!   explicitly.
//! - The 10-bit `process_id` field holds the low ten bits of the OS process id, unless assigned
//!   explicitly.
//! - The 2-bit `seq` field tells apart up to four identifiers issued by the same process within
//!   one millisecond. It is randomly initialized whenever `elapsed_ms` changes and incremented for
//!   each further identifier in that millisecond.
//!
//! When all four sequence values of a millisecond are used up, the generator waits for the clock
//! to reach the next millisecond. When the clock reads earlier than the last identifier, the
//! generator refuses with [`Error::ClockRollback`] and leaves its state untouched, so a later call
//! succeeds once the clock catches up. Identifiers issued after the 41-bit lifetime has run out
//! fail with [`Error::TimestampOverflow`].
//!
//! Uniqueness holds per `(machine_id, process_id)` pair. Nothing coordinates node identities
//! between hosts; see [`node`] for the limits of the derived identity.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod clock;
pub use clock::{StdSystemTime, TimeSource};

mod config;
pub use config::{Config, SequenceStart, DEFAULT_EPOCH_OFFSET_MS};

mod error;
pub use error::{Error, NodeIdKind, ParseError};

pub mod id;
pub use id::SnowflakeId;

pub mod node;
pub use node::NodeIdentity;

pub mod sequence;
pub use sequence::SequenceCounter;

pub mod generator;
pub use generator::{Generator, RandSource};

mod sync;
pub use sync::SyncGenerator;

mod global_gen;
#[cfg(feature = "global_gen")]
pub use global_gen::{configure, generate_unique_id, global_identity};

#[cfg(test)]
mod test_util;
