//! Error types.

use std::fmt;

use thiserror::Error;

/// Identifies which half of the node identity failed a range check.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum NodeIdKind {
    /// The machine id segment.
    Machine,
    /// The process id segment.
    Process,
}

impl fmt::Display for NodeIdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Machine => f.write_str("machine"),
            Self::Process => f.write_str("process"),
        }
    }
}

/// Error returned when an identifier cannot be generated.
///
/// No partially filled identifier is ever produced; every failure leaves the caller with either a
/// complete [`SnowflakeId`](crate::SnowflakeId) or one of these variants.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Error)]
pub enum Error {
    /// The clock reported a time earlier than the last timestamp handed out. The generator state
    /// is left untouched, so a later call succeeds once the clock catches up.
    #[error("clock moved backwards: {now_ms} ms is earlier than last issued {last_ms} ms")]
    ClockRollback {
        /// Timestamp of the most recent identifier.
        last_ms: u64,
        /// Timestamp the clock reported.
        now_ms: u64,
    },

    /// The elapsed time since the epoch offset does not fit in the 41-bit timestamp segment, or
    /// the clock reads earlier than the epoch offset itself.
    #[error(
        "timestamp {now_ms} ms is outside the 41-bit range after epoch offset {epoch_offset_ms} ms"
    )]
    TimestampOverflow {
        /// Unix timestamp that failed to encode.
        now_ms: u64,
        /// Configured epoch offset.
        epoch_offset_ms: u64,
    },

    /// A machine or process id is wider than its 10-bit segment.
    #[error("{kind} id {value} exceeds maximum {max}", max = crate::id::MAX_NODE_ID)]
    NodeIdRange {
        /// Segment that overflowed.
        kind: NodeIdKind,
        /// Offending value.
        value: u64,
    },
}

/// Error converting an invalid string or integer into an identifier.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Error)]
#[error("{kind}")]
pub struct ParseError {
    kind: ParseErrorKind,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
enum ParseErrorKind {
    InvalidString,
    OutOfRange,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidString => f.write_str("invalid string representation"),
            Self::OutOfRange => f.write_str("integer outside the 63-bit identifier range"),
        }
    }
}

impl ParseError {
    pub(crate) const fn invalid_string() -> Self {
        Self {
            kind: ParseErrorKind::InvalidString,
        }
    }

    pub(crate) const fn out_of_range() -> Self {
        Self {
            kind: ParseErrorKind::OutOfRange,
        }
    }
}
