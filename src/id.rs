//! The 63-bit identifier type and its bit layout.

use std::{fmt, str};

use crate::error::{Error, NodeIdKind, ParseError};

/// Width of the elapsed-time segment.
pub const TIMESTAMP_BITS: u32 = 41;
/// Width of the machine id segment.
pub const MACHINE_BITS: u32 = 10;
/// Width of the process id segment.
pub const PROCESS_BITS: u32 = 10;
/// Width of the per-millisecond sequence segment.
pub const SEQUENCE_BITS: u32 = 2;

const PROCESS_SHIFT: u32 = SEQUENCE_BITS;
const MACHINE_SHIFT: u32 = PROCESS_BITS + SEQUENCE_BITS;
const TIMESTAMP_SHIFT: u32 = MACHINE_BITS + PROCESS_BITS + SEQUENCE_BITS;

/// Largest elapsed time, in milliseconds after the epoch offset, that can be encoded (~69 years).
pub const MAX_ELAPSED_MS: u64 = (1 << TIMESTAMP_BITS) - 1;
/// Largest machine or process id (both segments are 10 bits wide).
pub const MAX_NODE_ID: u16 = (1 << MACHINE_BITS) - 1;
/// Largest sequence value within one millisecond.
pub const MAX_SEQUENCE: u8 = (1 << SEQUENCE_BITS) - 1;

const _: () = assert!(TIMESTAMP_BITS + MACHINE_BITS + PROCESS_BITS + SEQUENCE_BITS == 63);
const _: () = assert!(MACHINE_BITS == PROCESS_BITS);

/// Represents a 63-bit snowflake identifier.
///
/// The value always fits in a non-negative `i64`, and identifiers issued later by the same
/// generator compare greater because the elapsed time occupies the most significant bits.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct SnowflakeId(u64);

impl SnowflakeId {
    /// Smallest identifier (all segments zero).
    pub const MIN: Self = Self(0);

    /// Largest identifier (all segments saturated).
    pub const MAX: Self = Self(i64::MAX as u64);

    /// Creates an identifier from its four segment values.
    ///
    /// # Panics
    ///
    /// Panics if any field is wider than its segment.
    pub const fn from_fields(
        elapsed_ms: u64,
        machine_id: u16,
        process_id: u16,
        sequence: u8,
    ) -> Self {
        if elapsed_ms > MAX_ELAPSED_MS
            || machine_id > MAX_NODE_ID
            || process_id > MAX_NODE_ID
            || sequence > MAX_SEQUENCE
        {
            panic!("invalid field value");
        }

        Self(
            (elapsed_ms << TIMESTAMP_SHIFT)
                | (machine_id as u64) << MACHINE_SHIFT
                | (process_id as u64) << PROCESS_SHIFT
                | sequence as u64,
        )
    }

    /// Packs a Unix timestamp and node identity into an identifier, measuring elapsed time from
    /// `epoch_offset_ms`.
    ///
    /// Fails with [`Error::TimestampOverflow`] when `unix_ts_ms` precedes the epoch offset or lies
    /// more than [`MAX_ELAPSED_MS`] after it, and with [`Error::NodeIdRange`] when either node id
    /// exceeds [`MAX_NODE_ID`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use snowgen::SnowflakeId;
    ///
    /// let id = SnowflakeId::pack(1_483_200_000_005, 1_483_200_000_000, 7, 9, 2)?;
    /// assert_eq!(id.to_fields(), (5, 7, 9, 2));
    /// # Ok::<(), snowgen::Error>(())
    /// ```
    pub fn pack(
        unix_ts_ms: u64,
        epoch_offset_ms: u64,
        machine_id: u16,
        process_id: u16,
        sequence: u8,
    ) -> Result<Self, Error> {
        let elapsed_ms = unix_ts_ms
            .checked_sub(epoch_offset_ms)
            .filter(|elapsed| *elapsed <= MAX_ELAPSED_MS)
            .ok_or(Error::TimestampOverflow {
                now_ms: unix_ts_ms,
                epoch_offset_ms,
            })?;

        if machine_id > MAX_NODE_ID {
            return Err(Error::NodeIdRange {
                kind: NodeIdKind::Machine,
                value: machine_id.into(),
            });
        }
        if process_id > MAX_NODE_ID {
            return Err(Error::NodeIdRange {
                kind: NodeIdKind::Process,
                value: process_id.into(),
            });
        }
        debug_assert!(sequence <= MAX_SEQUENCE, "sequence out of range");

        let id = Self::from_fields(elapsed_ms, machine_id, process_id, sequence & MAX_SEQUENCE);
        Ok(Self(id.0 & i64::MAX as u64))
    }

    /// Returns the elapsed milliseconds since the epoch offset.
    pub const fn elapsed_ms(&self) -> u64 {
        self.0 >> TIMESTAMP_SHIFT
    }

    /// Returns the Unix timestamp in milliseconds, given the epoch offset the identifier was
    /// generated with. Saturates at `u64::MAX`.
    pub const fn timestamp_ms(&self, epoch_offset_ms: u64) -> u64 {
        epoch_offset_ms.saturating_add(self.elapsed_ms())
    }

    /// Returns the machine id segment.
    pub const fn machine_id(&self) -> u16 {
        ((self.0 >> MACHINE_SHIFT) & MAX_NODE_ID as u64) as u16
    }

    /// Returns the process id segment.
    pub const fn process_id(&self) -> u16 {
        ((self.0 >> PROCESS_SHIFT) & MAX_NODE_ID as u64) as u16
    }

    /// Returns the sequence segment.
    pub const fn sequence(&self) -> u8 {
        (self.0 & MAX_SEQUENCE as u64) as u8
    }

    /// Returns `(elapsed_ms, machine_id, process_id, sequence)`.
    pub const fn to_fields(&self) -> (u64, u16, u16, u8) {
        (
            self.elapsed_ms(),
            self.machine_id(),
            self.process_id(),
            self.sequence(),
        )
    }

    /// Returns the underlying integer.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the underlying integer as a non-negative `i64`.
    pub const fn as_i64(&self) -> i64 {
        self.0 as i64
    }
}

impl fmt::Display for SnowflakeId {
    /// Returns the decimal representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl str::FromStr for SnowflakeId {
    type Err = ParseError;

    /// Creates an object from the decimal representation.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        if src.is_empty() || !src.bytes().all(|c| c.is_ascii_digit()) {
            return Err(ParseError::invalid_string());
        }
        src.parse::<u64>()
            .ok()
            .and_then(|n| Self::try_from(n).ok())
            .ok_or(ParseError::invalid_string())
    }
}

impl From<SnowflakeId> for u64 {
    fn from(src: SnowflakeId) -> Self {
        src.0
    }
}

impl From<SnowflakeId> for i64 {
    fn from(src: SnowflakeId) -> Self {
        src.as_i64()
    }
}

impl TryFrom<u64> for SnowflakeId {
    type Error = ParseError;

    fn try_from(src: u64) -> Result<Self, Self::Error> {
        if src <= Self::MAX.0 {
            Ok(Self(src))
        } else {
            Err(ParseError::out_of_range())
        }
    }
}

impl TryFrom<i64> for SnowflakeId {
    type Error = ParseError;

    fn try_from(src: i64) -> Result<Self, Self::Error> {
        u64::try_from(src)
            .map(Self)
            .map_err(|_| ParseError::out_of_range())
    }
}

impl From<SnowflakeId> for String {
    fn from(src: SnowflakeId) -> Self {
        src.to_string()
    }
}

impl TryFrom<String> for SnowflakeId {
    type Error = ParseError;

    fn try_from(src: String) -> Result<Self, Self::Error> {
        src.parse()
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde_support {
    use super::{fmt, SnowflakeId};
    use serde::{de, Deserializer, Serializer};

    /// Human-readable formats get a decimal string so that consumers limited to 53-bit floats
    /// (JSON in browsers) do not lose precision; compact formats get the raw integer.
    impl serde::Serialize for SnowflakeId {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if serializer.is_human_readable() {
                serializer.collect_str(self)
            } else {
                serializer.serialize_u64(self.0)
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for SnowflakeId {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            if deserializer.is_human_readable() {
                deserializer.deserialize_any(VisitorImpl)
            } else {
                deserializer.deserialize_u64(VisitorImpl)
            }
        }
    }

    struct VisitorImpl;

    impl<'de> de::Visitor<'de> for VisitorImpl {
        type Value = SnowflakeId;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "a snowflake id as a decimal string or non-negative integer")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            value.parse::<Self::Value>().map_err(de::Error::custom)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            SnowflakeId::try_from(value).map_err(de::Error::custom)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            SnowflakeId::try_from(value).map_err(de::Error::custom)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::SnowflakeId;
        use serde_test::{
            assert_de_tokens, assert_de_tokens_error, assert_ser_tokens, assert_tokens, Configure,
            Token,
        };

        /// Serializes and deserializes prepared cases correctly
        #[test]
        fn serializes_and_deserializes_prepared_cases_correctly() {
            let cases = [
                ("0", 0u64),
                ("1", 1),
                ("1342177280405", 1_342_177_280_405),
                ("9223372036854775807", i64::MAX as u64),
            ];

            for (text, value) in cases {
                let e = text.parse::<SnowflakeId>().unwrap();
                assert_tokens(&e.readable(), &[Token::Str(text)]);
                assert_tokens(&e.compact(), &[Token::U64(value)]);
            }
        }

        /// Accepts integers from human-readable formats
        #[test]
        fn accepts_integers_from_human_readable_formats() {
            let e = SnowflakeId::try_from(42u64).unwrap();
            assert_de_tokens(&e.readable(), &[Token::U64(42)]);
            assert_de_tokens(&e.readable(), &[Token::I64(42)]);
        }

        /// Writes a decimal string to human-readable formats and an integer to compact ones
        #[test]
        fn writes_a_decimal_string_to_human_readable_formats_and_an_integer_to_compact_ones() {
            let e = SnowflakeId::try_from(42u64).unwrap();
            assert_ser_tokens(&e.readable(), &[Token::Str("42")]);
            assert_ser_tokens(&e.compact(), &[Token::U64(42)]);
        }

        /// Rejects out-of-range values
        #[test]
        fn rejects_out_of_range_values() {
            assert_de_tokens_error::<serde_test::Readable<SnowflakeId>>(
                &[Token::I64(-1)],
                "integer outside the 63-bit identifier range",
            );
            assert_de_tokens_error::<serde_test::Compact<SnowflakeId>>(
                &[Token::U64(u64::MAX)],
                "integer outside the 63-bit identifier range",
            );
            assert_de_tokens_error::<serde_test::Readable<SnowflakeId>>(
                &[Token::Str("-1")],
                "invalid string representation",
            );
        }
    }
}
