//! Generator configuration.

use crate::error::Error;
use crate::node::NodeIdentity;

/// Default epoch offset: 2017-01-01T00:00:00+08:00 in Unix milliseconds.
///
/// Changing the epoch offset of a deployment that has already issued identifiers breaks their
/// ordering and may produce duplicates, so pick it once and keep it.
pub const DEFAULT_EPOCH_OFFSET_MS: u64 = 1_483_200_000_000;

/// How the sequence is chosen for the first identifier of a new millisecond.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SequenceStart {
    /// Draw the starting value uniformly from the sequence range, lowering the odds that two
    /// uncoordinated generators sharing a node identity collide within the same millisecond.
    #[default]
    Random,
    /// Always start at zero.
    Zero,
}

/// Settings for a [`Generator`](crate::Generator).
///
/// # Examples
///
/// ```rust
/// use snowgen::{Config, SequenceStart};
///
/// let config = Config::default()
///     .with_epoch_offset_ms(1_700_000_000_000)
///     .with_machine_id(42)
///     .with_sequence_start(SequenceStart::Zero);
/// assert_eq!(config.node_identity()?.machine_id(), 42);
/// # Ok::<(), snowgen::Error>(())
/// ```
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    epoch_offset_ms: u64,
    machine_id: Option<u16>,
    process_id: Option<u16>,
    sequence_start: SequenceStart,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            epoch_offset_ms: DEFAULT_EPOCH_OFFSET_MS,
            machine_id: None,
            process_id: None,
            sequence_start: SequenceStart::default(),
        }
    }
}

impl Config {
    /// Sets the epoch offset that elapsed time is measured from.
    pub const fn with_epoch_offset_ms(mut self, epoch_offset_ms: u64) -> Self {
        self.epoch_offset_ms = epoch_offset_ms;
        self
    }

    /// Assigns the machine id explicitly instead of hashing the host name.
    pub const fn with_machine_id(mut self, machine_id: u16) -> Self {
        self.machine_id = Some(machine_id);
        self
    }

    /// Assigns the process id explicitly instead of masking the OS process id.
    pub const fn with_process_id(mut self, process_id: u16) -> Self {
        self.process_id = Some(process_id);
        self
    }

    /// Chooses how a new millisecond's first sequence value is picked.
    pub const fn with_sequence_start(mut self, sequence_start: SequenceStart) -> Self {
        self.sequence_start = sequence_start;
        self
    }

    /// Returns the configured epoch offset.
    pub const fn epoch_offset_ms(&self) -> u64 {
        self.epoch_offset_ms
    }

    /// Returns the explicitly assigned process id, if any.
    pub const fn process_id(&self) -> Option<u16> {
        self.process_id
    }

    /// Returns the configured sequence start policy.
    pub const fn sequence_start(&self) -> SequenceStart {
        self.sequence_start
    }

    /// Resolves the node identity, deriving whichever ids were not assigned explicitly.
    ///
    /// Fails with [`Error::NodeIdRange`] if an explicit id exceeds the 10-bit range.
    pub fn node_identity(&self) -> Result<NodeIdentity, Error> {
        match (self.machine_id, self.process_id) {
            (Some(machine_id), Some(process_id)) => NodeIdentity::new(machine_id, process_id),
            (machine_id, process_id) => {
                let detected = NodeIdentity::detect();
                NodeIdentity::new(
                    machine_id.unwrap_or(detected.machine_id()),
                    process_id.unwrap_or(detected.process_id()),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, SequenceStart, DEFAULT_EPOCH_OFFSET_MS};
    use crate::node::NodeIdentity;
    use crate::{Error, NodeIdKind};

    /// Uses documented defaults
    #[test]
    fn uses_documented_defaults() {
        let config = Config::default();
        assert_eq!(config.epoch_offset_ms(), 1_483_200_000_000);
        assert_eq!(config.epoch_offset_ms(), DEFAULT_EPOCH_OFFSET_MS);
        assert_eq!(config.sequence_start(), SequenceStart::Random);
        assert_eq!(config.node_identity(), Ok(NodeIdentity::detect()));
    }

    /// Overrides only the ids that are assigned
    #[test]
    fn overrides_only_the_ids_that_are_assigned() {
        let detected = NodeIdentity::detect();

        let identity = Config::default().with_machine_id(7).node_identity().unwrap();
        assert_eq!(identity.machine_id(), 7);
        assert_eq!(identity.process_id(), detected.process_id());

        let identity = Config::default().with_process_id(9).node_identity().unwrap();
        assert_eq!(identity.machine_id(), detected.machine_id());
        assert_eq!(identity.process_id(), 9);

        let identity = Config::default()
            .with_machine_id(1)
            .with_process_id(2)
            .node_identity()
            .unwrap();
        assert_eq!(identity, NodeIdentity::new(1, 2).unwrap());
    }

    /// Rejects explicit ids out of range
    #[test]
    fn rejects_explicit_ids_out_of_range() {
        assert_eq!(
            Config::default().with_machine_id(5000).node_identity(),
            Err(Error::NodeIdRange {
                kind: NodeIdKind::Machine,
                value: 5000
            })
        );
    }

    #[cfg(feature = "serde")]
    /// Deserializes with defaults for missing fields
    #[test]
    fn deserializes_with_defaults_for_missing_fields() {
        use serde_test::{assert_de_tokens, Token};

        let expected = Config::default()
            .with_machine_id(12)
            .with_sequence_start(SequenceStart::Zero);
        assert_de_tokens(
            &expected,
            &[
                Token::Struct {
                    name: "Config",
                    len: 2,
                },
                Token::Str("machine_id"),
                Token::Some,
                Token::U16(12),
                Token::Str("sequence_start"),
                Token::UnitVariant {
                    name: "SequenceStart",
                    variant: "zero",
                },
                Token::StructEnd,
            ],
        );
    }
}
