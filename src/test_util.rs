//! Deterministic clock and random sources for tests.

use std::collections::VecDeque;

use crate::clock::TimeSource;
use crate::generator::RandSource;

/// Replays a fixed list of readings, then counts up by one millisecond per read.
#[derive(Debug, Default)]
pub struct ScriptedClock {
    script: VecDeque<u64>,
    last: u64,
    reads: usize,
}

impl ScriptedClock {
    pub fn new(script: impl IntoIterator<Item = u64>) -> Self {
        Self {
            script: script.into_iter().collect(),
            last: 0,
            reads: 0,
        }
    }

    /// Returns how many times the clock has been read.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl TimeSource for ScriptedClock {
    fn unix_ts_ms(&mut self) -> u64 {
        self.reads += 1;
        self.last = match self.script.pop_front() {
            Some(ts) => ts,
            None => self.last + 1,
        };
        self.last
    }
}

/// Advances by one millisecond after every `reads_per_tick` reads.
#[derive(Debug)]
pub struct TickingClock {
    now: u64,
    reads_per_tick: usize,
    reads: usize,
}

impl TickingClock {
    pub fn new(start: u64, reads_per_tick: usize) -> Self {
        Self {
            now: start,
            reads_per_tick,
            reads: 0,
        }
    }
}

impl TimeSource for TickingClock {
    fn unix_ts_ms(&mut self) -> u64 {
        self.reads += 1;
        if self.reads % self.reads_per_tick == 0 {
            self.now += 1;
        }
        self.now
    }
}

/// Always yields the same value.
#[derive(Copy, Clone, Debug)]
pub struct ConstRand(pub u32);

impl RandSource for ConstRand {
    fn next_u32(&mut self) -> u32 {
        self.0
    }
}
