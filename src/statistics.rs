// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Statistics
//!
//! Counters are kept by the history and the search context, and merged when
//! reported.

use strum::EnumCount;
use strum_macros::EnumCount as EnumCountMacro;

#[derive(EnumCountMacro, Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Counters {
    /// Transformations evaluated by [`SearchContext::check`](crate::context::SearchContext::check).
    Checks,
    FullScans,
    GroupifyRollups,
    SnapshotRollups,
    SnapshotHits,
    SnapshotMisses,
    SnapshotsStored,
    SnapshotsRejected,
    SnapshotsEvicted,
    /// Cached snapshots dropped because their node became `successors-pruned`.
    SnapshotsPruned,
    Interrupts,
}

const COUNT: usize = Counters::COUNT;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Statistics {
    stats: [u64; COUNT],
}

impl Statistics {
    pub fn new() -> Self {
        Statistics::default()
    }

    /// Increment the specified counter by 1.
    pub(crate) fn increment(&mut self, counter: Counters) {
        self.stats[counter as usize] += 1;
    }

    /// Get the current value of the specified counter.
    pub fn get(&self, counter: Counters) -> u64 {
        self.stats[counter as usize]
    }

    pub fn reset(&mut self) {
        self.stats = [0; COUNT];
    }

    /// Add every counter of `other` into `self`.
    pub fn merge(&mut self, other: &Statistics) {
        for (mine, theirs) in self.stats.iter_mut().zip(other.stats.iter()) {
            *mine += theirs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_and_merge() {
        let mut a = Statistics::new();
        a.increment(Counters::Checks);
        a.increment(Counters::Checks);
        a.increment(Counters::Interrupts);

        let mut b = Statistics::new();
        b.increment(Counters::Checks);
        b.merge(&a);

        assert_eq!(b.get(Counters::Checks), 3);
        assert_eq!(b.get(Counters::Interrupts), 1);
        assert_eq!(b.get(Counters::FullScans), 0);

        b.reset();
        assert_eq!(b, Statistics::new());
    }
}
