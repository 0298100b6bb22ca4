// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! A single point in the generalization lattice.

use std::fmt;

/// Generalization levels for every quasi-identifier, with derived level and id.
///
/// Transformations are created by [`Lattice`](super::Lattice) and never change
/// afterwards. Other components keep only the id and level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transformation {
    id: u64,
    level: u32,
    generalization: Box<[u32]>,
}

impl Transformation {
    pub(crate) fn new(id: u64, level: u32, generalization: Box<[u32]>) -> Self {
        Self {
            id,
            level,
            generalization,
        }
    }

    /// Dense index in `0..lattice.size()`.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Sum of all generalization levels.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Per-attribute generalization levels.
    pub fn generalization(&self) -> &[u32] {
        &self.generalization
    }

    pub fn dimensions(&self) -> usize {
        self.generalization.len()
    }
}

impl fmt::Display for Transformation {
    /// Format as "#id [1, 0, 2]".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {:?}", self.id, self.generalization)
    }
}
