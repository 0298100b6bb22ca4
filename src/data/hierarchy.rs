// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Generalization hierarchies as flat lookup tables.
//!
//! A hierarchy maps every encoded value of one attribute to its generalized
//! code at each level. Level 0 is normally the value itself; the last level is
//! normally a single "suppressed" code. The table is stored row-major in one
//! `Vec<u32>` so that `generalize(code, level)` is a single index computation.

use crate::error::{Result, SearchError};

/// Lookup table `(code, level) → generalized code` for one quasi-identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneralizationHierarchy {
    map: Vec<u32>,
    codes: usize,
    levels: usize,
}

impl GeneralizationHierarchy {
    /// Build from one row per code, each row listing the generalized code per level.
    ///
    /// `attribute` is only used for error reporting.
    pub fn new(attribute: usize, table: &[Vec<u32>]) -> Result<Self> {
        let levels = table.first().map_or(0, Vec::len);
        if levels == 0 {
            return Err(SearchError::EmptyHierarchy { attribute });
        }

        let mut map = Vec::with_capacity(table.len() * levels);
        for (row, entries) in table.iter().enumerate() {
            if entries.len() != levels {
                return Err(SearchError::RaggedHierarchy {
                    attribute,
                    row,
                    expected: levels,
                    actual: entries.len(),
                });
            }
            map.extend_from_slice(entries);
        }

        Ok(Self {
            map,
            codes: table.len(),
            levels,
        })
    }

    /// Number of distinct input codes covered.
    pub fn codes(&self) -> usize {
        self.codes
    }

    /// Number of generalization levels, including level 0.
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Generalized code of `code` at `level`.
    #[inline]
    pub fn generalize(&self, code: u32, level: u32) -> u32 {
        self.map[code as usize * self.levels + level as usize]
    }
}
