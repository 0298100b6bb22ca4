// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Requirement bitmask for equivalence-class bookkeeping.
//!
//! Privacy criteria differ in what they need to know about each class: plain
//! k-anonymity only needs row counts, subset-based criteria also need the
//! number of rows from a research subset, and diversity/closeness criteria need
//! the distribution of sensitive values. The union of those needs fixes the
//! record width of cached snapshots.
//!
//! # Examples
//!
//! ```
//! use anon_search::data::Requirements;
//!
//! let req = Requirements::COUNTER | Requirements::SECONDARY_COUNTER;
//! assert!(req.validate().is_ok());
//! assert_eq!(req.snapshot_width(0), 3);
//! assert_eq!(format!("{}", req), "|CS|");
//! ```

use crate::error::{Result, SearchError};
use std::fmt;
use std::ops::BitOr;

/// A set of requirement flags stored as a bitset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Requirements(u8);

impl Requirements {
    /// Count rows per class.
    pub const COUNTER: Self = Self(1);
    /// Count rows per class that are also in the research subset.
    pub const SECONDARY_COUNTER: Self = Self(2);
    /// Track sensitive-value frequencies per class.
    pub const DISTRIBUTION: Self = Self(4);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn has_secondary(self) -> bool {
        self.contains(Self::SECONDARY_COUNTER)
    }

    pub fn has_distribution(self) -> bool {
        self.contains(Self::DISTRIBUTION)
    }

    /// Accept C, C|S, D, C|D and C|S|D.
    pub fn validate(self) -> Result<()> {
        let known = Self::COUNTER.0 | Self::SECONDARY_COUNTER.0 | Self::DISTRIBUTION.0;
        let legal = self.0 & !known == 0
            && (self.contains(Self::COUNTER) || self.has_distribution())
            && !(self.has_secondary() && !self.contains(Self::COUNTER));
        if legal {
            Ok(())
        } else {
            Err(SearchError::UnsupportedRequirements { bits: self.0 })
        }
    }

    /// Number of `u32` words per snapshot record.
    ///
    /// Every record starts with representative and count. The secondary counter
    /// adds one word, each sensitive attribute adds a (values, frequencies) id pair.
    pub fn snapshot_width(self, sensitive_attributes: usize) -> usize {
        let mut width = 2;
        if self.has_secondary() {
            width += 1;
        }
        if self.has_distribution() {
            width += 2 * sensitive_attributes;
        }
        width
    }
}

impl BitOr for Requirements {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for Requirements {
    /// Format as "|CSD|".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|")?;
        for (flag, c) in [
            (Self::COUNTER, 'C'),
            (Self::SECONDARY_COUNTER, 'S'),
            (Self::DISTRIBUTION, 'D'),
        ] {
            if self.contains(flag) {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "|")
    }
}
