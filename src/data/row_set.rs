// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! RowSet type for representing a research subset as a bitset.
//!
//! Bit i is set if row i belongs to the subset. Rows are dense indices
//! `0..rows`, so a word-packed bitset gives O(1) membership tests during scans.
//!
//! # Examples
//!
//! ```
//! use anon_search::data::RowSet;
//!
//! let mut set = RowSet::empty(100);
//! set.insert(3);
//! set.insert(64);
//!
//! assert_eq!(set.len(), 2);
//! assert!(set.contains(64));
//! assert!(!set.contains(65));
//! ```

/// A subset of rows represented as a bitset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowSet {
    words: Vec<u64>,
    rows: usize,
}

impl RowSet {
    /// Create an empty subset of a dataset with `rows` rows.
    pub fn empty(rows: usize) -> Self {
        Self {
            words: vec![0; rows.div_ceil(64)],
            rows,
        }
    }

    /// Create a subset containing every row.
    pub fn full(rows: usize) -> Self {
        let mut set = Self::empty(rows);
        let complete_words = rows / 64;
        for word in set.words.iter_mut().take(complete_words) {
            *word = u64::MAX;
        }
        let remaining_bits = rows % 64;
        if remaining_bits > 0 {
            set.words[complete_words] = (1u64 << remaining_bits) - 1;
        }
        set
    }

    /// Create a subset from a list of row indices.
    pub fn from_rows(rows: usize, members: &[usize]) -> Self {
        let mut set = Self::empty(rows);
        for &row in members {
            set.insert(row);
        }
        set
    }

    /// Number of rows of the underlying dataset (not the subset size).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// # Panics
    ///
    /// Panics if `row >= rows`.
    #[inline]
    pub fn contains(&self, row: usize) -> bool {
        assert!(row < self.rows, "Row out of range: {} >= {}", row, self.rows);
        (self.words[row / 64] >> (row % 64)) & 1 != 0
    }

    /// # Panics
    ///
    /// Panics if `row >= rows`.
    pub fn insert(&mut self, row: usize) {
        assert!(row < self.rows, "Row out of range: {} >= {}", row, self.rows);
        self.words[row / 64] |= 1u64 << (row % 64);
    }

    /// # Panics
    ///
    /// Panics if `row >= rows`.
    pub fn remove(&mut self, row: usize) {
        assert!(row < self.rows, "Row out of range: {} >= {}", row, self.rows);
        self.words[row / 64] &= !(1u64 << (row % 64));
    }

    /// Number of rows in the subset (population count).
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Iterate over member rows in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(word_idx, &word)| {
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let bit = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(word_idx * 64 + bit)
            })
        })
    }
}
