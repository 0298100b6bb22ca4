// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Frequency distribution of one sensitive attribute within a class.

/// Multiset of sensitive-value codes.
///
/// Values are kept sorted with a parallel frequency array. Equal multisets
/// therefore always have identical packed arrays, which is what lets the
/// snapshot dictionaries intern them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Distribution {
    values: Vec<u32>,
    frequencies: Vec<u32>,
}

impl Distribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a packed `(values, frequencies)` pair.
    ///
    /// # Panics
    ///
    /// Panics if the arrays differ in length.
    pub fn from_packed(values: &[u32], frequencies: &[u32]) -> Self {
        let mut distribution = Self::new();
        distribution.merge_packed(values, frequencies);
        distribution
    }

    /// Add one occurrence of `value`.
    pub fn add(&mut self, value: u32) {
        self.add_frequency(value, 1);
    }

    /// Add `frequency` occurrences of `value`.
    pub fn add_frequency(&mut self, value: u32, frequency: u32) {
        match self.values.binary_search(&value) {
            Ok(index) => self.frequencies[index] += frequency,
            Err(index) => {
                self.values.insert(index, value);
                self.frequencies.insert(index, frequency);
            }
        }
    }

    /// Add every occurrence from another distribution.
    pub fn merge(&mut self, other: &Distribution) {
        self.merge_packed(&other.values, &other.frequencies);
    }

    /// Add every occurrence from a packed pair.
    ///
    /// # Panics
    ///
    /// Panics if the arrays differ in length.
    pub fn merge_packed(&mut self, values: &[u32], frequencies: &[u32]) {
        assert_eq!(
            values.len(),
            frequencies.len(),
            "Packed distribution arrays differ in length"
        );
        if self.values.is_empty() && values.windows(2).all(|w| w[0] < w[1]) {
            self.values.extend_from_slice(values);
            self.frequencies.extend_from_slice(frequencies);
            return;
        }
        for (&value, &frequency) in values.iter().zip(frequencies) {
            self.add_frequency(value, frequency);
        }
    }

    /// Occurrences of `value`.
    pub fn frequency(&self, value: u32) -> u32 {
        self.values
            .binary_search(&value)
            .map_or(0, |index| self.frequencies[index])
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of all frequencies.
    pub fn total(&self) -> u64 {
        self.frequencies.iter().map(|&f| f as u64).sum()
    }

    /// Canonical `(values ascending, frequencies)` form.
    pub fn pack(&self) -> (&[u32], &[u32]) {
        (&self.values, &self.frequencies)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.values.iter().copied().zip(self.frequencies.iter().copied())
    }
}
