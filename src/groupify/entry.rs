// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! One equivalence class inside a [`HashGroupify`](super::HashGroupify).

use super::distribution::Distribution;

/// Index of an entry within its groupify, in insertion order.
pub type EntryId = usize;

/// Sentinel for "no next entry in this bucket".
pub(crate) const NIL: u32 = u32::MAX;

/// Bookkeeping for one equivalence class.
///
/// The generalized key lives in the groupify's flat key buffer, addressed by
/// the entry id.
#[derive(Debug, Clone)]
pub struct HashGroupifyEntry {
    pub(crate) hashcode: u32,
    pub(crate) count: u32,
    pub(crate) secondary: u32,
    pub(crate) representative: u32,
    pub(crate) distributions: Vec<Distribution>,
    /// Next entry in the same hash bucket, or [`NIL`].
    pub(crate) next_in_bucket: u32,
}

impl HashGroupifyEntry {
    pub(crate) fn new(hashcode: u32, representative: u32, sensitive_attributes: usize) -> Self {
        Self {
            hashcode,
            count: 0,
            secondary: 0,
            representative,
            distributions: vec![Distribution::new(); sensitive_attributes],
            next_in_bucket: NIL,
        }
    }

    /// Number of rows in this class.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Number of rows in this class that belong to the research subset.
    pub fn secondary(&self) -> u32 {
        self.secondary
    }

    /// Index of the first row that created this class.
    pub fn representative(&self) -> u32 {
        self.representative
    }

    /// One distribution per sensitive attribute (empty if none are tracked).
    pub fn distributions(&self) -> &[Distribution] {
        &self.distributions
    }

    pub fn hashcode(&self) -> u32 {
        self.hashcode
    }
}
