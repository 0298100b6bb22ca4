// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Fixed-width serialization of a groupify.
//!
//! # Record layout
//!
//! ```text
//! COUNTER                     [representative, count]
//! COUNTER | SECONDARY         [representative, count, secondary]
//! DISTRIBUTION (| COUNTER)    [representative, count, (values, freqs) × s]
//! COUNTER | SECONDARY | DIST  [representative, count, secondary, (values, freqs) × s]
//! ```
//!
//! `values` and `freqs` are ids into [`SnapshotDictionaries`]. Encoding takes
//! one reference per id; [`SnapshotLayout::release`] gives them back.

use super::dictionary::SnapshotDictionaries;
use crate::data::Requirements;
use crate::groupify::{Distribution, HashGroupify};
use std::sync::Arc;

/// Serialized equivalence classes of one transformation.
///
/// Cheap to clone. The dictionary ids inside are only valid while the
/// snapshot is still cached by the [`History`](super::History) that encoded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(Arc<[u32]>);

impl Snapshot {
    /// Number of `u32` words.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

/// One decoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRecord {
    pub representative: u32,
    pub count: u32,
    pub secondary: u32,
    pub distributions: Vec<Distribution>,
}

/// Record layout derived from the active requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotLayout {
    requirements: Requirements,
    sensitive_attributes: usize,
    width: usize,
    distribution_offset: usize,
}

impl SnapshotLayout {
    pub fn new(requirements: Requirements, sensitive_attributes: usize) -> Self {
        let sensitive_attributes = if requirements.has_distribution() {
            sensitive_attributes
        } else {
            0
        };
        Self {
            requirements,
            sensitive_attributes,
            width: requirements.snapshot_width(sensitive_attributes),
            distribution_offset: if requirements.has_secondary() { 3 } else { 2 },
        }
    }

    /// Words per record.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn sensitive_attributes(&self) -> usize {
        self.sensitive_attributes
    }

    pub fn requirements(&self) -> Requirements {
        self.requirements
    }

    /// Number of records in a snapshot.
    pub fn records(&self, snapshot: &Snapshot) -> usize {
        snapshot.len() / self.width
    }

    /// Iterate over the records of a snapshot.
    pub fn iter<'a>(&self, snapshot: &'a Snapshot) -> impl Iterator<Item = &'a [u32]> + 'a {
        snapshot.0.chunks_exact(self.width)
    }

    #[inline]
    pub fn representative(&self, record: &[u32]) -> u32 {
        record[0]
    }

    #[inline]
    pub fn count(&self, record: &[u32]) -> u32 {
        record[1]
    }

    #[inline]
    pub fn secondary(&self, record: &[u32]) -> u32 {
        if self.requirements.has_secondary() {
            record[2]
        } else {
            0
        }
    }

    /// `(values id, frequencies id)` of one sensitive attribute.
    #[inline]
    pub fn distribution_ids(&self, record: &[u32], attribute: usize) -> (u32, u32) {
        let offset = self.distribution_offset + 2 * attribute;
        (record[offset], record[offset + 1])
    }

    /// Serialize every class of `groupify` in insertion order.
    pub fn encode(&self, groupify: &HashGroupify, dictionaries: &mut SnapshotDictionaries) -> Snapshot {
        let mut data = Vec::with_capacity(groupify.size() * self.width);
        for (_, entry) in groupify.iter() {
            data.push(entry.representative());
            data.push(entry.count());
            if self.requirements.has_secondary() {
                data.push(entry.secondary());
            }
            for distribution in entry.distributions().iter().take(self.sensitive_attributes) {
                let (values, frequencies) = distribution.pack();
                data.push(dictionaries.values.probe(values));
                data.push(dictionaries.frequencies.probe(frequencies));
            }
        }
        debug_assert_eq!(data.len(), groupify.size() * self.width);
        Snapshot(data.into())
    }

    /// Reconstruct the records of a snapshot.
    pub fn decode(&self, snapshot: &Snapshot, dictionaries: &SnapshotDictionaries) -> Vec<SnapshotRecord> {
        self.iter(snapshot)
            .map(|record| SnapshotRecord {
                representative: self.representative(record),
                count: self.count(record),
                secondary: self.secondary(record),
                distributions: (0..self.sensitive_attributes)
                    .map(|attribute| {
                        let (values, frequencies) = self.distribution_ids(record, attribute);
                        Distribution::from_packed(
                            dictionaries.values.get(values),
                            dictionaries.frequencies.get(frequencies),
                        )
                    })
                    .collect(),
            })
            .collect()
    }

    /// Give back every dictionary reference the snapshot holds.
    pub fn release(&self, snapshot: &Snapshot, dictionaries: &mut SnapshotDictionaries) {
        if self.sensitive_attributes == 0 {
            return;
        }
        for record in self.iter(snapshot) {
            for attribute in 0..self.sensitive_attributes {
                let (values, frequencies) = self.distribution_ids(record, attribute);
                dictionaries.values.release(values);
                dictionaries.frequencies.release(frequencies);
            }
        }
    }
}
