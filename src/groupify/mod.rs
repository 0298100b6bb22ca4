// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Hash-based grouping of rows into equivalence classes.
//!
//! A [`HashGroupify`] is built once per evaluated transformation and thrown
//! away after the node has been judged (or cached as a snapshot).
//!
//! # Layout
//!
//! ```text
//! buckets: [u32; capacity]        head entry per bucket, or NIL
//! entries: Vec<HashGroupifyEntry> arena, in insertion order
//! keys:    Vec<u32>               entry i owns keys[i*d..(i+1)*d]
//! ```
//!
//! Because entries live in an arena in the order they were created, traversal
//! in insertion order is a walk over the arena, and rehashing re-links the
//! buckets from that walk without touching the keys. Both information-loss
//! computation and snapshot serialization rely on this order being
//! reproducible for identical input order.

pub mod distribution;
pub mod entry;

pub use distribution::Distribution;
pub use entry::{EntryId, HashGroupifyEntry};

use entry::NIL;

/// How an `add` contributes to the per-class distributions.
#[derive(Debug, Clone, Copy)]
pub enum DistributionSource<'a> {
    /// Nothing to track.
    None,
    /// One raw sensitive value per attribute, each added `count` times.
    Values(&'a [u32]),
    /// Live distributions of a finer class, merged in.
    Distributions(&'a [Distribution]),
    /// Packed `(values, frequencies)` per attribute, merged in.
    Packed(&'a [(&'a [u32], &'a [u32])]),
}

/// Hash table of equivalence classes keyed by generalized tuple.
#[derive(Debug, Clone)]
pub struct HashGroupify {
    dimensions: usize,
    sensitive_attributes: usize,
    buckets: Vec<u32>,
    entries: Vec<HashGroupifyEntry>,
    keys: Vec<u32>,
    threshold: usize,
}

impl HashGroupify {
    /// Rehash when `size > capacity * LOAD_FACTOR`.
    pub const LOAD_FACTOR: f64 = 0.75;

    /// Create an empty groupify sized for about `expected_classes` classes.
    ///
    /// Capacity is the next power of two ≥ 1.25 × `expected_classes`.
    pub fn new(expected_classes: usize, dimensions: usize, sensitive_attributes: usize) -> Self {
        let wanted = (expected_classes as f64 * 1.25).ceil() as usize;
        let capacity = wanted.max(1).next_power_of_two();
        Self {
            dimensions,
            sensitive_attributes,
            buckets: vec![NIL; capacity],
            entries: Vec::with_capacity(expected_classes),
            keys: Vec::with_capacity(expected_classes * dimensions),
            threshold: Self::threshold_for(capacity),
        }
    }

    fn threshold_for(capacity: usize) -> usize {
        (capacity as f64 * Self::LOAD_FACTOR) as usize
    }

    /// Add rows with generalized tuple `key`, creating its class on first sight.
    ///
    /// `representative` is only recorded when the class is created.
    ///
    /// # Panics
    ///
    /// Panics if `key` does not have `dimensions` elements, or if the distribution
    /// source does not supply one item per sensitive attribute.
    pub fn add(
        &mut self,
        key: &[u32],
        representative: u32,
        count: u32,
        secondary: u32,
        distributions: DistributionSource<'_>,
    ) -> EntryId {
        assert_eq!(key.len(), self.dimensions, "Key has wrong dimensionality");

        let hashcode = hashcode(key);
        let id = match self.find_hashed(key, hashcode) {
            Some(id) => id,
            None => self.create(key, hashcode, representative),
        };

        let sensitive = self.sensitive_attributes;
        let entry = &mut self.entries[id];
        entry.count += count;
        entry.secondary += secondary;

        if sensitive > 0 {
            match distributions {
                DistributionSource::None => {}
                DistributionSource::Values(values) => {
                    assert_eq!(values.len(), sensitive, "One value per sensitive attribute");
                    for (distribution, &value) in entry.distributions.iter_mut().zip(values) {
                        distribution.add_frequency(value, count);
                    }
                }
                DistributionSource::Distributions(others) => {
                    assert_eq!(others.len(), sensitive, "One distribution per sensitive attribute");
                    for (distribution, other) in entry.distributions.iter_mut().zip(others) {
                        distribution.merge(other);
                    }
                }
                DistributionSource::Packed(packed) => {
                    assert_eq!(packed.len(), sensitive, "One distribution per sensitive attribute");
                    for (distribution, (values, frequencies)) in
                        entry.distributions.iter_mut().zip(packed)
                    {
                        distribution.merge_packed(values, frequencies);
                    }
                }
            }
        }
        id
    }

    fn create(&mut self, key: &[u32], hashcode: u32, representative: u32) -> EntryId {
        let id = self.entries.len();
        let bucket = self.bucket(hashcode);
        let mut entry = HashGroupifyEntry::new(hashcode, representative, self.sensitive_attributes);
        entry.next_in_bucket = self.buckets[bucket];
        self.buckets[bucket] = id as u32;
        self.entries.push(entry);
        self.keys.extend_from_slice(key);

        if self.entries.len() > self.threshold {
            self.rehash();
        }
        id
    }

    /// Double the bucket array and re-link every entry in insertion order.
    fn rehash(&mut self) {
        let capacity = self.buckets.len() * 2;
        self.buckets.clear();
        self.buckets.resize(capacity, NIL);
        self.threshold = Self::threshold_for(capacity);

        for id in 0..self.entries.len() {
            let bucket = self.bucket(self.entries[id].hashcode);
            self.entries[id].next_in_bucket = self.buckets[bucket];
            self.buckets[bucket] = id as u32;
        }
    }

    #[inline]
    fn bucket(&self, hashcode: u32) -> usize {
        hashcode as usize & (self.buckets.len() - 1)
    }

    fn find_hashed(&self, key: &[u32], hashcode: u32) -> Option<EntryId> {
        let mut cursor = self.buckets[self.bucket(hashcode)];
        while cursor != NIL {
            let id = cursor as usize;
            let entry = &self.entries[id];
            if entry.hashcode == hashcode && self.key(id) == key {
                return Some(id);
            }
            cursor = entry.next_in_bucket;
        }
        None
    }

    /// Entry holding `key`, if any.
    pub fn find(&self, key: &[u32]) -> Option<EntryId> {
        if key.len() != self.dimensions {
            return None;
        }
        self.find_hashed(key, hashcode(key))
    }

    /// Number of equivalence classes.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn sensitive_attributes(&self) -> usize {
        self.sensitive_attributes
    }

    /// First entry in insertion order.
    pub fn first(&self) -> Option<EntryId> {
        if self.entries.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    /// Entry inserted right after `id`.
    pub fn next(&self, id: EntryId) -> Option<EntryId> {
        let next = id + 1;
        (next < self.entries.len()).then_some(next)
    }

    pub fn entry(&self, id: EntryId) -> &HashGroupifyEntry {
        &self.entries[id]
    }

    /// Generalized tuple of an entry.
    #[inline]
    pub fn key(&self, id: EntryId) -> &[u32] {
        &self.keys[id * self.dimensions..(id + 1) * self.dimensions]
    }

    /// `(key, entry)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u32], &HashGroupifyEntry)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(move |(id, entry)| (self.key(id), entry))
    }

    /// Sum of all counts.
    pub fn total_count(&self) -> u64 {
        self.entries.iter().map(|e| e.count as u64).sum()
    }

    /// Sum of all secondary counts.
    pub fn total_secondary(&self) -> u64 {
        self.entries.iter().map(|e| e.secondary as u64).sum()
    }

    /// Size of the smallest class, or `None` if empty.
    pub fn min_class_size(&self) -> Option<u32> {
        self.entries.iter().map(|e| e.count).min()
    }
}

/// Hash a generalized tuple (multiplicative combine plus a 32-bit finalizer).
#[inline]
pub(crate) fn hashcode(key: &[u32]) -> u32 {
    let mut h: u32 = 23;
    for &value in key {
        h = h.wrapping_mul(31).wrapping_add(value);
    }
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^ (h >> 16)
}
