// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Reference-counted interning of `u32` arrays.
//!
//! Snapshots refer to distribution payloads by id. Identical arrays across
//! classes and snapshots share one slot; each reference from a snapshot record
//! holds one count, and a slot is freed (and its id recycled) when the last
//! reference is released.

use std::collections::HashMap;
use std::sync::Arc;

/// Arena of interned arrays with explicit reference counts.
#[derive(Debug, Clone, Default)]
pub struct IntArrayDictionary {
    arrays: Vec<Option<Arc<[u32]>>>,
    refcounts: Vec<u32>,
    index: HashMap<Arc<[u32]>, u32>,
    free: Vec<u32>,
}

impl IntArrayDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `array` and take one reference to it. Returns its id.
    pub fn probe(&mut self, array: &[u32]) -> u32 {
        if let Some(&id) = self.index.get(array) {
            self.refcounts[id as usize] += 1;
            return id;
        }

        let shared: Arc<[u32]> = Arc::from(array);
        let id = match self.free.pop() {
            Some(id) => {
                self.arrays[id as usize] = Some(Arc::clone(&shared));
                self.refcounts[id as usize] = 1;
                id
            }
            None => {
                let id = self.arrays.len() as u32;
                self.arrays.push(Some(Arc::clone(&shared)));
                self.refcounts.push(1);
                id
            }
        };
        self.index.insert(shared, id);
        id
    }

    /// Array stored under `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` has been freed or never existed.
    #[inline]
    pub fn get(&self, id: u32) -> &[u32] {
        match self.arrays.get(id as usize) {
            Some(Some(array)) => &array[..],
            _ => panic!("Dictionary id {} is not live", id),
        }
    }

    /// Release one reference; frees the slot when none remain.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not live.
    pub fn release(&mut self, id: u32) {
        let slot = id as usize;
        assert!(
            matches!(self.arrays.get(slot), Some(Some(_))),
            "Dictionary id {} is not live",
            id
        );
        self.refcounts[slot] -= 1;
        if self.refcounts[slot] == 0 {
            if let Some(array) = self.arrays[slot].take() {
                self.index.remove(&array);
            }
            self.free.push(id);
        }
    }

    /// Outstanding references to `id` (zero if freed).
    pub fn refcount(&self, id: u32) -> u32 {
        self.refcounts.get(id as usize).copied().unwrap_or(0)
    }

    /// Number of live arrays.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn clear(&mut self) {
        self.arrays.clear();
        self.refcounts.clear();
        self.index.clear();
        self.free.clear();
    }
}

/// The two dictionaries backing distribution payloads.
#[derive(Debug, Clone, Default)]
pub struct SnapshotDictionaries {
    /// Sorted sensitive values per distribution.
    pub values: IntArrayDictionary,
    /// Frequencies parallel to `values`.
    pub frequencies: IntArrayDictionary,
}

impl SnapshotDictionaries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.frequencies.clear();
    }
}
