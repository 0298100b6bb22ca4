// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Most-recently-used list keyed by transformation id.
//!
//! A doubly linked list threaded through an arena of slots, plus an id → slot
//! map. Append, touch and removal are O(1); iteration runs from the most
//! recently used entry to the least recently used one or the other way round.

use std::collections::HashMap;

const NONE: usize = usize::MAX;

#[derive(Debug, Clone)]
struct Slot<T> {
    key: u64,
    value: T,
    /// Towards the LRU end.
    older: usize,
    /// Towards the MRU end.
    newer: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct MruList<T> {
    slots: Vec<Option<Slot<T>>>,
    index: HashMap<u64, usize>,
    free: Vec<usize>,
    /// Least recently used.
    head: usize,
    /// Most recently used.
    tail: usize,
}

impl<T> MruList<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
            free: Vec::new(),
            head: NONE,
            tail: NONE,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    pub(crate) fn contains(&self, key: u64) -> bool {
        self.index.contains_key(&key)
    }

    pub(crate) fn get(&self, key: u64) -> Option<&T> {
        let slot = *self.index.get(&key)?;
        self.slots[slot].as_ref().map(|s| &s.value)
    }

    /// Insert at the MRU end.
    ///
    /// # Panics
    ///
    /// Panics if `key` is already present.
    pub(crate) fn append(&mut self, key: u64, value: T) {
        assert!(!self.contains(key), "Key {} already in MRU list", key);
        let node = Slot {
            key,
            value,
            older: self.tail,
            newer: NONE,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.link_tail(slot);
        self.index.insert(key, slot);
    }

    /// Move `key` to the MRU end. Returns false if absent.
    pub(crate) fn touch(&mut self, key: u64) -> bool {
        let Some(&slot) = self.index.get(&key) else {
            return false;
        };
        if slot != self.tail {
            self.unlink(slot);
            if let Some(node) = self.slots[slot].as_mut() {
                node.older = self.tail;
                node.newer = NONE;
            }
            self.link_tail(slot);
        }
        true
    }

    pub(crate) fn remove(&mut self, key: u64) -> Option<T> {
        let slot = self.index.remove(&key)?;
        self.unlink(slot);
        self.free.push(slot);
        self.slots[slot].take().map(|node| node.value)
    }

    /// Remove the least recently used entry.
    pub(crate) fn pop_lru(&mut self) -> Option<(u64, T)> {
        if self.head == NONE {
            return None;
        }
        let key = self.slots[self.head].as_ref()?.key;
        self.remove(key).map(|value| (key, value))
    }

    /// Entries from most to least recently used.
    pub(crate) fn iter_mru(&self) -> impl Iterator<Item = (u64, &T)> + '_ {
        let mut cursor = self.tail;
        std::iter::from_fn(move || {
            let node = self.slots.get(cursor)?.as_ref()?;
            cursor = node.older;
            Some((node.key, &node.value))
        })
    }

    /// Keys from least to most recently used.
    pub(crate) fn keys_lru(&self) -> Vec<u64> {
        let mut keys: Vec<u64> = self.iter_mru().map(|(key, _)| key).collect();
        keys.reverse();
        keys
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
        self.free.clear();
        self.head = NONE;
        self.tail = NONE;
    }

    fn link_tail(&mut self, slot: usize) {
        if self.tail != NONE {
            if let Some(previous) = self.slots[self.tail].as_mut() {
                previous.newer = slot;
            }
        } else {
            self.head = slot;
        }
        self.tail = slot;
    }

    fn unlink(&mut self, slot: usize) {
        let (older, newer) = match self.slots[slot].as_ref() {
            Some(node) => (node.older, node.newer),
            None => return,
        };
        if older != NONE {
            if let Some(node) = self.slots[older].as_mut() {
                node.newer = newer;
            }
        } else {
            self.head = newer;
        }
        if newer != NONE {
            if let Some(node) = self.slots[newer].as_mut() {
                node.older = older;
            }
        } else {
            self.tail = older;
        }
    }
}
