// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Sparse per-node property storage keyed by `(level, id)`.
//!
//! Only nodes that have been tagged occupy memory. One hash map per level keeps
//! the maps small and lets a search enumerate tagged nodes level by level.

use super::property::{PropertyId, PropertySet};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub(crate) struct NodeStorage {
    /// Indexed by `level - min_level`.
    levels: Vec<HashMap<u64, PropertySet>>,
    min_level: u32,
}

impl NodeStorage {
    pub(crate) fn new(min_level: u32, max_level: u32) -> Self {
        Self {
            levels: vec![HashMap::new(); (max_level - min_level) as usize + 1],
            min_level,
        }
    }

    /// Empty for levels outside the stored range.
    #[inline]
    pub(crate) fn get(&self, level: u32, id: u64) -> PropertySet {
        level
            .checked_sub(self.min_level)
            .and_then(|offset| self.levels.get(offset as usize))
            .and_then(|nodes| nodes.get(&id))
            .copied()
            .unwrap_or_default()
    }

    #[inline]
    pub(crate) fn insert(&mut self, level: u32, id: u64, property: PropertyId) {
        self.levels[(level - self.min_level) as usize]
            .entry(id)
            .or_default()
            .insert(property);
    }

    /// Number of tagged nodes.
    pub(crate) fn len(&self) -> usize {
        self.levels.iter().map(HashMap::len).sum()
    }

    /// Tagged node ids ordered by level, then id.
    pub(crate) fn ids(&self) -> Vec<u64> {
        let mut ids = Vec::with_capacity(self.len());
        for level in &self.levels {
            let start = ids.len();
            ids.extend(level.keys().copied());
            ids[start..].sort_unstable();
        }
        ids
    }

    pub(crate) fn clear(&mut self) {
        for level in &mut self.levels {
            level.clear();
        }
    }
}
