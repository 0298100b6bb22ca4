// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Snapshot cache of evaluated transformations.
//!
//! A snapshot of node `T` lets any strictly more general node be grouped by
//! rolling up `T`'s classes instead of rescanning the dataset. The history keeps
//! a bounded number of snapshots in most-recently-used order and picks the
//! smallest usable one on lookup.
//!
//! # Admission
//!
//! A groupify offered to [`History::store`] is rejected, in this order, when:
//! 1. the cache size is zero
//! 2. it has more classes than `rows × snapshot_size_dataset`
//! 3. it shrank too little relative to the snapshot it was rolled up from
//! 4. its node is `successors-pruned` and not `force-snapshot`
//! 5. the storage strategy excludes it
//!
//! An admitted snapshot first triggers cleanup of entries whose nodes have
//! since been pruned, then replaces any entry for the same id, then evicts
//! least recently used entries to make room.

pub mod dictionary;
mod mru;
pub mod snapshot;

pub use dictionary::{IntArrayDictionary, SnapshotDictionaries};
pub use snapshot::{Snapshot, SnapshotLayout, SnapshotRecord};

use crate::config::{HistoryConfig, StorageStrategy};
use crate::data::DataManager;
use crate::error::Result;
use crate::groupify::HashGroupify;
use crate::lattice::{Lattice, PropertyId, Transformation};
use crate::statistics::{Counters, Statistics};
use mru::MruList;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
struct CachedSnapshot {
    level: u32,
    generalization: Box<[u32]>,
    snapshot: Snapshot,
}

/// A usable ancestor found by [`History::get`].
///
/// Borrows the history, so the snapshot and the dictionary entries it points
/// into cannot be released while the hit is alive.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotHit<'a> {
    pub source_id: u64,
    pub source_level: u32,
    pub source_generalization: &'a [u32],
    pub snapshot: &'a Snapshot,
}

/// Bounded MRU cache of snapshots plus the dictionaries they point into.
#[derive(Debug)]
pub struct History {
    config: HistoryConfig,
    /// Absolute class-count cap derived from the dataset size.
    snapshot_size_dataset: usize,
    layout: SnapshotLayout,
    cache: MruList<CachedSnapshot>,
    dictionaries: SnapshotDictionaries,
    statistics: Statistics,
}

impl History {
    pub fn new(data: &DataManager, config: HistoryConfig) -> Result<Self> {
        config.validate()?;
        let snapshot_size_dataset = (data.rows() as f64 * config.snapshot_size_dataset).floor() as usize;
        let layout = SnapshotLayout::new(data.requirements(), data.sensitive_attributes());
        debug!(
            size = config.size,
            snapshot_size_dataset,
            width = layout.width(),
            "history created"
        );
        Ok(Self {
            config,
            snapshot_size_dataset,
            layout,
            cache: MruList::new(),
            dictionaries: SnapshotDictionaries::new(),
            statistics: Statistics::new(),
        })
    }

    /// Find the cached ancestor of `target` with the smallest snapshot.
    ///
    /// Only strictly lower levels qualify. Candidates are scanned from most to
    /// least recently used and a later one wins only if strictly smaller. The
    /// winner is moved to the MRU end.
    pub fn get(&mut self, target: &Transformation) -> Option<SnapshotHit<'_>> {
        let id = self.find(target);
        self.record_lookup(id);
        id.and_then(|id| self.hit(id))
    }

    /// [`get`](Self::get) without touching recency or counters.
    pub fn peek(&self, target: &Transformation) -> Option<SnapshotHit<'_>> {
        self.find(target).and_then(|id| self.hit(id))
    }

    fn find(&self, target: &Transformation) -> Option<u64> {
        let mut best: Option<(u64, usize)> = None;
        for (id, cached) in self.cache.iter_mru() {
            if cached.level < target.level()
                && Lattice::is_parent_child_or_equal(&cached.generalization, target.generalization())
                && best.map_or(true, |(_, smallest)| cached.snapshot.len() < smallest)
            {
                best = Some((id, cached.snapshot.len()));
            }
        }
        best.map(|(id, _)| id)
    }

    fn hit(&self, id: u64) -> Option<SnapshotHit<'_>> {
        self.cache.get(id).map(|cached| SnapshotHit {
            source_id: id,
            source_level: cached.level,
            source_generalization: &cached.generalization,
            snapshot: &cached.snapshot,
        })
    }

    /// Count a lookup and touch its hit, if any.
    pub(crate) fn record_lookup(&mut self, hit: Option<u64>) {
        match hit {
            Some(id) => {
                trace!(source = id, "snapshot hit");
                self.cache.touch(id);
                self.statistics.increment(Counters::SnapshotHits);
            }
            None => self.statistics.increment(Counters::SnapshotMisses),
        }
    }

    /// Offer the groupify of `transformation` to the cache. Returns whether it was stored.
    ///
    /// `previous` is the snapshot the groupify was rolled up from, if any.
    pub fn store(
        &mut self,
        lattice: &Lattice,
        transformation: &Transformation,
        groupify: &HashGroupify,
        previous: Option<&Snapshot>,
    ) -> bool {
        if let Some(reason) = self.rejection(lattice, transformation, groupify, previous) {
            trace!(node = %transformation, reason, "snapshot rejected");
            self.statistics.increment(Counters::SnapshotsRejected);
            return false;
        }

        self.cleanup(lattice);
        if let Some(old) = self.cache.remove(transformation.id()) {
            self.discard(old);
        }
        while self.cache.len() >= self.config.size {
            match self.cache.pop_lru() {
                Some((id, evicted)) => {
                    trace!(evicted = id, "snapshot evicted");
                    self.discard(evicted);
                    self.statistics.increment(Counters::SnapshotsEvicted);
                }
                None => break,
            }
        }

        let snapshot = self.layout.encode(groupify, &mut self.dictionaries);
        trace!(node = %transformation, classes = groupify.size(), "snapshot stored");
        self.cache.append(
            transformation.id(),
            CachedSnapshot {
                level: transformation.level(),
                generalization: transformation.generalization().into(),
                snapshot,
            },
        );
        self.statistics.increment(Counters::SnapshotsStored);
        true
    }

    fn rejection(
        &self,
        lattice: &Lattice,
        transformation: &Transformation,
        groupify: &HashGroupify,
        previous: Option<&Snapshot>,
    ) -> Option<&'static str> {
        let classes = groupify.size();
        if self.config.size == 0 {
            return Some("history disabled");
        }
        if classes > self.snapshot_size_dataset {
            return Some("too many classes for dataset");
        }
        if let Some(previous) = previous {
            let ratio = classes as f64 / self.layout.records(previous) as f64;
            if ratio > self.config.snapshot_size_snapshot {
                return Some("too little reduction from previous snapshot");
            }
        }
        let properties = lattice.properties_of(transformation);
        if properties.contains(PropertyId::SUCCESSORS_PRUNED)
            && !properties.contains(PropertyId::FORCE_SNAPSHOT)
        {
            return Some("successors pruned");
        }
        if self.config.storage_strategy == StorageStrategy::NonAnonymous
            && !properties.contains(PropertyId::NOT_ANONYMOUS)
        {
            return Some("storage strategy");
        }
        None
    }

    /// Drop every entry whose node has become `successors-pruned`.
    fn cleanup(&mut self, lattice: &Lattice) {
        let pruned: Vec<u64> = self
            .cache
            .iter_mru()
            .filter(|(id, cached)| lattice.has_property_at(cached.level, *id, PropertyId::SUCCESSORS_PRUNED))
            .map(|(id, _)| id)
            .collect();
        for id in pruned {
            if let Some(cached) = self.cache.remove(id) {
                trace!(pruned = id, "snapshot removed");
                self.discard(cached);
                self.statistics.increment(Counters::SnapshotsPruned);
            }
        }
    }

    fn discard(&mut self, cached: CachedSnapshot) {
        self.layout.release(&cached.snapshot, &mut self.dictionaries);
    }

    /// Change the capacity. Takes effect on the next store.
    pub fn set_size(&mut self, size: usize) {
        self.config.size = size;
    }

    /// Change the admission trigger. Entries already cached stay.
    pub fn set_storage_strategy(&mut self, strategy: StorageStrategy) {
        self.config.storage_strategy = strategy;
    }

    /// Empty the cache and both dictionaries.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.dictionaries.clear();
    }

    /// Number of cached snapshots.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.len() == 0
    }

    pub fn contains(&self, id: u64) -> bool {
        self.cache.contains(id)
    }

    /// Snapshot cached for exactly `id`, without touching its recency.
    pub fn snapshot(&self, id: u64) -> Option<&Snapshot> {
        self.cache.get(id).map(|cached| &cached.snapshot)
    }

    /// Cached ids from least to most recently used.
    pub fn ids_lru(&self) -> Vec<u64> {
        self.cache.keys_lru()
    }

    pub fn layout(&self) -> &SnapshotLayout {
        &self.layout
    }

    pub fn dictionaries(&self) -> &SnapshotDictionaries {
        &self.dictionaries
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Class-count cap derived from the dataset size.
    pub fn snapshot_size_dataset(&self) -> usize {
        self.snapshot_size_dataset
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }
}
