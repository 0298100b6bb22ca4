// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Search context combining shared input data and per-search state.
//!
//! The SearchContext is the core data structure that combines:
//! - Tier 1: Immutable input data ([`DataManager`]) behind an `Arc`
//! - Tier 2: Mutable search state (lattice tags, snapshot cache, last groupify)
//!
//! Several contexts can search the same data independently, each owning its
//! own lattice and history.

use crate::config::SearchConfig;
use crate::data::DataManager;
use crate::error::{Result, SearchError};
use crate::groupify::HashGroupify;
use crate::history::History;
use crate::interrupt::Interrupt;
use crate::lattice::{Lattice, PropertyId, Transformation};
use crate::statistics::{Counters, Statistics};
use crate::transformer::Transformer;
use std::sync::Arc;
use tracing::{debug, trace};

/// Where the groupify of a checked node came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    FullScan,
    /// Rolled up from the previously checked node.
    Groupify { from: u64 },
    /// Rolled up from a cached snapshot.
    Snapshot { from: u64 },
}

/// Outcome of [`SearchContext::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckResult {
    pub transformation: u64,
    pub anonymous: bool,
    /// Number of equivalence classes.
    pub classes: usize,
    pub source: Source,
    /// Whether the groupify was admitted to the snapshot cache.
    pub stored: bool,
}

/// Search context combining shared data and owned search state.
///
/// # Memory Model
///
/// ```text
/// SearchContext {
///     data: Arc<DataManager>,   // Tier 1: Immutable, shared
///     lattice: Lattice,         // Tier 2: node tags
///     history: History,         // Tier 2: snapshot cache
///     last: (node, groupify),   // Tier 2: most recent evaluation
/// }
/// ```
#[derive(Debug)]
pub struct SearchContext {
    /// Input data (Tier 1)
    pub data: Arc<DataManager>,
    /// Node tags (Tier 2)
    pub lattice: Lattice,
    /// Snapshot cache (Tier 2)
    pub history: History,
    transformer: Transformer,
    statistics: Statistics,
    interrupt: Interrupt,
    last: Option<(Transformation, HashGroupify)>,
}

impl SearchContext {
    /// Create a context searching the lattice spanned by `min_levels..=max_levels`.
    ///
    /// Fails if the bounds do not match the data's quasi-identifiers or exceed
    /// their hierarchies, or if any part of `config` is invalid.
    pub fn new(
        data: Arc<DataManager>,
        min_levels: &[u32],
        max_levels: &[u32],
        config: SearchConfig,
    ) -> Result<Self> {
        config.validate()?;
        let mut lattice = Lattice::new(min_levels, max_levels)?;
        if lattice.dimensions() != data.dimensions() {
            return Err(SearchError::DimensionMismatch {
                expected: data.dimensions(),
                actual: lattice.dimensions(),
            });
        }
        lattice.set_property_predictable(config.property_predictable);

        let transformer = Transformer::new(Arc::clone(&data), config.transformer)?;
        transformer.check_levels(&lattice.top_transformation())?;
        let history = History::new(&data, config.history)?;

        debug!(
            size = lattice.size(),
            predictable = config.property_predictable,
            "search context created"
        );

        Ok(Self {
            data,
            lattice,
            history,
            transformer,
            statistics: Statistics::new(),
            interrupt: Interrupt::new(),
            last: None,
        })
    }

    /// Evaluate one transformation.
    ///
    /// The groupify is built from the cheapest available source: a cached
    /// snapshot of a strictly finer node, else the previous groupify if its node
    /// is strictly finer, else a full scan. `judge` decides anonymity; the node
    /// is tagged accordingly plus `checked`, and offered to the history.
    ///
    /// An interrupt, whether raised before or during the evaluation, returns
    /// [`SearchError::Interrupted`] with the lattice and history unchanged. A
    /// verdict that contradicts existing tags returns
    /// [`SearchError::ContradictoryProperty`] and is not counted as a check.
    pub fn check<F>(&mut self, transformation: &Transformation, judge: F) -> Result<CheckResult>
    where
        F: FnOnce(&HashGroupify) -> bool,
    {
        let hit = self.history.peek(transformation);
        let built = self.interrupt.check().and_then(|()| match hit {
            Some(hit) => self
                .transformer
                .apply_snapshot(
                    transformation,
                    hit.snapshot,
                    self.history.layout(),
                    self.history.dictionaries(),
                    &self.interrupt,
                )
                .map(|g| (g, Source::Snapshot { from: hit.source_id })),
            None => match &self.last {
                Some((previous, groupify)) if Self::is_strictly_finer(previous, transformation) => self
                    .transformer
                    .apply_groupify(transformation, groupify, &self.interrupt)
                    .map(|g| (g, Source::Groupify { from: previous.id() })),
                _ => self
                    .transformer
                    .apply_all(transformation, &self.interrupt)
                    .map(|g| (g, Source::FullScan)),
            },
        });
        // Held only until admission, which reads its size before evicting anything.
        let previous = hit.map(|hit| (hit.source_id, hit.snapshot.clone()));
        let (groupify, source) = match built {
            Ok(built) => built,
            Err(SearchError::Interrupted) => {
                self.statistics.increment(Counters::Interrupts);
                return Err(SearchError::Interrupted);
            }
            Err(err) => return Err(err),
        };

        let anonymous = judge(&groupify);
        let verdict = if anonymous {
            PropertyId::ANONYMOUS
        } else {
            PropertyId::NOT_ANONYMOUS
        };
        self.lattice.put_property(transformation, verdict)?;
        self.lattice.put_property(transformation, PropertyId::CHECKED)?;

        self.history.record_lookup(previous.as_ref().map(|(id, _)| *id));
        self.statistics.increment(Counters::Checks);
        self.statistics.increment(match source {
            Source::FullScan => Counters::FullScans,
            Source::Groupify { .. } => Counters::GroupifyRollups,
            Source::Snapshot { .. } => Counters::SnapshotRollups,
        });

        let stored = self.history.store(
            &self.lattice,
            transformation,
            &groupify,
            previous.as_ref().map(|(_, snapshot)| snapshot),
        );

        trace!(
            node = %transformation,
            anonymous,
            classes = groupify.size(),
            ?source,
            stored,
            "checked"
        );

        let result = CheckResult {
            transformation: transformation.id(),
            anonymous,
            classes: groupify.size(),
            source,
            stored,
        };
        self.last = Some((transformation.clone(), groupify));
        Ok(result)
    }

    fn is_strictly_finer(previous: &Transformation, target: &Transformation) -> bool {
        previous.level() < target.level()
            && Lattice::is_parent_child_or_equal(previous.generalization(), target.generalization())
    }

    /// Handle for cancelling evaluations from another thread.
    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    /// Groupify of the most recently checked node.
    pub fn current_groupify(&self) -> Option<(&Transformation, &HashGroupify)> {
        self.last.as_ref().map(|(t, g)| (t, g))
    }

    pub fn transformer(&self) -> &Transformer {
        &self.transformer
    }

    /// Counters of this context and its history.
    pub fn statistics(&self) -> Statistics {
        let mut statistics = self.statistics.clone();
        statistics.merge(self.history.statistics());
        statistics
    }

    /// Empty the snapshot cache and forget the previous groupify.
    pub fn reset_history(&mut self) {
        self.history.reset();
        self.last = None;
    }
}
