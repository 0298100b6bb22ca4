// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Builds the groupify of a transformation.
//!
//! Three routes lead to the same result:
//! - [`Transformer::apply_all`] generalizes every row of the dataset
//! - [`Transformer::apply_groupify`] rolls up the classes of a finer groupify
//! - [`Transformer::apply_snapshot`] rolls up the records of a cached snapshot
//!
//! A rollup generalizes each class's representative row at the target levels.
//! This is only sound when the source node is equal to or more specific than
//! the target on every axis; callers guarantee that.

mod scan;

use crate::config::TransformerConfig;
use crate::data::{DataManager, GeneralizationHierarchy, RowSet};
use crate::error::{Result, SearchError};
use crate::groupify::{DistributionSource, HashGroupify};
use crate::history::{Snapshot, SnapshotDictionaries, SnapshotLayout};
use crate::interrupt::Interrupt;
use crate::lattice::Transformation;
use std::sync::Arc;
use tracing::debug;

/// Classes handled between two interrupt polls during a rollup.
const INTERRUPT_STRIDE: usize = 4096;

/// Upper bound on the initial class estimate of a full scan.
const INITIAL_CLASSES: usize = 1024;

pub struct Transformer {
    data: Arc<DataManager>,
    config: TransformerConfig,
    pool: Option<rayon::ThreadPool>,
}

impl std::fmt::Debug for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformer")
            .field("rows", &self.data.rows())
            .field("config", &self.config)
            .field("parallel", &self.pool.is_some())
            .finish()
    }
}

impl Transformer {
    /// Fails if the configuration is invalid, if the data lacks inputs its
    /// requirements call for, or if the worker pool cannot be built.
    pub fn new(data: Arc<DataManager>, config: TransformerConfig) -> Result<Self> {
        config.validate()?;
        data.validate()?;
        let pool = if config.threads > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(config.threads)
                    .build()?,
            )
        } else {
            None
        };
        debug!(
            threads = config.threads,
            min_rows_per_slice = config.min_rows_per_slice,
            "transformer created"
        );
        Ok(Self { data, config, pool })
    }

    pub fn data(&self) -> &Arc<DataManager> {
        &self.data
    }

    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    /// Groupify `target` by scanning every row.
    pub fn apply_all(&self, target: &Transformation, interrupt: &Interrupt) -> Result<HashGroupify> {
        self.check_levels(target)?;
        let levels = target.generalization();
        match &self.pool {
            Some(pool) if self.data.rows() > self.config.min_rows_per_slice => {
                scan::parallel(self, pool, levels, interrupt)
            }
            _ => scan::sequential(self, levels, interrupt),
        }
    }

    /// Groupify `target` by rolling up a groupify of a finer node.
    pub fn apply_groupify(
        &self,
        target: &Transformation,
        source: &HashGroupify,
        interrupt: &Interrupt,
    ) -> Result<HashGroupify> {
        self.check_levels(target)?;
        let levels = target.generalization();
        let hierarchies = self.data.hierarchies();
        let sensitive = self.data.sensitive_attributes();
        let mut groupify = self.new_groupify(source.size());
        let mut key = vec![0u32; levels.len()];

        for (index, (_, entry)) in source.iter().enumerate() {
            if index % INTERRUPT_STRIDE == 0 {
                interrupt.check()?;
            }
            let representative = entry.representative();
            self.generalize_into(hierarchies, levels, representative, &mut key);
            let distributions = if sensitive > 0 {
                DistributionSource::Distributions(entry.distributions())
            } else {
                DistributionSource::None
            };
            groupify.add(&key, representative, entry.count(), entry.secondary(), distributions);
        }
        Ok(groupify)
    }

    /// Groupify `target` by rolling up a snapshot of a finer node.
    pub fn apply_snapshot(
        &self,
        target: &Transformation,
        snapshot: &Snapshot,
        layout: &SnapshotLayout,
        dictionaries: &SnapshotDictionaries,
        interrupt: &Interrupt,
    ) -> Result<HashGroupify> {
        self.check_levels(target)?;
        let levels = target.generalization();
        let hierarchies = self.data.hierarchies();
        let sensitive = layout.sensitive_attributes();
        let mut groupify = self.new_groupify(layout.records(snapshot));
        let mut key = vec![0u32; levels.len()];
        let mut packed: Vec<(&[u32], &[u32])> = Vec::with_capacity(sensitive);

        for (index, record) in layout.iter(snapshot).enumerate() {
            if index % INTERRUPT_STRIDE == 0 {
                interrupt.check()?;
            }
            let representative = layout.representative(record);
            self.generalize_into(hierarchies, levels, representative, &mut key);

            packed.clear();
            for attribute in 0..sensitive {
                let (values, frequencies) = layout.distribution_ids(record, attribute);
                packed.push((dictionaries.values.get(values), dictionaries.frequencies.get(frequencies)));
            }
            let distributions = if sensitive > 0 {
                DistributionSource::Packed(&packed)
            } else {
                DistributionSource::None
            };
            groupify.add(
                &key,
                representative,
                layout.count(record),
                layout.secondary(record),
                distributions,
            );
        }
        Ok(groupify)
    }

    /// Reject targets whose shape or levels the hierarchies cannot serve.
    pub fn check_levels(&self, target: &Transformation) -> Result<()> {
        let hierarchies = self.data.hierarchies();
        if target.dimensions() != hierarchies.len() {
            return Err(SearchError::DimensionMismatch {
                expected: hierarchies.len(),
                actual: target.dimensions(),
            });
        }
        for (attribute, (&level, hierarchy)) in target.generalization().iter().zip(hierarchies).enumerate() {
            if level as usize >= hierarchy.levels() {
                return Err(SearchError::LevelOutOfHierarchy {
                    attribute,
                    level,
                    levels: hierarchy.levels(),
                });
            }
        }
        Ok(())
    }

    fn new_groupify(&self, expected_classes: usize) -> HashGroupify {
        HashGroupify::new(
            expected_classes,
            self.data.dimensions(),
            self.data.sensitive_attributes(),
        )
    }

    #[inline]
    fn generalize_into(
        &self,
        hierarchies: &[GeneralizationHierarchy],
        levels: &[u32],
        row: u32,
        key: &mut [u32],
    ) {
        generalize_row(hierarchies, levels, self.data.generalized().row(row as usize), key);
    }

    /// Research subset, if secondary counts are required.
    fn subset(&self) -> Option<&RowSet> {
        if self.data.requirements().has_secondary() {
            self.data.subset()
        } else {
            None
        }
    }
}

/// Write the generalization of one encoded row at `levels` into `key`.
#[inline]
pub(crate) fn generalize_row(
    hierarchies: &[GeneralizationHierarchy],
    levels: &[u32],
    row: &[u32],
    key: &mut [u32],
) {
    for (axis, slot) in key.iter_mut().enumerate() {
        *slot = hierarchies[axis].generalize(row[axis], levels[axis]);
    }
}
