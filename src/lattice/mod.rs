// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! The transformation lattice.
//!
//! Every quasi-identifier contributes one axis ranging over
//! `[min_levels[i], max_levels[i]]`. A node is a vector of levels; nodes are
//! addressed by a dense id computed with mixed-radix multipliers, so both
//! directions of the `id ↔ coordinates` mapping are O(dimensions) arithmetic
//! and no node objects are ever materialized up front.
//!
//! # Neighbours
//!
//! Direct successors (one step more general) and predecessors (one step more
//! specific) are computed from the id by adding or subtracting the axis
//! multiplier, giving adjacency as id lists instead of a pointer graph.
//!
//! # Properties
//!
//! The lattice owns a [`PropertyRegistry`] and a sparse store of tagged nodes.
//! Setting an `Up` or `Down` property walks the affected region with an
//! explicit worklist and tags every reached node, so that later lookups are a
//! single hash probe.

pub mod property;
mod storage;
pub mod transformation;

pub use property::{Direction, PredictiveProperty, PropertyId, PropertyRegistry, PropertySet};
pub use transformation::Transformation;

use crate::error::{Result, SearchError};
use std::collections::HashSet;
use storage::NodeStorage;
use tracing::{debug, warn};

/// Lattices larger than this trigger a warning on full enumeration.
pub const ENUMERATION_WARNING_SIZE: u64 = 1_000_000;

/// Addressable space of transformations plus per-node property storage.
#[derive(Debug, Clone)]
pub struct Lattice {
    min: Vec<u32>,
    max: Vec<u32>,
    /// `multipliers[i]` = product of the cardinalities of axes `i+1..`.
    multipliers: Vec<u64>,
    size: u64,
    properties: PropertyRegistry,
    storage: NodeStorage,
}

impl Lattice {
    /// Create a lattice with one axis per entry of `min_levels`/`max_levels`.
    ///
    /// Fails on mismatched lengths, zero axes, `min > max` on any axis, or if the
    /// node count overflows `u64`.
    pub fn new(min_levels: &[u32], max_levels: &[u32]) -> Result<Self> {
        if min_levels.len() != max_levels.len() {
            return Err(SearchError::DimensionMismatch {
                expected: min_levels.len(),
                actual: max_levels.len(),
            });
        }
        if min_levels.is_empty() {
            return Err(SearchError::EmptyLattice);
        }
        for (axis, (&min, &max)) in min_levels.iter().zip(max_levels).enumerate() {
            if min > max {
                return Err(SearchError::InconsistentBounds { axis, min, max });
            }
        }

        let dimensions = min_levels.len();
        let overflow = || SearchError::SizeOverflow { dimensions };

        let mut multipliers = vec![1u64; dimensions];
        let mut size = 1u64;
        for axis in (0..dimensions).rev() {
            multipliers[axis] = size;
            let cardinality = (max_levels[axis] - min_levels[axis]) as u64 + 1;
            size = size.checked_mul(cardinality).ok_or_else(overflow)?;
        }

        let level_of = |levels: &[u32]| -> Result<u32> {
            let sum: u64 = levels.iter().map(|&l| l as u64).sum();
            u32::try_from(sum).map_err(|_| overflow())
        };
        let min_level = level_of(min_levels)?;
        let max_level = level_of(max_levels)?;

        debug!(dimensions, size, min_level, max_level, "lattice created");

        Ok(Self {
            min: min_levels.to_vec(),
            max: max_levels.to_vec(),
            multipliers,
            size,
            properties: PropertyRegistry::default(),
            storage: NodeStorage::new(min_level, max_level),
        })
    }

    pub fn dimensions(&self) -> usize {
        self.min.len()
    }

    /// Total number of nodes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Least generalized coordinates.
    pub fn bottom(&self) -> &[u32] {
        &self.min
    }

    /// Most generalized coordinates.
    pub fn top(&self) -> &[u32] {
        &self.max
    }

    pub fn bottom_transformation(&self) -> Transformation {
        self.build(0, self.min.clone())
    }

    pub fn top_transformation(&self) -> Transformation {
        self.build(self.size - 1, self.max.clone())
    }

    /// Sum of coordinates.
    pub fn level(generalization: &[u32]) -> u32 {
        generalization.iter().sum()
    }

    pub fn min_level(&self) -> u32 {
        Self::level(&self.min)
    }

    pub fn max_level(&self) -> u32 {
        Self::level(&self.max)
    }

    /// Dense id of an in-bounds coordinate vector.
    ///
    /// # Panics
    ///
    /// Debug builds panic if the vector is out of bounds.
    #[inline]
    pub fn encode(&self, generalization: &[u32]) -> u64 {
        debug_assert!(self.check_bounds(generalization).is_ok());
        generalization
            .iter()
            .zip(&self.min)
            .zip(&self.multipliers)
            .map(|((&level, &min), &multiplier)| (level - min) as u64 * multiplier)
            .sum()
    }

    /// Coordinates of an id in `0..size`.
    #[inline]
    pub fn decode(&self, id: u64) -> Vec<u32> {
        let mut remainder = id;
        self.multipliers
            .iter()
            .zip(&self.min)
            .map(|(&multiplier, &min)| {
                let offset = remainder / multiplier;
                remainder %= multiplier;
                min + offset as u32
            })
            .collect()
    }

    /// Look up a transformation by id.
    pub fn transformation(&self, id: u64) -> Result<Transformation> {
        if id >= self.size {
            return Err(SearchError::UnknownTransformation {
                id,
                size: self.size,
            });
        }
        Ok(self.build(id, self.decode(id)))
    }

    /// Look up a transformation by coordinates.
    pub fn transformation_of(&self, generalization: &[u32]) -> Result<Transformation> {
        self.check_bounds(generalization)?;
        Ok(self.build(self.encode(generalization), generalization.to_vec()))
    }

    fn build(&self, id: u64, generalization: Vec<u32>) -> Transformation {
        let level = Self::level(&generalization);
        Transformation::new(id, level, generalization.into_boxed_slice())
    }

    fn check_bounds(&self, generalization: &[u32]) -> Result<()> {
        if generalization.len() != self.dimensions() {
            return Err(SearchError::DimensionMismatch {
                expected: self.dimensions(),
                actual: generalization.len(),
            });
        }
        for (axis, &value) in generalization.iter().enumerate() {
            let (min, max) = (self.min[axis], self.max[axis]);
            if value < min || value > max {
                return Err(SearchError::OutOfBounds {
                    axis,
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }

    /// True iff `child` is exactly one generalization step above `parent`.
    pub fn is_direct_parent_child(parent: &[u32], child: &[u32]) -> bool {
        let steps: u64 = parent.iter().zip(child).map(|(&p, &c)| c.saturating_sub(p) as u64).sum();
        Self::is_parent_child_or_equal(parent, child) && steps == 1
    }

    /// True iff `parent` is equal to or more specific than `child` on every axis.
    pub fn is_parent_child_or_equal(parent: &[u32], child: &[u32]) -> bool {
        parent.len() == child.len() && parent.iter().zip(child).all(|(p, c)| p <= c)
    }

    /// Ids of the nodes one step more general.
    pub fn successors(&self, transformation: &Transformation) -> Vec<u64> {
        self.successor_ids(transformation.id(), transformation.generalization())
    }

    /// Ids of the nodes one step more specific.
    pub fn predecessors(&self, transformation: &Transformation) -> Vec<u64> {
        self.predecessor_ids(transformation.id(), transformation.generalization())
    }

    fn successor_ids(&self, id: u64, generalization: &[u32]) -> Vec<u64> {
        (0..self.dimensions())
            .filter(|&axis| generalization[axis] < self.max[axis])
            .map(|axis| id + self.multipliers[axis])
            .collect()
    }

    fn predecessor_ids(&self, id: u64, generalization: &[u32]) -> Vec<u64> {
        (0..self.dimensions())
            .filter(|&axis| generalization[axis] > self.min[axis])
            .map(|axis| id - self.multipliers[axis])
            .collect()
    }

    // Properties

    pub fn properties(&self) -> &PropertyRegistry {
        &self.properties
    }

    /// Register a custom property on this lattice.
    pub fn register_property(
        &mut self,
        label: &'static str,
        direction: Direction,
    ) -> Result<PropertyId> {
        self.properties.register(label, direction)
    }

    /// Declare two registered properties mutually exclusive.
    pub fn set_opposite_properties(&mut self, a: PropertyId, b: PropertyId) {
        self.properties.set_opposite(a, b);
    }

    /// Declare the monotonicity of the active privacy model.
    ///
    /// Only changes what future callers may infer; tags already stored stay as they are.
    pub fn set_property_predictable(&mut self, predictable: bool) {
        self.properties.set_predictable(predictable);
    }

    pub fn has_property(&self, transformation: &Transformation, property: PropertyId) -> bool {
        self.has_property_at(transformation.level(), transformation.id(), property)
    }

    /// Property lookup for callers that only kept level and id.
    ///
    /// Levels outside the lattice carry no properties.
    #[inline]
    pub fn has_property_at(&self, level: u32, id: u64, property: PropertyId) -> bool {
        self.storage.get(level, id).contains(property)
    }

    /// All properties of one node.
    pub fn properties_of(&self, transformation: &Transformation) -> PropertySet {
        self.storage.get(transformation.level(), transformation.id())
    }

    /// Tag a node, propagating according to the property's direction.
    pub fn put_property(&mut self, transformation: &Transformation, property: PropertyId) -> Result<()> {
        match self.properties.direction(property) {
            Direction::None => {
                self.check_opposite(transformation.level(), transformation.id(), property)?;
                self.storage
                    .insert(transformation.level(), transformation.id(), property);
                Ok(())
            }
            Direction::Up => self.put_property_upwards(transformation, true, property),
            Direction::Down => self.put_property_downwards(transformation, true, property),
        }
    }

    /// Tag every more general node, and the node itself if `include_self`.
    pub fn put_property_upwards(
        &mut self,
        transformation: &Transformation,
        include_self: bool,
        property: PropertyId,
    ) -> Result<()> {
        self.propagate(transformation, include_self, property, true)
    }

    /// Tag every more specific node, and the node itself if `include_self`.
    pub fn put_property_downwards(
        &mut self,
        transformation: &Transformation,
        include_self: bool,
        property: PropertyId,
    ) -> Result<()> {
        self.propagate(transformation, include_self, property, false)
    }

    fn propagate(
        &mut self,
        start: &Transformation,
        include_self: bool,
        property: PropertyId,
        upwards: bool,
    ) -> Result<()> {
        // Collect first, so a contradiction leaves the storage untouched.
        let mut pending: Vec<(u64, u32)> = Vec::new();
        let mut seen: HashSet<u64> = HashSet::new();
        let mut stack: Vec<(u64, u32)> = vec![(start.id(), start.level())];
        seen.insert(start.id());

        while let Some((id, level)) = stack.pop() {
            let is_start = id == start.id();
            // A tagged node may have been set without propagation, so keep walking past it.
            if (!is_start || include_self) && !self.has_property_at(level, id, property) {
                self.check_opposite(level, id, property)?;
                pending.push((id, level));
            }

            let generalization = self.decode(id);
            let (neighbours, next_level) = if upwards {
                (self.successor_ids(id, &generalization), level + 1)
            } else {
                (self.predecessor_ids(id, &generalization), level.wrapping_sub(1))
            };
            for neighbour in neighbours {
                if seen.insert(neighbour) {
                    stack.push((neighbour, next_level));
                }
            }
        }

        for (id, level) in pending {
            self.storage.insert(level, id, property);
        }
        Ok(())
    }

    fn check_opposite(&self, level: u32, id: u64, property: PropertyId) -> Result<()> {
        if let Some(opposite) = self.properties.get(property).opposite {
            if self.has_property_at(level, id, opposite) {
                return Err(SearchError::ContradictoryProperty {
                    property: self.properties.get(property).label,
                    opposite: self.properties.get(opposite).label,
                    id,
                });
            }
        }
        Ok(())
    }

    /// Forget all stored tags.
    pub fn clear_properties(&mut self) {
        self.storage.clear();
    }

    // Enumeration

    /// Nodes carrying at least one tag, ordered by level then id.
    pub fn materialized_transformations(&self) -> impl Iterator<Item = Transformation> + '_ {
        self.storage
            .ids()
            .into_iter()
            .map(move |id| self.build(id, self.decode(id)))
    }

    /// Number of tagged nodes.
    pub fn materialized_count(&self) -> usize {
        self.storage.len()
    }

    /// Every node on one level, by full enumeration of the lattice.
    ///
    /// Cost is proportional to [`size`](Self::size); only use on small lattices.
    pub fn all_transformations_at_level(&self, level: u32) -> Vec<Transformation> {
        if self.size > ENUMERATION_WARNING_SIZE {
            warn!(
                size = self.size,
                level, "full enumeration of a large lattice"
            );
        }

        let mut result = Vec::new();
        if level < self.min_level() || level > self.max_level() {
            return result;
        }

        // Odometer over all coordinates in id order.
        let mut current = self.min.clone();
        let mut current_level = self.min_level();
        for id in 0..self.size {
            if current_level == level {
                result.push(self.build(id, current.clone()));
            }
            for axis in (0..self.dimensions()).rev() {
                if current[axis] < self.max[axis] {
                    current[axis] += 1;
                    current_level += 1;
                    break;
                }
                current_level -= current[axis] - self.min[axis];
                current[axis] = self.min[axis];
            }
        }
        result
    }
}
