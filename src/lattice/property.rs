// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Predictive properties and the per-lattice property registry.
//!
//! A property is a boolean tag on a lattice node. Its direction says what can
//! be inferred from it:
//! - `None`: nothing, the tag only describes the node itself
//! - `Up`: the tag also holds for every more general node
//! - `Down`: the tag also holds for every more specific node
//!
//! Whether "anonymous" is `Up`-predictive depends on the privacy model of the
//! current run, so every [`Lattice`](super::Lattice) owns its own registry.

use crate::error::{Result, SearchError};
use std::fmt;

/// Propagation direction of a predictive property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    None,
    Up,
    Down,
}

/// Index of a property in its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(u8);

impl PropertyId {
    /// Satisfies the active privacy model. `Up` when predictable.
    pub const ANONYMOUS: Self = Self(0);
    /// Violates the active privacy model. `Down` when predictable.
    pub const NOT_ANONYMOUS: Self = Self(1);
    /// Satisfies the k-anonymity part of the model.
    pub const K_ANONYMOUS: Self = Self(2);
    /// Violates the k-anonymity part of the model.
    pub const NOT_K_ANONYMOUS: Self = Self(3);
    /// Cannot beat the best utility found so far.
    pub const INSUFFICIENT_UTILITY: Self = Self(4);
    /// Evaluated by the node checker.
    pub const CHECKED: Self = Self(5);
    /// Cache this node even if its successors are pruned.
    pub const FORCE_SNAPSHOT: Self = Self(6);
    /// All more general nodes have been resolved.
    pub const SUCCESSORS_PRUNED: Self = Self(7);
    /// Reached by the search algorithm.
    pub const VISITED: Self = Self(8);
    /// Successors enqueued by the search algorithm.
    pub const EXPANDED: Self = Self(9);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A named tag with a propagation direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictiveProperty {
    pub label: &'static str,
    pub direction: Direction,
    /// A property that can never hold on the same node.
    pub opposite: Option<PropertyId>,
}

impl fmt::Display for PredictiveProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.label, self.direction)
    }
}

/// Set of properties on one node, one bit per registered property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PropertySet(u32);

impl PropertySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    #[inline]
    pub fn contains(self, property: PropertyId) -> bool {
        (self.0 >> property.0) & 1 != 0
    }

    #[inline]
    pub fn insert(&mut self, property: PropertyId) {
        self.0 |= 1 << property.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }
}

/// Properties known to one lattice.
#[derive(Debug, Clone)]
pub struct PropertyRegistry {
    properties: Vec<PredictiveProperty>,
}

impl PropertyRegistry {
    /// Bits available in a [`PropertySet`].
    pub const MAX_PROPERTIES: usize = 32;

    /// Registry holding the built-in properties.
    ///
    /// `predictable` selects whether `anonymous`/`not-anonymous` propagate.
    pub fn new(predictable: bool) -> Self {
        let builtin = |label, direction, opposite| PredictiveProperty {
            label,
            direction,
            opposite,
        };
        let mut registry = Self {
            properties: vec![
                builtin("anonymous", Direction::None, Some(PropertyId::NOT_ANONYMOUS)),
                builtin("not-anonymous", Direction::None, Some(PropertyId::ANONYMOUS)),
                builtin("k-anonymous", Direction::Up, Some(PropertyId::NOT_K_ANONYMOUS)),
                builtin("not-k-anonymous", Direction::Down, Some(PropertyId::K_ANONYMOUS)),
                builtin("insufficient-utility", Direction::Up, None),
                builtin("checked", Direction::None, None),
                builtin("force-snapshot", Direction::None, None),
                builtin("successors-pruned", Direction::None, None),
                builtin("visited", Direction::None, None),
                builtin("expanded", Direction::None, None),
            ],
        };
        registry.set_predictable(predictable);
        registry
    }

    /// Switch the `anonymous`/`not-anonymous` pair between `None` and `Up`/`Down`.
    pub fn set_predictable(&mut self, predictable: bool) {
        let (up, down) = if predictable {
            (Direction::Up, Direction::Down)
        } else {
            (Direction::None, Direction::None)
        };
        self.properties[PropertyId::ANONYMOUS.index()].direction = up;
        self.properties[PropertyId::NOT_ANONYMOUS.index()].direction = down;
    }

    pub fn is_predictable(&self) -> bool {
        self.direction(PropertyId::ANONYMOUS) == Direction::Up
    }

    /// Add a custom property.
    pub fn register(&mut self, label: &'static str, direction: Direction) -> Result<PropertyId> {
        if self.properties.len() >= Self::MAX_PROPERTIES {
            return Err(SearchError::PropertyRegistryFull {
                max: Self::MAX_PROPERTIES,
            });
        }
        let id = PropertyId(self.properties.len() as u8);
        self.properties.push(PredictiveProperty {
            label,
            direction,
            opposite: None,
        });
        Ok(id)
    }

    /// Declare two properties mutually exclusive.
    pub fn set_opposite(&mut self, a: PropertyId, b: PropertyId) {
        self.properties[a.index()].opposite = Some(b);
        self.properties[b.index()].opposite = Some(a);
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued by this registry.
    pub fn get(&self, id: PropertyId) -> &PredictiveProperty {
        &self.properties[id.index()]
    }

    pub fn direction(&self, id: PropertyId) -> Direction {
        self.get(id).direction
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl Default for PropertyRegistry {
    fn default() -> Self {
        Self::new(true)
    }
}
