// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Error types for lattice construction, data validation and node evaluation.
//!
//! Configuration problems are reported when a [`Lattice`](crate::lattice::Lattice),
//! [`DataManager`](crate::data::DataManager) or [`Transformer`](crate::transformer::Transformer)
//! is built, never in the middle of a traversal. The only error a traversal can
//! produce on its own is [`SearchError::Interrupted`], which is a cooperative abort.

use thiserror::Error;

/// Errors surfaced to the driving search algorithm.
#[derive(Debug, Error)]
pub enum SearchError {
    /// An axis has a lower bound above its upper bound.
    #[error("inconsistent bounds on axis {axis}: min {min} > max {max}")]
    InconsistentBounds { axis: usize, min: u32, max: u32 },

    /// A lattice needs at least one axis.
    #[error("lattice must have at least one dimension")]
    EmptyLattice,

    /// Two per-dimension inputs disagree on the number of dimensions.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The number of lattice nodes does not fit in 64 bits.
    #[error("lattice size overflows u64 ({dimensions} dimensions)")]
    SizeOverflow { dimensions: usize },

    /// A coordinate lies outside the configured bounds of its axis.
    #[error("coordinate {value} out of bounds on axis {axis} [{min}, {max}]")]
    OutOfBounds {
        axis: usize,
        value: u32,
        min: u32,
        max: u32,
    },

    /// A transformation id is not part of the lattice.
    #[error("transformation id {id} out of range (lattice size {size})")]
    UnknownTransformation { id: u64, size: u64 },

    /// Setting a property would contradict an opposite property on a comparable node.
    #[error("property '{property}' contradicts '{opposite}' already set on node {id}")]
    ContradictoryProperty {
        property: &'static str,
        opposite: &'static str,
        id: u64,
    },

    /// No room left in the per-lattice property registry.
    #[error("property registry full ({max} properties)")]
    PropertyRegistryFull { max: usize },

    /// A hierarchy table has rows of different depth.
    #[error("hierarchy {attribute}: row {row} has {actual} levels, expected {expected}")]
    RaggedHierarchy {
        attribute: usize,
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A hierarchy table has no rows or no levels.
    #[error("hierarchy {attribute} is empty")]
    EmptyHierarchy { attribute: usize },

    /// The data contains a code the hierarchy does not cover.
    #[error("attribute {attribute}: row {row} has code {code}, hierarchy covers {codes} codes")]
    CodeOutOfHierarchy {
        attribute: usize,
        row: usize,
        code: u32,
        codes: usize,
    },

    /// A generalization level exceeds the depth of its hierarchy.
    #[error("attribute {attribute}: level {level} exceeds hierarchy depth {levels}")]
    LevelOutOfHierarchy {
        attribute: usize,
        level: u32,
        levels: usize,
    },

    /// Columns of one matrix have different lengths.
    #[error("column {column} has {actual} rows, expected {expected}")]
    RaggedColumns {
        column: usize,
        expected: usize,
        actual: usize,
    },

    /// An additional matrix does not have one row per data row.
    #[error("expected {expected} rows to match the data, got {actual}")]
    RowCountMismatch { expected: usize, actual: usize },

    /// Row indices are stored as u32.
    #[error("dataset has {rows} rows, at most {max} are supported")]
    TooManyRows { rows: usize, max: usize },

    /// The requirement bitmask is not one of the supported combinations.
    #[error("unsupported requirement combination {bits:#05b}")]
    UnsupportedRequirements { bits: u8 },

    /// Distribution tracking was requested but no sensitive columns were supplied.
    #[error("distribution requirement without sensitive attributes")]
    MissingSensitiveAttributes,

    /// Secondary counting was requested but no research subset was supplied.
    #[error("secondary counter requirement without research subset")]
    MissingSubset,

    /// A configuration value is outside its legal range.
    #[error("invalid configuration '{field}': {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },

    /// The worker pool for parallel scans could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// The caller raised the interrupt flag during a node evaluation.
    #[error("evaluation interrupted")]
    Interrupted,
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SearchError>;
