// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Search core for full-domain generalization of tabular data.
//!
//! Every quasi-identifier column has a generalization hierarchy. A
//! transformation picks one level per column; the set of all transformations
//! forms a lattice ordered by generalization. Evaluating a transformation means
//! grouping the generalized rows into equivalence classes and judging the
//! classes against a privacy model supplied by the caller.
//!
//! # Architecture
//!
//! The implementation uses a two-tier memory model:
//!
//! ## Tier 1: Input Data (Immutable)
//!
//! Shared behind an `Arc` and never written during search:
//! - Encoded quasi-identifier rows and their hierarchies
//! - Optional sensitive columns and research subset
//! - The requirements bitmask fixing what each class tracks
//!
//! ## Tier 2: Search State (Mutable)
//!
//! Owned by one [`SearchContext`]:
//! - [`Lattice`] - node addressing plus predictive property tags
//! - [`History`] - MRU cache of snapshots of evaluated nodes
//! - The most recent [`HashGroupify`], reusable for rollups
//!
//! # Evaluation
//!
//! A node's groupify is built by the cheapest route available:
//!
//! 1. **Snapshot rollup**: regroup the classes of a cached, strictly finer node
//! 2. **Groupify rollup**: regroup the previous groupify, if strictly finer
//! 3. **Full scan**: generalize every row, optionally across a rayon pool
//!
//! All three routes yield the same classes for the same node.
//!
//! # Parallelization
//!
//! Only full scans run in parallel. Independent contexts over the same data
//! may also run on separate threads; an [`Interrupt`] handle cancels a running
//! evaluation from outside.

pub mod config;
pub mod context;
pub mod data;
pub mod error;
pub mod groupify;
pub mod history;
pub mod interrupt;
pub mod lattice;
pub mod statistics;
pub mod transformer;

// Re-export commonly used types
pub use config::{HistoryConfig, SearchConfig, StorageStrategy, TransformerConfig};
pub use context::{CheckResult, SearchContext, Source};
pub use data::{DataManager, GeneralizationHierarchy, Requirements, RowSet};
pub use error::{Result, SearchError};
pub use groupify::HashGroupify;
pub use history::History;
pub use interrupt::Interrupt;
pub use lattice::{Lattice, PropertyId, Transformation};
pub use transformer::Transformer;
