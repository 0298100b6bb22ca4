// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use anon_search::data::{DataManager, GeneralizationHierarchy, Requirements, RowSet};
use anon_search::groupify::{Distribution, HashGroupify};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Install a `RUST_LOG`-driven subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Deterministic pseudo-random stream (64-bit LCG), so datasets are reproducible.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Lcg(seed)
    }

    pub fn next_below(&mut self, bound: u32) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) % bound as u64) as u32
    }
}

/// Interval hierarchy: level `k` maps code `c` to `c / widths[k-1]`; a last
/// level suppresses everything to `0`. Each width must divide the next.
pub fn interval_hierarchy(attribute: usize, codes: u32, widths: &[u32]) -> GeneralizationHierarchy {
    let table: Vec<Vec<u32>> = (0..codes)
        .map(|code| {
            let mut row = vec![code];
            row.extend(widths.iter().map(|w| code / w));
            row.push(0);
            row
        })
        .collect();
    GeneralizationHierarchy::new(attribute, &table).unwrap()
}

/// Shape of one generated quasi-identifier.
pub struct Attribute {
    pub codes: u32,
    pub widths: &'static [u32],
}

/// Random dataset over `attributes`.
///
/// `sensitive` extra columns with values below 5 are attached when
/// distributions are required; every third row is in the research subset when
/// secondary counts are required.
pub fn dataset(
    rows: usize,
    attributes: &[Attribute],
    requirements: Requirements,
    sensitive: usize,
    seed: u64,
) -> Arc<DataManager> {
    let mut lcg = Lcg::new(seed);
    let columns: Vec<Vec<u32>> = attributes
        .iter()
        .map(|a| (0..rows).map(|_| lcg.next_below(a.codes)).collect())
        .collect();
    let hierarchies = attributes
        .iter()
        .enumerate()
        .map(|(i, a)| interval_hierarchy(i, a.codes, a.widths))
        .collect();
    let mut data = DataManager::new(&columns, hierarchies, requirements).unwrap();
    if requirements.has_distribution() {
        let sensitive: Vec<Vec<u32>> = (0..sensitive)
            .map(|_| (0..rows).map(|_| lcg.next_below(5)).collect())
            .collect();
        data = data.with_sensitive(&sensitive).unwrap();
    }
    if requirements.has_secondary() {
        let members: Vec<usize> = (0..rows).filter(|r| r % 3 == 0).collect();
        data = data.with_subset(RowSet::from_rows(rows, &members)).unwrap();
    }
    Arc::new(data)
}

/// Two attributes: 8 codes (levels 0..=3) and 4 codes (levels 0..=2).
pub const SMALL: [Attribute; 2] = [
    Attribute {
        codes: 8,
        widths: &[2, 4],
    },
    Attribute {
        codes: 4,
        widths: &[2],
    },
];

/// Four attributes with 3 or 4 levels each.
pub const WIDE: [Attribute; 4] = [
    Attribute {
        codes: 16,
        widths: &[4],
    },
    Attribute {
        codes: 6,
        widths: &[3],
    },
    Attribute {
        codes: 10,
        widths: &[2, 6],
    },
    Attribute {
        codes: 3,
        widths: &[],
    },
];

/// Everything observable about one equivalence class.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Class {
    pub key: Vec<u32>,
    pub representative: u32,
    pub count: u32,
    pub secondary: u32,
    pub distributions: Vec<Vec<(u32, u32)>>,
}

fn flatten(distributions: &[Distribution]) -> Vec<Vec<(u32, u32)>> {
    distributions.iter().map(|d| d.iter().collect()).collect()
}

/// Classes in insertion order.
pub fn classes(groupify: &HashGroupify) -> Vec<Class> {
    groupify
        .iter()
        .map(|(key, entry)| Class {
            key: key.to_vec(),
            representative: entry.representative(),
            count: entry.count(),
            secondary: entry.secondary(),
            distributions: flatten(entry.distributions()),
        })
        .collect()
}

/// Classes sorted by key, ignoring representatives.
pub fn class_multiset(groupify: &HashGroupify) -> Vec<Class> {
    let mut classes: Vec<Class> = classes(groupify)
        .into_iter()
        .map(|mut c| {
            c.representative = 0;
            c
        })
        .collect();
    classes.sort();
    classes
}
