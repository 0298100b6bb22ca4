// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

mod common;

use anon_search::groupify::{DistributionSource, HashGroupify};
use common::{class_multiset, Lcg};

/// `(key, secondary, sensitive)` triples with many repeated keys.
fn rows(n: usize, seed: u64) -> Vec<([u32; 3], u32, u32)> {
    let mut lcg = Lcg::new(seed);
    (0..n)
        .map(|_| {
            let key = [lcg.next_below(4), lcg.next_below(3), lcg.next_below(5)];
            (key, lcg.next_below(2), lcg.next_below(7))
        })
        .collect()
}

fn group(rows: &[([u32; 3], u32, u32)]) -> HashGroupify {
    let mut groupify = HashGroupify::new(8, 3, 1);
    for (row, (key, secondary, sensitive)) in rows.iter().enumerate() {
        groupify.add(
            key,
            row as u32,
            1,
            *secondary,
            DistributionSource::Values(std::slice::from_ref(sensitive)),
        );
    }
    groupify
}

#[test]
fn test_grouping_is_order_independent() {
    let original = rows(500, 7);
    let expected = class_multiset(&group(&original));

    let mut reversed = original.clone();
    reversed.reverse();
    assert_eq!(class_multiset(&group(&reversed)), expected);

    let mut lcg = Lcg::new(99);
    let mut shuffled = original.clone();
    for i in (1..shuffled.len()).rev() {
        let j = lcg.next_below(i as u32 + 1) as usize;
        shuffled.swap(i, j);
    }
    assert_eq!(class_multiset(&group(&shuffled)), expected);
}

#[test]
fn test_totals_and_rehash_under_load() {
    let original = rows(2000, 3);
    let groupify = group(&original);

    assert_eq!(groupify.total_count(), 2000);
    let secondary: u64 = original.iter().map(|(_, s, _)| *s as u64).sum();
    assert_eq!(groupify.total_secondary(), secondary);
    assert!(groupify.size() <= 4 * 3 * 5);
    assert!(groupify.size() as f64 <= groupify.capacity() as f64 * HashGroupify::LOAD_FACTOR);

    for (key, entry) in groupify.iter() {
        let total: u64 = entry.distributions()[0].total();
        assert_eq!(total, entry.count() as u64, "class {:?}", key);
    }
}
