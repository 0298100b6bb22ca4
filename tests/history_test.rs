// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

mod common;

use anon_search::data::{DataManager, Requirements};
use anon_search::groupify::{DistributionSource, HashGroupify};
use anon_search::history::{SnapshotDictionaries, SnapshotLayout};
use anon_search::lattice::{Lattice, PropertyId, Transformation};
use anon_search::statistics::Counters;
use anon_search::{History, HistoryConfig, StorageStrategy};
use common::{dataset, SMALL};

fn data(requirements: Requirements) -> std::sync::Arc<DataManager> {
    dataset(100, &SMALL, requirements, 2, 17)
}

fn history(size: usize) -> History {
    let config = HistoryConfig {
        size,
        ..HistoryConfig::default()
    };
    History::new(&data(Requirements::COUNTER), config).unwrap()
}

/// `classes` classes with keys `[c, c]`; distributions for `sensitive` attributes.
fn groupify(classes: u32, sensitive: usize) -> HashGroupify {
    let mut g = HashGroupify::new(classes as usize, 2, sensitive);
    for c in 0..classes {
        let values = [c % 3, 7];
        let source = if sensitive > 0 {
            DistributionSource::Values(&values[..sensitive])
        } else {
            DistributionSource::None
        };
        g.add(&[c, c], c * 10, c + 1, c % 2, source);
        g.add(&[c, c], c * 10 + 1, 1, 0, source);
    }
    g
}

fn node(lattice: &Lattice, coordinates: [u32; 2]) -> Transformation {
    lattice.transformation_of(&coordinates).unwrap()
}

#[test]
fn test_eviction_with_capacity_three() {
    common::init_tracing();
    let lattice = Lattice::new(&[0, 0], &[3, 3]).unwrap();
    let mut history = history(3);
    let t1 = node(&lattice, [0, 1]);
    let t2 = node(&lattice, [1, 0]);
    let t3 = node(&lattice, [1, 1]);
    let t4 = node(&lattice, [0, 2]);

    assert!(history.store(&lattice, &t1, &groupify(6, 0), None));
    assert!(history.store(&lattice, &t2, &groupify(5, 0), None));
    assert!(history.store(&lattice, &t3, &groupify(4, 0), None));
    assert!(history.store(&lattice, &t4, &groupify(3, 0), None));

    assert_eq!(history.len(), 3);
    assert!(!history.contains(t1.id()));
    assert_eq!(history.ids_lru(), vec![t2.id(), t3.id(), t4.id()]);
    assert_eq!(history.statistics().get(Counters::SnapshotsEvicted), 1);

    // Only t1 lies strictly below [0, 2].
    assert!(history.get(&node(&lattice, [0, 2])).is_none());

    let hit = history.get(&node(&lattice, [2, 0])).unwrap();
    assert_eq!(hit.source_id, t2.id());
    assert_eq!(hit.source_generalization, &[1, 0]);
    assert_eq!(history.ids_lru(), vec![t3.id(), t4.id(), t2.id()]);

    // t2, t3 and t4 all qualify; t4 has the fewest classes.
    let hit = history.get(&node(&lattice, [1, 3])).unwrap();
    assert_eq!(hit.source_id, t4.id());

    // The touched entries survive the next eviction.
    let t5 = node(&lattice, [2, 2]);
    assert!(history.store(&lattice, &t5, &groupify(2, 0), None));
    assert!(!history.contains(t3.id()));
    assert_eq!(history.ids_lru(), vec![t2.id(), t4.id(), t5.id()]);
}

#[test]
fn test_equal_sizes_prefer_most_recent() {
    let lattice = Lattice::new(&[0, 0], &[3, 3]).unwrap();
    let mut history = history(10);
    let a = node(&lattice, [1, 0]);
    let b = node(&lattice, [0, 1]);
    history.store(&lattice, &a, &groupify(4, 0), None);
    history.store(&lattice, &b, &groupify(4, 0), None);

    let target = node(&lattice, [1, 1]);
    assert_eq!(history.get(&target).unwrap().source_id, b.id());
    // b is now most recent and still wins.
    assert_eq!(history.get(&target).unwrap().source_id, b.id());
    assert!(history.peek(&node(&lattice, [0, 0])).is_none());
}

#[test]
fn test_snapshot_round_trip_per_requirement_mode() {
    let modes = [
        Requirements::COUNTER,
        Requirements::COUNTER | Requirements::SECONDARY_COUNTER,
        Requirements::DISTRIBUTION,
        Requirements::COUNTER | Requirements::DISTRIBUTION,
        Requirements::COUNTER | Requirements::SECONDARY_COUNTER | Requirements::DISTRIBUTION,
    ];
    for requirements in modes {
        let sensitive = if requirements.has_distribution() { 2 } else { 0 };
        let layout = SnapshotLayout::new(requirements, sensitive);
        assert_eq!(layout.width(), requirements.snapshot_width(sensitive));

        for classes in [0, 1, 7] {
            let g = groupify(classes, sensitive);
            let mut dictionaries = SnapshotDictionaries::new();
            let snapshot = layout.encode(&g, &mut dictionaries);
            assert_eq!(snapshot.len(), classes as usize * layout.width());

            let records = layout.decode(&snapshot, &dictionaries);
            assert_eq!(records.len(), g.size());
            for (record, (_, entry)) in records.iter().zip(g.iter()) {
                assert_eq!(record.representative, entry.representative());
                assert_eq!(record.count, entry.count());
                let secondary = if requirements.has_secondary() { entry.secondary() } else { 0 };
                assert_eq!(record.secondary, secondary, "{}", requirements);
                assert_eq!(record.distributions.as_slice(), entry.distributions());
            }

            layout.release(&snapshot, &mut dictionaries);
            assert!(dictionaries.values.is_empty());
            assert!(dictionaries.frequencies.is_empty());
        }
    }
}

#[test]
fn test_removal_releases_dictionary_entries() {
    let requirements = Requirements::COUNTER | Requirements::DISTRIBUTION;
    let lattice = Lattice::new(&[0, 0], &[3, 3]).unwrap();
    let config = HistoryConfig {
        size: 1,
        ..HistoryConfig::default()
    };
    let mut history = History::new(&data(requirements), config).unwrap();

    history.store(&lattice, &node(&lattice, [0, 0]), &groupify(6, 2), None);
    let live = history.dictionaries().values.len();
    assert!(live > 0);

    // Evicts the first snapshot; the new one only uses a subset of its arrays.
    history.store(&lattice, &node(&lattice, [1, 0]), &groupify(1, 2), None);
    assert_eq!(history.len(), 1);
    assert!(history.dictionaries().values.len() < live);

    history.reset();
    assert!(history.is_empty());
    assert!(history.dictionaries().values.is_empty());
    assert!(history.dictionaries().frequencies.is_empty());
}

fn distributions(history: &History, target: &Transformation) -> Vec<Vec<(u32, u32)>> {
    let hit = history.peek(target).unwrap();
    let records = history.layout().decode(hit.snapshot, history.dictionaries());
    records[0].distributions.iter().map(|d| d.iter().collect()).collect()
}

#[test]
fn test_hit_reads_its_own_distribution_after_eviction() {
    let requirements = Requirements::COUNTER | Requirements::DISTRIBUTION;
    let lattice = Lattice::new(&[0, 0], &[3, 3]).unwrap();
    let config = HistoryConfig {
        size: 1,
        ..HistoryConfig::default()
    };
    let mut history = History::new(&data(requirements), config).unwrap();
    let single = |value: u32| {
        let mut g = HashGroupify::new(1, 2, 2);
        g.add(&[0, 0], 0, 1, 0, DistributionSource::Values(&[value, value]));
        g
    };

    history.store(&lattice, &node(&lattice, [0, 0]), &single(5), None);
    assert_eq!(distributions(&history, &node(&lattice, [1, 0])), vec![vec![(5, 1)]; 2]);

    // Evicts the first snapshot; its freed ids are reused by the second.
    history.store(&lattice, &node(&lattice, [0, 1]), &single(9), None);
    assert_eq!(history.dictionaries().values.len(), 1);
    assert!(history.peek(&node(&lattice, [1, 0])).is_none());
    assert_eq!(distributions(&history, &node(&lattice, [1, 1])), vec![vec![(9, 1)]; 2]);
}

#[test]
fn test_admission_rules() {
    let mut lattice = Lattice::new(&[0, 0], &[3, 3]).unwrap();
    let mut history = history(10);
    assert_eq!(history.snapshot_size_dataset(), 20);

    let t = node(&lattice, [1, 1]);
    assert!(!history.store(&lattice, &t, &groupify(21, 0), None));

    lattice.put_property(&t, PropertyId::SUCCESSORS_PRUNED).unwrap();
    assert!(!history.store(&lattice, &t, &groupify(3, 0), None));
    lattice.put_property(&t, PropertyId::FORCE_SNAPSHOT).unwrap();
    assert!(history.store(&lattice, &t, &groupify(3, 0), None));

    history.set_storage_strategy(StorageStrategy::NonAnonymous);
    let u = node(&lattice, [2, 1]);
    assert!(!history.store(&lattice, &u, &groupify(3, 0), None));
    lattice.put_property(&u, PropertyId::NOT_ANONYMOUS).unwrap();
    assert!(history.store(&lattice, &u, &groupify(3, 0), None));

    assert_eq!(history.statistics().get(Counters::SnapshotsRejected), 3);
    assert_eq!(history.statistics().get(Counters::SnapshotsStored), 2);
}

#[test]
fn test_pruned_entries_cleaned_on_next_store() {
    let mut lattice = Lattice::new(&[0, 0], &[3, 3]).unwrap();
    let mut history = history(10);
    let a = node(&lattice, [0, 1]);
    let b = node(&lattice, [1, 0]);
    history.store(&lattice, &a, &groupify(3, 0), None);
    lattice.put_property(&a, PropertyId::SUCCESSORS_PRUNED).unwrap();
    assert!(history.contains(a.id()));

    history.store(&lattice, &b, &groupify(3, 0), None);
    assert!(!history.contains(a.id()));
    assert!(history.contains(b.id()));
    assert_eq!(history.statistics().get(Counters::SnapshotsPruned), 1);
}

#[test]
fn test_shrinking_size_applies_on_next_store() {
    let lattice = Lattice::new(&[0, 0], &[3, 3]).unwrap();
    let mut history = history(5);
    for (i, coordinates) in [[0, 1], [1, 0], [1, 1], [2, 0]].into_iter().enumerate() {
        history.store(&lattice, &node(&lattice, coordinates), &groupify(i as u32 + 1, 0), None);
    }
    history.set_size(2);
    assert_eq!(history.len(), 4);

    history.store(&lattice, &node(&lattice, [2, 2]), &groupify(1, 0), None);
    assert_eq!(history.len(), 2);
    assert_eq!(history.ids_lru()[1], node(&lattice, [2, 2]).id());
}
