// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

mod common;

use anon_search::lattice::{Direction, Lattice, PropertyId};
use anon_search::SearchError;

fn lattice() -> Lattice {
    Lattice::new(&[0, 0, 0, 0], &[2, 1, 3, 2]).unwrap()
}

#[test]
fn test_every_id_round_trips() {
    let lattice = lattice();
    assert_eq!(lattice.size(), 72);
    assert_eq!(lattice.bottom(), &[0, 0, 0, 0]);
    assert_eq!(lattice.top(), &[2, 1, 3, 2]);

    let mut per_level = vec![0usize; 9];
    for id in 0..lattice.size() {
        let t = lattice.transformation(id).unwrap();
        assert_eq!(lattice.encode(t.generalization()), id);
        assert_eq!(Lattice::level(t.generalization()), t.level());
        per_level[t.level() as usize] += 1;
    }
    let enumerated: Vec<usize> = (0..=8)
        .map(|level| lattice.all_transformations_at_level(level).len())
        .collect();
    assert_eq!(per_level, enumerated);
    assert_eq!(per_level.iter().sum::<usize>(), 72);
}

#[test]
fn test_upward_tag_reaches_every_generalization() {
    common::init_tracing();
    let mut lattice = lattice();
    let base = lattice.transformation_of(&[1, 0, 2, 1]).unwrap();
    lattice.put_property(&base, PropertyId::K_ANONYMOUS).unwrap();

    for id in 0..lattice.size() {
        let t = lattice.transformation(id).unwrap();
        let above = Lattice::is_parent_child_or_equal(base.generalization(), t.generalization());
        assert_eq!(lattice.has_property(&t, PropertyId::K_ANONYMOUS), above, "{}", t);
    }
    // 2 × 2 × 2 × 2 nodes at or above the base.
    assert_eq!(lattice.materialized_count(), 16);
}

#[test]
fn test_predecessors_and_successors_are_inverse() {
    let lattice = lattice();
    for id in 0..lattice.size() {
        let t = lattice.transformation(id).unwrap();
        for successor in lattice.successors(&t) {
            let s = lattice.transformation(successor).unwrap();
            assert!(Lattice::is_direct_parent_child(t.generalization(), s.generalization()));
            assert!(lattice.predecessors(&s).contains(&id));
        }
    }
}

#[test]
fn test_custom_property_contradiction() {
    let mut lattice = lattice();
    let fast = lattice.register_property("fast", Direction::Up).unwrap();
    let slow = lattice.register_property("slow", Direction::Down).unwrap();
    lattice.set_opposite_properties(fast, slow);

    let low = lattice.transformation_of(&[1, 0, 1, 0]).unwrap();
    let high = lattice.transformation_of(&[1, 1, 1, 1]).unwrap();
    lattice.put_property(&low, fast).unwrap();
    let tagged = lattice.materialized_count();

    let err = lattice.put_property(&high, slow).unwrap_err();
    assert!(matches!(
        err,
        SearchError::ContradictoryProperty {
            property: "slow",
            opposite: "fast",
            ..
        }
    ));
    assert!(!lattice.has_property(&lattice.bottom_transformation(), slow));
    assert_eq!(lattice.materialized_count(), tagged);
}

#[test]
fn test_out_of_bounds_coordinates() {
    let lattice = lattice();
    let err = lattice.transformation_of(&[0, 2, 0, 0]).unwrap_err();
    assert!(matches!(err, SearchError::OutOfBounds { axis: 1, value: 2, .. }));
    assert!(matches!(
        lattice.transformation(72),
        Err(SearchError::UnknownTransformation { id: 72, size: 72 })
    ));
}
