//! Interpolated lookup tables and tide-window queries.

use bargeflow_core::{
    error::SimError,
    table::{DraftTable, InterpolatedTable, TideTable},
};

fn draft_table() -> DraftTable {
    DraftTable::from_samples([(0.0, 3.0), (3600.0, 3.8), (7200.0, 4.6)]).unwrap()
}

#[test]
fn exact_key_returns_sample() {
    let table = draft_table();
    assert_eq!(table.get(3600.0).unwrap(), 3.8);
    assert_eq!(table.get(0.0).unwrap(), 3.0);
    assert_eq!(table.get(7200.0).unwrap(), 4.6);
}

#[test]
fn between_samples_lies_on_the_line() {
    let table = draft_table();
    let v = table.get(1800.0).unwrap();
    assert!((v - 3.4).abs() < 1e-9, "Expected 3.4, got {v}");
    let v = table.get(5400.0).unwrap();
    assert!((v - 4.2).abs() < 1e-9, "Expected 4.2, got {v}");
}

#[test]
fn outside_range_fails() {
    let table = draft_table();
    assert!(matches!(table.get(-1.0), Err(SimError::KeyOutOfRange { .. })));
    assert!(matches!(table.get(7200.5), Err(SimError::KeyOutOfRange { .. })));
}

#[test]
fn empty_table_fails() {
    let table = DraftTable::new();
    assert!(matches!(table.get(1.0), Err(SimError::EmptyTable)));
}

#[test]
fn duplicate_keys_are_rejected() {
    let mut table = InterpolatedTable::<u64>::new();
    table.add(10, 1.0).unwrap();
    assert!(matches!(table.add(10, 2.0), Err(SimError::DuplicateKey { .. })));
    assert_eq!(table.get(10).unwrap(), 1.0);
}

#[test]
fn unordered_insertion_is_sorted() {
    let table = InterpolatedTable::<u64>::from_samples([(100, 2.0), (0, 0.0), (50, 1.0)]).unwrap();
    assert_eq!(table.first_key(), Some(0));
    assert_eq!(table.last_key(), Some(100));
    assert_eq!(table.get(75).unwrap(), 1.5);
}

#[test]
fn tide_wraps_around_the_period() {
    let tide = TideTable::from_samples([(0, 1.0), (60, 4.0), (120, 1.0)]).unwrap();
    assert_eq!(tide.period().unwrap(), 120);
    assert_eq!(tide.depth_at(60).unwrap(), 4.0);
    assert_eq!(tide.depth_at(180).unwrap(), 4.0);
}

#[test]
fn tide_wait_finds_first_deep_enough_minute() {
    let tide = TideTable::from_samples([(0, 1.0), (60, 4.0), (120, 1.0)]).unwrap();
    // depth = 1 + minute/20 on the rising half: 2.5 at minute 30.
    assert_eq!(tide.time_to_depth(0, 2.5).unwrap(), 30);
    assert_eq!(tide.time_to_depth(60, 2.5).unwrap(), 0);
    let wait = tide.time_to_depth(100, 3.0).unwrap();
    assert!(tide.depth_at(100 + wait).unwrap() >= 3.0);
}

#[test]
fn tide_too_shallow_for_a_whole_period_fails() {
    let tide = TideTable::from_samples([(0, 1.0), (60, 2.0), (120, 1.0)]).unwrap();
    assert!(matches!(tide.time_to_depth(0, 2.5), Err(SimError::NoTideWindow { .. })));
}
