//! Tests for occurrence identity, moves, and the cancel invariant.

use cadence_engine::{EngineError, MemoryStore, Occurrence, OccurrenceKind, Series};
use chrono::{Duration, TimeZone, Utc};

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn hour_series() -> Series {
    Series::new(utc(2008, 1, 5, 8, 0), utc(2008, 1, 5, 9, 0)).unwrap()
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

#[test]
fn generate_derives_end_from_series_duration() {
    let series = hour_series();
    let occ = Occurrence::generate(&series, utc(2008, 1, 12, 8, 0), None).unwrap();
    assert_eq!(occ.start(), utc(2008, 1, 12, 8, 0));
    assert_eq!(occ.end(), utc(2008, 1, 12, 9, 0));
    assert_eq!(occ.original_start(), occ.start());
    assert_eq!(occ.original_end(), occ.end());
    assert!(!occ.cancelled());
    assert_eq!(occ.kind(), OccurrenceKind::Instance);
}

#[test]
fn generate_accepts_an_explicit_end() {
    let series = hour_series();
    let occ =
        Occurrence::generate(&series, utc(2008, 1, 12, 8, 0), Some(utc(2008, 1, 12, 11, 0)))
            .unwrap();
    assert_eq!(occ.duration(), Duration::hours(3));
}

#[test]
fn generate_rejects_inverted_interval() {
    let series = hour_series();
    let result =
        Occurrence::generate(&series, utc(2008, 1, 12, 8, 0), Some(utc(2008, 1, 12, 7, 0)));
    assert!(matches!(
        result,
        Err(EngineError::InvalidInterval { .. })
    ));
}

// ---------------------------------------------------------------------------
// Moves keep identity
// ---------------------------------------------------------------------------

#[test]
fn move_to_changes_slot_but_not_key() {
    let series = hour_series();
    let mut occ = Occurrence::generate(&series, utc(2008, 1, 12, 2, 0), None).unwrap();
    let key_before = occ.key();

    occ.move_to(utc(2008, 1, 15, 8, 0), Some(utc(2008, 1, 15, 9, 0)))
        .unwrap();

    assert!(occ.moved());
    assert_eq!(occ.start(), utc(2008, 1, 15, 8, 0));
    assert_eq!(occ.end(), utc(2008, 1, 15, 9, 0));
    assert_eq!(occ.key(), key_before);
}

#[test]
fn move_to_without_end_keeps_current_duration() {
    let series = hour_series();
    let mut occ = Occurrence::generate(&series, utc(2008, 1, 12, 2, 0), None).unwrap();
    occ.move_to(utc(2008, 1, 13, 6, 30), None).unwrap();
    assert_eq!(occ.end(), utc(2008, 1, 13, 7, 30));
}

#[test]
fn move_by_shifts_both_endpoints() {
    let series = hour_series();
    let mut occ = Occurrence::generate(&series, utc(2008, 1, 12, 2, 0), None).unwrap();
    occ.move_by(Duration::days(3)).unwrap();
    assert_eq!(occ.start(), utc(2008, 1, 15, 2, 0));
    assert_eq!(occ.end(), utc(2008, 1, 15, 3, 0));
    assert!(occ.moved());
}

#[test]
fn move_to_rejects_inverted_interval() {
    let series = hour_series();
    let mut occ = Occurrence::generate(&series, utc(2008, 1, 12, 2, 0), None).unwrap();
    let result = occ.move_to(utc(2008, 1, 15, 9, 0), Some(utc(2008, 1, 15, 8, 0)));
    assert!(result.is_err());
    // The failed move left the slot untouched.
    assert_eq!(occ.start(), utc(2008, 1, 12, 2, 0));
    assert!(!occ.moved());
}

// ---------------------------------------------------------------------------
// Cancel invariant
// ---------------------------------------------------------------------------

#[test]
fn cancel_and_uncancel_an_instance() {
    let series = hour_series();
    let mut occ = Occurrence::generate(&series, utc(2008, 1, 12, 8, 0), None).unwrap();
    occ.cancel().unwrap();
    assert!(occ.cancelled());
    occ.uncancel().unwrap();
    assert!(!occ.cancelled());
}

#[test]
fn cancelling_the_group_source_is_rejected_and_state_unchanged() {
    let series = hour_series();
    let mut store = MemoryStore::new();
    let mut source = store.get_or_create_group_source(&series);
    assert_eq!(source.kind(), OccurrenceKind::GroupSource);

    let result = source.cancel();
    assert!(matches!(
        result,
        Err(EngineError::CancelGroupSource(id)) if id == series.id()
    ));
    assert!(!source.cancelled());
}

#[test]
fn group_source_is_created_once() {
    let series = hour_series();
    let mut store = MemoryStore::new();
    let first = store.get_or_create_group_source(&series);
    let second = store.get_or_create_group_source(&series);
    assert_eq!(first, second);
}

// ---------------------------------------------------------------------------
// Timeslot comparison
// ---------------------------------------------------------------------------

#[test]
fn same_timeslot_ignores_identity() {
    let series_a = hour_series();
    let series_b = hour_series();
    let a = Occurrence::generate(&series_a, utc(2008, 1, 12, 8, 0), None).unwrap();
    let b = Occurrence::generate(&series_b, utc(2008, 1, 12, 8, 0), None).unwrap();
    assert!(a.same_timeslot(&b));
    // Different series, so structurally distinct occurrences.
    assert_ne!(a, b);
}

#[test]
fn display_renders_the_current_slot() {
    let series = hour_series();
    let occ = Occurrence::generate(&series, utc(2008, 1, 12, 8, 0), None).unwrap();
    assert_eq!(
        occ.to_string(),
        "2008-01-12 08:00:00 UTC to 2008-01-12 09:00:00 UTC"
    );
}
