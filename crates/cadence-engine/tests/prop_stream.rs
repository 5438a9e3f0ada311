//! Property-based tests for occurrence streams using proptest.
//!
//! These verify invariants that should hold for *any* rule/window combo,
//! not just the fixture dates in `stream_tests.rs`.

use cadence_engine::{
    merged_occurrences_after, occurrences_after, occurrences_between, Frequency, MemoryStore,
    RecurrenceRule, Series, TimePolicy,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_freq() -> impl Strategy<Value = Frequency> {
    prop_oneof![
        Just(Frequency::Daily),
        Just(Frequency::Weekly),
        Just(Frequency::Monthly),
    ]
}

fn arb_interval() -> impl Strategy<Value = u16> {
    1u16..=4
}

fn arb_count() -> impl Strategy<Value = u32> {
    1u32..=20
}

/// Series start in 2020, any day and hour.
fn arb_start() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..=365, 0i64..=23).prop_map(|(days, hours)| {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
            + Duration::days(days)
            + Duration::hours(hours)
    })
}

fn arb_duration_minutes() -> impl Strategy<Value = i64> {
    15i64..=180
}

fn recurring_series(
    start: DateTime<Utc>,
    duration_minutes: i64,
    freq: Frequency,
    interval: u16,
    count: u32,
) -> Series {
    Series::recurring(
        start,
        start + Duration::minutes(duration_minutes),
        RecurrenceRule::new(freq).every(interval).count(count),
        None,
    )
    .unwrap()
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: window results intersect the (edge-inclusive) query window
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn window_results_touch_the_window(
        freq in arb_freq(),
        interval in arb_interval(),
        count in arb_count(),
        start in arb_start(),
        dur in arb_duration_minutes(),
        window_days in 1i64..=60,
    ) {
        let store = MemoryStore::new();
        let series = recurring_series(start, dur, freq, interval, count);
        let window_start = start - Duration::days(1);
        let window_end = start + Duration::days(window_days);

        let occs = occurrences_between(&store, &series, window_start, window_end).unwrap();
        for occ in &occs {
            prop_assert!(occ.start() <= window_end, "occurrence starts past the window");
            prop_assert!(occ.end() >= window_start, "occurrence ends before the window");
        }
    }
}

// ---------------------------------------------------------------------------
// Property 2: every generated occurrence inherits the series duration
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn durations_match_the_series(
        freq in arb_freq(),
        interval in arb_interval(),
        count in arb_count(),
        start in arb_start(),
        dur in arb_duration_minutes(),
    ) {
        let store = MemoryStore::new();
        let series = recurring_series(start, dur, freq, interval, count);
        let occs = occurrences_between(
            &store,
            &series,
            start - Duration::days(1),
            start + Duration::days(400),
        )
        .unwrap();
        for occ in &occs {
            prop_assert_eq!(occ.duration(), series.duration());
        }
    }
}

// ---------------------------------------------------------------------------
// Property 3: window queries are idempotent without intervening mutation
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn window_query_is_idempotent(
        freq in arb_freq(),
        interval in arb_interval(),
        count in arb_count(),
        start in arb_start(),
        dur in arb_duration_minutes(),
    ) {
        let store = MemoryStore::new();
        let series = recurring_series(start, dur, freq, interval, count);
        let window = (start - Duration::days(1), start + Duration::days(90));

        let view = |occs: Vec<cadence_engine::Occurrence>| -> Vec<_> {
            occs.iter().map(|o| (o.start(), o.end(), o.cancelled())).collect()
        };
        let first = view(occurrences_between(&store, &series, window.0, window.1).unwrap());
        let second = view(occurrences_between(&store, &series, window.0, window.1).unwrap());
        prop_assert_eq!(first, second);
    }
}

// ---------------------------------------------------------------------------
// Property 4: the tail is strictly increasing and ends after the cursor
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn tail_is_ordered_and_past_the_cursor(
        freq in arb_freq(),
        interval in arb_interval(),
        count in arb_count(),
        start in arb_start(),
        dur in arb_duration_minutes(),
        cursor_days in 0i64..=30,
    ) {
        let store = MemoryStore::new();
        let policy = TimePolicy::default();
        let series = recurring_series(start, dur, freq, interval, count);
        let after = start + Duration::days(cursor_days);

        let occs: Vec<_> = occurrences_after(&store, &series, after.into(), &policy)
            .unwrap()
            .collect();
        for occ in &occs {
            prop_assert!(occ.end() > after, "tail yielded an occurrence at or before the cursor");
        }
        for pair in occs.windows(2) {
            prop_assert!(pair[0].start() < pair[1].start());
        }
    }
}

// ---------------------------------------------------------------------------
// Property 5: the merged stream is ordered by start
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn merged_stream_is_ordered(
        freq_a in arb_freq(),
        freq_b in arb_freq(),
        count_a in arb_count(),
        count_b in arb_count(),
        start_a in arb_start(),
        start_b in arb_start(),
        dur in arb_duration_minutes(),
    ) {
        let store = MemoryStore::new();
        let policy = TimePolicy::default();
        let a = recurring_series(start_a, dur, freq_a, 1, count_a);
        let b = recurring_series(start_b, dur, freq_b, 1, count_b);
        let after = Utc.with_ymd_and_hms(2019, 12, 1, 0, 0, 0).unwrap();

        let occs: Vec<_> = merged_occurrences_after(&store, &[a, b], after.into(), &policy)
            .unwrap()
            .collect();
        prop_assert_eq!(occs.len() as u32, count_a + count_b);
        for pair in occs.windows(2) {
            prop_assert!(pair[0].start() <= pair[1].start());
        }
    }
}
