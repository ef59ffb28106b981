//! Daily selection invariants.
//!
//! The server and every client compute "today's verse" independently, so the
//! rule must be reproducible from nothing but the date and the corpus size.
//! These tests pin the rule down with a hand-computed table and check it
//! against a second, independently written implementation that follows
//! browser semantics (UTF-16 code units, signed remainder then absolute value).

use chrono::NaiveDate;
use proptest::prelude::*;
use shlok_core::{canonical_date_string, select_daily_index, select_daily_index_for, ShlokError};

/// Browser-style reference: `Math.abs(sum(charCodeAt) % n)`.
fn browser_index(year: i32, month: u32, day: u32, n: usize) -> usize {
    let date_string = format!("{year}-{month}-{day}");
    let hash: i64 = date_string.encode_utf16().map(i64::from).sum();
    let n = i64::try_from(n).unwrap();
    usize::try_from((hash % n).abs()).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn hand_computed_agreement_table() {
    let table: &[(&str, usize, usize)] = &[
        ("2024-1-15", 700, 441),
        ("2024-1-15", 18, 9),
        ("2025-12-31", 700, 490),
        ("2025-12-31", 100, 90),
        ("2026-10-19", 700, 495),
        ("2026-10-19", 7, 5),
        ("2000-2-29", 400, 41),
        ("1999-9-9", 5, 4),
        ("1999-9-9", 1, 0),
    ];

    for &(date_string, n, expected) in table {
        assert_eq!(
            select_daily_index_for(date_string, n).unwrap(),
            expected,
            "{date_string} mod {n}"
        );
    }
}

#[test]
fn canonical_string_feeds_the_table() {
    assert_eq!(
        select_daily_index(date(2026, 10, 19), 700).unwrap(),
        select_daily_index_for("2026-10-19", 700).unwrap()
    );
}

#[test]
fn zero_size_never_yields_an_index() {
    for (y, m, d) in [(2024, 1, 15), (1970, 1, 1), (2099, 12, 31)] {
        assert!(matches!(
            select_daily_index(date(y, m, d), 0),
            Err(ShlokError::EmptyCorpus)
        ));
    }
}

proptest! {
    #[test]
    fn prop_deterministic(
        y in 1900i32..2200,
        m in 1u32..=12,
        d in 1u32..=28,
        n in 1usize..5000,
    ) {
        let first = select_daily_index(date(y, m, d), n).unwrap();
        let second = select_daily_index(date(y, m, d), n).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_in_range(
        y in -5000i32..5000,
        m in 1u32..=12,
        d in 1u32..=28,
        n in 1usize..100_000,
    ) {
        let index = select_daily_index(date(y, m, d), n).unwrap();
        prop_assert!(index < n);
    }

    #[test]
    fn prop_matches_browser_reference(
        y in 1900i32..2200,
        m in 1u32..=12,
        d in 1u32..=28,
        n in 1usize..5000,
    ) {
        prop_assert_eq!(
            select_daily_index(date(y, m, d), n).unwrap(),
            browser_index(y, m, d, n)
        );
    }

    #[test]
    fn prop_string_has_no_padding(
        y in 1000i32..10000,
        m in 1u32..=12,
        d in 1u32..=28,
    ) {
        let s = canonical_date_string(date(y, m, d));
        prop_assert_eq!(s, format!("{y}-{m}-{d}"));
    }
}
