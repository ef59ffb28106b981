//! Daily and random index selection
//!
//! The daily rule is a pure function of `(calendar date, corpus size)`:
//!
//! ```text
//! date ──► "YYYY-M-D" ──► Σ code points ──► hash mod n
//! ```
//!
//! Every process that computes it for the same UTC date and corpus size
//! gets the same index, with no coordination. The date string is built
//! without zero padding and the hash sums Unicode scalar values, so any
//! runtime able to iterate characters can reproduce it exactly.

use crate::error::{ShlokError, ShlokResult};
use chrono::{Datelike, NaiveDate, Utc};
use rand::Rng;

/// Canonical hash input for a calendar date
///
/// Month is 1-based; no component is zero padded.
///
/// ```
/// use chrono::NaiveDate;
/// use shlok_core::selector::canonical_date_string;
///
/// let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
/// assert_eq!(canonical_date_string(date), "2024-1-5");
/// ```
#[must_use]
pub fn canonical_date_string(date: NaiveDate) -> String {
    format!("{}-{}-{}", date.year(), date.month(), date.day())
}

/// Sum of the code points of every character in `input`
#[must_use]
pub fn date_hash(input: &str) -> u64 {
    input.chars().map(|c| u64::from(u32::from(c))).sum()
}

/// Today's date in the canonical timezone (UTC)
#[must_use]
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Deterministic index for `date` in a corpus of `corpus_size` records
///
/// # Errors
/// `ShlokError::EmptyCorpus` when `corpus_size` is zero.
pub fn select_daily_index(date: NaiveDate, corpus_size: usize) -> ShlokResult<usize> {
    select_daily_index_for(&canonical_date_string(date), corpus_size)
}

/// Deterministic index for an already canonical date string
///
/// # Errors
/// `ShlokError::EmptyCorpus` when `corpus_size` is zero.
#[allow(clippy::cast_possible_truncation)]
pub fn select_daily_index_for(date_string: &str, corpus_size: usize) -> ShlokResult<usize> {
    if corpus_size == 0 {
        return Err(ShlokError::EmptyCorpus);
    }
    // Unsigned remainder: non-negative and below `corpus_size`.
    Ok((date_hash(date_string) % corpus_size as u64) as usize)
}

/// Uniformly random index using the thread-local generator
///
/// # Errors
/// `ShlokError::EmptyCorpus` when `corpus_size` is zero.
pub fn select_random_index(corpus_size: usize) -> ShlokResult<usize> {
    select_random_index_with(&mut rand::thread_rng(), corpus_size)
}

/// Uniformly random index from the supplied generator
///
/// # Errors
/// `ShlokError::EmptyCorpus` when `corpus_size` is zero.
pub fn select_random_index_with<R: Rng + ?Sized>(
    rng: &mut R,
    corpus_size: usize,
) -> ShlokResult<usize> {
    if corpus_size == 0 {
        return Err(ShlokError::EmptyCorpus);
    }
    Ok(rng.gen_range(0..corpus_size))
}
