//! Verse lookup by index or by chapter and verse

use crate::error::{ShlokError, ShlokResult};
use crate::record::{Corpus, VerseRecord};
use std::fmt::Display;

/// Record at `index`
///
/// # Errors
/// `ShlokError::OutOfRange` when `index >= corpus.len()`.
pub fn by_index(corpus: &Corpus, index: usize) -> ShlokResult<&VerseRecord> {
    corpus.records().get(index).ok_or(ShlokError::OutOfRange {
        index,
        len: corpus.len(),
    })
}

/// First record matching `chapter` and `verse`, in corpus order
///
/// Both sides are compared as trimmed text, so `2`, `"2"` and `" 2 "` all
/// address the same chapter. A miss is `None`, not an error.
pub fn by_chapter_verse(
    corpus: &Corpus,
    chapter: impl Display,
    verse: impl Display,
) -> Option<&VerseRecord> {
    let chapter = chapter.to_string();
    let verse = verse.to_string();
    let (chapter, verse) = (chapter.trim(), verse.trim());

    corpus
        .iter()
        .find(|r| r.chapter.trim() == chapter && r.verse.trim() == verse)
}
