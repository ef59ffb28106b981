//! Verse records and the ordered corpus
//!
//! Chapter and verse are kept as trimmed strings. Comparison always happens
//! on that canonical text; numeric forms exist only for callers that need
//! to emit integers at a serialization boundary.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// One row of the verse corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseRecord {
    /// Chapter number, canonical text form
    pub chapter: String,
    /// Verse number within the chapter, canonical text form
    pub verse: String,
    /// Original-script text
    pub sanskrit: String,
    /// Romanized text
    pub transliteration: String,
    /// English rendering
    pub english_meaning: String,
    /// Practical application note, may be empty
    #[serde(default)]
    pub application: String,
}

impl VerseRecord {
    /// Build a record, canonicalizing chapter and verse
    #[must_use]
    pub fn new(
        chapter: impl AsRef<str>,
        verse: impl AsRef<str>,
        sanskrit: impl Into<String>,
        transliteration: impl Into<String>,
        english_meaning: impl Into<String>,
    ) -> Self {
        Self {
            chapter: chapter.as_ref().trim().to_string(),
            verse: verse.as_ref().trim().to_string(),
            sanskrit: sanskrit.into(),
            transliteration: transliteration.into(),
            english_meaning: english_meaning.into(),
            application: String::new(),
        }
    }

    /// With application note
    #[inline]
    #[must_use]
    pub fn with_application(mut self, application: impl Into<String>) -> Self {
        self.application = application.into();
        self
    }

    /// Chapter as an integer, if it parses
    #[inline]
    #[must_use]
    pub fn chapter_number(&self) -> Option<u32> {
        self.chapter.parse().ok()
    }

    /// Verse as an integer, if it parses
    #[inline]
    #[must_use]
    pub fn verse_number(&self) -> Option<u32> {
        self.verse.parse().ok()
    }

    /// `chapter:verse` reference
    #[must_use]
    pub fn reference(&self) -> String {
        format!("{}:{}", self.chapter, self.verse)
    }
}

/// Ordered sequence of verse records, file order preserved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    records: Vec<VerseRecord>,
}

impl Corpus {
    /// Create empty corpus
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records were loaded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in corpus order
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[VerseRecord] {
        &self.records
    }

    /// Iterate records in corpus order
    pub fn iter(&self) -> std::slice::Iter<'_, VerseRecord> {
        self.records.iter()
    }

    /// Append a record at the end
    pub fn push(&mut self, record: VerseRecord) {
        self.records.push(record);
    }

    /// Consume into the underlying records
    #[must_use]
    pub fn into_records(self) -> Vec<VerseRecord> {
        self.records
    }
}

impl From<Vec<VerseRecord>> for Corpus {
    fn from(records: Vec<VerseRecord>) -> Self {
        Self { records }
    }
}

impl FromIterator<VerseRecord> for Corpus {
    fn from_iter<I: IntoIterator<Item = VerseRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a VerseRecord;
    type IntoIter = std::slice::Iter<'a, VerseRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Identity of one revision of a corpus source
///
/// Two loads with equal fingerprints read identical bytes, so a cached
/// corpus keyed by fingerprint is never stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFingerprint {
    /// Resolved location of the source
    pub location: String,
    /// Last modification time
    pub modified: SystemTime,
    /// Size in bytes
    pub len: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_canonicalizes_numbers() {
        let record = VerseRecord::new(" 2 ", "47\r", "कर्मण्येवाधिकारस्ते", "karmaṇy-evādhikāras te", "You have a right to action");
        assert_eq!(record.chapter, "2");
        assert_eq!(record.verse, "47");
        assert_eq!(record.chapter_number(), Some(2));
        assert_eq!(record.verse_number(), Some(47));
        assert_eq!(record.reference(), "2:47");
        assert!(record.application.is_empty());
    }

    #[test]
    fn non_numeric_chapter_has_no_number() {
        let record = VerseRecord::new("intro", "1", "", "", "");
        assert_eq!(record.chapter_number(), None);
    }

    #[test]
    fn record_serializes_with_column_names() {
        let record = VerseRecord::new("1", "1", "a", "b", "c").with_application("d");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["english_meaning"], "c");
        assert_eq!(json["application"], "d");
    }

    #[test]
    fn corpus_preserves_order() {
        let corpus: Corpus = (1..=3)
            .map(|v| VerseRecord::new("1", v.to_string(), "", "", ""))
            .collect();
        let verses: Vec<_> = corpus.iter().map(|r| r.verse.as_str()).collect();
        assert_eq!(verses, ["1", "2", "3"]);
        assert_eq!(corpus.len(), 3);
        assert!(!corpus.is_empty());
    }
}
