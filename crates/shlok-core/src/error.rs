//! Error types for the verse core
//!
//! Covers the three ways a verse request can fail:
//! - the corpus source cannot be located or read
//! - the source was read but holds no usable records
//! - an index lookup falls outside the corpus
//!
//! Malformed rows are not errors; the loader skips them.

use std::path::PathBuf;

/// Errors raised while loading a corpus or resolving a verse
#[derive(Debug, thiserror::Error)]
pub enum ShlokError {
    /// No candidate location for the corpus exists
    #[error("corpus source unavailable (tried: {})", display_paths(.tried))]
    SourceUnavailable {
        /// Every location tried, in order
        tried: Vec<PathBuf>,
    },

    /// The corpus file exists but could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A remote corpus could not be fetched
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The source was read but yielded zero records
    #[error("corpus is empty")]
    EmptyCorpus,

    /// Index lookup beyond the end of the corpus
    #[error("index {index} out of range for corpus of {len} records")]
    OutOfRange {
        /// Requested index
        index: usize,
        /// Corpus length
        len: usize,
    },
}

impl ShlokError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when no corpus source could be found at all
    #[inline]
    #[must_use]
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. })
    }

    /// True when the source was present but empty
    #[inline]
    #[must_use]
    pub fn is_empty_corpus(&self) -> bool {
        matches!(self, Self::EmptyCorpus)
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for verse operations
pub type ShlokResult<T> = Result<T, ShlokError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_unavailable_lists_paths() {
        let err = ShlokError::SourceUnavailable {
            tried: vec![PathBuf::from("data/a.csv"), PathBuf::from("public/a.csv")],
        };
        assert_eq!(
            err.to_string(),
            "corpus source unavailable (tried: data/a.csv, public/a.csv)"
        );
        assert!(err.is_source_unavailable());
        assert!(!err.is_empty_corpus());
    }

    #[test]
    fn out_of_range_display() {
        let err = ShlokError::OutOfRange { index: 9, len: 3 };
        assert_eq!(err.to_string(), "index 9 out of range for corpus of 3 records");
    }

    #[test]
    fn empty_corpus_is_distinct() {
        let err = ShlokError::EmptyCorpus;
        assert!(err.is_empty_corpus());
        assert!(!err.is_source_unavailable());
    }
}
