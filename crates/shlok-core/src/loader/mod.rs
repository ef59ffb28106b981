//! Dataset loader
//!
//! Reads corpus text from a [`CorpusSource`] and parses it into an ordered
//! [`Corpus`]. Nothing is retained between calls; every load re-reads the
//! source from scratch.

use crate::error::ShlokResult;
use crate::record::Corpus;

mod parser;
mod source;

pub use parser::{
    parse_corpus, parse_reader, parse_record, split_row, COMMENT_MARKER, HEADER_SIGNATURE,
    MIN_FIELDS,
};
pub use source::{CorpusSource, FileSource, HttpSource, StaticSource};

/// Load and parse a corpus from the given source
///
/// An empty-but-present source yields an empty corpus, not an error.
///
/// # Errors
/// Propagates the source's read failure unchanged.
pub async fn load_corpus(source: &dyn CorpusSource) -> ShlokResult<Corpus> {
    let text = source.read_text().await?;
    let corpus = parse_corpus(&text);
    tracing::debug!(
        source = %source.describe(),
        records = corpus.len(),
        "loaded corpus"
    );
    Ok(corpus)
}

impl Corpus {
    /// Parse a corpus from any UTF-8 byte stream
    ///
    /// # Errors
    /// Returns the reader's IO error or `InvalidData` for non UTF-8 input.
    pub fn from_reader<R: std::io::Read>(reader: R) -> std::io::Result<Self> {
        parse_reader(reader)
    }
}
