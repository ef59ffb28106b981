//! Delimited-text parser for the verse corpus
//!
//! The format is deliberately lenient:
//! - blank lines are dropped
//! - a leading run of `//` comments and the header line is skipped
//! - rows with fewer than five fields are skipped without error

use crate::record::{Corpus, VerseRecord};
use std::io::Read;

/// Line prefix marking a comment in the preamble
pub const COMMENT_MARKER: &str = "//";

/// Text identifying the header row
pub const HEADER_SIGNATURE: &str = "chapter,verse";

/// Minimum number of fields for a row to become a record
pub const MIN_FIELDS: usize = 5;

/// Split one row on commas, honoring double-quoted fields
///
/// A quote toggles quoted mode and is not kept. Commas inside quotes are
/// literal. Each field is trimmed. The final field is only emitted when
/// something was accumulated for it, so a trailing comma adds no field.
#[must_use]
pub fn split_row(row: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut inside_quotes = false;
    let mut current = String::new();

    for ch in row.chars() {
        match ch {
            '"' => inside_quotes = !inside_quotes,
            ',' if !inside_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        fields.push(current.trim().to_string());
    }

    fields
}

/// Parse full corpus text into records
#[must_use]
pub fn parse_corpus(text: &str) -> Corpus {
    let rows: Vec<&str> = text
        .split('\n')
        .filter(|row| !row.trim().is_empty())
        .collect();

    let start = rows
        .iter()
        .position(|row| !is_preamble(row))
        .unwrap_or(rows.len());

    let mut corpus = Corpus::new();
    let mut skipped = 0usize;

    for row in &rows[start..] {
        match parse_record(row) {
            Some(record) => corpus.push(record),
            None => {
                skipped += 1;
                tracing::trace!(row = %row, "skipping row with too few fields");
            }
        }
    }

    if skipped > 0 {
        tracing::debug!(skipped, kept = corpus.len(), "dropped malformed rows");
    }

    corpus
}

/// Parse corpus text from any UTF-8 byte stream
///
/// # Errors
/// Returns the reader's error, or `InvalidData` if the bytes are not UTF-8.
pub fn parse_reader<R: Read>(mut reader: R) -> std::io::Result<Corpus> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    Ok(parse_corpus(&text))
}

/// Parse a single data row, `None` if it has too few fields
#[must_use]
pub fn parse_record(row: &str) -> Option<VerseRecord> {
    let fields = split_row(row);
    if fields.len() < MIN_FIELDS {
        return None;
    }

    let record = VerseRecord::new(
        &fields[0],
        &fields[1],
        strip_quotes(&fields[2]),
        strip_quotes(&fields[3]),
        strip_quotes(&fields[4]),
    )
    .with_application(fields.get(5).map(|f| strip_quotes(f)).unwrap_or_default());

    Some(record)
}

fn is_preamble(row: &str) -> bool {
    row.starts_with(COMMENT_MARKER) || row.contains(HEADER_SIGNATURE)
}

fn strip_quotes(field: &str) -> String {
    let field = field.trim();
    let field = field.strip_prefix('"').unwrap_or(field);
    field.strip_suffix('"').unwrap_or(field).to_string()
}
