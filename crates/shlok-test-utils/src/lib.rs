//! Testing utilities for the shlok workspace
//!
//! Shared corpus fixtures and helpers for writing them to disk.

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const HEADER: &str = "chapter,verse,sanskrit,transliteration,english_meaning,application";

/// Two comment lines, a header and five data rows
pub const SAMPLE_CSV: &str = r#"// Bhagavad Gita verses
// columns: chapter, verse, sanskrit, transliteration, english_meaning, application
chapter,verse,sanskrit,transliteration,english_meaning,application
1,1,"धृतराष्ट्र उवाच","dhṛtarāṣṭra uvāca","Dhritarashtra said","Listen carefully"
2,47,"कर्मण्येवाधिकारस्ते मा फलेषु कदाचन","karmaṇy evādhikāras te mā phaleṣhu kadāchana","You have a right to perform your duty, but not to the fruits of action","Focus on effort, not outcome"
2,48,"योगस्थः कुरु कर्माणि","yoga-sthaḥ kuru karmāṇi","Perform your duty established in yoga",""
4,7,"यदा यदा हि धर्मस्य","yadā yadā hi dharmasya","Whenever there is a decline of righteousness","Stand up for what is right"
18,66,"सर्वधर्मान्परित्यज्य","sarva-dharmān parityajya","Abandon all varieties of duty and surrender unto Me","Let go of what you cannot control"
"#;

pub const SAMPLE_LEN: usize = 5;

/// Comment lines, a header, and rows with too few fields mixed in
pub const MESSY_CSV: &str = "// header comment\n\
chapter,verse,sanskrit,transliteration,english_meaning\n\
\n\
1,1,a,b,c\n\
1,2,only three\n\
   \n\
1,3,a,b,c,d\n\
broken\n\
1,4,\"x, with comma\",b,c\n";

pub const MESSY_LEN: usize = 3;

/// Data rows without header or comments
#[must_use]
pub fn rows(count: usize) -> String {
    (1..=count)
        .map(|v| format!("1,{v},sanskrit {v},translit {v},meaning {v},apply {v}\n"))
        .collect()
}

/// Full corpus text with header and `count` rows
#[must_use]
pub fn corpus_text(count: usize) -> String {
    format!("{HEADER}\n{}", rows(count))
}

/// Temporary directory holding one corpus file
#[derive(Debug)]
pub struct CorpusDir {
    dir: TempDir,
    path: PathBuf,
}

impl CorpusDir {
    /// Write `contents` to `gita-shloks.csv` inside a fresh temp dir
    ///
    /// # Panics
    /// When the temp dir or file cannot be created.
    #[must_use]
    pub fn with_contents(contents: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("gita-shloks.csv");
        fs::write(&path, contents).expect("write corpus");
        Self { dir, path }
    }

    /// Corpus with the sample fixture
    #[must_use]
    pub fn sample() -> Self {
        Self::with_contents(SAMPLE_CSV)
    }

    /// Path of the corpus file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Root of the temp dir
    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// A path in the temp dir that does not exist
    #[must_use]
    pub fn missing(&self) -> PathBuf {
        self.dir.path().join("missing.csv")
    }

    /// Replace the corpus contents
    ///
    /// # Panics
    /// When the file cannot be written.
    pub fn rewrite(&self, contents: &str) {
        fs::write(&self.path, contents).expect("rewrite corpus");
    }
}
