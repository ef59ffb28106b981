//! The verse service
//!
//! The only surface the rest of the application depends on:
//! - [`ShlokService::daily_verse`]
//! - [`ShlokService::random_verse`]
//! - [`ShlokService::verse`]
//!
//! Each call loads the corpus from its source and computes from scratch,
//! so any number of callers can use one service concurrently.

use crate::cache::CorpusCache;
use crate::error::ShlokResult;
use crate::loader::{load_corpus, CorpusSource};
use crate::lookup::{by_chapter_verse, by_index};
use crate::record::{Corpus, VerseRecord};
use crate::selector::{canonical_date_string, select_daily_index, select_random_index, today_utc};
use chrono::NaiveDate;
use std::fmt::Display;
use std::sync::Arc;

/// Daily, random and direct verse lookups over one corpus source
#[derive(Debug, Clone)]
pub struct ShlokService {
    source: Arc<dyn CorpusSource>,
    cache: Option<CorpusCache>,
}

impl ShlokService {
    /// Service that reloads the source on every call
    #[inline]
    #[must_use]
    pub fn new(source: impl CorpusSource + 'static) -> Self {
        Self::from_shared(Arc::new(source))
    }

    /// Service over an already shared source
    #[inline]
    #[must_use]
    pub fn from_shared(source: Arc<dyn CorpusSource>) -> Self {
        Self {
            source,
            cache: None,
        }
    }

    /// With a revision-keyed cache for fingerprinted sources
    #[inline]
    #[must_use]
    pub fn with_cache(mut self, cache: CorpusCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Underlying source
    #[inline]
    #[must_use]
    pub fn source(&self) -> &Arc<dyn CorpusSource> {
        &self.source
    }

    /// Load the corpus, consulting the cache when the source has a revision
    ///
    /// # Errors
    /// Propagates source errors.
    pub async fn corpus(&self) -> ShlokResult<Arc<Corpus>> {
        if let Some(cache) = &self.cache {
            if let Some(fingerprint) = self.source.fingerprint().await {
                return cache
                    .try_get_or_insert_with(fingerprint, || load_corpus(self.source.as_ref()))
                    .await;
            }
        }
        load_corpus(self.source.as_ref()).await.map(Arc::new)
    }

    /// Verse for the given calendar date
    ///
    /// # Errors
    /// - `ShlokError::EmptyCorpus` when the source has no records
    /// - source errors unchanged
    pub async fn daily_verse_on(&self, date: NaiveDate) -> ShlokResult<VerseRecord> {
        let corpus = self.corpus().await?;
        let index = select_daily_index(date, corpus.len())?;
        tracing::debug!(
            date = %canonical_date_string(date),
            index,
            total = corpus.len(),
            "selected daily verse"
        );
        by_index(&corpus, index).cloned()
    }

    /// Verse for today (UTC)
    ///
    /// # Errors
    /// See [`ShlokService::daily_verse_on`].
    pub async fn daily_verse(&self) -> ShlokResult<VerseRecord> {
        self.daily_verse_on(today_utc()).await
    }

    /// Uniformly random verse
    ///
    /// # Errors
    /// - `ShlokError::EmptyCorpus` when the source has no records
    /// - source errors unchanged
    pub async fn random_verse(&self) -> ShlokResult<VerseRecord> {
        let corpus = self.corpus().await?;
        let index = select_random_index(corpus.len())?;
        by_index(&corpus, index).cloned()
    }

    /// Verse by chapter and verse number, `None` if absent
    ///
    /// # Errors
    /// Source errors only; a miss is not an error.
    pub async fn verse(
        &self,
        chapter: impl Display,
        verse: impl Display,
    ) -> ShlokResult<Option<VerseRecord>> {
        let corpus = self.corpus().await?;
        Ok(by_chapter_verse(&corpus, chapter, verse).cloned())
    }
}
