//! Corpus sources
//!
//! A source knows where the corpus text lives and how to read it. The file
//! source tries a primary path and then an optional fallback; the HTTP
//! source fetches the same text the browser client would.

use crate::error::{ShlokError, ShlokResult};
use crate::record::SourceFingerprint;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Where corpus text comes from
#[async_trait]
pub trait CorpusSource: Send + Sync + std::fmt::Debug {
    /// Human-readable location for logs
    fn describe(&self) -> String;

    /// Read the whole corpus text
    ///
    /// # Errors
    /// - `ShlokError::SourceUnavailable` when nothing exists to read
    /// - `ShlokError::Io` / `ShlokError::Fetch` when reading fails
    async fn read_text(&self) -> ShlokResult<String>;

    /// Revision identity of the current content, if the source has one
    ///
    /// Caches treat an unchanged fingerprint as unchanged content, so a
    /// fingerprint must change whenever the text does, as far as the
    /// source can tell.
    async fn fingerprint(&self) -> Option<SourceFingerprint> {
        None
    }
}

/// Corpus file on local disk, with an optional fallback location
#[derive(Debug, Clone)]
pub struct FileSource {
    primary: PathBuf,
    fallback: Option<PathBuf>,
}

impl FileSource {
    /// Source with a single location
    #[inline]
    #[must_use]
    pub fn new(primary: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            fallback: None,
        }
    }

    /// With fallback location, tried when the primary is missing
    #[inline]
    #[must_use]
    pub fn with_fallback(mut self, fallback: impl Into<PathBuf>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    /// Primary path
    #[inline]
    #[must_use]
    pub fn primary(&self) -> &Path {
        &self.primary
    }

    /// Fallback path
    #[inline]
    #[must_use]
    pub fn fallback(&self) -> Option<&Path> {
        self.fallback.as_deref()
    }

    /// Pick the first existing candidate
    ///
    /// # Errors
    /// `ShlokError::SourceUnavailable` listing every path tried.
    pub async fn resolve(&self) -> ShlokResult<PathBuf> {
        if exists(&self.primary).await {
            return Ok(self.primary.clone());
        }
        tracing::warn!(path = %self.primary.display(), "corpus not found at primary path");

        if let Some(fallback) = &self.fallback {
            if exists(fallback).await {
                tracing::info!(path = %fallback.display(), "using fallback corpus path");
                return Ok(fallback.clone());
            }
            tracing::error!(path = %fallback.display(), "corpus not found at fallback path either");
        }

        let mut tried = vec![self.primary.clone()];
        tried.extend(self.fallback.clone());
        Err(ShlokError::SourceUnavailable { tried })
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

#[async_trait]
impl CorpusSource for FileSource {
    fn describe(&self) -> String {
        match &self.fallback {
            Some(fallback) => format!(
                "{} (fallback {})",
                self.primary.display(),
                fallback.display()
            ),
            None => self.primary.display().to_string(),
        }
    }

    async fn read_text(&self) -> ShlokResult<String> {
        let path = self.resolve().await?;
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ShlokError::io_error(path, e))
    }

    /// Resolved path, modification time and size
    ///
    /// Only as fine as the filesystem's mtime: a rewrite that keeps the
    /// byte length and lands within the same mtime tick (one second on some
    /// filesystems, coarser on FAT) goes unnoticed until the next change.
    async fn fingerprint(&self) -> Option<SourceFingerprint> {
        let path = self.resolve().await.ok()?;
        let metadata = tokio::fs::metadata(&path).await.ok()?;
        Some(SourceFingerprint {
            location: path.display().to_string(),
            modified: metadata.modified().ok()?,
            len: metadata.len(),
        })
    }
}

/// Corpus served over HTTP
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    /// Source for the given URL with a default client
    #[inline]
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, reqwest::Client::new())
    }

    /// Source sharing an existing client
    #[inline]
    #[must_use]
    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    /// Target URL
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CorpusSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn read_text(&self) -> ShlokResult<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ShlokError::Fetch(format!("{}: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ShlokError::Fetch(format!("{}: status {status}", self.url)));
        }

        response
            .text()
            .await
            .map_err(|e| ShlokError::Fetch(format!("{}: {e}", self.url)))
    }
}

/// Corpus held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    text: String,
}

impl StaticSource {
    /// Source over the given text
    #[inline]
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl CorpusSource for StaticSource {
    fn describe(&self) -> String {
        format!("<memory: {} bytes>", self.text.len())
    }

    async fn read_text(&self) -> ShlokResult<String> {
        Ok(self.text.clone())
    }
}
