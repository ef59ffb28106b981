//! Shlok Client
//!
//! Fetches today's verse from the server. When the server cannot answer,
//! downloads the raw corpus and runs the same loader and selector locally,
//! so the verse shown is the one the server would have returned.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

use chrono::NaiveDate;
use serde::Deserialize;
use shlok_core::{load_corpus, select_daily_index, today_utc, HttpSource, ShlokError, VerseRecord};
use std::fmt::Display;
use std::time::Duration;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP client could not be constructed
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),

    /// Request could not be sent or its body read
    #[error("request to {url} failed: {source}")]
    Http {
        /// Requested URL
        url: String,
        /// Underlying error
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with an error status
    #[error("{url} answered {status}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Server answered without a verse
    #[error("{url} answered without a verse")]
    MissingVerse {
        /// Requested URL
        url: String,
    },

    /// Local computation failed
    #[error(transparent)]
    Verse(#[from] ShlokError),
}

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Which path produced a daily verse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyOrigin {
    /// Returned by the server
    Server,
    /// Computed locally from the raw corpus
    LocalFallback,
}

/// A daily verse and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyVerse {
    /// The verse
    pub verse: VerseRecord,
    /// Path that produced it
    pub origin: DailyOrigin,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    shlok: Option<VerseRecord>,
}

/// Client for the verse server
#[derive(Debug, Clone)]
pub struct ShlokClient {
    api_base: String,
    csv_url: String,
    http: reqwest::Client,
}

impl ShlokClient {
    /// Client for a server at `api_base`, with the corpus at
    /// `{api_base}/data/gita-shloks.csv` and a 10 second request timeout
    ///
    /// # Errors
    /// `ClientError::Build` when the HTTP client cannot be initialised.
    pub fn new(api_base: impl Into<String>) -> ClientResult<Self> {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        let csv_url = format!("{api_base}/data/gita-shloks.csv");
        Ok(Self {
            api_base,
            csv_url,
            http: http_client(DEFAULT_TIMEOUT)?,
        })
    }

    /// With a per-request timeout of `timeout`
    ///
    /// # Errors
    /// `ClientError::Build` when the HTTP client cannot be initialised.
    pub fn with_timeout(mut self, timeout: Duration) -> ClientResult<Self> {
        self.http = http_client(timeout)?;
        Ok(self)
    }

    /// With the corpus fetched from `csv_url` instead
    #[must_use]
    pub fn with_csv_url(mut self, csv_url: impl Into<String>) -> Self {
        self.csv_url = csv_url.into();
        self
    }

    /// With a preconfigured HTTP client
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Server base URL
    #[inline]
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Corpus URL used for local computation
    #[inline]
    #[must_use]
    pub fn csv_url(&self) -> &str {
        &self.csv_url
    }

    /// Today's verse, from the server or computed locally
    ///
    /// # Errors
    /// Only when both the server and the local computation fail; the local
    /// error is returned.
    pub async fn daily_verse(&self) -> ClientResult<DailyVerse> {
        match self.server_daily().await {
            Ok(verse) => Ok(DailyVerse {
                verse,
                origin: DailyOrigin::Server,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "server daily verse unavailable, computing locally");
                let verse = self.local_daily_verse(today_utc()).await?;
                Ok(DailyVerse {
                    verse,
                    origin: DailyOrigin::LocalFallback,
                })
            }
        }
    }

    /// Verse for `date`, computed from the raw corpus
    ///
    /// # Errors
    /// - `ShlokError::Fetch` when the corpus cannot be downloaded
    /// - `ShlokError::EmptyCorpus` when it has no records
    pub async fn local_daily_verse(&self, date: NaiveDate) -> ClientResult<VerseRecord> {
        let source = HttpSource::with_client(self.csv_url.clone(), self.http.clone());
        let corpus = load_corpus(&source).await?;
        let index = select_daily_index(date, corpus.len())?;
        tracing::debug!(index, total = corpus.len(), "computed daily verse locally");
        Ok(shlok_core::by_index(&corpus, index)?.clone())
    }

    /// Verse by chapter and verse from the server, `None` on 404
    ///
    /// Both parts are sent as given and matched as text by the server, so
    /// `"2"` and `2` are the same request.
    ///
    /// # Errors
    /// Transport failures and non-404 error statuses.
    pub async fn verse(
        &self,
        chapter: impl Display,
        verse: impl Display,
    ) -> ClientResult<Option<VerseRecord>> {
        let url = format!("{}/api/shloks/{chapter}/{verse}", self.api_base);
        match self.fetch_verse(&url).await {
            Ok(record) => Ok(Some(record)),
            Err(ClientError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// A random verse from the server
    ///
    /// # Errors
    /// Transport failures and error statuses.
    pub async fn random_verse(&self) -> ClientResult<VerseRecord> {
        let url = format!("{}/api/shloks/random", self.api_base);
        self.fetch_verse(&url).await
    }

    async fn server_daily(&self) -> ClientResult<VerseRecord> {
        let url = format!("{}/api/shloks/daily", self.api_base);
        self.fetch_verse(&url).await
    }

    async fn fetch_verse(&self, url: &str) -> ClientResult<VerseRecord> {
        let http_error = |source| ClientError::Http {
            url: url.to_string(),
            source,
        };
        let response = self.http.get(url).send().await.map_err(http_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let envelope: Envelope = response.json().await.map_err(http_error)?;
        envelope.shlok.ok_or_else(|| ClientError::MissingVerse {
            url: url.to_string(),
        })
    }
}

fn http_client(timeout: Duration) -> ClientResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(ClientError::Build)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn csv_url_derived_from_base() {
        let client = ShlokClient::new("http://localhost:3001/").unwrap();
        assert_eq!(client.api_base(), "http://localhost:3001");
        assert_eq!(client.csv_url(), "http://localhost:3001/data/gita-shloks.csv");

        let client = client.with_csv_url("https://cdn.example.org/gita-shloks.csv");
        assert_eq!(client.csv_url(), "https://cdn.example.org/gita-shloks.csv");
    }

    #[tokio::test]
    async fn unreachable_everything_is_fetch_error() {
        let client = ShlokClient::new("http://127.0.0.1:9").unwrap();
        let err = client.daily_verse().await.unwrap_err();
        assert!(matches!(err, ClientError::Verse(ShlokError::Fetch(_))));
    }

    #[tokio::test]
    async fn stalled_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let client = ShlokClient::new(base)
            .unwrap()
            .with_timeout(Duration::from_millis(200))
            .unwrap();
        let err = tokio::time::timeout(Duration::from_secs(5), client.daily_verse())
            .await
            .expect("request timeout not applied")
            .unwrap_err();
        assert!(matches!(err, ClientError::Verse(ShlokError::Fetch(_))));
    }
}
