//! Server configuration
//!
//! Built in three layers: defaults, an optional TOML file, then environment
//! variables. A malformed environment value is logged and ignored.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use shlok_notify::DISPATCH_PERIOD;
use std::time::Duration;

/// Default listening port
pub const DEFAULT_PORT: u16 = 3001;
/// Default corpus location
pub const DEFAULT_CORPUS_PATH: &str = "data/gita-shloks.csv";
/// Corpus location tried when the default is missing
pub const DEFAULT_FALLBACK_CORPUS_PATH: &str = "public/data/gita-shloks.csv";
/// Requests allowed per client address in one window
pub const DEFAULT_RATE_LIMIT: u32 = 100;
/// Rate limit window
pub const DEFAULT_RATE_WINDOW_SECS: u64 = 15 * 60;

/// Configuration load errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for this configuration
    #[error("invalid config {path}: {source}")]
    Parse {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listening port
    pub port: u16,
    /// Listening address
    pub host: String,
    /// Primary corpus file
    pub corpus_path: PathBuf,
    /// Corpus file used when the primary is missing
    pub fallback_corpus_path: Option<PathBuf>,
    /// JSON file of subscribers; no subscribers when unset
    pub subscribers_path: Option<PathBuf>,
    /// Cache the parsed corpus until the file changes
    ///
    /// Changes are detected by modification time and size. A rewrite that
    /// keeps the size within the filesystem's mtime resolution is not seen
    /// until the next change; leave this off where the corpus is edited in
    /// place.
    pub cache_corpus: bool,
    /// Seconds between notification passes; 0 disables the ticker, any
    /// other value runs at the 60 second dispatch period
    pub tick_interval_secs: u64,
    /// Requests per client address per window on `/api`; 0 disables limiting
    pub rate_limit_requests: u32,
    /// Rate limit window in seconds
    pub rate_limit_window_secs: u64,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: "0.0.0.0".to_string(),
            corpus_path: PathBuf::from(DEFAULT_CORPUS_PATH),
            fallback_corpus_path: Some(PathBuf::from(DEFAULT_FALLBACK_CORPUS_PATH)),
            subscribers_path: None,
            cache_corpus: false,
            tick_interval_secs: 60,
            rate_limit_requests: DEFAULT_RATE_LIMIT,
            rate_limit_window_secs: DEFAULT_RATE_WINDOW_SECS,
            log_json: false,
        }
    }
}

impl ServerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With listening port
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// With listening address
    #[inline]
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// With corpus paths
    #[inline]
    #[must_use]
    pub fn with_corpus(mut self, primary: impl Into<PathBuf>, fallback: Option<PathBuf>) -> Self {
        self.corpus_path = primary.into();
        self.fallback_corpus_path = fallback;
        self
    }

    /// With subscriber file
    #[inline]
    #[must_use]
    pub fn with_subscribers(mut self, path: impl Into<PathBuf>) -> Self {
        self.subscribers_path = Some(path.into());
        self
    }

    /// With corpus caching
    #[inline]
    #[must_use]
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_corpus = enabled;
        self
    }

    /// With notification tick interval in seconds
    #[inline]
    #[must_use]
    pub fn with_tick_interval(mut self, secs: u64) -> Self {
        self.tick_interval_secs = secs;
        self
    }

    /// With `/api` rate limit, `requests` per `window_secs`
    #[inline]
    #[must_use]
    pub fn with_rate_limit(mut self, requests: u32, window_secs: u64) -> Self {
        self.rate_limit_requests = requests;
        self.rate_limit_window_secs = window_secs;
        self
    }

    /// Socket address string
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Tick period, `None` when the ticker is disabled
    ///
    /// Dispatch matches whole UTC minutes, so every enabled ticker runs at
    /// [`DISPATCH_PERIOD`].
    #[must_use]
    pub fn tick_interval(&self) -> Option<Duration> {
        match self.tick_interval_secs {
            0 => None,
            secs if secs == DISPATCH_PERIOD.as_secs() => Some(DISPATCH_PERIOD),
            secs => {
                tracing::warn!(
                    tick_interval_secs = secs,
                    "Unsupported tick interval, using {}s",
                    DISPATCH_PERIOD.as_secs()
                );
                Some(DISPATCH_PERIOD)
            }
        }
    }

    /// Rate limit as `(requests, window)`, `None` when disabled
    #[must_use]
    pub fn rate_limit(&self) -> Option<(u32, Duration)> {
        (self.rate_limit_requests > 0 && self.rate_limit_window_secs > 0).then(|| {
            (
                self.rate_limit_requests,
                Duration::from_secs(self.rate_limit_window_secs),
            )
        })
    }

    /// Parse from TOML text, missing keys take defaults
    ///
    /// # Errors
    /// The TOML error for malformed text.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Read a TOML file
    ///
    /// # Errors
    /// `ConfigError` when the file is unreadable or malformed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults, then `file` if given, then the process environment
    ///
    /// # Errors
    /// `ConfigError` when `file` is given but cannot be used.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(base.apply_env(|key| std::env::var(key).ok()))
    }

    /// Override fields from environment-style lookups
    #[must_use]
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        override_from(&lookup, "PORT", &mut self.port);
        if let Some(path) = lookup("SHLOK_CORPUS_PATH") {
            self.corpus_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("SHLOK_FALLBACK_CORPUS_PATH") {
            self.fallback_corpus_path = (!path.is_empty()).then(|| PathBuf::from(path));
        }
        if let Some(path) = lookup("SHLOK_SUBSCRIBERS_PATH") {
            self.subscribers_path = (!path.is_empty()).then(|| PathBuf::from(path));
        }
        override_from(&lookup, "SHLOK_CACHE_CORPUS", &mut self.cache_corpus);
        override_from(&lookup, "SHLOK_TICK_SECS", &mut self.tick_interval_secs);
        override_from(&lookup, "SHLOK_RATE_LIMIT", &mut self.rate_limit_requests);
        override_from(&lookup, "SHLOK_RATE_WINDOW_SECS", &mut self.rate_limit_window_secs);
        override_from(&lookup, "SHLOK_LOG_JSON", &mut self.log_json);
        self
    }
}

fn override_from<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T)
where
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *slot = value,
        Err(e) => tracing::warn!("Invalid {key} value '{raw}': {e}, keeping current"),
    }
}
