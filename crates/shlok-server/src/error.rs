//! HTTP error mapping
//!
//! Misses answer `{success: false, message}`, failures answer
//! `{success: false, error}`.

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shlok_core::ShlokError;
use shlok_notify::NotifyError;
use thiserror::Error;

/// Message returned when the corpus has no records
pub const NO_SHLOKS_MESSAGE: &str = "No shloks found";
/// Message returned when the corpus cannot be read; paths stay in the logs
pub const CORPUS_UNAVAILABLE_MESSAGE: &str = "Shlok data is currently unavailable";

/// Errors surfaced by route handlers
#[derive(Error, Debug)]
pub enum AppError {
    /// Verse requested by chapter and verse is absent
    #[error("Shlok not found for chapter {chapter}, verse {verse}")]
    VerseNotFound {
        /// Requested chapter
        chapter: String,
        /// Requested verse
        verse: String,
    },

    /// Corpus or selection failure
    #[error(transparent)]
    Shlok(#[from] ShlokError),

    /// Notification failure
    #[error(transparent)]
    Notify(#[from] NotifyError),

    /// Client is over its request allowance
    #[error("Too many requests, please try again later.")]
    RateLimited {
        /// Seconds until the next request is allowed
        retry_after_secs: u64,
    },
}

impl AppError {
    /// HTTP status for this error
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::VerseNotFound { .. } => StatusCode::NOT_FOUND,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Shlok(e) | Self::Notify(NotifyError::Verse(e)) => shlok_status(e),
            Self::Notify(NotifyError::SubscriberNotFound(_)) => StatusCode::NOT_FOUND,
            Self::Notify(NotifyError::MissingToken(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Notify(NotifyError::Delivery(_)) => StatusCode::BAD_GATEWAY,
            Self::Notify(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn is_miss(&self) -> bool {
        matches!(
            self,
            Self::VerseNotFound { .. }
                | Self::Shlok(ShlokError::EmptyCorpus)
                | Self::Notify(NotifyError::Verse(ShlokError::EmptyCorpus))
        )
    }

    fn public_message(&self) -> String {
        match self {
            Self::Shlok(ShlokError::EmptyCorpus)
            | Self::Notify(NotifyError::Verse(ShlokError::EmptyCorpus)) => {
                NO_SHLOKS_MESSAGE.to_string()
            }
            Self::Shlok(e) | Self::Notify(NotifyError::Verse(e))
                if matches!(e, ShlokError::SourceUnavailable { .. } | ShlokError::Io { .. }) =>
            {
                CORPUS_UNAVAILABLE_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}

fn shlok_status(error: &ShlokError) -> StatusCode {
    match error {
        ShlokError::EmptyCorpus => StatusCode::NOT_FOUND,
        ShlokError::SourceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.public_message();
        let retry_after = match &self {
            Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };

        let body = if self.is_miss() {
            json!({ "success": false, "message": message })
        } else {
            if status.is_server_error() {
                tracing::error!(%status, error = %self, "request failed");
            }
            json!({ "success": false, "error": message })
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            response.headers_mut().insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

/// Result type for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn status_mapping() {
        assert_eq!(AppError::from(ShlokError::EmptyCorpus).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::from(ShlokError::SourceUnavailable {
                tried: vec![PathBuf::from("a.csv")]
            })
            .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::from(ShlokError::Fetch("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(NotifyError::SubscriberNotFound("u".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(NotifyError::Verse(ShlokError::EmptyCorpus)).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn unavailable_corpus_hides_paths() {
        let err = AppError::from(ShlokError::SourceUnavailable {
            tried: vec![PathBuf::from("/srv/secret/gita.csv")],
        });
        assert_eq!(err.public_message(), CORPUS_UNAVAILABLE_MESSAGE);
        assert!(!err.public_message().contains("/srv/secret"));

        let io = AppError::from(NotifyError::Verse(ShlokError::io_error(
            "/srv/secret/gita.csv",
            std::io::Error::other("denied"),
        )));
        assert_eq!(io.public_message(), CORPUS_UNAVAILABLE_MESSAGE);
    }

    #[test]
    fn rate_limited_sets_retry_after() {
        let response = AppError::RateLimited { retry_after_secs: 9 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "9");
    }

    #[test]
    fn miss_message() {
        let err = AppError::VerseNotFound {
            chapter: "99".into(),
            verse: "1".into(),
        };
        assert_eq!(err.public_message(), "Shlok not found for chapter 99, verse 1");
        assert_eq!(AppError::from(ShlokError::EmptyCorpus).public_message(), NO_SHLOKS_MESSAGE);
    }
}
