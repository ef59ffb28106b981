//! Push messages and the provider seam
//!
//! The push provider (device token in, delivery out) is an external
//! collaborator behind [`Messenger`]. [`LogMessenger`] stands in when no
//! provider is configured; [`RecordingMessenger`] captures deliveries.

use crate::error::NotifyResult;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use shlok_core::VerseRecord;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Title of the scheduled daily push
pub const DAILY_TITLE: &str = "Your Daily Bhagavad Gita Shlok";
/// Title of an on-demand push
pub const DIRECT_TITLE: &str = "Bhagavad Gita Daily Shlok";
/// Body used when the verse has no Sanskrit text
pub const DAILY_FALLBACK_BODY: &str = "Time for your daily wisdom from the Bhagavad Gita";
/// Action the app performs when the push is opened
pub const OPEN_DAILY_ACTION: &str = "OPEN_DAILY_SHLOK";

const PREVIEW_CHARS: usize = 50;

/// A push notification addressed to one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushMessage {
    /// Device token
    pub token: String,
    /// Notification title
    pub title: String,
    /// Notification body
    pub body: String,
    /// Data payload delivered alongside
    pub data: BTreeMap<String, String>,
}

impl PushMessage {
    /// Scheduled daily push for `verse`
    ///
    /// The body previews the first 50 characters of the Sanskrit text.
    #[must_use]
    pub fn compose_daily(token: impl Into<String>, verse: &VerseRecord) -> Self {
        let body = if verse.sanskrit.is_empty() {
            DAILY_FALLBACK_BODY.to_string()
        } else {
            let preview: String = verse.sanskrit.chars().take(PREVIEW_CHARS).collect();
            format!("{} - {preview}...", verse.reference())
        };
        Self {
            token: token.into(),
            title: DAILY_TITLE.to_string(),
            body,
            data: verse_data(verse),
        }
    }

    /// On-demand push for `verse`
    #[must_use]
    pub fn compose_direct(token: impl Into<String>, verse: &VerseRecord) -> Self {
        Self {
            token: token.into(),
            title: DIRECT_TITLE.to_string(),
            body: format!("Chapter {}, Verse {}", verse.chapter, verse.verse),
            data: verse_data(verse),
        }
    }
}

fn verse_data(verse: &VerseRecord) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("chapter".to_string(), verse.chapter.clone()),
        ("verse".to_string(), verse.verse.clone()),
        ("click_action".to_string(), OPEN_DAILY_ACTION.to_string()),
    ])
}

/// Delivers push messages
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Deliver one message, returning the provider's message id
    ///
    /// # Errors
    /// `NotifyError::Delivery` when the provider rejects the message.
    async fn send(&self, message: PushMessage) -> NotifyResult<String>;
}

#[async_trait]
impl<T: Messenger + ?Sized> Messenger for Arc<T> {
    async fn send(&self, message: PushMessage) -> NotifyResult<String> {
        (**self).send(message).await
    }
}

/// Messenger that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMessenger;

#[async_trait]
impl Messenger for LogMessenger {
    async fn send(&self, message: PushMessage) -> NotifyResult<String> {
        tracing::info!(
            title = %message.title,
            body = %message.body,
            "push delivery (log only)"
        );
        Ok(format!("log-{}", message.data.get("verse").map_or("", String::as_str)))
    }
}

/// Messenger that keeps every message it is asked to send
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<PushMessage>>,
}

impl RecordingMessenger {
    /// Create an empty recorder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far
    #[must_use]
    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent.lock().clone()
    }

    /// Number of messages sent so far
    #[must_use]
    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, message: PushMessage) -> NotifyResult<String> {
        let mut sent = self.sent.lock();
        sent.push(message);
        Ok(format!("msg-{}", sent.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn verse(sanskrit: &str) -> VerseRecord {
        VerseRecord::new("2", "47", sanskrit, "t", "m")
    }

    #[test]
    fn daily_body_previews_fifty_chars() {
        let long = "क".repeat(80);
        let message = PushMessage::compose_daily("tok", &verse(&long));

        assert_eq!(message.title, DAILY_TITLE);
        assert_eq!(message.body, format!("2:47 - {}...", "क".repeat(50)));
        assert_eq!(message.data["click_action"], OPEN_DAILY_ACTION);
        assert_eq!(message.data["chapter"], "2");
    }

    #[test]
    fn daily_body_without_sanskrit() {
        let message = PushMessage::compose_daily("tok", &verse(""));
        assert_eq!(message.body, DAILY_FALLBACK_BODY);
    }

    #[test]
    fn direct_body_names_chapter_and_verse() {
        let message = PushMessage::compose_direct("tok", &verse("x"));
        assert_eq!(message.title, DIRECT_TITLE);
        assert_eq!(message.body, "Chapter 2, Verse 47");
    }

    #[tokio::test]
    async fn recorder_keeps_messages() {
        let recorder = RecordingMessenger::new();
        let id = recorder
            .send(PushMessage::compose_direct("tok", &verse("x")))
            .await
            .unwrap();
        assert_eq!(id, "msg-1");
        assert_eq!(recorder.count(), 1);
        assert_eq!(recorder.sent()[0].token, "tok");
    }
}
