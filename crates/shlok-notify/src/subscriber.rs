//! Subscribers and where they are stored
//!
//! The user database is an external collaborator. [`SubscriberStore`] is
//! the seam; [`InMemorySubscriberStore`] backs the server when subscribers
//! are provisioned from a JSON file, and the tests.

use crate::error::{NotifyError, NotifyResult};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Notification preferences of one subscriber
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Whether daily pushes are wanted
    #[serde(default)]
    pub notifications_enabled: bool,
    /// Preferred `H:M` delivery time, UTC
    #[serde(default)]
    pub notification_time: Option<String>,
    /// Push token for the subscriber's device
    #[serde(default)]
    pub fcm_token: Option<String>,
    /// When the preferences were last changed
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// A user who may receive the daily verse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    /// Stable user id
    pub id: String,
    /// Notification preferences
    #[serde(default)]
    pub preferences: Preferences,
}

impl Subscriber {
    /// Subscriber with notifications enabled at `time`
    #[must_use]
    pub fn enabled(id: impl Into<String>, time: impl Into<String>, token: Option<&str>) -> Self {
        Self {
            id: id.into(),
            preferences: Preferences {
                notifications_enabled: true,
                notification_time: Some(time.into()),
                fcm_token: token.map(str::to_string),
                last_updated: None,
            },
        }
    }

    /// Push token, if a non-empty one is saved
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.preferences
            .fcm_token
            .as_deref()
            .filter(|t| !t.is_empty())
    }
}

/// Source of subscriber records
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// All subscribers with notifications enabled
    ///
    /// # Errors
    /// `NotifyError::Store` when the backing store fails.
    async fn enabled_subscribers(&self) -> NotifyResult<Vec<Subscriber>>;

    /// One subscriber by id
    ///
    /// # Errors
    /// `NotifyError::Store` when the backing store fails.
    async fn subscriber(&self, id: &str) -> NotifyResult<Option<Subscriber>>;
}

#[async_trait]
impl<T: SubscriberStore + ?Sized> SubscriberStore for Arc<T> {
    async fn enabled_subscribers(&self) -> NotifyResult<Vec<Subscriber>> {
        (**self).enabled_subscribers().await
    }

    async fn subscriber(&self, id: &str) -> NotifyResult<Option<Subscriber>> {
        (**self).subscriber(id).await
    }
}

/// Concurrent in-memory subscriber store
#[derive(Debug, Default)]
pub struct InMemorySubscriberStore {
    subscribers: DashMap<String, Subscriber>,
}

impl InMemorySubscriberStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a subscriber
    pub fn insert(&self, subscriber: Subscriber) {
        self.subscribers.insert(subscriber.id.clone(), subscriber);
    }

    /// Remove a subscriber
    pub fn remove(&self, id: &str) -> Option<Subscriber> {
        self.subscribers.remove(id).map(|(_, s)| s)
    }

    /// Number of subscribers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// True when empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Load a JSON array of subscribers
    ///
    /// # Errors
    /// `NotifyError::Store` when the file cannot be read or parsed.
    pub async fn from_json_file(path: impl AsRef<Path>) -> NotifyResult<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| NotifyError::Store(format!("{}: {e}", path.display())))?;
        let store = Self::from_json(&text)
            .map_err(|e| NotifyError::Store(format!("{}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), subscribers = store.len(), "loaded subscribers");
        Ok(store)
    }

    /// Parse a JSON array of subscribers
    ///
    /// # Errors
    /// The JSON error when the text is not an array of subscribers.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let subscribers: Vec<Subscriber> = serde_json::from_str(text)?;
        Ok(subscribers.into_iter().collect())
    }
}

impl FromIterator<Subscriber> for InMemorySubscriberStore {
    fn from_iter<I: IntoIterator<Item = Subscriber>>(iter: I) -> Self {
        let store = Self::new();
        for subscriber in iter {
            store.insert(subscriber);
        }
        store
    }
}

#[async_trait]
impl SubscriberStore for InMemorySubscriberStore {
    async fn enabled_subscribers(&self) -> NotifyResult<Vec<Subscriber>> {
        let mut enabled: Vec<Subscriber> = self
            .subscribers
            .iter()
            .filter(|entry| entry.preferences.notifications_enabled)
            .map(|entry| entry.value().clone())
            .collect();
        // DashMap iteration order is arbitrary
        enabled.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(enabled)
    }

    async fn subscriber(&self, id: &str) -> NotifyResult<Option<Subscriber>> {
        Ok(self.subscribers.get(id).map(|entry| entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"[
        {"id": "u1", "preferences": {"notificationsEnabled": true, "notificationTime": "6:30", "fcmToken": "tok-1"}},
        {"id": "u2", "preferences": {"notificationsEnabled": false, "notificationTime": "6:30"}},
        {"id": "u3"}
    ]"#;

    #[tokio::test]
    async fn json_roundtrip_uses_camel_case() {
        let store = InMemorySubscriberStore::from_json(JSON).unwrap();
        assert_eq!(store.len(), 3);

        let u1 = store.subscriber("u1").await.unwrap().unwrap();
        assert_eq!(u1.preferences.notification_time.as_deref(), Some("6:30"));
        assert_eq!(u1.token(), Some("tok-1"));

        let u3 = store.subscriber("u3").await.unwrap().unwrap();
        assert_eq!(u3.preferences, Preferences::default());
    }

    #[tokio::test]
    async fn only_enabled_subscribers_listed() {
        let store = InMemorySubscriberStore::from_json(JSON).unwrap();
        let ids: Vec<_> = store
            .enabled_subscribers()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, ["u1"]);
    }

    #[tokio::test]
    async fn from_json_file_reports_path_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subscribers.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = InMemorySubscriberStore::from_json_file(&path).await.unwrap_err();
        assert!(matches!(err, NotifyError::Store(msg) if msg.contains("subscribers.json")));
    }

    #[test]
    fn empty_token_is_no_token() {
        let subscriber = Subscriber::enabled("u1", "6:30", Some(""));
        assert_eq!(subscriber.token(), None);
    }

    #[tokio::test]
    async fn insert_and_remove() {
        let store = InMemorySubscriberStore::new();
        store.insert(Subscriber::enabled("u1", "6:30", None));
        assert!(store.subscriber("u1").await.unwrap().is_some());
        assert!(store.remove("u1").is_some());
        assert!(store.is_empty());
    }
}
