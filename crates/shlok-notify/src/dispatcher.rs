//! One dispatch pass over the subscriber list
//!
//! A pass finds subscribers whose preferred time equals the current UTC
//! minute and pushes today's verse to each. The corpus is only loaded when
//! at least one subscriber is due.
//!
//! A dispatcher handles each UTC minute at most once. A pass for a minute
//! already handled, or an earlier one, is skipped, so ticker passes and
//! manual checks never double-send.

use crate::error::{NotifyError, NotifyResult};
use crate::messenger::{Messenger, PushMessage};
use crate::schedule::NotificationTime;
use crate::subscriber::{Subscriber, SubscriberStore};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use shlok_core::ShlokService;

const TOKEN_PREVIEW_CHARS: usize = 10;

/// UTC date and minute a pass ran for
pub type DispatchMinute = (NaiveDate, NotificationTime);

/// Outcome of one dispatch pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    /// Subscribers due in this minute
    pub total_processed: usize,
    /// Messages handed to the provider
    pub total_sent: usize,
    /// Per-subscriber failures
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// The minute had already been dispatched; nothing was sent
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub already_dispatched: bool,
}

impl DispatchReport {
    /// True when nobody was due
    #[inline]
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.total_processed == 0
    }
}

/// Result of a direct send
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    /// Recipient
    pub user_id: String,
    /// Provider message id
    pub message_id: String,
    /// Chapter of the verse sent
    pub chapter: String,
    /// Verse number of the verse sent
    pub verse: String,
}

/// Notification settings of one subscriber as seen by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    /// Subscriber id
    pub user_id: String,
    /// Whether pushes are enabled
    pub notifications_enabled: bool,
    /// Preferred time, or "Not set"
    pub notification_time: String,
    /// Whether a push token is saved
    pub has_fcm_token: bool,
    /// Length of the saved token
    pub token_length: usize,
    /// Last preference change, or "Never"
    pub last_updated: String,
    /// Server clock, RFC 3339
    pub current_server_time: String,
    /// Server clock as `HH:MM` UTC
    #[serde(rename = "currentUTCTime")]
    pub current_utc_time: String,
    /// First characters of the token, or "None"
    pub token_first_chars: String,
}

/// Matches subscribers to the clock and sends them the daily verse
#[derive(Debug)]
pub struct Dispatcher<S, M> {
    service: ShlokService,
    store: S,
    messenger: M,
    last_dispatched: Mutex<Option<DispatchMinute>>,
}

impl<S, M> Dispatcher<S, M>
where
    S: SubscriberStore,
    M: Messenger,
{
    /// Create a dispatcher
    #[must_use]
    pub fn new(service: ShlokService, store: S, messenger: M) -> Self {
        Self {
            service,
            store,
            messenger,
            last_dispatched: Mutex::new(None),
        }
    }

    /// Latest minute a pass has claimed
    #[must_use]
    pub fn last_dispatched(&self) -> Option<DispatchMinute> {
        *self.last_dispatched.lock()
    }

    /// Claim `minute`, returning the previous claim, or `None` when it
    /// (or a later minute) was already claimed
    fn claim_minute(&self, minute: DispatchMinute) -> Option<Option<DispatchMinute>> {
        let mut last = self.last_dispatched.lock();
        if last.is_some_and(|prev| prev >= minute) {
            return None;
        }
        Some(last.replace(minute))
    }

    fn release_minute(&self, minute: DispatchMinute, previous: Option<DispatchMinute>) {
        let mut last = self.last_dispatched.lock();
        if *last == Some(minute) {
            *last = previous;
        }
    }

    /// Subscriber store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Push provider
    #[inline]
    #[must_use]
    pub fn messenger(&self) -> &M {
        &self.messenger
    }

    /// Subscribers whose preferred time is the minute of `now`
    ///
    /// # Errors
    /// Store failures.
    pub async fn due_subscribers(&self, now: DateTime<Utc>) -> NotifyResult<Vec<Subscriber>> {
        let current = NotificationTime::from_datetime(now);
        let due = self
            .store
            .enabled_subscribers()
            .await?
            .into_iter()
            .filter(|subscriber| {
                let Some(raw) = subscriber.preferences.notification_time.as_deref() else {
                    return false;
                };
                match NotificationTime::parse(raw) {
                    Ok(time) => {
                        tracing::trace!(user = %subscriber.id, %time, %current, "checking time");
                        time == current
                    }
                    Err(e) => {
                        tracing::warn!(user = %subscriber.id, error = %e, "skipping subscriber");
                        false
                    }
                }
            })
            .collect();
        Ok(due)
    }

    /// Send today's verse to everyone due at `now`
    ///
    /// # Errors
    /// - store failures
    /// - `NotifyError::Verse` when subscribers are due but no verse can be chosen
    ///
    /// Missing tokens and failed deliveries are reported, not raised. A
    /// failed pass releases its minute so it can be retried.
    pub async fn check_and_send(&self, now: DateTime<Utc>) -> NotifyResult<DispatchReport> {
        let minute = (now.date_naive(), NotificationTime::from_datetime(now));
        let Some(previous) = self.claim_minute(minute) else {
            tracing::debug!(at = %minute.1, "minute already dispatched, skipping");
            return Ok(DispatchReport {
                already_dispatched: true,
                ..DispatchReport::default()
            });
        };

        let result = self.dispatch(now).await;
        if result.is_err() {
            self.release_minute(minute, previous);
        }
        result
    }

    async fn dispatch(&self, now: DateTime<Utc>) -> NotifyResult<DispatchReport> {
        let due = self.due_subscribers(now).await?;
        tracing::debug!(due = due.len(), at = %NotificationTime::from_datetime(now), "dispatch pass");
        if due.is_empty() {
            return Ok(DispatchReport::default());
        }

        let verse = self.service.daily_verse_on(now.date_naive()).await?;
        let mut report = DispatchReport {
            total_processed: due.len(),
            ..DispatchReport::default()
        };

        for subscriber in &due {
            let Some(token) = subscriber.token() else {
                tracing::warn!(user = %subscriber.id, "notifications enabled but no push token");
                report.errors.push(NotifyError::MissingToken(subscriber.id.clone()).to_string());
                continue;
            };
            match self
                .messenger
                .send(PushMessage::compose_daily(token, &verse))
                .await
            {
                Ok(message_id) => {
                    report.total_sent += 1;
                    tracing::info!(user = %subscriber.id, %message_id, verse = %verse.reference(), "sent daily verse");
                }
                Err(e) => {
                    tracing::error!(user = %subscriber.id, error = %e, "delivery failed");
                    report.errors.push(format!("failed to send to {}: {e}", subscriber.id));
                }
            }
        }

        Ok(report)
    }

    /// Send today's verse to one subscriber, whatever their schedule
    ///
    /// # Errors
    /// - `NotifyError::SubscriberNotFound`
    /// - `NotifyError::MissingToken`
    /// - `NotifyError::Verse` when no verse can be chosen
    /// - delivery failures
    pub async fn send_to_user(&self, user_id: &str, now: DateTime<Utc>) -> NotifyResult<SendReceipt> {
        let subscriber = self
            .store
            .subscriber(user_id)
            .await?
            .ok_or_else(|| NotifyError::SubscriberNotFound(user_id.to_string()))?;
        let token = subscriber
            .token()
            .ok_or_else(|| NotifyError::MissingToken(user_id.to_string()))?;

        let verse = self.service.daily_verse_on(now.date_naive()).await?;
        let message_id = self
            .messenger
            .send(PushMessage::compose_direct(token, &verse))
            .await?;
        tracing::info!(user = %user_id, %message_id, verse = %verse.reference(), "sent direct verse");

        Ok(SendReceipt {
            user_id: user_id.to_string(),
            message_id,
            chapter: verse.chapter,
            verse: verse.verse,
        })
    }

    /// Notification settings of one subscriber
    ///
    /// # Errors
    /// `NotifyError::SubscriberNotFound` or store failures.
    pub async fn debug_info(&self, user_id: &str, now: DateTime<Utc>) -> NotifyResult<DebugInfo> {
        let subscriber = self
            .store
            .subscriber(user_id)
            .await?
            .ok_or_else(|| NotifyError::SubscriberNotFound(user_id.to_string()))?;
        let prefs = &subscriber.preferences;
        let token = subscriber.token();

        Ok(DebugInfo {
            user_id: subscriber.id.clone(),
            notifications_enabled: prefs.notifications_enabled,
            notification_time: prefs
                .notification_time
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Not set".to_string()),
            has_fcm_token: token.is_some(),
            token_length: token.map_or(0, |t| t.chars().count()),
            last_updated: prefs
                .last_updated
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Never".to_string()),
            current_server_time: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            current_utc_time: NotificationTime::from_datetime(now).to_string(),
            token_first_chars: token.map_or_else(
                || "None".to_string(),
                |t| format!("{}...", t.chars().take(TOKEN_PREVIEW_CHARS).collect::<String>()),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messenger::{MockMessenger, RecordingMessenger};
    use crate::subscriber::InMemorySubscriberStore;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use shlok_core::{FileSource, StaticSource};

    const TEXT: &str = "1,1,a,b,c,d\n2,47,e,f,g,h\n18,66,i,j,k,l\n";

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, hour, minute, 12).unwrap()
    }

    fn store() -> InMemorySubscriberStore {
        [
            Subscriber::enabled("alice", "6:30", Some("token-alice-0123456789")),
            Subscriber::enabled("bob", "06:30", None),
            Subscriber::enabled("carol", "7:00", Some("token-carol")),
        ]
        .into_iter()
        .collect()
    }

    fn dispatcher<M: Messenger>(messenger: M) -> Dispatcher<InMemorySubscriberStore, M> {
        Dispatcher::new(ShlokService::new(StaticSource::new(TEXT)), store(), messenger)
    }

    #[tokio::test]
    async fn sends_to_due_subscribers_with_tokens() {
        let dispatcher = dispatcher(RecordingMessenger::new());
        let report = dispatcher.check_and_send(at(6, 30)).await.unwrap();

        assert_eq!(report.total_processed, 2);
        assert_eq!(report.total_sent, 1);
        assert_eq!(report.errors, ["subscriber bob has no push token"]);

        let sent = dispatcher.messenger().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].token, "token-alice-0123456789");
        // 2024-1-15 hashes to 441, 441 % 3 == 0
        assert_eq!(sent[0].body, "1:1 - a...");
    }

    #[tokio::test]
    async fn idle_minute_does_not_touch_corpus() {
        let dispatcher = Dispatcher::new(
            ShlokService::new(StaticSource::new("")),
            store(),
            RecordingMessenger::new(),
        );
        let report = dispatcher.check_and_send(at(12, 0)).await.unwrap();
        assert!(report.is_idle());
    }

    #[tokio::test]
    async fn empty_corpus_fails_pass_when_someone_is_due() {
        let dispatcher = Dispatcher::new(
            ShlokService::new(StaticSource::new("")),
            store(),
            RecordingMessenger::new(),
        );
        let err = dispatcher.check_and_send(at(7, 0)).await.unwrap_err();
        assert!(matches!(err, NotifyError::Verse(e) if e.is_empty_corpus()));
    }

    #[tokio::test]
    async fn one_failed_delivery_does_not_abort_batch() {
        let store = InMemorySubscriberStore::new();
        store.insert(Subscriber::enabled("a", "7:00", Some("bad")));
        store.insert(Subscriber::enabled("b", "7:00", Some("good")));

        let mut messenger = MockMessenger::new();
        messenger.expect_send().times(2).returning(|message| {
            if message.token == "bad" {
                Err(NotifyError::Delivery("token expired".into()))
            } else {
                Ok("id-1".into())
            }
        });

        let dispatcher = Dispatcher::new(ShlokService::new(StaticSource::new(TEXT)), store, messenger);
        let report = dispatcher.check_and_send(at(7, 0)).await.unwrap();

        assert_eq!(report.total_processed, 2);
        assert_eq!(report.total_sent, 1);
        assert_eq!(report.errors, ["failed to send to a: delivery failed: token expired"]);
    }

    #[tokio::test]
    async fn malformed_time_is_skipped() {
        let store = InMemorySubscriberStore::new();
        store.insert(Subscriber::enabled("x", "seven", Some("tok")));

        let mut messenger = MockMessenger::new();
        messenger.expect_send().never();

        let dispatcher = Dispatcher::new(ShlokService::new(StaticSource::new(TEXT)), store, messenger);
        assert!(dispatcher.check_and_send(at(7, 0)).await.unwrap().is_idle());
    }

    #[tokio::test]
    async fn direct_send_uses_chapter_verse_body() {
        let dispatcher = dispatcher(RecordingMessenger::new());
        let receipt = dispatcher.send_to_user("carol", at(9, 0)).await.unwrap();

        assert_eq!(receipt.message_id, "msg-1");
        assert_eq!((receipt.chapter.as_str(), receipt.verse.as_str()), ("1", "1"));
        assert_eq!(dispatcher.messenger().sent()[0].body, "Chapter 1, Verse 1");
    }

    #[tokio::test]
    async fn direct_send_errors() {
        let dispatcher = dispatcher(RecordingMessenger::new());
        assert!(matches!(
            dispatcher.send_to_user("nobody", at(9, 0)).await,
            Err(NotifyError::SubscriberNotFound(_))
        ));
        assert!(matches!(
            dispatcher.send_to_user("bob", at(9, 0)).await,
            Err(NotifyError::MissingToken(_))
        ));
        assert_eq!(dispatcher.messenger().count(), 0);
    }

    #[tokio::test]
    async fn debug_info_masks_token() {
        let dispatcher = dispatcher(RecordingMessenger::new());
        let info = dispatcher.debug_info("alice", at(6, 5)).await.unwrap();

        assert_eq!(info.token_first_chars, "token-alic...");
        assert_eq!(info.token_length, 22);
        assert_eq!(info.current_utc_time, "06:05");
        assert_eq!(info.last_updated, "Never");
        assert_eq!(info.current_server_time, "2024-01-15T06:05:12.000Z");

        let bob = dispatcher.debug_info("bob", at(6, 5)).await.unwrap();
        assert!(!bob.has_fcm_token);
        assert_eq!(bob.token_first_chars, "None");
    }

    #[tokio::test]
    async fn same_minute_is_dispatched_once() {
        let dispatcher = dispatcher(RecordingMessenger::new());
        let first = dispatcher.check_and_send(at(6, 30)).await.unwrap();
        let again = dispatcher
            .check_and_send(Utc.with_ymd_and_hms(2024, 1, 15, 6, 30, 58).unwrap())
            .await
            .unwrap();

        assert_eq!(first.total_sent, 1);
        assert!(again.already_dispatched);
        assert!(again.is_idle());
        assert_eq!(dispatcher.messenger().count(), 1);
    }

    #[tokio::test]
    async fn earlier_minute_is_not_replayed() {
        let dispatcher = dispatcher(RecordingMessenger::new());
        dispatcher.check_and_send(at(7, 0)).await.unwrap();

        let late = dispatcher.check_and_send(at(6, 30)).await.unwrap();
        assert!(late.already_dispatched);
        assert_eq!(dispatcher.messenger().count(), 1);
        assert_eq!(
            dispatcher.last_dispatched(),
            Some((at(7, 0).date_naive(), NotificationTime::new(7, 0).unwrap()))
        );
    }

    #[tokio::test]
    async fn failed_pass_releases_its_minute() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shloks.csv");
        let dispatcher = Dispatcher::new(
            ShlokService::new(FileSource::new(&path)),
            store(),
            RecordingMessenger::new(),
        );

        assert!(dispatcher.check_and_send(at(7, 0)).await.is_err());
        assert_eq!(dispatcher.last_dispatched(), None);

        std::fs::write(&path, TEXT).unwrap();
        let retry = dispatcher.check_and_send(at(7, 0)).await.unwrap();
        assert_eq!(retry.total_sent, 1);
    }

    #[test]
    fn report_serializes_camel_case() {
        let report = DispatchReport {
            total_processed: 1,
            total_sent: 1,
            ..DispatchReport::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json, serde_json::json!({"totalProcessed": 1, "totalSent": 1}));
    }
}
