//! Error types for notification dispatch

use shlok_core::ShlokError;

/// Errors raised while scheduling or delivering verse notifications
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Preferred time is not `H:M` with valid hour and minute
    #[error("invalid notification time: '{0}'")]
    InvalidTime(String),

    /// No subscriber with this id
    #[error("subscriber {0} not found")]
    SubscriberNotFound(String),

    /// Subscriber has no push token saved
    #[error("subscriber {0} has no push token")]
    MissingToken(String),

    /// Subscriber store failed
    #[error("subscriber store error: {0}")]
    Store(String),

    /// Push provider rejected or failed the message
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// Verse could not be resolved
    #[error("verse unavailable: {0}")]
    Verse(#[from] ShlokError),
}

impl NotifyError {
    /// True when the failure concerns one subscriber, not the whole pass
    #[inline]
    #[must_use]
    pub fn is_per_subscriber(&self) -> bool {
        matches!(
            self,
            Self::SubscriberNotFound(_) | Self::MissingToken(_) | Self::Delivery(_)
        )
    }
}

/// Result type alias for notification operations
pub type NotifyResult<T> = Result<T, NotifyError>;
