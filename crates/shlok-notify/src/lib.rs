//! Shlok Notify
//!
//! Pushes the daily verse to subscribers at their preferred UTC minute.
//!
//! ```text
//! run_ticker ──every minute──▶ Dispatcher::check_and_send(now)
//!                                 ├─ SubscriberStore  (who is due)
//!                                 ├─ ShlokService     (today's verse)
//!                                 └─ Messenger        (delivery)
//! ```
//!
//! The user database and the push provider are traits; the server wires
//! [`InMemorySubscriberStore`] and [`LogMessenger`] by default.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod dispatcher;
pub mod error;
pub mod messenger;
pub mod schedule;
pub mod subscriber;
pub mod ticker;

pub use dispatcher::{DebugInfo, DispatchMinute, DispatchReport, Dispatcher, SendReceipt};
pub use error::{NotifyError, NotifyResult};
pub use messenger::{LogMessenger, Messenger, PushMessage, RecordingMessenger};
pub use schedule::NotificationTime;
pub use subscriber::{InMemorySubscriberStore, Preferences, Subscriber, SubscriberStore};
pub use ticker::{run_ticker, DISPATCH_PERIOD};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for notification dispatch
    pub use crate::dispatcher::{DispatchReport, Dispatcher};
    pub use crate::error::{NotifyError, NotifyResult};
    pub use crate::messenger::{Messenger, PushMessage};
    pub use crate::subscriber::{Subscriber, SubscriberStore};
}
