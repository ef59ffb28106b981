//! Minute ticker driving dispatch passes
//!
//! Ticks are aligned to wall-clock multiples of the period, so with
//! [`DISPATCH_PERIOD`] a pass starts just after every UTC minute boundary.
//! Ticks that land in a minute already dispatched are no-ops.

use crate::dispatcher::Dispatcher;
use crate::messenger::Messenger;
use crate::subscriber::SubscriberStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

/// Period of the production ticker
pub const DISPATCH_PERIOD: Duration = Duration::from_secs(60);

/// Time from `now_millis` (Unix epoch) to the next multiple of `period`
#[must_use]
pub fn delay_to_boundary(now_millis: i64, period: Duration) -> Duration {
    let period_millis = i64::try_from(period.as_millis()).unwrap_or(i64::MAX).max(1);
    let elapsed = now_millis.rem_euclid(period_millis);
    Duration::from_millis(u64::try_from(period_millis - elapsed).unwrap_or(0))
}

/// Run a dispatch pass every `period` until `shutdown` flips to `true`
///
/// The first pass waits for the next wall-clock boundary of `period`.
/// Failed passes are logged and the loop carries on. Ticks missed while a
/// pass overruns are skipped, not replayed.
pub async fn run_ticker<S, M>(
    dispatcher: Arc<Dispatcher<S, M>>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) where
    S: SubscriberStore,
    M: Messenger,
{
    let start = Instant::now() + delay_to_boundary(Utc::now().timestamp_millis(), period);
    let mut interval = tokio::time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tracing::info!(period_ms = period.as_millis(), "notification ticker started");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match dispatcher.check_and_send(Utc::now()).await {
                    Ok(report) if report.is_idle() => {}
                    Ok(report) => tracing::info!(
                        processed = report.total_processed,
                        sent = report.total_sent,
                        errors = report.errors.len(),
                        "dispatch pass complete"
                    ),
                    Err(e) => tracing::error!(error = %e, "dispatch pass failed"),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!("notification ticker stopped");
}
