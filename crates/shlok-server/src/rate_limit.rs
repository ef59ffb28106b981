//! Per-address request limiting for `/api` routes

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Keyed limiter over client addresses
pub struct ApiRateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    clock: DefaultClock,
}

impl ApiRateLimiter {
    /// Allow `requests` per `window` for each address
    ///
    /// The full allowance is available as a burst and refills evenly across
    /// the window. Returns `None` when `requests` is zero.
    #[must_use]
    pub fn new(requests: u32, window: Duration) -> Option<Self> {
        let burst = NonZeroU32::new(requests)?;
        let quota = Quota::with_period(window / requests)
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);
        Some(Self {
            limiter: RateLimiter::keyed(quota),
            clock: DefaultClock::default(),
        })
    }

    /// Take one request for `addr`; `Err` carries the wait until the next
    pub fn check(&self, addr: IpAddr) -> Result<(), Duration> {
        self.limiter
            .check_key(&addr)
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }
}

/// Middleware rejecting requests over the configured limit with 429
///
/// Requests without connection info (in-process calls) share one bucket.
///
/// # Errors
/// `AppError::RateLimited` when the address is over its allowance.
pub async fn limit_requests(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(limiter) = &state.rate_limiter {
        let addr = connect_info.map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |ConnectInfo(addr)| {
            addr.ip()
        });
        if let Err(wait) = limiter.check(addr) {
            tracing::warn!(%addr, path = %request.uri().path(), "rate limit exceeded");
            return Err(AppError::RateLimited {
                retry_after_secs: (wait.as_secs() + u64::from(wait.subsec_nanos() > 0)).max(1),
            });
        }
    }
    Ok(next.run(request).await)
}
