//! Shlok Server
//!
//! HTTP surface for the daily verse plus the minute ticker that pushes it
//! to subscribers.
//!
//! # Routes
//! - `GET /` health
//! - `GET /api/shloks/daily`, `/api/shloks/random`, `/api/shloks/:chapter/:verse`
//! - `GET /api/notifications/check`, `POST /api/notifications/user/:user_id`,
//!   `GET /api/notifications/debug/:user_id`
//! - `GET /data/gita-shloks.csv` raw corpus for clients computing locally
//!
//! Every handler reads the corpus through one shared `ShlokService`, so the
//! HTTP answer and the pushed verse agree for a given UTC date.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod state;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::{net::TcpListener, sync::watch};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub use config::{ConfigError, ServerConfig};
pub use error::{AppError, AppResult};
pub use rate_limit::ApiRateLimiter;
pub use state::{AppState, ServerDispatcher};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Router over shared state
///
/// `/api` routes pass through the per-address rate limit; the health check
/// and the raw corpus do not.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/shloks/daily", get(routes::daily_handler))
        .route("/api/shloks/random", get(routes::random_handler))
        .route("/api/shloks/:chapter/:verse", get(routes::verse_handler))
        .route("/api/notifications/check", get(routes::check_handler))
        .route(
            "/api/notifications/user/:user_id",
            post(routes::send_user_handler),
        )
        .route(
            "/api/notifications/debug/:user_id",
            get(routes::debug_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            rate_limit::limit_requests,
        ))
        .route("/", get(routes::health_handler))
        .route("/data/gita-shloks.csv", get(routes::corpus_csv_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` overrides the default `info` filter. Calling twice is a no-op.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let result = if json {
        fmt().with_env_filter(filter).json().try_init()
    } else {
        fmt().with_env_filter(filter).try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Serve until `shutdown` resolves, running the notification ticker alongside
///
/// # Errors
/// Bind or serve failures.
pub async fn serve(
    state: Arc<AppState>,
    listener: TcpListener,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let (stop_tx, stop_rx) = watch::channel(false);
    let ticker = state.config.tick_interval().map(|period| {
        tokio::spawn(shlok_notify::run_ticker(
            Arc::clone(&state.dispatcher),
            period,
            stop_rx,
        ))
    });

    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    let _ = stop_tx.send(true);
    if let Some(handle) = ticker {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "notification ticker ended abnormally");
        }
    }
    result
}

/// Build state from `config`, bind and serve until Ctrl-C or SIGTERM
///
/// # Errors
/// Subscriber loading, bind or serve failures.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    info!("Initializing state...");
    let state = AppState::from_config(config).await?;

    let address = state.config.address();
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    serve(state, listener, shutdown_signal()).await?;
    info!("Server shut down");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
