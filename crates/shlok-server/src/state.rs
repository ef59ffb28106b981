//! Shared handler state

use crate::config::ServerConfig;
use crate::rate_limit::ApiRateLimiter;
use shlok_core::{CorpusCache, FileSource, ShlokService};
use shlok_notify::{
    Dispatcher, InMemorySubscriberStore, LogMessenger, Messenger, NotifyResult, SubscriberStore,
};
use std::sync::Arc;

/// Dispatcher as wired into the server
pub type ServerDispatcher = Dispatcher<Arc<dyn SubscriberStore>, Arc<dyn Messenger>>;

/// State shared by every request
pub struct AppState {
    /// Loaded configuration
    pub config: ServerConfig,
    /// Verse service over the configured corpus
    pub service: ShlokService,
    /// Notification dispatcher
    pub dispatcher: Arc<ServerDispatcher>,
    /// `/api` limiter, `None` when limiting is disabled
    pub rate_limiter: Option<ApiRateLimiter>,
}

impl AppState {
    /// Assemble state from parts
    #[must_use]
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn SubscriberStore>,
        messenger: Arc<dyn Messenger>,
    ) -> Arc<Self> {
        let service = service_for(&config);
        let dispatcher = Arc::new(Dispatcher::new(service.clone(), store, messenger));
        let rate_limiter = config
            .rate_limit()
            .and_then(|(requests, window)| ApiRateLimiter::new(requests, window));
        Arc::new(Self {
            config,
            service,
            dispatcher,
            rate_limiter,
        })
    }

    /// State from configuration alone, loading subscribers from disk
    ///
    /// # Errors
    /// The subscriber file is configured but unreadable.
    pub async fn from_config(config: ServerConfig) -> NotifyResult<Arc<Self>> {
        let store = match &config.subscribers_path {
            Some(path) => InMemorySubscriberStore::from_json_file(path).await?,
            None => {
                tracing::info!("no subscriber file configured, notifications idle");
                InMemorySubscriberStore::new()
            }
        };
        Ok(Self::new(config, Arc::new(store), Arc::new(LogMessenger)))
    }
}

/// Verse service for the configured corpus paths
#[must_use]
pub fn service_for(config: &ServerConfig) -> ShlokService {
    let mut source = FileSource::new(&config.corpus_path);
    if let Some(fallback) = &config.fallback_corpus_path {
        source = source.with_fallback(fallback);
    }
    let service = ShlokService::new(source);
    if config.cache_corpus {
        service.with_cache(CorpusCache::default())
    } else {
        service
    }
}
