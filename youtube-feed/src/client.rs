//! The entry point the rendering layer calls: cached, deduplicated fetches per resource kind.

use crate::cache::CacheStore;
use crate::config::FeedConfig;
use crate::error::FetchError;
use crate::fetcher::{FetchSettings, PaginatedFetcher};
use crate::item::{FetchRequest, Item, ResourceKind};
use crate::rate_limit::RateLimiter;
use crate::youtube_api::YouTubeClient;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::instrument;

type SharedOutcome = Result<Arc<[Item]>, FetchError>;
type InFlight = Mutex<HashMap<ResourceKind, watch::Receiver<Option<SharedOutcome>>>>;

/// Fetches collections through a [`CacheStore`].
///
/// Concurrent misses for the same kind share one remote fetch. Once the API reports that the
/// quota is exhausted, further misses fail straight away for the rest of the client's life;
/// cached results are still served.
#[derive(Debug)]
pub struct ResourceClient {
    fetcher: PaginatedFetcher,
    cache: CacheStore,
    inflight: InFlight,
    quota_exhausted: Mutex<Option<String>>,
}

enum Flight {
    Lead(watch::Sender<Option<SharedOutcome>>),
    Follow(watch::Receiver<Option<SharedOutcome>>),
}

/// Clears the in-flight slot for `kind` when the leading fetch finishes or is dropped.
struct FlightGuard<'a> {
    inflight: &'a InFlight,
    kind: ResourceKind,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.kind);
    }
}

impl ResourceClient {
    pub fn new(fetcher: PaginatedFetcher, cache: CacheStore) -> Self {
        Self {
            fetcher,
            cache,
            inflight: Mutex::new(HashMap::new()),
            quota_exhausted: Mutex::new(None),
        }
    }

    /// Wires up the transport, rate limiter, retry policy and cache from `config`.
    pub fn from_config(config: &FeedConfig) -> eyre::Result<Self> {
        let tuning = &config.tuning;
        let api = YouTubeClient::with_timeout(
            config.api_key.as_str(),
            tuning.base_url.as_str(),
            tuning.request_timeout(),
        )?;
        let limiter = Arc::new(RateLimiter::new(tuning.min_request_interval()));
        let fetcher = PaginatedFetcher::new(
            api,
            limiter,
            tuning.retry_policy(),
            FetchSettings::from_config(config),
        );
        Ok(Self::new(fetcher, CacheStore::new(tuning.cache_ttl())))
    }

    pub fn fetcher(&self) -> &PaginatedFetcher {
        &self.fetcher
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// The quota reason, if an earlier fetch ran the quota dry.
    pub fn quota_exhausted(&self) -> Option<String> {
        self.quota_exhausted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Up to `request.desired_count` items of `request.kind`.
    ///
    /// A cached result is trimmed to the requested count but never topped up when it holds
    /// fewer items. On a miss the full fetched result replaces the cache entry; a failed fetch
    /// leaves the cache untouched.
    #[instrument(skip(self, request), fields(kind = %request.kind, desired = request.desired_count))]
    pub async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Item>, FetchError> {
        if request.desired_count == 0 {
            return Ok(Vec::new());
        }

        if let Some(entry) = self.cache.get(request.kind) {
            tracing::debug!(
                cached_items = entry.items.len(),
                age_ms = entry.age().as_millis() as u64,
                "cache hit"
            );
            return Ok(trimmed(&entry.items, request.desired_count));
        }
        tracing::debug!("cache miss");

        let items = self.fetch_shared(request).await?;
        Ok(trimmed(&items, request.desired_count))
    }

    /// Drops the cached result for `kind` so the next fetch goes to the API.
    pub fn invalidate(&self, kind: ResourceKind) {
        self.cache.invalidate(kind);
    }

    /// Fetches `request` from the API regardless of what is cached.
    pub async fn refresh(&self, request: &FetchRequest) -> Result<Vec<Item>, FetchError> {
        self.invalidate(request.kind);
        self.fetch(request).await
    }

    fn join_or_lead(&self, kind: ResourceKind) -> Flight {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        match inflight.get(&kind) {
            Some(receiver) => Flight::Follow(receiver.clone()),
            None => {
                let (sender, receiver) = watch::channel(None);
                inflight.insert(kind, receiver);
                Flight::Lead(sender)
            }
        }
    }

    async fn fetch_shared(&self, request: &FetchRequest) -> SharedOutcome {
        loop {
            if let Some(reason) = self.quota_exhausted() {
                tracing::debug!(%reason, "quota already exhausted, not calling the API");
                return Err(FetchError::QuotaExceeded { reason });
            }

            match self.join_or_lead(request.kind) {
                Flight::Follow(mut receiver) => {
                    tracing::debug!("joining in-flight fetch");
                    let shared = match receiver.wait_for(Option::is_some).await {
                        Ok(outcome) => outcome.clone(),
                        Err(_) => None,
                    };
                    if let Some(outcome) = shared {
                        return outcome;
                    }
                    // the leading fetch was dropped before it finished
                }
                Flight::Lead(sender) => {
                    let _guard = FlightGuard {
                        inflight: &self.inflight,
                        kind: request.kind,
                    };
                    let outcome = self.fetch_remote(request).await;
                    sender.send_replace(Some(outcome.clone()));
                    return outcome;
                }
            }
        }
    }

    async fn fetch_remote(&self, request: &FetchRequest) -> SharedOutcome {
        match self
            .fetcher
            .fetch_up_to(request.kind, request.desired_count, &request.filters)
            .await
        {
            Ok(items) => {
                let items: Arc<[Item]> = items.into();
                self.cache.put(request.kind, Arc::clone(&items));
                Ok(items)
            }
            Err(error) => {
                if let FetchError::QuotaExceeded { reason } = &error {
                    tracing::error!(%reason, "YouTube API quota exhausted, further fetches will fail until restart");
                    *self
                        .quota_exhausted
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner) = Some(reason.clone());
                }
                Err(error)
            }
        }
    }
}

fn trimmed(items: &[Item], desired_count: usize) -> Vec<Item> {
    items.iter().take(desired_count).cloned().collect()
}
