//! Refresh orchestration for one feed request.
//!
//! ### Decision per call
//! 1. Unknown name: `NotFound`.
//! 2. Persisted entry fresh: serve it. No lock, no network.
//! 3. Stale: try the single-flight lock without waiting.
//!    - Held elsewhere: serve the stale document.
//!    - Acquired: on a spawned task holding the lock, re-read the entry
//!      (the previous holder may have just refreshed it), then fetch, render
//!      and persist. Dropping the caller does not cancel that task.
//! 4. Fetch or render failure: the entry is left untouched and the stale
//!    document is served.
//!
//! A caller only ever sees `UpstreamUnavailable` when no document was ever
//! produced for the feed.

use std::sync::Arc;

use chrono::Duration;
use nrfeed_client::{FeedRenderer, FetchOutcome, RateLimitedFetcher};
use nrfeed_core::{CacheDb, Clock, Error, FeedCacheEntry, FeedLocks, FeedMetadata, FeedRegistry};

/// Produces the current document for a feed, refreshing it when stale.
pub struct FeedService {
    registry: Arc<FeedRegistry>,
    store: CacheDb,
    locks: FeedLocks,
    fetcher: RateLimitedFetcher,
    renderer: Arc<dyn FeedRenderer>,
    clock: Arc<dyn Clock>,
    freshness: Duration,
}

impl FeedService {
    pub fn new(
        registry: Arc<FeedRegistry>, store: CacheDb, locks: FeedLocks, fetcher: RateLimitedFetcher,
        renderer: Arc<dyn FeedRenderer>, clock: Arc<dyn Clock>, freshness: Duration,
    ) -> Self {
        Self { registry, store, locks, fetcher, renderer, clock, freshness }
    }

    pub fn registry(&self) -> &FeedRegistry {
        &self.registry
    }

    /// Current document for feed `name`.
    ///
    /// Once the lock is taken the refresh runs on its own task, so dropping
    /// the caller (a disconnected client) does not cut it short.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `name` is not in the registry.
    /// - `UpstreamUnavailable` if there is no cached document and none could
    ///   be produced now.
    pub async fn get_feed(self: &Arc<Self>, name: &str) -> Result<String, Error> {
        if self.registry.get(name).is_none() {
            return Err(Error::NotFound(format!("unknown feed: {name}")));
        }

        let entry = self.load(name).await;
        if entry.is_fresh(self.clock.now(), self.freshness) {
            tracing::debug!(feed = %name, "serving fresh feed");
            return serve(&entry);
        }

        let guard = match self.locks.try_acquire(name) {
            Ok(Some(guard)) => guard,
            Ok(None) => {
                tracing::debug!(feed = %name, "refresh in progress elsewhere, serving cached feed");
                return serve(&entry);
            }
            Err(e) => {
                tracing::error!(feed = %name, error = %e, "failed to take feed lock, serving cached feed");
                return serve(&entry);
            }
        };

        let service = Arc::clone(self);
        let task = tokio::spawn(async move {
            let result = service.refresh_locked(guard.key()).await;
            guard.release();
            result
        });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(feed = %name, error = %e, "refresh task failed, serving cached feed");
                serve(&entry)
            }
        }
    }

    /// Refresh `name` while holding its lock.
    async fn refresh_locked(&self, name: &str) -> Result<String, Error> {
        let meta = self
            .registry
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("unknown feed: {name}")))?;

        let entry = self.load(name).await;
        if entry.is_fresh(self.clock.now(), self.freshness) {
            tracing::debug!(feed = %name, "feed refreshed by previous lock holder");
            return serve(&entry);
        }

        self.refresh(meta, entry).await
    }

    async fn refresh(&self, meta: &FeedMetadata, mut entry: FeedCacheEntry) -> Result<String, Error> {
        let name = meta.name.as_str();
        let outcome = self.fetcher.fetch(&meta.url).await;

        let response = match outcome.as_ref() {
            FetchOutcome::Success(response) => response,
            FetchOutcome::Failure(failure) => {
                tracing::warn!(
                    feed = %name,
                    url = %meta.url,
                    status = ?failure.status,
                    reason = %failure.reason,
                    body = failure.body_excerpt.as_deref().unwrap_or(""),
                    "upstream fetch failed, serving cached feed"
                );
                return serve(&entry);
            }
        };

        let raw = response.text();
        let document = match self.renderer.render(&raw, name, meta) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(feed = %name, url = %meta.url, error = %e, "render failed, serving cached feed");
                return serve(&entry);
            }
        };

        entry.record_refresh(raw, document.clone(), self.clock.now());
        if let Err(e) = self.store.save_entry(&entry).await {
            tracing::error!(feed = %name, error = %e, "failed to persist refreshed feed");
        }

        tracing::info!(feed = %name, bytes = document.len(), "feed refreshed");
        Ok(document)
    }

    /// Persisted entry for `name`, or an empty one when there is none.
    async fn load(&self, name: &str) -> FeedCacheEntry {
        match self.store.load_entry(name).await {
            Ok(Some(entry)) => entry,
            Ok(None) => FeedCacheEntry::new(name),
            Err(e) => {
                tracing::error!(feed = %name, error = %e, "failed to read feed cache");
                FeedCacheEntry::new(name)
            }
        }
    }
}

fn serve(entry: &FeedCacheEntry) -> Result<String, Error> {
    entry
        .rendered_document()
        .map(str::to_string)
        .ok_or_else(|| Error::UpstreamUnavailable(format!("no cached document for {}", entry.name())))
}
