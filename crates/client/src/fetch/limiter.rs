//! Per-URL rate limiting for upstream fetches.
//!
//! At most one request per URL goes out per window. Within the window every
//! caller gets the same outcome, failures included, so a broken page or a
//! bug upstream of us cannot turn into a request storm against the origin.

use std::sync::Arc;

use chrono::Duration;
use nrfeed_core::{Clock, TtlMemo};
use url::Url;

use super::{FetchOutcome, Transport};

/// Transport wrapper that reuses the last outcome per URL for a window.
pub struct RateLimitedFetcher {
    transport: Arc<dyn Transport>,
    memo: TtlMemo<String, Arc<FetchOutcome>>,
}

impl RateLimitedFetcher {
    pub fn new(transport: Arc<dyn Transport>, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { transport, memo: TtlMemo::new(window, clock) }
    }

    /// Fetch `url`, or return the outcome obtained for it within the window.
    pub async fn fetch(&self, url: &Url) -> Arc<FetchOutcome> {
        self.memo
            .get_or_insert_with(url.as_str().to_string(), || async {
                tracing::debug!(%url, "requesting upstream page");
                Arc::new(self.transport.get(url).await)
            })
            .await
    }

    pub fn window(&self) -> Duration {
        self.memo.ttl()
    }
}
