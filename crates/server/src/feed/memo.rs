//! Short-lived in-process memo in front of the refresh orchestrator.
//!
//! Absorbs request bursts for the same feed: within the window every caller
//! gets the document produced by one orchestrator call, and callers arriving
//! while that call is running wait for it instead of starting their own.
//! Errors are returned to everyone waiting on that call but not kept.

use std::sync::Arc;

use chrono::Duration;
use nrfeed_core::{Clock, Error, TtlMemo};

use super::FeedService;

pub struct FeedMemo {
    service: Arc<FeedService>,
    memo: TtlMemo<String, String>,
}

impl FeedMemo {
    pub fn new(service: Arc<FeedService>, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { service, memo: TtlMemo::new(window, clock) }
    }

    pub fn service(&self) -> &FeedService {
        &self.service
    }

    /// Document for feed `name`, reusing one produced within the window.
    pub async fn get_feed(&self, name: &str) -> Result<String, Error> {
        self.memo
            .get_or_try_insert_with(name.to_string(), || self.service.get_feed(name))
            .await
    }
}
