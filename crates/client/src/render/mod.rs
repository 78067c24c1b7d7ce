//! Feed document rendering.
//!
//! A [`FeedRenderer`] turns a fetched upstream page into the document served
//! to podcast clients. [`PodcastRenderer`] extracts a [`Channel`] from a
//! program page and writes it as RSS.

pub mod rss;

use nrfeed_core::{Error, FeedMetadata};

use crate::extract::{Channel, extract_channel};

/// Turns raw upstream content into a feed document.
pub trait FeedRenderer: Send + Sync {
    /// Render `raw` for feed `feed_id`.
    ///
    /// # Errors
    ///
    /// Returns `Error::RenderFailed` when the page cannot be turned into a
    /// document.
    fn render(&self, raw: &str, feed_id: &str, meta: &FeedMetadata) -> Result<String, Error>;
}

/// Renders program pages as RSS 2.0 podcast feeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct PodcastRenderer;

impl PodcastRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Extract the channel without writing the document.
    pub fn channel(&self, raw: &str, feed_id: &str, meta: &FeedMetadata) -> Result<Channel, Error> {
        extract_channel(raw, feed_id, meta)
    }
}

impl FeedRenderer for PodcastRenderer {
    fn render(&self, raw: &str, feed_id: &str, meta: &FeedMetadata) -> Result<String, Error> {
        let channel = self.channel(raw, feed_id, meta)?;
        tracing::debug!(feed = %feed_id, episodes = channel.episodes.len(), "rendered podcast feed");
        Ok(rss::write_rss(&channel))
    }
}
