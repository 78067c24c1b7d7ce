//! Client code for nrfeed.
//!
//! This crate provides the upstream fetch pipeline, program page extraction,
//! and feed rendering used by the server.

pub mod extract;
pub mod fetch;
pub mod render;

pub use extract::{Channel, Episode, extract_channel};
pub use fetch::{FetchConfig, FetchFailure, FetchOutcome, FetchResponse, HttpTransport, RateLimitedFetcher, Transport};
pub use render::{FeedRenderer, PodcastRenderer};
