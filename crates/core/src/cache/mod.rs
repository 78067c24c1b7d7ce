//! SQLite-backed persisted feed cache.
//!
//! One row per feed name holds the last rendered document, its raw source
//! payload and the refresh timestamp, so a restarted worker computes the
//! same entry age as the process that wrote it. It provides:
//!
//! - Versioned JSON records; unreadable rows behave as a cache miss
//! - Automatic schema migrations
//! - WAL mode and a busy timeout for several worker processes on one host

pub mod connection;
pub mod entries;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{CacheRecord, FeedCacheEntry, RECORD_VERSION};
