//! Core types and shared functionality for nrfeed.
//!
//! This crate provides:
//! - Persisted feed cache with SQLite backend
//! - Host-local single-flight lock
//! - TTL memo and injectable clock
//! - Feed registry
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod lock;
pub mod memo;
pub mod registry;

pub use cache::{CacheDb, FeedCacheEntry};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::Error;
pub use lock::{FeedLockGuard, FeedLocks};
pub use memo::TtlMemo;
pub use registry::{FeedMetadata, FeedRegistry};
