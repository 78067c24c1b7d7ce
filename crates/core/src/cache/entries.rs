//! Per-feed cache entries and their persisted record format.
//!
//! An entry is stored as one row holding a versioned JSON [`CacheRecord`].
//! A row is written with a single UPSERT, so a reader sees either the whole
//! previous record or the whole new one. Rows that fail to decode, or carry a
//! version this build does not know, load as absent.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use crate::Error;

/// Version written into every persisted record.
pub const RECORD_VERSION: u32 = 1;

/// Cached state of one feed.
///
/// `raw_payload`, `rendered_document` and `last_refreshed_at` only change
/// together through [`FeedCacheEntry::record_refresh`], so a refreshed entry
/// always has a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedCacheEntry {
    name: String,
    raw_payload: Option<String>,
    rendered_document: Option<String>,
    last_refreshed_at: Option<DateTime<Utc>>,
}

impl FeedCacheEntry {
    /// Empty entry for a feed that has never been refreshed.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), raw_payload: None, rendered_document: None, last_refreshed_at: None }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw_payload(&self) -> Option<&str> {
        self.raw_payload.as_deref()
    }

    pub fn rendered_document(&self) -> Option<&str> {
        self.rendered_document.as_deref()
    }

    pub fn last_refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed_at
    }

    /// Time since the last successful refresh, never negative.
    ///
    /// `None` means the entry was never refreshed and is infinitely old.
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_refreshed_at
            .map(|at| if now > at { now - at } else { Duration::zero() })
    }

    /// Whether the entry may be served without attempting a refresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.age(now).is_some_and(|age| age <= window) && self.rendered_document.is_some()
    }

    /// Apply a successful refresh.
    pub fn record_refresh(&mut self, raw_payload: String, rendered_document: String, at: DateTime<Utc>) {
        self.raw_payload = Some(raw_payload);
        self.rendered_document = Some(rendered_document);
        self.last_refreshed_at = Some(at);
    }

    fn to_record(&self) -> CacheRecord {
        CacheRecord {
            version: RECORD_VERSION,
            raw_payload: self.raw_payload.clone(),
            rendered_document: self.rendered_document.clone(),
            last_refreshed_at: self.last_refreshed_at,
        }
    }

    fn from_record(name: String, record: CacheRecord) -> Option<Self> {
        if record.version != RECORD_VERSION {
            return None;
        }
        // A timestamp without a document breaks the entry invariant; drop it.
        if record.last_refreshed_at.is_some() && record.rendered_document.is_none() {
            return None;
        }
        Some(Self {
            name,
            raw_payload: record.raw_payload,
            rendered_document: record.rendered_document,
            last_refreshed_at: record.last_refreshed_at,
        })
    }
}

/// Serialized form of a [`FeedCacheEntry`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    pub version: u32,
    pub raw_payload: Option<String>,
    pub rendered_document: Option<String>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

impl CacheDb {
    /// Load the cached entry for `name`.
    ///
    /// Returns None if no row exists, or if the stored record cannot be
    /// decoded by this build.
    pub async fn load_entry(&self, name: &str) -> Result<Option<FeedCacheEntry>, Error> {
        let key = name.to_string();
        let stored = self
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result = conn.query_row("SELECT record FROM feed_cache WHERE name = ?1", params![key], |row| {
                    row.get::<_, String>(0)
                });

                match result {
                    Ok(record) => Ok(Some(record)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        let Some(json) = stored else {
            return Ok(None);
        };

        let entry = serde_json::from_str::<CacheRecord>(&json)
            .ok()
            .and_then(|record| FeedCacheEntry::from_record(name.to_string(), record));

        if entry.is_none() {
            tracing::warn!(feed = %name, "ignoring unreadable cache record");
        }

        Ok(entry)
    }

    /// Insert or replace the cached entry for `entry.name()`.
    pub async fn save_entry(&self, entry: &FeedCacheEntry) -> Result<(), Error> {
        let json = serde_json::to_string(&entry.to_record())?;
        let name = entry.name.clone();
        let last_refreshed_at = entry.last_refreshed_at.map(|at| at.to_rfc3339());
        let saved_at = Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO feed_cache (name, record, last_refreshed_at, saved_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(name) DO UPDATE SET
                        record = excluded.record,
                        last_refreshed_at = excluded.last_refreshed_at,
                        saved_at = excluded.saved_at",
                    params![name, json, last_refreshed_at, saved_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        tracing::debug!(feed = %entry.name, "cache entry saved");
        Ok(())
    }
}
