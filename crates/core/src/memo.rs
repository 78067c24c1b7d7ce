//! Keyed time-to-live memo.
//!
//! Each key owns a slot with a fixed expiration instant. Expired slots are
//! removed on every access, before the caller's key is looked up, so an
//! expired value is never returned and never partially reused. Callers that
//! arrive while the first computation for a slot is still running wait for
//! it and share its result.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::OnceCell;

use crate::clock::Clock;

struct Slot<V> {
    expires_at: DateTime<Utc>,
    value: OnceCell<V>,
}

/// Keyed memo whose entries live for a fixed window.
pub struct TtlMemo<K, V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slots: Mutex<HashMap<K, Arc<Slot<V>>>>,
}

impl<K, V> TtlMemo<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { ttl, clock, slots: Mutex::new(HashMap::new()) }
    }

    /// Window each entry lives for.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the memoized value for `key`, computing it with `init` when the
    /// key has no live entry.
    pub async fn get_or_insert_with<F, Fut>(&self, key: K, init: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let slot = self.slot(key);
        slot.value.get_or_init(init).await.clone()
    }

    /// Like [`get_or_insert_with`](Self::get_or_insert_with), but an `Err`
    /// from `init` is returned without being memoized.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = self.slot(key);
        slot.value.get_or_try_init(init).await.cloned()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.retain(|_, slot| slot.expires_at > now);
        slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: K) -> Arc<Slot<V>> {
        let now = self.clock.now();
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.retain(|_, slot| slot.expires_at > now);
        slots
            .entry(key)
            .or_insert_with(|| Arc::new(Slot { expires_at: now + self.ttl, value: OnceCell::new() }))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn memo(ttl_secs: i64) -> (Arc<ManualClock>, TtlMemo<String, usize>) {
        let clock = Arc::new(ManualClock::default());
        let memo = TtlMemo::new(Duration::seconds(ttl_secs), clock.clone());
        (clock, memo)
    }

    #[tokio::test]
    async fn test_memo_reuses_value_within_window() {
        let (clock, memo) = memo(10);
        let calls = AtomicUsize::new(0);

        let first = memo
            .get_or_insert_with("a".into(), || async { calls.fetch_add(1, Ordering::SeqCst) + 1 })
            .await;
        clock.advance(Duration::seconds(9));
        let second = memo
            .get_or_insert_with("a".into(), || async { calls.fetch_add(1, Ordering::SeqCst) + 1 })
            .await;

        assert_eq!(first, 1);
        assert_eq!(second, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_memo_clears_at_expiry() {
        let (clock, memo) = memo(10);
        memo.get_or_insert_with("a".into(), || async { 1 }).await;

        clock.advance(Duration::seconds(10));
        assert!(memo.is_empty());

        let value = memo.get_or_insert_with("a".into(), || async { 2 }).await;
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_memo_keys_are_independent() {
        let (_clock, memo) = memo(10);
        let a = memo.get_or_insert_with("a".into(), || async { 1 }).await;
        let b = memo.get_or_insert_with("b".into(), || async { 2 }).await;
        assert_eq!((a, b), (1, 2));
        assert_eq!(memo.len(), 2);
    }

    #[tokio::test]
    async fn test_memo_evicts_other_expired_keys() {
        let (clock, memo) = memo(10);
        memo.get_or_insert_with("a".into(), || async { 1 }).await;
        clock.advance(Duration::seconds(11));
        memo.get_or_insert_with("b".into(), || async { 2 }).await;
        assert_eq!(memo.len(), 1);
    }

    #[tokio::test]
    async fn test_memo_does_not_keep_errors() {
        let (_clock, memo) = memo(10);
        let failed: Result<usize, &str> = memo.get_or_try_insert_with("a".into(), || async { Err("boom") }).await;
        assert!(failed.is_err());

        let ok: Result<usize, &str> = memo.get_or_try_insert_with("a".into(), || async { Ok(7) }).await;
        assert_eq!(ok, Ok(7));

        let cached: Result<usize, &str> = memo.get_or_try_insert_with("a".into(), || async { Ok(8) }).await;
        assert_eq!(cached, Ok(7));
    }

    #[tokio::test]
    async fn test_memo_shares_in_flight_call() {
        let (_clock, memo) = memo(10);
        let memo = Arc::new(memo);
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(tokio::sync::Notify::new());

        let first = {
            let (memo, calls, gate) = (memo.clone(), calls.clone(), gate.clone());
            tokio::spawn(async move {
                memo.get_or_insert_with("a".into(), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    gate.notified().await;
                    1
                })
                .await
            })
        };

        while calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let second = {
            let (memo, calls) = (memo.clone(), calls.clone());
            tokio::spawn(async move {
                memo.get_or_insert_with("a".into(), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    2
                })
                .await
            })
        };

        tokio::task::yield_now().await;
        gate.notify_one();

        assert_eq!(first.await.unwrap(), 1);
        assert_eq!(second.await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
