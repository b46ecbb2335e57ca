// SPDX-License-Identifier: Apache-2.0

//! TTL read-through cache in front of a document store.
//!
//! Fetch and aggregate results are keyed by a canonical hash of the
//! request shape, so semantically identical requests share an entry
//! regardless of JSON key order. Writes pass through and drop the whole
//! cache: an upsert can change any cached result set.

use qcdeck_core::canonical::stable_json_hash_hex;
use qcdeck_core::ports::{ClockPort, DocumentStorePort, StoreError, StoreErrorCode};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

pub const TTL_ONE_MINUTE_MS: u64 = 60_000;
pub const TTL_ONE_HOUR_MS: u64 = 3_600_000;
pub const TTL_TWENTY_FOUR_HOURS_MS: u64 = 86_400_000;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
struct CacheEntry {
    stored_at_ms: u64,
    rows: Vec<Value>,
}

/// Read-through cache. Generic over the clock so tests can advance time
/// by hand.
pub struct QueryCache<S, C> {
    inner: S,
    clock: C,
    ttl_ms: u64,
    capacity: usize,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl<S: DocumentStorePort, C: ClockPort> QueryCache<S, C> {
    pub fn new(inner: S, clock: C, ttl_ms: u64) -> Self {
        Self {
            inner,
            clock,
            ttl_ms,
            capacity: DEFAULT_CAPACITY,
            entries: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &str, now_ms: u64) -> Option<Vec<Value>> {
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(key)?;
        if now_ms.saturating_sub(entry.stored_at_ms) < self.ttl_ms {
            Some(entry.rows.clone())
        } else {
            None
        }
    }

    fn store(&self, key: String, rows: Vec<Value>, now_ms: u64) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            // Evict the oldest entry to stay within capacity.
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.stored_at_ms)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key,
            CacheEntry {
                stored_at_ms: now_ms,
                rows,
            },
        );
    }

    fn request_key(request: &Value) -> Result<String, StoreError> {
        stable_json_hash_hex(request).map_err(|err| {
            StoreError::new(
                StoreErrorCode::Internal,
                format!("cache key derivation failed: {err}"),
            )
        })
    }
}

impl<S: DocumentStorePort, C: ClockPort> DocumentStorePort for QueryCache<S, C> {
    fn fetch(
        &self,
        filter: &Value,
        projection: Option<&Value>,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError> {
        let request = json!({
            "op": "fetch",
            "filter": filter,
            "projection": projection,
            "limit": limit,
        });
        let key = Self::request_key(&request)?;
        let now_ms = self.clock.now_millis();
        if let Some(rows) = self.lookup(&key, now_ms) {
            return Ok(rows);
        }
        let rows = self.inner.fetch(filter, projection, limit)?;
        self.store(key, rows.clone(), now_ms);
        Ok(rows)
    }

    fn aggregate(&self, pipeline: &[Value]) -> Result<Vec<Value>, StoreError> {
        let request = json!({"op": "aggregate", "pipeline": pipeline});
        let key = Self::request_key(&request)?;
        let now_ms = self.clock.now_millis();
        if let Some(rows) = self.lookup(&key, now_ms) {
            return Ok(rows);
        }
        let rows = self.inner.aggregate(pipeline)?;
        self.store(key, rows.clone(), now_ms);
        Ok(rows)
    }

    fn upsert(&self, id: &str, document: &Value) -> Result<(), StoreError> {
        self.inner.upsert(id, document)?;
        self.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct ManualClock(Arc<AtomicU64>);

    impl ManualClock {
        fn advance(&self, ms: u64) {
            self.0.fetch_add(ms, Ordering::Relaxed);
        }
    }

    impl ClockPort for ManualClock {
        fn now_millis(&self) -> u64 {
            self.0.load(Ordering::Relaxed)
        }
    }

    fn seeded_cache(ttl_ms: u64) -> (QueryCache<MemoryDocStore, ManualClock>, ManualClock) {
        let store = MemoryDocStore::new();
        store.seed([json!({"_id": "a", "modality": "ecephys"})]);
        let clock = ManualClock::default();
        (QueryCache::new(store, clock.clone(), ttl_ms), clock)
    }

    #[test]
    fn repeated_fetch_hits_the_store_once() {
        let (cache, _clock) = seeded_cache(TTL_ONE_MINUTE_MS);
        let filter = json!({"modality": "ecephys"});
        let first = cache.fetch(&filter, None, 0).expect("fetch");
        let second = cache.fetch(&filter, None, 0).expect("fetch");
        assert_eq!(first, second);
        assert_eq!(cache.inner().fetch_calls(), 1);
    }

    #[test]
    fn key_ignores_json_key_order() {
        let (cache, _clock) = seeded_cache(TTL_ONE_MINUTE_MS);
        let a = json!({"modality": "ecephys", "subject.subject_id": {"$exists": true}});
        let b = json!({"subject.subject_id": {"$exists": true}, "modality": "ecephys"});
        cache.fetch(&a, None, 0).expect("fetch");
        cache.fetch(&b, None, 0).expect("fetch");
        assert_eq!(cache.inner().fetch_calls(), 1);
    }

    #[test]
    fn expired_entry_refetches() {
        let (cache, clock) = seeded_cache(TTL_ONE_MINUTE_MS);
        let filter = json!({"modality": "ecephys"});
        cache.fetch(&filter, None, 0).expect("fetch");
        clock.advance(TTL_ONE_MINUTE_MS);
        cache.fetch(&filter, None, 0).expect("fetch");
        assert_eq!(cache.inner().fetch_calls(), 2);
    }

    #[test]
    fn upsert_drops_cached_results() {
        let (cache, _clock) = seeded_cache(TTL_ONE_HOUR_MS);
        let filter = json!({"modality": "ecephys"});
        assert_eq!(cache.fetch(&filter, None, 0).expect("fetch").len(), 1);
        cache
            .upsert("b", &json!({"modality": "ecephys"}))
            .expect("upsert");
        assert_eq!(cache.fetch(&filter, None, 0).expect("fetch").len(), 2);
        assert_eq!(cache.inner().fetch_calls(), 2);
    }

    #[test]
    fn capacity_evicts_oldest_entry() {
        let (cache, clock) = seeded_cache(TTL_TWENTY_FOUR_HOURS_MS);
        let cache = cache.with_capacity(2);
        cache.fetch(&json!({"k": 1}), None, 0).expect("fetch");
        clock.advance(1);
        cache.fetch(&json!({"k": 2}), None, 0).expect("fetch");
        clock.advance(1);
        cache.fetch(&json!({"k": 3}), None, 0).expect("fetch");
        assert_eq!(cache.len(), 2);
        // The first request was evicted and must hit the store again.
        cache.fetch(&json!({"k": 1}), None, 0).expect("fetch");
        assert_eq!(cache.inner().fetch_calls(), 4);
    }
}
