// SPDX-License-Identifier: Apache-2.0

use crate::filtering::{apply_projection, doc_matches, run_pipeline};
use qcdeck_core::ports::{DocumentStorePort, StoreError, StoreErrorCode};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// In-memory document store.
///
/// Doubles as the test fake: every port call bumps a counter, and writes
/// can be forced to fail to exercise commit-failure paths.
#[derive(Debug, Default)]
pub struct MemoryDocStore {
    documents: Mutex<BTreeMap<String, Value>>,
    fetch_calls: AtomicU64,
    aggregate_calls: AtomicU64,
    upsert_calls: AtomicU64,
    fail_upserts: AtomicBool,
}

impl MemoryDocStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, documents: impl IntoIterator<Item = Value>) {
        if let Ok(mut store) = self.documents.lock() {
            for document in documents {
                let id = document
                    .get("_id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                store.insert(id, document);
            }
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Value> {
        self.documents
            .lock()
            .ok()
            .and_then(|store| store.get(id).cloned())
    }

    #[must_use]
    pub fn fetch_calls(&self) -> u64 {
        self.fetch_calls.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn aggregate_calls(&self) -> u64 {
        self.aggregate_calls.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn upsert_calls(&self) -> u64 {
        self.upsert_calls.load(Ordering::Relaxed)
    }

    pub fn set_fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::Relaxed);
    }
}

impl DocumentStorePort for MemoryDocStore {
    fn fetch(
        &self,
        filter: &Value,
        projection: Option<&Value>,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        let store = self.documents.lock().map_err(poisoned)?;
        let mut hits = Vec::new();
        for document in store.values() {
            if doc_matches(document, filter)? {
                hits.push(apply_projection(document, projection));
                if limit > 0 && hits.len() == limit {
                    break;
                }
            }
        }
        Ok(hits)
    }

    fn aggregate(&self, pipeline: &[Value]) -> Result<Vec<Value>, StoreError> {
        self.aggregate_calls.fetch_add(1, Ordering::Relaxed);
        let documents: Vec<Value> = self
            .documents
            .lock()
            .map_err(poisoned)?
            .values()
            .cloned()
            .collect();
        run_pipeline(documents, pipeline)
    }

    fn upsert(&self, id: &str, document: &Value) -> Result<(), StoreError> {
        self.upsert_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_upserts.load(Ordering::Relaxed) {
            return Err(StoreError::new(
                StoreErrorCode::Network,
                "store unreachable (forced failure)",
            ));
        }
        let fields = document.as_object().ok_or_else(|| {
            StoreError::new(StoreErrorCode::Validation, "upsert document must be an object")
        })?;
        let mut store = self.documents.lock().map_err(poisoned)?;
        let entry = store
            .entry(id.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        let Some(target) = entry.as_object_mut() else {
            return Err(StoreError::new(
                StoreErrorCode::Internal,
                format!("stored document `{id}` is not an object"),
            ));
        };
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
        target.insert("_id".to_string(), Value::String(id.to_string()));
        Ok(())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::new(StoreErrorCode::Internal, "store lock poisoned")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fetch_respects_filter_projection_and_limit() {
        let store = MemoryDocStore::new();
        store.seed([
            json!({"_id": "a", "name": "x", "modality": "ecephys"}),
            json!({"_id": "b", "name": "y", "modality": "ecephys"}),
            json!({"_id": "c", "name": "z", "modality": "behavior"}),
        ]);
        let hits = store
            .fetch(&json!({"modality": "ecephys"}), Some(&json!({"name": 1})), 1)
            .expect("fetch");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0], json!({"_id": "a", "name": "x"}));
        assert_eq!(store.fetch_calls(), 1);
    }

    #[test]
    fn upsert_merges_top_level_fields() {
        let store = MemoryDocStore::new();
        store.seed([json!({"_id": "a", "name": "x", "other": 1})]);
        store
            .upsert("a", &json!({"quality_control": {"overall_status": "Pass"}}))
            .expect("upsert");
        let merged = store.get("a").expect("document");
        assert_eq!(merged.get("other"), Some(&json!(1)));
        assert_eq!(
            merged.get("quality_control"),
            Some(&json!({"overall_status": "Pass"}))
        );
    }

    #[test]
    fn forced_upsert_failure_reports_network_error() {
        let store = MemoryDocStore::new();
        store.set_fail_upserts(true);
        let err = store.upsert("a", &json!({"x": 1})).expect_err("forced failure");
        assert_eq!(err.code, StoreErrorCode::Network);
        assert_eq!(store.upsert_calls(), 1);
    }
}
