// SPDX-License-Identifier: Apache-2.0

//! Directory-backed document store: one pretty-printed JSON file per
//! document, named `<id>.json`. Useful for offline snapshots and tests.

use crate::filtering::{apply_projection, doc_matches, run_pipeline};
use qcdeck_core::ports::{DocumentStorePort, StoreError, StoreErrorCode};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct LocalDocStore {
    root: PathBuf,
}

impl LocalDocStore {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(io_error)?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        if id.is_empty() || id.contains(['/', '\\', '.']) {
            return Err(StoreError::new(
                StoreErrorCode::Validation,
                format!("`{id}` is not a valid document id"),
            ));
        }
        Ok(self.root.join(format!("{id}.json")))
    }

    fn load_all(&self) -> Result<Vec<Value>, StoreError> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.root)
            .map_err(io_error)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().map_or(false, |ext| ext == "json"))
            .collect();
        paths.sort();
        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = fs::read(&path).map_err(io_error)?;
            let document: Value = serde_json::from_slice(&bytes).map_err(|err| {
                StoreError::new(
                    StoreErrorCode::Io,
                    format!("unreadable document at {}: {err}", path.display()),
                )
            })?;
            documents.push(document);
        }
        Ok(documents)
    }

    fn write_document(&self, id: &str, document: &Value) -> Result<(), StoreError> {
        let path = self.document_path(id)?;
        let bytes = serde_json::to_vec_pretty(document).map_err(|err| {
            StoreError::new(StoreErrorCode::Internal, format!("serialize failed: {err}"))
        })?;
        fs::write(path, bytes).map_err(io_error)
    }
}

fn io_error(err: io::Error) -> StoreError {
    StoreError::new(StoreErrorCode::Io, err.to_string())
}

impl DocumentStorePort for LocalDocStore {
    fn fetch(
        &self,
        filter: &Value,
        projection: Option<&Value>,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError> {
        let mut hits = Vec::new();
        for document in self.load_all()? {
            if doc_matches(&document, filter)? {
                hits.push(apply_projection(&document, projection));
                if limit > 0 && hits.len() == limit {
                    break;
                }
            }
        }
        Ok(hits)
    }

    fn aggregate(&self, pipeline: &[Value]) -> Result<Vec<Value>, StoreError> {
        run_pipeline(self.load_all()?, pipeline)
    }

    fn upsert(&self, id: &str, document: &Value) -> Result<(), StoreError> {
        let fields = document.as_object().ok_or_else(|| {
            StoreError::new(StoreErrorCode::Validation, "upsert document must be an object")
        })?;
        let path = self.document_path(id)?;
        let mut merged = if path.exists() {
            let bytes = fs::read(&path).map_err(io_error)?;
            serde_json::from_slice::<Value>(&bytes)
                .ok()
                .and_then(|v| v.as_object().cloned())
                .unwrap_or_default()
        } else {
            Map::new()
        };
        for (key, value) in fields {
            merged.insert(key.clone(), value.clone());
        }
        merged.insert("_id".to_string(), Value::String(id.to_string()));
        self.write_document(id, &Value::Object(merged))
    }
}
