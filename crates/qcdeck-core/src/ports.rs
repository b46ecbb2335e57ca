// SPDX-License-Identifier: Apache-2.0

//! Ports consumed by the higher layers.
//!
//! The document store is treated as an opaque key/filter store: exact-match
//! filters, `$in`-style membership, and a small `$match`/`$project`
//! aggregation capability. Adapters live in `qcdeck-store`.

use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreErrorCode {
    NotFound,
    Validation,
    Network,
    Io,
    Internal,
}

impl StoreErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Validation => "validation_error",
            Self::Network => "network_error",
            Self::Io => "io_error",
            Self::Internal => "internal_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
}

impl StoreError {
    #[must_use]
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for StoreError {}

/// Backing document store.
///
/// `fetch` with `limit == 0` returns every matching document. `upsert`
/// merges the supplied top-level fields into the stored document (a field
/// named in `document` is replaced wholesale; others are untouched).
pub trait DocumentStorePort {
    fn fetch(
        &self,
        filter: &Value,
        projection: Option<&Value>,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError>;

    fn aggregate(&self, pipeline: &[Value]) -> Result<Vec<Value>, StoreError>;

    fn upsert(&self, id: &str, document: &Value) -> Result<(), StoreError>;
}

/// Injected clock. TTL caching is the only consumer; deterministic core
/// paths never touch it.
pub trait ClockPort {
    fn now_millis(&self) -> u64;
}
