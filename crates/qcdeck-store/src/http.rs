// SPDX-License-Identifier: Apache-2.0

//! HTTP document-store client. Speaks a small JSON-over-POST protocol:
//! `POST {base}/v1/fetch`, `/v1/aggregate`, and `/v1/upsert`. This is the
//! only module in the workspace that talks to the network, and the only
//! one that emits tracing events.

use qcdeck_core::ports::{DocumentStorePort, StoreError, StoreErrorCode};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpDocStore {
    base_url: String,
    client: Client,
}

impl HttpDocStore {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post(&self, endpoint: &str, body: &Value) -> Result<Vec<Value>, StoreError> {
        let url = format!("{}/v1/{endpoint}", self.base_url);
        let response = self.client.post(&url).json(body).send().map_err(|err| {
            warn!(endpoint, error = %err, "document store request failed");
            StoreError::new(StoreErrorCode::Network, err.to_string())
        })?;
        let status = response.status();
        if !status.is_success() {
            warn!(endpoint, status = status.as_u16(), "document store error response");
            let code = match status {
                StatusCode::NOT_FOUND => StoreErrorCode::NotFound,
                s if s.is_client_error() => StoreErrorCode::Validation,
                _ => StoreErrorCode::Network,
            };
            let message = response
                .text()
                .unwrap_or_else(|_| status.to_string());
            return Err(StoreError::new(code, message));
        }
        let rows: Vec<Value> = response.json().map_err(|err| {
            StoreError::new(
                StoreErrorCode::Network,
                format!("malformed response body: {err}"),
            )
        })?;
        info!(endpoint, rows = rows.len(), "document store request ok");
        Ok(rows)
    }
}

impl DocumentStorePort for HttpDocStore {
    fn fetch(
        &self,
        filter: &Value,
        projection: Option<&Value>,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError> {
        self.post(
            "fetch",
            &json!({
                "filter": filter,
                "projection": projection,
                "limit": limit,
            }),
        )
    }

    fn aggregate(&self, pipeline: &[Value]) -> Result<Vec<Value>, StoreError> {
        self.post("aggregate", &json!({"pipeline": pipeline}))
    }

    fn upsert(&self, id: &str, document: &Value) -> Result<(), StoreError> {
        self.post("upsert", &json!({"_id": id, "document": document}))
            .map(|_| ())
    }
}
