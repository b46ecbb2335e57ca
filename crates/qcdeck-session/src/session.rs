// SPDX-License-Identifier: Apache-2.0

use qcdeck_core::ports::{DocumentStorePort, StoreError};
use qcdeck_model::{MetricValue, MetricValueKind, QcDocument, StatusValue};
use serde_json::{json, Value};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NoDocument,
    Clean,
    Dirty,
}

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SessionError {
    NoDocument,
    MissingQc { id: String },
    Validation(String),
    IndexOutOfRange { evaluation: usize, metric: Option<usize> },
    TypeMismatch { expected: MetricValueKind, got: MetricValueKind },
    Store(StoreError),
    Commit(StoreError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDocument => write!(f, "no QC document is loaded"),
            Self::MissingQc { id } => write!(f, "document `{id}` has no quality_control field"),
            Self::Validation(message) => write!(f, "QC document failed validation: {message}"),
            Self::IndexOutOfRange { evaluation, metric: Some(metric) } => {
                write!(f, "no metric {metric} in evaluation {evaluation}")
            }
            Self::IndexOutOfRange { evaluation, metric: None } => {
                write!(f, "no evaluation {evaluation}")
            }
            Self::TypeMismatch { expected, got } => {
                write!(f, "metric value must stay {expected}, got {got}")
            }
            Self::Store(err) => write!(f, "store error: {err}"),
            Self::Commit(err) => write!(f, "commit failed: {err}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(err) | Self::Commit(err) => Some(err),
            _ => None,
        }
    }
}

impl SessionError {
    /// Stable machine shape for the presentation layer.
    #[must_use]
    pub fn to_machine_error(&self) -> qcdeck_core::errors::MachineError {
        use qcdeck_core::errors::MachineError;
        match self {
            Self::NoDocument => MachineError::new("no_document", &self.to_string()),
            Self::MissingQc { id } => {
                MachineError::new("missing_qc", &self.to_string()).with_detail("asset_id", id)
            }
            Self::Validation(_) => MachineError::new("validation_failed", &self.to_string()),
            Self::IndexOutOfRange { .. } => MachineError::new("index_out_of_range", &self.to_string()),
            Self::TypeMismatch { expected, got } => {
                MachineError::new("type_mismatch", &self.to_string())
                    .with_detail("expected", expected.as_str())
                    .with_detail("got", got.as_str())
            }
            Self::Store(err) => {
                MachineError::new("store_error", &self.to_string())
                    .with_detail("store_code", err.code.as_str())
            }
            Self::Commit(err) => {
                MachineError::new("commit_failed", &self.to_string())
                    .with_detail("store_code", err.code.as_str())
            }
        }
    }
}

/// One applied mutation, recorded for the dirty signal and for the editor's
/// change summary.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SessionEvent {
    pub path: String,
    pub summary: String,
}

#[derive(Debug, Clone)]
pub enum CommitOutcome {
    Committed,
    /// Session was clean; the store was not contacted.
    NothingToCommit,
}

#[derive(Debug, Clone)]
struct LoadedQc {
    id: String,
    asset_name: String,
    document: QcDocument,
}

/// Edit session over one asset's QC document.
///
/// State machine: `NoDocument` -> (`load` ok) -> `Clean`; any applied
/// setter -> `Dirty` (idempotent); successful `commit` -> `Clean`. A
/// rejected mutation (type mismatch, bad index) leaves the state untouched.
#[derive(Debug, Default)]
pub struct QcEditSession {
    loaded: Option<LoadedQc>,
    events: Vec<SessionEvent>,
}

impl QcEditSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        match (&self.loaded, self.events.is_empty()) {
            (None, _) => SessionPhase::NoDocument,
            (Some(_), true) => SessionPhase::Clean,
            (Some(_), false) => SessionPhase::Dirty,
        }
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.phase() == SessionPhase::Dirty
    }

    #[must_use]
    pub fn document(&self) -> Option<&QcDocument> {
        self.loaded.as_ref().map(|l| &l.document)
    }

    #[must_use]
    pub fn asset_name(&self) -> Option<&str> {
        self.loaded.as_ref().map(|l| l.asset_name.as_str())
    }

    /// Change events since the last successful commit, in application order.
    #[must_use]
    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    /// Fetch and validate the QC document for `id`. Any failure leaves the
    /// session in the `NoDocument` state, never partially populated.
    pub fn load(&mut self, store: &dyn DocumentStorePort, id: &str) -> Result<(), SessionError> {
        self.loaded = None;
        self.events.clear();

        let documents = store
            .fetch(&json!({"_id": id}), None, 1)
            .map_err(SessionError::Store)?;
        let document = documents.first().ok_or_else(|| {
            SessionError::Store(StoreError::new(
                qcdeck_core::ports::StoreErrorCode::NotFound,
                format!("no document with id `{id}`"),
            ))
        })?;

        let asset_name = document
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let qc = document
            .get("quality_control")
            .ok_or_else(|| SessionError::MissingQc { id: id.to_string() })?;
        let parsed: QcDocument = serde_json::from_value(qc.clone())
            .map_err(|e| SessionError::Validation(e.to_string()))?;

        self.loaded = Some(LoadedQc {
            id: id.to_string(),
            asset_name,
            document: parsed,
        });
        Ok(())
    }

    /// Persist the whole document as a single atomic write. A no-op while
    /// clean: the store is not contacted. On failure the session stays
    /// dirty; retrying is the caller's decision.
    pub fn commit(&mut self, store: &dyn DocumentStorePort) -> Result<CommitOutcome, SessionError> {
        let loaded = self.loaded.as_ref().ok_or(SessionError::NoDocument)?;
        if self.events.is_empty() {
            return Ok(CommitOutcome::NothingToCommit);
        }
        let qc = serde_json::to_value(&loaded.document)
            .map_err(|e| SessionError::Validation(e.to_string()))?;
        store
            .upsert(&loaded.id, &json!({"quality_control": qc}))
            .map_err(SessionError::Commit)?;
        self.events.clear();
        Ok(CommitOutcome::Committed)
    }

    pub fn set_overall_status(&mut self, status: StatusValue) -> Result<(), SessionError> {
        let loaded = self.loaded.as_mut().ok_or(SessionError::NoDocument)?;
        loaded.document.overall_status.status = status;
        self.events.push(SessionEvent {
            path: "overall_status.status".to_string(),
            summary: format!("overall status set to {status}"),
        });
        Ok(())
    }

    pub fn set_document_notes(&mut self, notes: Option<String>) -> Result<(), SessionError> {
        let loaded = self.loaded.as_mut().ok_or(SessionError::NoDocument)?;
        loaded.document.notes = notes;
        self.events.push(SessionEvent {
            path: "notes".to_string(),
            summary: "document notes edited".to_string(),
        });
        Ok(())
    }

    pub fn set_evaluation_notes(
        &mut self,
        evaluation: usize,
        notes: Option<String>,
    ) -> Result<(), SessionError> {
        let loaded = self.loaded.as_mut().ok_or(SessionError::NoDocument)?;
        let eval = loaded.document.evaluations.get_mut(evaluation).ok_or(
            SessionError::IndexOutOfRange {
                evaluation,
                metric: None,
            },
        )?;
        eval.notes = notes;
        self.events.push(SessionEvent {
            path: format!("evaluations[{evaluation}].notes"),
            summary: format!("notes edited on evaluation `{}`", eval.name),
        });
        Ok(())
    }

    pub fn set_metric_status(
        &mut self,
        evaluation: usize,
        metric: usize,
        status: StatusValue,
    ) -> Result<(), SessionError> {
        let loaded = self.loaded.as_mut().ok_or(SessionError::NoDocument)?;
        let target = metric_mut(&mut loaded.document, evaluation, metric)?;
        match &mut target.status {
            Some(record) => record.status = status,
            None => {
                return Err(SessionError::Validation(format!(
                    "metric `{}` carries no status record",
                    target.name
                )))
            }
        }
        self.events.push(SessionEvent {
            path: format!("evaluations[{evaluation}].metrics[{metric}].status"),
            summary: format!("metric status set to {status}"),
        });
        Ok(())
    }

    /// Replace a metric's value. The new value must keep the metric's
    /// declared variant; a mismatch mutates nothing and leaves the dirty
    /// flag untouched.
    pub fn set_metric_value(
        &mut self,
        evaluation: usize,
        metric: usize,
        value: MetricValue,
    ) -> Result<(), SessionError> {
        let loaded = self.loaded.as_mut().ok_or(SessionError::NoDocument)?;
        let target = metric_mut(&mut loaded.document, evaluation, metric)?;
        if target.value.kind() != value.kind() {
            return Err(SessionError::TypeMismatch {
                expected: target.value.kind(),
                got: value.kind(),
            });
        }
        target.value = value;
        self.events.push(SessionEvent {
            path: format!("evaluations[{evaluation}].metrics[{metric}].value"),
            summary: format!("metric `{}` value edited", target.name),
        });
        Ok(())
    }
}

fn metric_mut(
    document: &mut QcDocument,
    evaluation: usize,
    metric: usize,
) -> Result<&mut qcdeck_model::Metric, SessionError> {
    let eval = document
        .evaluations
        .get_mut(evaluation)
        .ok_or(SessionError::IndexOutOfRange {
            evaluation,
            metric: None,
        })?;
    eval.metrics
        .get_mut(metric)
        .ok_or(SessionError::IndexOutOfRange {
            evaluation,
            metric: Some(metric),
        })
}
