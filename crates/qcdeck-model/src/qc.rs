// SPDX-License-Identifier: Apache-2.0

//! The QC document tree: evaluations containing metrics.
//!
//! This tree round-trips unedited subtrees byte-for-byte, so unknown fields
//! are captured in `extra` maps instead of being rejected. `overall_status`
//! is set by a human reviewer and is never derived from child statuses; the
//! model carries it as a one-way pass-through.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusValue {
    Pass,
    Fail,
    Pending,
}

impl StatusValue {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::Fail => "Fail",
            Self::Pending => "Pending",
        }
    }
}

impl Display for StatusValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One recorded status decision: who set it, what, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub evaluator: String,
    pub status: StatusValue,
    pub timestamp: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricValueKind {
    Bool,
    Number,
    Text,
    Structured,
}

impl MetricValueKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Number => "number",
            Self::Text => "text",
            Self::Structured => "structured",
        }
    }
}

impl Display for MetricValueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metric value variant. Mutation and serialization dispatch on the tag;
/// the untagged representation matches the stored JSON exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    Structured(Value),
}

impl MetricValue {
    #[must_use]
    pub const fn kind(&self) -> MetricValueKind {
        match self {
            Self::Bool(_) => MetricValueKind::Bool,
            Self::Number(_) => MetricValueKind::Number,
            Self::Text(_) => MetricValueKind::Text,
            Self::Structured(_) => MetricValueKind::Structured,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub value: MetricValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusRecord>,
    /// Optional pointer to a visualization asset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub modality: String,
    pub stage: String,
    pub status: StatusRecord,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub allow_failed_metrics: bool,
    pub metrics: Vec<Metric>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcDocument {
    pub overall_status: StatusRecord,
    #[serde(default)]
    pub notes: Option<String>,
    pub evaluations: Vec<Evaluation>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl QcDocument {
    #[must_use]
    pub fn metric_count(&self) -> usize {
        self.evaluations.iter().map(|e| e.metrics.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_document() -> Value {
        json!({
            "overall_status": {"evaluator": "jane", "status": "Pass", "timestamp": "2024-08-27T11:28:34"},
            "notes": null,
            "evaluations": [{
                "name": "Drift map",
                "description": "Spatial drift over the session",
                "modality": "ecephys",
                "stage": "processing",
                "status": {"evaluator": "automated", "status": "Fail", "timestamp": "2024-08-27T11:28:34"},
                "notes": "borderline",
                "allow_failed_metrics": true,
                "metrics": [
                    {"name": "drift_ok", "description": null, "value": false,
                     "reference": "ecephys-drift-map"},
                    {"name": "drift_um", "description": null, "value": 12.5},
                    {"name": "sorter", "description": null, "value": "kilosort2.5"},
                    {"name": "histogram", "description": null, "value": {"bins": [1, 2, 3]}}
                ],
                "custom_field": {"kept": true}
            }]
        })
    }

    #[test]
    fn untagged_values_take_the_right_variant() {
        let doc: QcDocument = serde_json::from_value(sample_document()).expect("parse");
        let kinds: Vec<MetricValueKind> = doc.evaluations[0]
            .metrics
            .iter()
            .map(|m| m.value.kind())
            .collect();
        assert_eq!(
            kinds,
            vec![
                MetricValueKind::Bool,
                MetricValueKind::Number,
                MetricValueKind::Text,
                MetricValueKind::Structured,
            ]
        );
    }

    #[test]
    fn unknown_fields_round_trip_unchanged() {
        let raw = sample_document();
        let doc: QcDocument = serde_json::from_value(raw.clone()).expect("parse");
        assert_eq!(
            doc.evaluations[0].extra.get("custom_field"),
            Some(&json!({"kept": true}))
        );
        let back = serde_json::to_value(&doc).expect("serialize");
        assert_eq!(
            qcdeck_core::canonical::stable_json_bytes(&back).expect("bytes"),
            qcdeck_core::canonical::stable_json_bytes(&raw).expect("bytes"),
        );
    }

    #[test]
    fn metric_count_sums_across_evaluations() {
        let doc: QcDocument = serde_json::from_value(sample_document()).expect("parse");
        assert_eq!(doc.metric_count(), 4);
    }
}
