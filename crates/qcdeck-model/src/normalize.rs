// SPDX-License-Identifier: Apache-2.0

use crate::asset::{AssetName, NameError};
use qcdeck_core::time::parse_name_timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NormalizationError {
    MissingName,
    MalformedName { name: String, source: NameError },
}

impl Display for NormalizationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "document has no string `name` field"),
            Self::MalformedName { name, source } => {
                write!(f, "asset name `{name}` is malformed: {source}")
            }
        }
    }
}

impl std::error::Error for NormalizationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MissingName => None,
            Self::MalformedName { source, .. } => Some(source),
        }
    }
}

/// Derived QC status of an asset. Absence of a QC sub-document is a valid
/// state (`NoQc`), never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum QcStatus {
    NoQc,
    Pass,
    Fail,
    Pending,
}

impl QcStatus {
    pub const NO_QC_LABEL: &'static str = "No QC";

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "pass" => Some(Self::Pass),
            "fail" => Some(Self::Fail),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoQc => Self::NO_QC_LABEL,
            Self::Pass => "Pass",
            Self::Fail => "Fail",
            Self::Pending => "Pending",
        }
    }
}

impl Display for QcStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Non-fatal conditions noticed while normalizing. Flagged records are
/// retained; time-based views skip records flagged with
/// `UnparsableTimestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordFlag {
    UnparsableTimestamp,
    UnknownStatusLabel,
}

/// Immutable flat view of one asset document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: String,
    pub name: String,
    pub modality: String,
    pub subject_id: String,
    pub date: String,
    pub time: String,
    pub is_raw: bool,
    /// Processing-stage label; empty for raw assets.
    pub stage: String,
    pub lineage_key: String,
    pub qc_status: QcStatus,
    /// The `overall_status` label exactly as stored, or `"No QC"`.
    pub status_label: String,
    /// Unix seconds parsed from the name's date/time component. `None` when
    /// unparsable; such records stay in flat listings but are excluded from
    /// time-sorted and time-filtered views.
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<RecordFlag>,
}

impl AssetRecord {
    #[must_use]
    pub fn has_flag(&self, flag: RecordFlag) -> bool {
        self.flags.contains(&flag)
    }
}

/// Normalize one raw document into a flat [`AssetRecord`].
///
/// Pure function over the document. A malformed name is the only hard
/// error besides a missing `name`; timestamp and status problems downgrade
/// to retained flags.
pub fn normalize(raw_document: &Value) -> Result<AssetRecord, NormalizationError> {
    let name_str = raw_document
        .get("name")
        .and_then(Value::as_str)
        .ok_or(NormalizationError::MissingName)?;
    let name = AssetName::parse(name_str).map_err(|source| NormalizationError::MalformedName {
        name: name_str.to_string(),
        source,
    })?;

    let id = raw_document
        .get("_id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut flags = Vec::new();

    let (date, time) = name.event_date_time();
    let (date, time) = (date.to_string(), time.to_string());
    let timestamp = match parse_name_timestamp(&date, &time) {
        Ok(unix) => Some(unix),
        Err(_) => {
            flags.push(RecordFlag::UnparsableTimestamp);
            None
        }
    };

    let (qc_status, status_label) = match overall_status_label(raw_document) {
        Some(label) => match QcStatus::from_label(&label) {
            Some(status) => (status, label),
            None => {
                flags.push(RecordFlag::UnknownStatusLabel);
                (QcStatus::NoQc, label)
            }
        },
        None => (QcStatus::NoQc, QcStatus::NO_QC_LABEL.to_string()),
    };

    // Raw/derived is decided by the name's shape, not by the stage label:
    // a 7-part name with an empty stage part is still derived.
    let is_raw = name.is_raw();
    let stage = name
        .derived
        .as_ref()
        .map(|d| d.stage.clone())
        .unwrap_or_default();
    let lineage_key = name.lineage_key();

    Ok(AssetRecord {
        id,
        lineage_key,
        name: name_str.to_string(),
        modality: name.modality,
        subject_id: name.subject_id,
        date,
        time,
        is_raw,
        stage,
        qc_status,
        status_label,
        timestamp,
        flags,
    })
}

// The status lives either under the full nested document
// (`quality_control.overall_status`, itself either a bare label or a
// status record with a `status` sub-field) or pre-projected by the store
// aggregation as `qc_exists`.
fn overall_status_label(document: &Value) -> Option<String> {
    let overall = document
        .get("quality_control")
        .and_then(|qc| qc.get("overall_status"))
        .or_else(|| document.get("qc_exists"))?;
    match overall {
        Value::String(label) => Some(label.clone()),
        Value::Object(map) => map
            .get("status")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        _ => None,
    }
}
