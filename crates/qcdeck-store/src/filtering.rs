// SPDX-License-Identifier: Apache-2.0

//! Shared filter/projection evaluation for the in-memory and local
//! directory stores. Supports the operator subset the portal actually
//! issues: exact match, `$in`, `$ne`, `$exists`, and case-insensitive
//! `$regex` treated as a literal substring match.

use qcdeck_core::ports::{StoreError, StoreErrorCode};
use serde_json::{Map, Value};

pub(crate) fn doc_matches(document: &Value, filter: &Value) -> Result<bool, StoreError> {
    let Some(conditions) = filter.as_object() else {
        return Err(StoreError::new(
            StoreErrorCode::Validation,
            "filter must be an object",
        ));
    };
    for (path, condition) in conditions {
        if !field_matches(lookup_path(document, path), condition)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn field_matches(value: Option<&Value>, condition: &Value) -> Result<bool, StoreError> {
    if let Some(operators) = condition.as_object() {
        if operators.keys().any(|k| k.starts_with('$')) {
            return operator_matches(value, operators);
        }
    }
    Ok(value == Some(condition))
}

fn operator_matches(
    value: Option<&Value>,
    operators: &Map<String, Value>,
) -> Result<bool, StoreError> {
    for (op, operand) in operators {
        let hit = match op.as_str() {
            "$regex" => {
                let needle = operand.as_str().ok_or_else(|| {
                    StoreError::new(StoreErrorCode::Validation, "$regex operand must be a string")
                })?;
                value
                    .and_then(Value::as_str)
                    .map_or(false, |s| s.to_lowercase().contains(&needle.to_lowercase()))
            }
            "$in" => {
                let members = operand.as_array().ok_or_else(|| {
                    StoreError::new(StoreErrorCode::Validation, "$in operand must be an array")
                })?;
                value.map_or(false, |v| members.contains(v))
            }
            "$ne" => value != Some(operand),
            "$exists" => {
                let wanted = operand.as_bool().unwrap_or(true);
                value.is_some() == wanted
            }
            "$options" => true, // modifier for $regex; only "i" is issued
            other => {
                return Err(StoreError::new(
                    StoreErrorCode::Validation,
                    format!("unsupported filter operator `{other}`"),
                ))
            }
        };
        if !hit {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Dotted-path lookup, e.g. `subject.subject_id`.
fn lookup_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = document;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Inclusion/exclusion projection. Listing any field as `1` switches to
/// inclusion mode (`_id` included unless explicitly excluded); otherwise
/// `0`-fields are dropped from the full document.
pub(crate) fn apply_projection(document: &Value, projection: Option<&Value>) -> Value {
    let Some(projection) = projection.and_then(Value::as_object) else {
        return document.clone();
    };
    let included: Vec<&str> = projection
        .iter()
        .filter(|(_, v)| v.as_i64() == Some(1))
        .map(|(k, _)| k.as_str())
        .collect();
    let Some(source) = document.as_object() else {
        return document.clone();
    };
    let mut out = Map::new();
    if included.is_empty() {
        for (key, value) in source {
            if projection.get(key).and_then(Value::as_i64) != Some(0) {
                out.insert(key.clone(), value.clone());
            }
        }
    } else {
        let id_excluded = projection.get("_id").and_then(Value::as_i64) == Some(0);
        if !id_excluded {
            if let Some(id) = source.get("_id") {
                out.insert("_id".to_string(), id.clone());
            }
        }
        for key in included {
            if let Some(value) = lookup_path(document, key) {
                out.insert(key.to_string(), value.clone());
            }
        }
    }
    Value::Object(out)
}

/// `$match` + `$project` aggregation over an already-fetched document set.
pub(crate) fn run_pipeline(
    documents: Vec<Value>,
    pipeline: &[Value],
) -> Result<Vec<Value>, StoreError> {
    let mut rows = documents;
    for stage in pipeline {
        let Some(stage_obj) = stage.as_object() else {
            return Err(StoreError::new(
                StoreErrorCode::Validation,
                "aggregation stage must be an object",
            ));
        };
        if let Some(filter) = stage_obj.get("$match") {
            let mut kept = Vec::with_capacity(rows.len());
            for row in rows {
                if doc_matches(&row, filter)? {
                    kept.push(row);
                }
            }
            rows = kept;
        } else if let Some(projection) = stage_obj.get("$project") {
            rows = rows
                .into_iter()
                .map(|row| apply_projection(&row, Some(projection)))
                .collect();
        } else {
            let stage_name = stage_obj.keys().next().cloned().unwrap_or_default();
            return Err(StoreError::new(
                StoreErrorCode::Validation,
                format!("unsupported aggregation stage `{stage_name}`"),
            ));
        }
    }
    Ok(rows)
}
