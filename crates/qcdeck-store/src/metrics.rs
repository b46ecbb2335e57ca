// SPDX-License-Identifier: Apache-2.0

//! Columnar metrics executor: runs a `QueryPredicate` against the
//! per-session metrics table in SQLite. Predicate values are bound with
//! `?` placeholders; the only interpolated text is the table name, which
//! is validated against a strict identifier charset first.

use qcdeck_core::ports::{StoreError, StoreErrorCode};
use qcdeck_query::{QueryPredicate, SqlParam};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};

#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub name: String,
    pub value: Option<f64>,
    pub ts: i64,
    pub subject_id: String,
}

pub fn fetch_metric_rows(
    conn: &Connection,
    table: &str,
    predicate: &QueryPredicate,
) -> Result<Vec<MetricRow>, StoreError> {
    if !is_safe_table_name(table) {
        return Err(StoreError::new(
            StoreErrorCode::Validation,
            format!("`{table}` is not a valid table name"),
        ));
    }
    let (where_sql, params) = predicate.where_sql();
    let sql = if where_sql.is_empty() {
        format!("SELECT name, value, ts, subject_id FROM {table} ORDER BY ts")
    } else {
        format!("SELECT name, value, ts, subject_id FROM {table} {where_sql} ORDER BY ts")
    };
    let mut stmt = conn.prepare(&sql).map_err(sql_error)?;
    let bound = params.into_iter().map(|p| match p {
        SqlParam::Integer(i) => SqlValue::Integer(i),
        SqlParam::Real(f) => SqlValue::Real(f),
        SqlParam::Text(s) => SqlValue::Text(s),
    });
    let rows = stmt
        .query_map(params_from_iter(bound), |row| {
            Ok(MetricRow {
                name: row.get(0)?,
                value: row.get(1)?,
                ts: row.get(2)?,
                subject_id: row.get(3)?,
            })
        })
        .map_err(sql_error)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(sql_error)?);
    }
    Ok(out)
}

fn sql_error(err: rusqlite::Error) -> StoreError {
    StoreError::new(StoreErrorCode::Internal, err.to_string())
}

fn is_safe_table_name(input: &str) -> bool {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
