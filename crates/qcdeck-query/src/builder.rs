// SPDX-License-Identifier: Apache-2.0

//! Declarative column mapping to a parameterized query predicate.
//!
//! The predicate decides what to filter on; executing it is the data
//! layer's job. User-supplied filter values never appear in query text:
//! they travel as bound parameters, and column identifiers are validated
//! against a strict charset before they may appear in rendered SQL.

use crate::query_error::QueryError;
use crate::selection::TimeSelection;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub x: String,
    pub y: String,
    pub group_by: Option<String>,
    pub filter_column: Option<String>,
    pub filter_values: Vec<String>,
}

/// Bound parameter value for rendered SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Integer(i64),
    Real(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Clause {
    NotNull {
        column: String,
    },
    /// Closed interval in the store's native unit (seconds).
    TimeRange {
        column: String,
        start_s: i64,
        end_s: i64,
    },
    /// ASCII-case-insensitive, whitespace-trimmed membership; values held
    /// in normalized form.
    AnyOf {
        column: String,
        values: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryPredicate {
    clauses: Vec<Clause>,
}

pub struct TableQueryBuilder;

impl TableQueryBuilder {
    /// Build the predicate for a column mapping plus the current time
    /// selection.
    ///
    /// Clauses, ANDed in order: `y IS NOT NULL`; the time range on `x`
    /// (converted ms -> s here, closed interval) when the selection is
    /// non-empty; the membership filter when a column and a non-empty
    /// value set are both configured. An empty value set with a configured
    /// column is deliberate pass-all, not an error.
    pub fn build(map: &ColumnMap, selection: &TimeSelection) -> Result<QueryPredicate, QueryError> {
        if map.x.trim().is_empty() {
            return Err(QueryError::configuration("x column mapping is missing"));
        }
        if map.y.trim().is_empty() {
            return Err(QueryError::configuration("y column mapping is missing"));
        }
        for column in [Some(&map.x), Some(&map.y), map.group_by.as_ref(), map.filter_column.as_ref()]
            .into_iter()
            .flatten()
        {
            if !is_safe_identifier(column) {
                return Err(QueryError::validation(format!(
                    "`{column}` is not a valid column identifier"
                )));
            }
        }

        let mut clauses = vec![Clause::NotNull {
            column: map.y.clone(),
        }];
        if let Some((start_s, end_s)) = selection.bounds_seconds() {
            clauses.push(Clause::TimeRange {
                column: map.x.clone(),
                start_s,
                end_s,
            });
        }
        if let Some(column) = &map.filter_column {
            if !map.filter_values.is_empty() {
                clauses.push(Clause::AnyOf {
                    column: column.clone(),
                    values: map.filter_values.iter().map(|v| normalize_member(v)).collect(),
                });
            }
        }
        Ok(QueryPredicate { clauses })
    }
}

impl QueryPredicate {
    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// In-memory evaluation against one JSON object row, using the same
    /// normalization rules as the rendered SQL.
    #[must_use]
    pub fn matches(&self, row: &Map<String, Value>) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::NotNull { column } => {
                row.get(column).map_or(false, |v| !v.is_null())
            }
            Clause::TimeRange {
                column,
                start_s,
                end_s,
            } => row
                .get(column)
                .and_then(Value::as_i64)
                .map_or(false, |ts| *start_s <= ts && ts <= *end_s),
            Clause::AnyOf { column, values } => row
                .get(column)
                .map_or(false, |v| match v {
                    Value::String(s) => values.contains(&normalize_member(s)),
                    other => values.contains(&normalize_member(&other.to_string())),
                }),
        })
    }

    /// Render a WHERE fragment with `?` placeholders and the bound
    /// parameters that go with it. Empty predicate renders an empty
    /// fragment.
    #[must_use]
    pub fn where_sql(&self) -> (String, Vec<SqlParam>) {
        let mut fragments = Vec::with_capacity(self.clauses.len());
        let mut params = Vec::new();
        for clause in &self.clauses {
            match clause {
                Clause::NotNull { column } => {
                    fragments.push(format!("{column} IS NOT NULL"));
                }
                Clause::TimeRange {
                    column,
                    start_s,
                    end_s,
                } => {
                    fragments.push(format!("{column} BETWEEN ? AND ?"));
                    params.push(SqlParam::Integer(*start_s));
                    params.push(SqlParam::Integer(*end_s));
                }
                Clause::AnyOf { column, values } => {
                    let placeholders = vec!["?"; values.len()].join(", ");
                    fragments.push(format!("LOWER(TRIM({column})) IN ({placeholders})"));
                    params.extend(values.iter().cloned().map(SqlParam::Text));
                }
            }
        }
        if fragments.is_empty() {
            (String::new(), params)
        } else {
            (format!("WHERE {}", fragments.join(" AND ")), params)
        }
    }
}

// ASCII-only fold to stay in lockstep with SQLite's LOWER(); the value
// domain is ASCII status labels and subject ids.
fn normalize_member(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

fn is_safe_identifier(input: &str) -> bool {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
