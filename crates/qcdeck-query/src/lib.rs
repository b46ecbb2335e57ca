#![forbid(unsafe_code)]
//! Query narrowing: brush-driven time selection and the parameterized
//! predicate builder that feeds the tabular data layer.

mod builder;
mod query_error;
mod selection;

pub use builder::{Clause, ColumnMap, QueryPredicate, SqlParam, TableQueryBuilder};
pub use query_error::{QueryError, QueryErrorCode};
pub use selection::{BrushBounds, SelectionUpdate, TimeRangeSelector, TimeSelection};

pub const CRATE_NAME: &str = "qcdeck-query";
