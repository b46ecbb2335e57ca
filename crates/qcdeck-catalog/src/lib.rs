#![forbid(unsafe_code)]
//! Asset catalog and lineage grouping.

mod catalog;
mod lineage;

pub use catalog::{AssetCatalog, CatalogField, CatalogFilter, RejectedDocument};
pub use lineage::{LineageGroup, LineageGroups, UNKNOWN_LINEAGE_KEY};

pub const CRATE_NAME: &str = "qcdeck-catalog";
