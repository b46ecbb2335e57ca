#![forbid(unsafe_code)]
//! Asset/QC model SSOT.

mod asset;
mod normalize;
mod qc;

pub use asset::{
    lineage_key_lenient, AssetName, DerivedStage, NameError, DERIVED_NAME_PARTS, NAME_SEPARATOR,
    RAW_NAME_PARTS,
};
pub use normalize::{normalize, AssetRecord, NormalizationError, QcStatus, RecordFlag};
pub use qc::{
    Evaluation, Metric, MetricValue, MetricValueKind, QcDocument, StatusRecord, StatusValue,
};

pub const CRATE_NAME: &str = "qcdeck-model";
