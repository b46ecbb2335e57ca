// SPDX-License-Identifier: Apache-2.0

use qcdeck_model::{normalize, AssetRecord, NormalizationError};
use serde_json::Value;
use std::collections::BTreeSet;
use unicode_normalization::UnicodeNormalization;

/// A document the normalizer refused. Retained and surfaced separately;
/// a bad record never aborts the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedDocument {
    pub name: String,
    pub error: NormalizationError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogField {
    Modality,
    SubjectId,
    Date,
}

/// Filter criteria for one browse query. An empty string means pass-all
/// for that dimension; supplied criteria are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub modality: String,
    pub subject_id: String,
    pub date: String,
    /// Case-insensitive substring match over the asset name.
    pub text: String,
}

impl CatalogFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modality.is_empty()
            && self.subject_id.is_empty()
            && self.date.is_empty()
            && self.text.is_empty()
    }
}

/// Ordered collection of normalized records for one browse session.
///
/// Records are sorted once at load, by timestamp descending with
/// timestampless records after every timestamped one; the order is
/// preserved afterwards.
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    records: Vec<AssetRecord>,
    rejected: Vec<RejectedDocument>,
}

impl AssetCatalog {
    #[must_use]
    pub fn from_documents(documents: &[Value]) -> Self {
        let mut records = Vec::new();
        let mut rejected = Vec::new();
        for document in documents {
            match normalize(document) {
                Ok(record) => records.push(record),
                Err(error) => rejected.push(RejectedDocument {
                    name: document
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    error,
                }),
            }
        }
        // Stable sort: ties and timestampless records keep input order.
        records.sort_by(|a, b| {
            b.timestamp
                .unwrap_or(i64::MIN)
                .cmp(&a.timestamp.unwrap_or(i64::MIN))
        });
        Self { records, rejected }
    }

    #[must_use]
    pub fn records(&self) -> &[AssetRecord] {
        &self.records
    }

    #[must_use]
    pub fn rejected(&self) -> &[RejectedDocument] {
        &self.rejected
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Apply a filter and return the matching records in catalog order.
    /// Side-effect free; with an empty filter this is the identity.
    #[must_use]
    pub fn filter(&self, filter: &CatalogFilter) -> Vec<&AssetRecord> {
        let text = if filter.text.is_empty() {
            None
        } else {
            Some(fold_text(&filter.text))
        };
        self.records
            .iter()
            .filter(|record| {
                matches_dimension(&filter.modality, &record.modality)
                    && matches_dimension(&filter.subject_id, &record.subject_id)
                    && matches_dimension(&filter.date, &record.date)
                    && text
                        .as_ref()
                        .map_or(true, |needle| fold_text(&record.name).contains(needle.as_str()))
            })
            .collect()
    }

    /// Distinct values present for a field, sorted, with the leading `""`
    /// "no filter" sentinel always first. Zero records yields `[""]`.
    #[must_use]
    pub fn distinct(&self, field: CatalogField) -> Vec<String> {
        let values: BTreeSet<&str> = self
            .records
            .iter()
            .map(|record| match field {
                CatalogField::Modality => record.modality.as_str(),
                CatalogField::SubjectId => record.subject_id.as_str(),
                CatalogField::Date => record.date.as_str(),
            })
            .collect();
        let mut options = Vec::with_capacity(values.len() + 1);
        options.push(String::new());
        options.extend(values.into_iter().map(ToString::to_string));
        options
    }
}

fn matches_dimension(criterion: &str, value: &str) -> bool {
    criterion.is_empty() || criterion == value
}

fn fold_text(input: &str) -> String {
    input.nfc().collect::<String>().to_lowercase()
}
