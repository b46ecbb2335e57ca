use qcdeck_model::{lineage_key_lenient, AssetRecord};
use std::collections::HashMap;

/// Reserved bucket for records whose lineage prefix cannot be recovered.
pub const UNKNOWN_LINEAGE_KEY: &str = "__unknown__";

/// One lineage: a raw asset and everything derived from it, in input
/// order. `unparsed_names` carries rejected documents whose lenient prefix
/// matched this group.
#[derive(Debug, Clone, PartialEq)]
pub struct LineageGroup {
    pub key: String,
    pub records: Vec<AssetRecord>,
    pub unparsed_names: Vec<String>,
}

/// Partition of a record sequence by lineage key.
///
/// Group positions follow first-seen order in the input, so a fixed input
/// order yields fixed group indices (they are used as chart-axis
/// categories; upstream supplies timestamp-descending order).
#[derive(Debug, Clone, Default)]
pub struct LineageGroups {
    groups: Vec<LineageGroup>,
    index: HashMap<String, usize>,
}

impl LineageGroups {
    #[must_use]
    pub fn group_records(records: &[AssetRecord]) -> Self {
        Self::group_with_rejected(records, &[])
    }

    /// Like [`Self::group_records`], with rejected names bucketed by their
    /// lenient first-4-parts prefix where computable, else into
    /// [`UNKNOWN_LINEAGE_KEY`].
    #[must_use]
    pub fn group_with_rejected(records: &[AssetRecord], rejected_names: &[String]) -> Self {
        let mut groups = Self::default();
        for record in records {
            let slot = groups.slot(record.lineage_key.clone());
            groups.groups[slot].records.push(record.clone());
        }
        for name in rejected_names {
            let key =
                lineage_key_lenient(name).unwrap_or_else(|| UNKNOWN_LINEAGE_KEY.to_string());
            let slot = groups.slot(key);
            groups.groups[slot].unparsed_names.push(name.clone());
        }
        groups
    }

    fn slot(&mut self, key: String) -> usize {
        if let Some(&slot) = self.index.get(&key) {
            return slot;
        }
        let slot = self.groups.len();
        self.index.insert(key.clone(), slot);
        self.groups.push(LineageGroup {
            key,
            records: Vec::new(),
            unparsed_names: Vec::new(),
        });
        slot
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&LineageGroup> {
        self.index.get(key).map(|&slot| &self.groups[slot])
    }

    #[must_use]
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LineageGroup> {
        self.groups.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    #[must_use]
    pub fn record_count(&self) -> usize {
        self.groups.iter().map(|g| g.records.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcdeck_model::normalize;
    use serde_json::json;

    fn records() -> Vec<AssetRecord> {
        [
            "ecephys_718481_2024-06-04_10-33-39_sorted-ks25_2024-08-27_11-28-34",
            "behavior_623_2024-01-02_09-00-00",
            "ecephys_718481_2024-06-04_10-33-39",
            "ecephys_718481_2024-06-04_10-33-39_nwb_2024-08-28_01-00-00",
        ]
        .iter()
        .map(|name| normalize(&json!({"_id": *name, "name": *name})).expect("normalize"))
        .collect()
    }

    #[test]
    fn shared_prefix_lands_in_one_group() {
        let groups = LineageGroups::group_records(&records());
        assert_eq!(groups.len(), 2);
        let lineage = groups
            .get("ecephys_718481_2024-06-04_10-33-39")
            .expect("lineage group");
        assert_eq!(lineage.records.len(), 3);
    }

    #[test]
    fn every_record_appears_in_exactly_one_group() {
        let records = records();
        let groups = LineageGroups::group_records(&records);
        assert_eq!(groups.record_count(), records.len());
        for record in &records {
            let hits = groups
                .iter()
                .filter(|g| g.records.iter().any(|r| r.id == record.id))
                .count();
            assert_eq!(hits, 1, "{}", record.name);
        }
    }

    #[test]
    fn group_indices_follow_first_seen_order() {
        let groups = LineageGroups::group_records(&records());
        assert_eq!(
            groups.index_of("ecephys_718481_2024-06-04_10-33-39"),
            Some(0)
        );
        assert_eq!(groups.index_of("behavior_623_2024-01-02_09-00-00"), Some(1));
    }

    #[test]
    fn singleton_raw_group_is_valid() {
        let groups = LineageGroups::group_records(&records());
        let singleton = groups
            .get("behavior_623_2024-01-02_09-00-00")
            .expect("singleton");
        assert_eq!(singleton.records.len(), 1);
        assert!(singleton.records[0].is_raw);
    }

    #[test]
    fn rejected_names_bucket_by_lenient_prefix_or_unknown() {
        let rejected = vec![
            "ecephys_718481_2024-06-04_10-33-39_oddball".to_string(),
            "two_parts".to_string(),
        ];
        let groups = LineageGroups::group_with_rejected(&records(), &rejected);
        let lineage = groups
            .get("ecephys_718481_2024-06-04_10-33-39")
            .expect("lineage group");
        assert_eq!(
            lineage.unparsed_names,
            vec!["ecephys_718481_2024-06-04_10-33-39_oddball".to_string()]
        );
        let unknown = groups.get(UNKNOWN_LINEAGE_KEY).expect("unknown bucket");
        assert_eq!(unknown.unparsed_names, vec!["two_parts".to_string()]);
        assert!(unknown.records.is_empty());
    }
}
