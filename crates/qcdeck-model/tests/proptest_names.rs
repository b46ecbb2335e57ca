use proptest::prelude::*;
use proptest::test_runner::Config;
use qcdeck_model::{lineage_key_lenient, AssetName, NameError};

proptest! {
    #![proptest_config(Config::with_cases(128))]
    #[test]
    fn parsed_names_round_trip_through_display(
        modality in "[a-z]{2,10}",
        subject in "[0-9]{1,7}",
        date in "[0-9]{4}-[0-9]{2}-[0-9]{2}",
        time in "[0-9]{2}-[0-9]{2}-[0-9]{2}",
    ) {
        let raw = format!("{modality}_{subject}_{date}_{time}");
        let parsed = AssetName::parse(&raw).expect("raw name");
        prop_assert!(parsed.is_raw());
        prop_assert_eq!(parsed.to_string(), raw.clone());
        prop_assert_eq!(parsed.lineage_key(), raw.clone());

        let derived = format!("{raw}_sorted-ks25_{date}_{time}");
        let parsed = AssetName::parse(&derived).expect("derived name");
        prop_assert!(!parsed.is_raw());
        prop_assert_eq!(parsed.to_string(), derived);
        prop_assert_eq!(parsed.lineage_key(), raw);
    }

    #[test]
    fn wrong_part_counts_never_parse(
        parts in prop::collection::vec("[a-z0-9-]{1,8}", 1..12),
    ) {
        prop_assume!(parts.len() != 4 && parts.len() != 7);
        let name = parts.join("_");
        let err = AssetName::parse(&name).expect_err("must be malformed");
        let is_malformed = matches!(&err, NameError::MalformedName { .. });
        prop_assert!(is_malformed, "unexpected error for `{}`: {:?}", name, err);
    }

    #[test]
    fn lenient_key_agrees_with_strict_parse(
        modality in "[a-z]{2,10}",
        subject in "[0-9]{1,7}",
        date in "[0-9]{4}-[0-9]{2}-[0-9]{2}",
        time in "[0-9]{2}-[0-9]{2}-[0-9]{2}",
    ) {
        let raw = format!("{modality}_{subject}_{date}_{time}");
        let strict = AssetName::parse(&raw).expect("raw name").lineage_key();
        prop_assert_eq!(lineage_key_lenient(&raw), Some(strict));
    }
}
