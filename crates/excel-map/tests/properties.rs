use std::collections::BTreeSet;

use proptest::prelude::*;
use serde_json::Value;

use excel_map::{DecodeOptions, Decoder};
use excel_master::{GenerateOptions, generate_master};
use excel_model::Record;

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (0i64..6).prop_map(Value::from),
        "[a-c]{1,3}".prop_map(Value::from),
    ]
}

fn records_strategy(key_pattern: &'static str) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(
        prop::collection::btree_map(key_pattern, value_strategy(), 0..6)
            .prop_map(|map| map.into_iter().collect::<Record>()),
        1..8,
    )
}

proptest! {
    #[test]
    fn mapping_never_assigns_twice(
        plaintext in records_strategy("f[0-5]"),
        dump in records_strategy("k[0-7]"),
    ) {
        let schema = generate_master("Random", &plaintext, &GenerateOptions::default()).unwrap();
        let plan = Decoder::new(schema, Vec::new(), DecodeOptions::default()).plan(&dump);
        let mapping = &plan.tree.mapping;

        let keys: BTreeSet<&str> = mapping.iter().map(|a| a.obfuscated_key.as_str()).collect();
        let fields: BTreeSet<&str> = mapping.iter().map(|a| a.canonical_name.as_str()).collect();
        prop_assert_eq!(keys.len(), mapping.len());
        prop_assert_eq!(fields.len(), mapping.len());
        for assignment in mapping.iter() {
            prop_assert_eq!(
                mapping.key_for(&assignment.canonical_name),
                Some(assignment.obfuscated_key.as_str())
            );
            prop_assert!((0.0..=1.0).contains(&assignment.confidence));
        }
        prop_assert!((0.0..=1.0).contains(&plan.evaluation.overall));
    }

    #[test]
    fn planning_is_deterministic(
        plaintext in records_strategy("f[0-5]"),
        dump in records_strategy("k[0-7]"),
    ) {
        let schema = generate_master("Random", &plaintext, &GenerateOptions::default()).unwrap();
        let decoder = Decoder::new(schema, Vec::new(), DecodeOptions::default());
        let first = decoder.plan(&dump);
        let second = decoder.plan(&dump);
        prop_assert_eq!(first.tree, second.tree);
        prop_assert_eq!(first.evaluation, second.evaluation);
    }
}
