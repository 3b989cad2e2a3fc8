//! Key renaming pass.

use std::collections::BTreeMap;

use serde_json::Value;

use excel_model::{KeyMapping, Record};

/// Key mapping of one record level plus the mappings of its nested fields,
/// keyed by canonical field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingTree {
    pub mapping: KeyMapping,
    pub children: BTreeMap<String, MappingTree>,
}

impl MappingTree {
    pub fn new(mapping: KeyMapping) -> Self {
        Self {
            mapping,
            children: BTreeMap::new(),
        }
    }

    /// Nested mappings flattened to `parent.child` paths.
    pub fn nested_mappings(&self) -> BTreeMap<String, KeyMapping> {
        let mut out = BTreeMap::new();
        self.collect_nested("", &mut out);
        out
    }

    fn collect_nested(&self, prefix: &str, out: &mut BTreeMap<String, KeyMapping>) {
        for (name, child) in &self.children {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}.{name}")
            };
            child.collect_nested(&path, out);
            out.insert(path, child.mapping.clone());
        }
    }
}

/// Renames obfuscated keys to canonical names.
///
/// Keys without a mapping are dropped. Input records are left untouched.
pub fn rename_records(records: &[Record], tree: &MappingTree) -> Vec<Record> {
    records.iter().map(|record| rename_record(record, tree)).collect()
}

fn rename_record(record: &Record, tree: &MappingTree) -> Record {
    let mut out = Record::new();
    for (key, value) in record {
        let Some(canonical) = tree.mapping.canonical_for(key) else {
            continue;
        };
        let value = match tree.children.get(canonical) {
            Some(child) => rename_nested(value, child),
            None => value.clone(),
        };
        out.insert(canonical.to_string(), value);
    }
    out
}

fn rename_nested(value: &Value, tree: &MappingTree) -> Value {
    match value {
        Value::Object(map) => Value::Object(rename_record(map, tree)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| rename_nested(item, tree))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use excel_model::{KeyAssignment, MatchMethod};
    use serde_json::json;

    fn mapping(pairs: &[(&str, &str)]) -> KeyMapping {
        let mut mapping = KeyMapping::new();
        for (key, canonical) in pairs {
            mapping
                .insert(KeyAssignment {
                    obfuscated_key: (*key).to_string(),
                    canonical_name: (*canonical).to_string(),
                    confidence: 1.0,
                    method: MatchMethod::Structural,
                })
                .unwrap();
        }
        mapping
    }

    #[test]
    fn renames_nested_arrays_and_drops_unmapped_keys() {
        let record = json!({
            "AB": 1,
            "CD": [{"EF": "GROW_CURVE_HP", "GH": 1.5, "XX": 0}],
            "ZZ": "junk"
        })
        .as_object()
        .unwrap()
        .clone();

        let mut tree = MappingTree::new(mapping(&[("AB", "level"), ("CD", "curveInfos")]));
        tree.children.insert(
            "curveInfos".to_string(),
            MappingTree::new(mapping(&[("EF", "type"), ("GH", "value")])),
        );

        let out = rename_records(std::slice::from_ref(&record), &tree);
        assert_eq!(
            Value::Object(out[0].clone()),
            json!({"level": 1, "curveInfos": [{"type": "GROW_CURVE_HP", "value": 1.5}]})
        );
        assert!(record.contains_key("ZZ"));
        assert_eq!(
            tree.nested_mappings().keys().collect::<Vec<_>>(),
            vec!["curveInfos"]
        );
    }
}
