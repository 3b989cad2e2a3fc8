//! Offline master generation from a trusted, already decoded dump.
//!
//! The fingerprint of every field in the plaintext dump becomes that field's
//! stored profile. Nested objects (and arrays of objects) get child
//! descriptors so their keys can be recovered too.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info};

use excel_ingest::{FingerprintOptions, fingerprint_records, nested_records};
use excel_model::{FieldDescriptor, FieldFingerprint, MasterSchema, Record, ValueKind};

use crate::error::{MasterError, Result};

const MAX_NESTING_DEPTH: usize = 4;

/// Options for [`generate_master`].
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub fingerprint: FingerprintOptions,
    /// Canonical field -> description of the anchor resolving it.
    pub anchor_hints: BTreeMap<String, String>,
}

/// Builds a master schema from plaintext records.
///
/// Fields keep the order in which they first appear. A field is required when
/// every record holds a non-null value of a single kind.
pub fn generate_master(
    dataset: &str,
    records: &[Record],
    options: &GenerateOptions,
) -> Result<MasterSchema> {
    if records.is_empty() {
        return Err(MasterError::EmptySource {
            dataset: dataset.to_string(),
        });
    }
    let mut fields = describe(records, options, 0);
    for field in &mut fields {
        if let Some(hint) = options.anchor_hints.get(&field.canonical_name) {
            field.anchor_hint = Some(hint.clone());
        }
    }
    let required = fields.iter().filter(|f| f.required).count();
    info!(
        dataset,
        records = records.len(),
        fields = fields.len(),
        required,
        "master generated"
    );
    MasterSchema::new(dataset, fields).map_err(|source| MasterError::GeneratedSchemaInvalid {
        dataset: dataset.to_string(),
        source,
    })
}

fn describe(records: &[Record], options: &GenerateOptions, depth: usize) -> Vec<FieldDescriptor> {
    let fingerprints = fingerprint_records(records, options.fingerprint);
    first_seen_keys(records)
        .into_iter()
        .filter_map(|key| {
            let fp = fingerprints.get(&key)?;
            Some(describe_field(records, &key, fp, options, depth))
        })
        .collect()
}

fn describe_field(
    records: &[Record],
    key: &str,
    fp: &FieldFingerprint,
    options: &GenerateOptions,
    depth: usize,
) -> FieldDescriptor {
    let mut field = FieldDescriptor::from_fingerprint(key, fp);
    if fp.ambiguous {
        debug!(field = key, "mixed value kinds, marking optional");
        field.required = false;
    }
    let nests = matches!(fp.value_kind, ValueKind::Object | ValueKind::Array);
    if nests && depth < MAX_NESTING_DEPTH {
        let nested = nested_records(records, key);
        if !nested.is_empty() {
            field.children = describe(&nested, options, depth + 1);
        }
    }
    field
}

fn first_seen_keys(records: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for record in records {
        for key in record.keys() {
            if seen.insert(key.as_str()) {
                keys.push(key.clone());
            }
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use excel_model::ModelError;
    use serde_json::json;

    fn records(value: serde_json::Value) -> Vec<Record> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn generates_required_and_optional_fields() {
        let recs = records(json!([
            {"id": 1, "name": "Amber", "tag": null},
            {"id": 2, "name": "Kaeya"},
            {"id": 3, "name": "Lisa", "tag": 7},
        ]));
        let schema = generate_master("Avatar", &recs, &GenerateOptions::default()).unwrap();
        assert_eq!(schema.canonical_names(), vec!["id", "name", "tag"]);

        let id = schema.field("id").unwrap();
        assert!(id.required);
        assert!(id.is_unique);
        assert_eq!(id.numeric_range.unwrap().max, 3.0);

        let tag = schema.field("tag").unwrap();
        assert!(!tag.required);
        assert!(tag.is_nullable);
    }

    #[test]
    fn describes_nested_array_fields() {
        let recs = records(json!([
            {"level": 1, "curveInfos": [{"type": "GROW_CURVE_HP", "value": 1.0}]},
            {"level": 2, "curveInfos": [{"type": "GROW_CURVE_HP", "value": 1.1}]},
        ]));
        let schema = generate_master("AvatarCurve", &recs, &GenerateOptions::default()).unwrap();
        let curve = schema.field("curveInfos").unwrap();
        assert!(curve.has_nested_fields());
        let names: Vec<&str> = curve
            .children
            .iter()
            .map(|c| c.canonical_name.as_str())
            .collect();
        assert_eq!(names, vec!["type", "value"]);
    }

    #[test]
    fn applies_anchor_hints() {
        let recs = records(json!([{"skinId": 1}, {"skinId": 2}]));
        let mut options = GenerateOptions::default();
        options
            .anchor_hints
            .insert("skinId".to_string(), "known costume id".to_string());
        let schema = generate_master("Costume", &recs, &options).unwrap();
        assert_eq!(
            schema.field("skinId").unwrap().anchor_hint.as_deref(),
            Some("known costume id")
        );
    }

    #[test]
    fn invalid_generated_schema_names_the_dataset() {
        let recs = records(json!([{"": 1}, {"": 2}]));
        let err = generate_master("Blank", &recs, &GenerateOptions::default()).unwrap_err();
        match &err {
            MasterError::GeneratedSchemaInvalid { dataset, source } => {
                assert_eq!(dataset, "Blank");
                assert!(matches!(source, ModelError::EmptyFieldName { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().starts_with("generated master schema for Blank is invalid"));
    }

    #[test]
    fn empty_source_is_rejected() {
        let err = generate_master("Empty", &[], &GenerateOptions::default()).unwrap_err();
        assert!(matches!(err, MasterError::EmptySource { .. }));
    }
}
