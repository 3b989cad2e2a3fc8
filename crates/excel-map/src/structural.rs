//! Greedy structural matching.
//!
//! Every unresolved master field is scored against every unclaimed,
//! unambiguous dump key. Candidates are taken highest score first; each
//! assignment consumes one field and one key. Ties are broken by master field
//! order, then key name, so the result does not depend on hash order.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use excel_model::{FieldDescriptor, FieldFingerprint, KeyAssignment, KeyMapping, MatchMethod};

use crate::error::RejectedKey;
use crate::score::similarity;

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuralReport {
    /// Canonical fields assigned by this pass, in assignment order.
    pub assigned: Vec<String>,
    /// Keys left unclaimed, sorted by name, with their best unresolved field.
    pub rejected: Vec<RejectedKey>,
}

struct Candidate<'a> {
    field_index: usize,
    field: &'a str,
    key: &'a str,
    score: f64,
}

/// Assigns remaining keys to remaining fields by fingerprint similarity.
///
/// Candidates scoring below `floor` are never assigned.
pub fn match_structural(
    fields: &[FieldDescriptor],
    observed: &BTreeMap<String, FieldFingerprint>,
    mapping: &mut KeyMapping,
    floor: f64,
) -> StructuralReport {
    let open_fields: Vec<(usize, &FieldDescriptor, FieldFingerprint)> = fields
        .iter()
        .enumerate()
        .filter(|(_, field)| !mapping.is_resolved(&field.canonical_name))
        .map(|(idx, field)| (idx, field, field.fingerprint()))
        .collect();
    let open_keys: Vec<(&str, &FieldFingerprint)> = observed
        .iter()
        .filter(|(key, fp)| !mapping.is_key_claimed(key) && fp.is_structural_candidate())
        .map(|(key, fp)| (key.as_str(), fp))
        .collect();

    let mut candidates = Vec::new();
    for (field_index, field, master_fp) in &open_fields {
        for (key, fp) in &open_keys {
            let score = similarity(master_fp, fp);
            if score > 0.0 {
                candidates.push(Candidate {
                    field_index: *field_index,
                    field: field.canonical_name.as_str(),
                    key: *key,
                    score,
                });
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.field_index.cmp(&b.field_index))
            .then(a.key.cmp(b.key))
    });

    let mut assigned = Vec::new();
    let mut taken_fields = BTreeSet::new();
    let mut taken_keys = BTreeSet::new();
    for candidate in &candidates {
        if candidate.score + EPSILON < floor {
            break;
        }
        if taken_fields.contains(candidate.field) || taken_keys.contains(candidate.key) {
            continue;
        }
        let assignment = KeyAssignment {
            obfuscated_key: candidate.key.to_string(),
            canonical_name: candidate.field.to_string(),
            confidence: candidate.score,
            method: MatchMethod::Structural,
        };
        if mapping.insert(assignment).is_err() {
            continue;
        }
        debug!(
            field = candidate.field,
            key = candidate.key,
            confidence = candidate.score,
            method = "structural",
            "key resolved"
        );
        taken_fields.insert(candidate.field);
        taken_keys.insert(candidate.key);
        assigned.push(candidate.field.to_string());
    }

    let rejected = observed
        .keys()
        .filter(|key| !mapping.is_key_claimed(key))
        .map(|key| {
            let best = candidates
                .iter()
                .filter(|c| c.key == key.as_str() && !taken_fields.contains(c.field))
                .max_by(|a, b| {
                    a.score
                        .partial_cmp(&b.score)
                        .unwrap_or(Ordering::Equal)
                        .then(b.field_index.cmp(&a.field_index))
                });
            RejectedKey {
                key: key.clone(),
                best_field: best.map(|c| c.field.to_string()),
                score: best.map_or(0.0, |c| c.score),
            }
        })
        .collect();

    StructuralReport { assigned, rejected }
}

#[cfg(test)]
mod tests {
    use super::*;
    use excel_model::{ValueKind, ValueRange};

    fn fp(kind: ValueKind, unique: bool, range: Option<(f64, f64)>) -> FieldFingerprint {
        let range = range.map(|(a, b)| ValueRange::new(a, b));
        FieldFingerprint {
            value_kind: kind,
            ambiguous: false,
            is_unique: unique,
            is_nullable: false,
            presence: 1.0,
            numeric_range: if kind == ValueKind::Number { range } else { None },
            magnitude_range: if kind == ValueKind::Number { None } else { range },
        }
    }

    #[test]
    fn assigns_best_pairs_first() {
        let fields = vec![
            FieldDescriptor::new("id", ValueKind::Number)
                .unique()
                .with_numeric_range(1.0, 100.0),
            FieldDescriptor::new("level", ValueKind::Number).with_numeric_range(1.0, 90.0),
        ];
        let mut observed = BTreeMap::new();
        observed.insert("A".to_string(), fp(ValueKind::Number, false, Some((1.0, 90.0))));
        observed.insert("B".to_string(), fp(ValueKind::Number, true, Some((1.0, 100.0))));
        let mut mapping = KeyMapping::new();
        let report = match_structural(&fields, &observed, &mut mapping, 0.6);
        assert_eq!(mapping.key_for("id"), Some("B"));
        assert_eq!(mapping.key_for("level"), Some("A"));
        assert_eq!(report.assigned.len(), 2);
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn ties_follow_field_order_then_key_name() {
        let fields = vec![
            FieldDescriptor::new("first", ValueKind::Bool),
            FieldDescriptor::new("second", ValueKind::Bool),
        ];
        let mut observed = BTreeMap::new();
        observed.insert("Y".to_string(), fp(ValueKind::Bool, false, None));
        observed.insert("X".to_string(), fp(ValueKind::Bool, false, None));
        let mut mapping = KeyMapping::new();
        match_structural(&fields, &observed, &mut mapping, 0.6);
        assert_eq!(mapping.key_for("first"), Some("X"));
        assert_eq!(mapping.key_for("second"), Some("Y"));
    }

    #[test]
    fn below_floor_stays_unmatched() {
        let fields = vec![FieldDescriptor::new("name", ValueKind::String).unique()];
        let mut observed = BTreeMap::new();
        let mut weak = fp(ValueKind::String, false, Some((1.0, 3.0)));
        weak.is_nullable = true;
        observed.insert("K".to_string(), weak);
        let mut mapping = KeyMapping::new();
        let report = match_structural(&fields, &observed, &mut mapping, 0.6);
        assert!(mapping.is_empty());
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].best_field.as_deref(), Some("name"));
        assert!((report.rejected[0].score - 0.4).abs() < 1e-12);
    }

    #[test]
    fn skips_resolved_fields_and_claimed_keys() {
        let fields = vec![
            FieldDescriptor::new("a", ValueKind::Bool),
            FieldDescriptor::new("b", ValueKind::Bool),
        ];
        let mut observed = BTreeMap::new();
        observed.insert("P".to_string(), fp(ValueKind::Bool, false, None));
        observed.insert("Q".to_string(), fp(ValueKind::Bool, false, None));
        let mut mapping = KeyMapping::new();
        mapping
            .insert(KeyAssignment {
                obfuscated_key: "P".to_string(),
                canonical_name: "b".to_string(),
                confidence: 1.0,
                method: MatchMethod::Anchor,
            })
            .unwrap();
        match_structural(&fields, &observed, &mut mapping, 0.6);
        assert_eq!(mapping.key_for("a"), Some("Q"));
        assert_eq!(mapping.key_for("b"), Some("P"));
    }
}
