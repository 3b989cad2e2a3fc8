//! Fingerprint similarity.
//!
//! Kinds must agree or the score is zero. Otherwise the score is a weighted
//! sum, out of ten, of:
//! - kind agreement (4)
//! - uniqueness flag agreement (2)
//! - nullability agreement (2)
//! - range overlap (2 x intersection-over-union)
//!
//! Identical fingerprints score exactly 1.0.

use excel_model::FieldFingerprint;

const KIND_WEIGHT: f64 = 4.0;
const UNIQUENESS_WEIGHT: f64 = 2.0;
const NULLABILITY_WEIGHT: f64 = 2.0;
const RANGE_WEIGHT: f64 = 2.0;
const TOTAL_WEIGHT: f64 = KIND_WEIGHT + UNIQUENESS_WEIGHT + NULLABILITY_WEIGHT + RANGE_WEIGHT;

/// Similarity between a master field's stored fingerprint and a dump key's
/// fingerprint, in `[0, 1]`.
pub fn similarity(master: &FieldFingerprint, observed: &FieldFingerprint) -> f64 {
    if master.value_kind != observed.value_kind || !observed.is_structural_candidate() {
        return 0.0;
    }
    let mut score = KIND_WEIGHT;
    if master.is_unique == observed.is_unique {
        score += UNIQUENESS_WEIGHT;
    }
    if master.is_nullable == observed.is_nullable {
        score += NULLABILITY_WEIGHT;
    }
    score += RANGE_WEIGHT * range_overlap(master, observed);
    (score / TOTAL_WEIGHT).clamp(0.0, 1.0)
}

fn range_overlap(master: &FieldFingerprint, observed: &FieldFingerprint) -> f64 {
    match (master.comparable_range(), observed.comparable_range()) {
        (Some(a), Some(b)) => a.overlap(&b),
        (None, None) => 1.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use excel_model::{FieldDescriptor, ValueKind, ValueRange};

    fn observed(kind: ValueKind) -> FieldFingerprint {
        FieldFingerprint {
            value_kind: kind,
            ambiguous: false,
            is_unique: false,
            is_nullable: false,
            presence: 1.0,
            numeric_range: None,
            magnitude_range: None,
        }
    }

    #[test]
    fn identical_fingerprints_score_one() {
        let master = FieldDescriptor::new("id", ValueKind::Number)
            .unique()
            .with_numeric_range(1.0, 3.0)
            .fingerprint();
        let mut fp = observed(ValueKind::Number);
        fp.is_unique = true;
        fp.numeric_range = Some(ValueRange::new(1.0, 3.0));
        assert_eq!(similarity(&master, &fp), 1.0);
    }

    #[test]
    fn kind_mismatch_scores_zero() {
        let master = FieldDescriptor::new("rank", ValueKind::Number).fingerprint();
        assert_eq!(similarity(&master, &observed(ValueKind::String)), 0.0);
        assert_eq!(similarity(&master, &FieldFingerprint::empty()), 0.0);
    }

    #[test]
    fn ambiguous_key_scores_zero() {
        let master = FieldDescriptor::new("rank", ValueKind::Number).fingerprint();
        let mut fp = observed(ValueKind::Number);
        fp.ambiguous = true;
        assert_eq!(similarity(&master, &fp), 0.0);
    }

    #[test]
    fn flag_disagreements_lower_the_score() {
        let master = FieldDescriptor::new("name", ValueKind::String).fingerprint();
        let mut fp = observed(ValueKind::String);
        assert_eq!(similarity(&master, &fp), 1.0);
        fp.is_unique = true;
        assert!((similarity(&master, &fp) - 0.8).abs() < 1e-12);
        fp.is_nullable = true;
        assert!((similarity(&master, &fp) - 0.6).abs() < 1e-12);
        fp.magnitude_range = Some(ValueRange::new(1.0, 4.0));
        assert!((similarity(&master, &fp) - 0.4).abs() < 1e-12);
    }
}
