//! Structural fingerprints of dump fields.

use serde::{Deserialize, Serialize};

use crate::schema::ValueKind;

/// Closed numeric interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn point(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Widens the range to include `value`.
    pub fn include(&mut self, value: f64) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Intersection over union of two intervals, in `[0, 1]`.
    ///
    /// Degenerate intervals (single points) score 1.0 against an equal point
    /// and 0.5 when they fall inside the other interval.
    pub fn overlap(&self, other: &ValueRange) -> f64 {
        let lo = self.min.max(other.min);
        let hi = self.max.min(other.max);
        if hi < lo {
            return 0.0;
        }
        let union = self.max.max(other.max) - self.min.min(other.min);
        if union <= 0.0 {
            return 1.0;
        }
        let intersection = hi - lo;
        if intersection <= 0.0 {
            return 0.5;
        }
        (intersection / union).clamp(0.0, 1.0)
    }
}

/// Structural summary of one key across all records of a dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFingerprint {
    /// Dominant non-null kind ([`ValueKind::Null`] when no value was ever present).
    pub value_kind: ValueKind,
    /// More than one non-null kind was observed.
    pub ambiguous: bool,
    /// No duplicate scalar value within the uniqueness sample.
    pub is_unique: bool,
    /// At least one record holds null or lacks the key.
    pub is_nullable: bool,
    /// Fraction of records holding a non-null value.
    pub presence: f64,
    pub numeric_range: Option<ValueRange>,
    /// String length, array length or object member count range.
    pub magnitude_range: Option<ValueRange>,
}

impl FieldFingerprint {
    /// Fingerprint of a key that never held a value.
    pub fn empty() -> Self {
        Self {
            value_kind: ValueKind::Null,
            ambiguous: false,
            is_unique: false,
            is_nullable: true,
            presence: 0.0,
            numeric_range: None,
            magnitude_range: None,
        }
    }

    /// Ambiguous and all-null keys never take part in structural matching.
    pub fn is_structural_candidate(&self) -> bool {
        !self.ambiguous && self.value_kind != ValueKind::Null
    }

    /// The range compared during structural matching for this kind.
    pub fn comparable_range(&self) -> Option<ValueRange> {
        match self.value_kind {
            ValueKind::Number => self.numeric_range,
            _ => self.magnitude_range,
        }
    }
}
