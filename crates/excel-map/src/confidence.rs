//! Confidence gate.
//!
//! Overall confidence is the fraction of required fields that resolved.
//! Optional fields never lower it, but unmatched optional fields are still
//! reported. The weakest per-field confidence among matched required fields
//! is carried alongside for diagnostics and does not gate the outcome.

use serde::{Deserialize, Serialize};

/// Tolerance for comparisons against the cutoffs.
const EPSILON: f64 = 1e-9;

/// Cutoffs applied to the overall confidence.
///
/// Both cutoffs are inclusive on the accepting side: a score equal to
/// `acceptance` is accepted and a score equal to `pattern_floor` is not a
/// pattern mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceThresholds {
    /// Minimum overall confidence for an unconditional accept (default: 0.8).
    pub acceptance: f64,
    /// Below this the dump is treated as a different structure (default: 0.5).
    pub pattern_floor: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            acceptance: 0.8,
            pattern_floor: 0.5,
        }
    }
}

impl ConfidenceThresholds {
    #[must_use]
    pub fn new(acceptance: f64, pattern_floor: f64) -> Self {
        Self {
            acceptance,
            pattern_floor,
        }
    }

    /// True when `0 <= pattern_floor <= acceptance <= 1`.
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.pattern_floor)
            && (0.0..=1.0).contains(&self.acceptance)
            && self.pattern_floor <= self.acceptance
    }

    /// Classifies an overall confidence.
    #[must_use]
    pub fn classify(&self, overall: f64, accept_partial: bool) -> ConfidenceOutcome {
        if overall + EPSILON >= self.acceptance {
            ConfidenceOutcome::FullMatch
        } else if overall + EPSILON >= self.pattern_floor {
            if accept_partial {
                ConfidenceOutcome::PartialMatch
            } else {
                ConfidenceOutcome::LowConfidence
            }
        } else {
            ConfidenceOutcome::PatternMismatch
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceOutcome {
    /// At or above the acceptance threshold.
    FullMatch,
    /// Between the cutoffs, accepted because partial decodes were allowed.
    PartialMatch,
    /// Between the cutoffs and rejected.
    LowConfidence,
    /// Below the pattern floor.
    PatternMismatch,
}

impl ConfidenceOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::FullMatch | Self::PartialMatch)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullMatch => "full match",
            Self::PartialMatch => "partial match",
            Self::LowConfidence => "low confidence",
            Self::PatternMismatch => "pattern mismatch",
        }
    }
}

/// Resolution state of one canonical field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldOutcome {
    /// Canonical path; nested fields use `parent.child`.
    pub path: String,
    pub required: bool,
    /// Confidence of the assignment, `None` when unmatched.
    pub confidence: Option<f64>,
}

impl FieldOutcome {
    pub fn new(path: impl Into<String>, required: bool, confidence: Option<f64>) -> Self {
        Self {
            path: path.into(),
            required,
            confidence,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.confidence.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub overall: f64,
    /// Matched required fields over required fields (1.0 when none are required).
    pub coverage: f64,
    /// Weakest confidence among matched required fields. Informational only.
    pub weakest: Option<f64>,
    pub required_total: usize,
    pub required_matched: usize,
    /// Every unmatched field, required or optional, in schema order.
    pub unmatched: Vec<String>,
    /// Unmatched required fields, in schema order.
    pub unresolved_required: Vec<String>,
    pub outcome: ConfidenceOutcome,
}

impl Evaluation {
    pub fn is_accepted(&self) -> bool {
        self.outcome.is_accepted()
    }
}

/// Scores a set of field outcomes and classifies the result.
pub fn evaluate(
    fields: &[FieldOutcome],
    thresholds: &ConfidenceThresholds,
    accept_partial: bool,
) -> Evaluation {
    let mut required_total = 0usize;
    let mut required_matched = 0usize;
    let mut weakest: Option<f64> = None;
    let mut unmatched = Vec::new();
    let mut unresolved_required = Vec::new();

    for field in fields {
        if field.required {
            required_total += 1;
        }
        match (field.confidence, field.required) {
            (Some(confidence), true) => {
                required_matched += 1;
                weakest = Some(weakest.map_or(confidence, |w| w.min(confidence)));
            }
            (Some(_), false) => {}
            (None, required) => {
                unmatched.push(field.path.clone());
                if required {
                    unresolved_required.push(field.path.clone());
                }
            }
        }
    }

    let coverage = if required_total == 0 {
        1.0
    } else {
        required_matched as f64 / required_total as f64
    };
    let overall = coverage;
    let outcome = thresholds.classify(overall, accept_partial);

    Evaluation {
        overall,
        coverage,
        weakest,
        required_total,
        required_matched,
        unmatched,
        unresolved_required,
        outcome,
    }
}
