//! Options controlling a decode run.

use excel_ingest::FingerprintOptions;

use crate::confidence::ConfidenceThresholds;

/// Default minimum similarity for a structural assignment.
pub const DEFAULT_STRUCTURAL_FLOOR: f64 = 0.6;

/// Default number of rejected keys carried by a key matching failure.
pub const DEFAULT_REJECTED_SAMPLE: usize = 8;

#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    pub thresholds: ConfidenceThresholds,
    /// Accept decodes between the pattern-mismatch floor and the acceptance
    /// threshold, surfacing the unmatched fields instead of failing.
    pub accept_partial: bool,
    /// Per-field minimum similarity; weaker candidates stay unmatched.
    pub structural_floor: f64,
    pub fingerprint: FingerprintOptions,
    /// Cap on rejected keys reported in a key matching failure.
    pub rejected_sample: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            thresholds: ConfidenceThresholds::default(),
            accept_partial: false,
            structural_floor: DEFAULT_STRUCTURAL_FLOOR,
            fingerprint: FingerprintOptions::default(),
            rejected_sample: DEFAULT_REJECTED_SAMPLE,
        }
    }
}

impl DecodeOptions {
    #[must_use]
    pub fn with_accept_partial(mut self, enable: bool) -> Self {
        self.accept_partial = enable;
        self
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: ConfidenceThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    #[must_use]
    pub fn with_structural_floor(mut self, floor: f64) -> Self {
        self.structural_floor = floor;
        self
    }
}
