use std::collections::BTreeMap;

use serde::Serialize;

use crate::Record;
use crate::mapping::KeyMapping;

/// Outcome of an accepted decode attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodeResult {
    pub dataset: String,
    /// Records with obfuscated keys renamed to canonical names.
    pub canonical_records: Vec<Record>,
    pub mapping: KeyMapping,
    /// Mappings of nested object keys, keyed by canonical parent path.
    pub nested_mappings: BTreeMap<String, KeyMapping>,
    pub overall_confidence: f64,
    /// Canonical fields (required or optional) left without a key.
    pub unmatched_canonical_fields: Vec<String>,
}

impl DecodeResult {
    /// True when every canonical field was resolved.
    pub fn is_complete(&self) -> bool {
        self.unmatched_canonical_fields.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.canonical_records.len()
    }
}
