//! Field fingerprints of a dump.
//!
//! Every key seen in at least one record gets a [`FieldFingerprint`]:
//! - Dominant non-null value kind, and whether the kind varies
//! - Whether values look unique (scalars only, bounded sample)
//! - Whether the key is ever null or missing
//! - Numeric range, and a magnitude range (string length, array length,
//!   object member count)
//!
//! The scan is a single pass over all records.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

use excel_model::{FieldFingerprint, Record, ValueKind, ValueRange};

/// Default number of scalar values sampled per key for uniqueness detection.
pub const DEFAULT_UNIQUENESS_SAMPLE: usize = 4096;

/// Options for [`fingerprint_records`].
#[derive(Debug, Clone, Copy)]
pub struct FingerprintOptions {
    /// Maximum number of values per key inspected for duplicates.
    pub uniqueness_sample: usize,
}

impl Default for FingerprintOptions {
    fn default() -> Self {
        Self {
            uniqueness_sample: DEFAULT_UNIQUENESS_SAMPLE,
        }
    }
}

#[derive(Default)]
struct Accumulator {
    kind_counts: BTreeMap<ValueKind, usize>,
    present: usize,
    numeric: Option<ValueRange>,
    magnitude: Option<ValueRange>,
    seen: HashSet<String>,
    sampled: usize,
    duplicate: bool,
}

impl Accumulator {
    fn observe(&mut self, value: &Value, sample_limit: usize) {
        let kind = ValueKind::of(value);
        if kind == ValueKind::Null {
            return;
        }
        self.present += 1;
        *self.kind_counts.entry(kind).or_insert(0) += 1;

        match value {
            Value::Number(n) => {
                if let Some(v) = n.as_f64() {
                    widen(&mut self.numeric, v);
                }
            }
            Value::String(s) => widen(&mut self.magnitude, s.chars().count() as f64),
            Value::Array(items) => widen(&mut self.magnitude, items.len() as f64),
            Value::Object(map) => widen(&mut self.magnitude, map.len() as f64),
            Value::Bool(_) | Value::Null => {}
        }

        if kind.is_scalar() && !self.duplicate && self.sampled < sample_limit {
            self.sampled += 1;
            if !self.seen.insert(value.to_string()) {
                self.duplicate = true;
            }
        }
    }

    fn finish(self, total_records: usize) -> FieldFingerprint {
        if self.present == 0 {
            return FieldFingerprint::empty();
        }
        // Most frequent kind; BTreeMap order breaks ties deterministically.
        let mut value_kind = ValueKind::Null;
        let mut best = 0usize;
        for (kind, count) in &self.kind_counts {
            if *count > best {
                best = *count;
                value_kind = *kind;
            }
        }
        let ambiguous = self.kind_counts.len() > 1;
        let is_unique =
            value_kind.is_scalar() && !ambiguous && !self.duplicate && self.sampled >= 2;
        FieldFingerprint {
            value_kind,
            ambiguous,
            is_unique,
            is_nullable: self.present < total_records,
            presence: self.present as f64 / total_records as f64,
            numeric_range: self.numeric,
            magnitude_range: self.magnitude,
        }
    }
}

fn widen(range: &mut Option<ValueRange>, value: f64) {
    match range {
        Some(r) => r.include(value),
        None => *range = Some(ValueRange::point(value)),
    }
}

/// Computes a fingerprint for every key appearing in at least one record.
pub fn fingerprint_records(
    records: &[Record],
    options: FingerprintOptions,
) -> BTreeMap<String, FieldFingerprint> {
    let mut accumulators: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for record in records {
        for (key, value) in record {
            accumulators
                .entry(key.as_str())
                .or_default()
                .observe(value, options.uniqueness_sample);
        }
    }
    accumulators
        .into_iter()
        .map(|(key, acc)| (key.to_string(), acc.finish(records.len())))
        .collect()
}

/// Collects the objects nested under `key`: the object itself, or every
/// object element of an array.
pub fn nested_records(records: &[Record], key: &str) -> Vec<Record> {
    let mut nested = Vec::new();
    for record in records {
        match record.get(key) {
            Some(Value::Object(map)) => nested.push(map.clone()),
            Some(Value::Array(items)) => {
                for item in items {
                    if let Value::Object(map) = item {
                        nested.push(map.clone());
                    }
                }
            }
            _ => {}
        }
    }
    nested
}
