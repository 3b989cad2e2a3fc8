//! Dataset-shaped lookup structures built from canonical records.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::Record;

/// Key of a cache index level, rendered from a JSON scalar.
pub type IndexKey = String;

/// Renders a JSON scalar as an index key.
///
/// Integral numbers render without a fractional part so `10000002` and
/// `10000002.0` address the same entry. Arrays, objects and null have no key.
pub fn index_key(value: &Value) -> Option<IndexKey> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().map(|f| {
                    if f.fract() == 0.0 && f.abs() < 9.0e15 {
                        format!("{}", f as i64)
                    } else {
                        f.to_string()
                    }
                })
            }
        }
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Final lookup structure of one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", content = "entries", rename_all = "snake_case")]
pub enum CacheIndex {
    /// `id -> record`
    Direct(BTreeMap<IndexKey, Record>),
    /// `curve type -> level -> value`
    Curve(BTreeMap<IndexKey, BTreeMap<IndexKey, Value>>),
    /// `parent id -> rank -> record`
    Nested(BTreeMap<IndexKey, BTreeMap<IndexKey, Record>>),
}

impl CacheIndex {
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Direct(_) => "direct",
            Self::Curve(_) => "curve",
            Self::Nested(_) => "nested",
        }
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        match self {
            Self::Direct(map) => map.len(),
            Self::Curve(map) => map.len(),
            Self::Nested(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn direct(&self, id: &str) -> Option<&Record> {
        match self {
            Self::Direct(map) => map.get(id),
            _ => None,
        }
    }

    pub fn curve(&self, curve_type: &str) -> Option<&BTreeMap<IndexKey, Value>> {
        match self {
            Self::Curve(map) => map.get(curve_type),
            _ => None,
        }
    }

    pub fn curve_value(&self, curve_type: &str, level: &str) -> Option<&Value> {
        self.curve(curve_type).and_then(|levels| levels.get(level))
    }

    pub fn nested(&self, parent: &str, rank: &str) -> Option<&Record> {
        match self {
            Self::Nested(map) => map.get(parent).and_then(|ranks| ranks.get(rank)),
            _ => None,
        }
    }
}
