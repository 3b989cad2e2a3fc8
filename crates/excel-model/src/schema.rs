//! Master schema types.
//!
//! A master schema is the canonical description of one dataset's fields,
//! captured once from a trusted (already decoded) dump. Each descriptor
//! carries the structural profile the field had in that dump so a freshly
//! obfuscated dump can be matched against it.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, Result};
use crate::fingerprint::{FieldFingerprint, ValueRange};

/// JSON value kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Object,
    Array,
    Number,
    String,
    Bool,
    Null,
}

impl ValueKind {
    /// Returns the kind of a JSON value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Array,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Bool(_) => Self::Bool,
            Value::Null => Self::Null,
        }
    }

    /// Scalar kinds take part in uniqueness detection.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Number | Self::String | Self::Bool)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::Number => "number",
            Self::String => "string",
            Self::Bool => "bool",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of one canonical field in a master schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub canonical_name: String,
    pub value_kind: ValueKind,
    /// Required fields count toward decode confidence.
    #[serde(default = "default_required")]
    pub required: bool,
    /// Human-readable note on the anchor that resolves this field, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_hint: Option<String>,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub is_nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_range: Option<ValueRange>,
    /// String length, array length or object member count range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnitude_range: Option<ValueRange>,
    /// Fields of nested objects (for `object` fields and arrays of objects).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FieldDescriptor>,
}

fn default_required() -> bool {
    true
}

impl FieldDescriptor {
    /// Creates a required descriptor with an empty structural profile.
    pub fn new(canonical_name: impl Into<String>, value_kind: ValueKind) -> Self {
        Self {
            canonical_name: canonical_name.into(),
            value_kind,
            required: true,
            anchor_hint: None,
            is_unique: false,
            is_nullable: false,
            numeric_range: None,
            magnitude_range: None,
            children: Vec::new(),
        }
    }

    /// Builds a descriptor from a fingerprint observed in a trusted dump.
    pub fn from_fingerprint(canonical_name: impl Into<String>, fp: &FieldFingerprint) -> Self {
        Self {
            canonical_name: canonical_name.into(),
            value_kind: fp.value_kind,
            required: !fp.is_nullable && fp.value_kind != ValueKind::Null,
            anchor_hint: None,
            is_unique: fp.is_unique,
            is_nullable: fp.is_nullable,
            numeric_range: fp.numeric_range,
            magnitude_range: fp.magnitude_range,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    #[must_use]
    pub fn with_numeric_range(mut self, min: f64, max: f64) -> Self {
        self.numeric_range = Some(ValueRange::new(min, max));
        self
    }

    #[must_use]
    pub fn with_magnitude_range(mut self, min: f64, max: f64) -> Self {
        self.magnitude_range = Some(ValueRange::new(min, max));
        self
    }

    #[must_use]
    pub fn with_anchor_hint(mut self, hint: impl Into<String>) -> Self {
        self.anchor_hint = Some(hint.into());
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<FieldDescriptor>) -> Self {
        self.children = children;
        self
    }

    /// The fingerprint this field is expected to have in a fresh dump.
    pub fn fingerprint(&self) -> FieldFingerprint {
        FieldFingerprint {
            value_kind: self.value_kind,
            ambiguous: false,
            is_unique: self.is_unique,
            is_nullable: self.is_nullable,
            presence: if self.is_nullable { 0.0 } else { 1.0 },
            numeric_range: self.numeric_range,
            magnitude_range: self.magnitude_range,
        }
    }

    /// True when nested records of this field should be decoded.
    pub fn has_nested_fields(&self) -> bool {
        !self.children.is_empty()
            && matches!(self.value_kind, ValueKind::Object | ValueKind::Array)
    }
}

/// Canonical schema of one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MasterSchema {
    pub dataset: String,
    fields: Vec<FieldDescriptor>,
}

impl MasterSchema {
    /// Creates a schema, rejecting duplicate or empty canonical names at any nesting level.
    pub fn new(dataset: impl Into<String>, fields: Vec<FieldDescriptor>) -> Result<Self> {
        let dataset = dataset.into();
        validate_fields(&dataset, &fields)?;
        Ok(Self { dataset, fields })
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<FieldDescriptor> {
        self.fields
    }

    pub fn field(&self, canonical_name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|f| f.canonical_name == canonical_name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.required)
    }

    pub fn required_count(&self) -> usize {
        self.required_fields().count()
    }

    /// Required fields at every decoded nesting level.
    pub fn required_count_recursive(&self) -> usize {
        count_required(&self.fields)
    }

    pub fn canonical_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .map(|f| f.canonical_name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn count_required(fields: &[FieldDescriptor]) -> usize {
    fields
        .iter()
        .map(|f| {
            let nested = if f.has_nested_fields() {
                count_required(&f.children)
            } else {
                0
            };
            usize::from(f.required) + nested
        })
        .sum()
}

fn validate_fields(dataset: &str, fields: &[FieldDescriptor]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for field in fields {
        let name = field.canonical_name.trim();
        if name.is_empty() {
            return Err(ModelError::EmptyFieldName {
                dataset: dataset.to_string(),
            });
        }
        if !seen.insert(name) {
            return Err(ModelError::DuplicateField {
                dataset: dataset.to_string(),
                field: name.to_string(),
            });
        }
        validate_fields(dataset, &field.children)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_kind_of_json() {
        assert_eq!(ValueKind::of(&json!(1)), ValueKind::Number);
        assert_eq!(ValueKind::of(&json!("a")), ValueKind::String);
        assert_eq!(ValueKind::of(&json!([1])), ValueKind::Array);
        assert_eq!(ValueKind::of(&json!({})), ValueKind::Object);
        assert_eq!(ValueKind::of(&json!(null)), ValueKind::Null);
        assert!(ValueKind::Bool.is_scalar());
        assert!(!ValueKind::Array.is_scalar());
    }

    #[test]
    fn rejects_duplicate_canonical_names() {
        let err = MasterSchema::new(
            "AvatarExcelConfigData",
            vec![
                FieldDescriptor::new("id", ValueKind::Number),
                FieldDescriptor::new("id", ValueKind::String),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ModelError::DuplicateField {
                dataset: "AvatarExcelConfigData".to_string(),
                field: "id".to_string(),
            }
        );
    }

    #[test]
    fn recursive_required_count_includes_decoded_children() {
        let schema = MasterSchema::new(
            "WeaponExcelConfigData",
            vec![
                FieldDescriptor::new("id", ValueKind::Number),
                FieldDescriptor::new("note", ValueKind::String).optional(),
                FieldDescriptor::new("stats", ValueKind::Array).with_children(vec![
                    FieldDescriptor::new("p", ValueKind::Number),
                    FieldDescriptor::new("q", ValueKind::Number).optional(),
                ]),
            ],
        )
        .unwrap();
        assert_eq!(schema.required_count(), 2);
        assert_eq!(schema.required_count_recursive(), 3);
    }

    #[test]
    fn rejects_duplicate_child_names() {
        let parent = FieldDescriptor::new("curveInfos", ValueKind::Array).with_children(vec![
            FieldDescriptor::new("type", ValueKind::String),
            FieldDescriptor::new("type", ValueKind::String),
        ]);
        assert!(MasterSchema::new("Curve", vec![parent]).is_err());
    }

    #[test]
    fn required_defaults_to_true_when_absent() {
        let field: FieldDescriptor =
            serde_json::from_str(r#"{"canonical_name":"id","value_kind":"number"}"#).unwrap();
        assert!(field.required);
        assert!(field.children.is_empty());
    }
}
