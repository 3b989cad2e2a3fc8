//! Obfuscated key to canonical field mapping.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MappingError;

/// How a key mapping was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    /// Known-plaintext match against a reference entity.
    Anchor,
    /// Fingerprint similarity.
    Structural,
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anchor => f.write_str("anchor"),
            Self::Structural => f.write_str("structural"),
        }
    }
}

/// One resolved key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyAssignment {
    pub obfuscated_key: String,
    pub canonical_name: String,
    /// Confidence score (0.0 to 1.0) for this assignment.
    pub confidence: f64,
    pub method: MatchMethod,
}

/// Injective mapping from obfuscated keys to canonical field names.
///
/// Both directions are indexed; an insert that would map a key or a field
/// twice is refused.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeyMapping {
    by_key: BTreeMap<String, KeyAssignment>,
    #[serde(skip)]
    by_canonical: BTreeMap<String, String>,
}

impl KeyMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, assignment: KeyAssignment) -> Result<(), MappingError> {
        if let Some(existing) = self.by_key.get(&assignment.obfuscated_key) {
            return Err(MappingError::KeyAlreadyClaimed {
                key: assignment.obfuscated_key,
                canonical: existing.canonical_name.clone(),
            });
        }
        if let Some(key) = self.by_canonical.get(&assignment.canonical_name) {
            return Err(MappingError::FieldAlreadyResolved {
                canonical: assignment.canonical_name,
                key: key.clone(),
            });
        }
        self.by_canonical.insert(
            assignment.canonical_name.clone(),
            assignment.obfuscated_key.clone(),
        );
        self.by_key
            .insert(assignment.obfuscated_key.clone(), assignment);
        Ok(())
    }

    pub fn canonical_for(&self, obfuscated_key: &str) -> Option<&str> {
        self.by_key
            .get(obfuscated_key)
            .map(|a| a.canonical_name.as_str())
    }

    pub fn key_for(&self, canonical_name: &str) -> Option<&str> {
        self.by_canonical.get(canonical_name).map(String::as_str)
    }

    pub fn assignment_for(&self, canonical_name: &str) -> Option<&KeyAssignment> {
        self.key_for(canonical_name)
            .and_then(|key| self.by_key.get(key))
    }

    pub fn is_key_claimed(&self, obfuscated_key: &str) -> bool {
        self.by_key.contains_key(obfuscated_key)
    }

    pub fn is_resolved(&self, canonical_name: &str) -> bool {
        self.by_canonical.contains_key(canonical_name)
    }

    /// Assignments ordered by obfuscated key.
    pub fn iter(&self) -> impl Iterator<Item = &KeyAssignment> {
        self.by_key.values()
    }

    pub fn count_by_method(&self, method: MatchMethod) -> usize {
        self.by_key.values().filter(|a| a.method == method).count()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
