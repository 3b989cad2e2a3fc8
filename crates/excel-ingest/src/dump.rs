//! Dump loading.
//!
//! A dump is an array of JSON objects supplied by the game-data distribution
//! side. It is untrusted: anything other than an array of objects is rejected
//! as malformed before any matching is attempted.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use excel_model::{Record, ValueKind};

use crate::discovery::dataset_name;
use crate::error::{IngestError, Result};
use crate::hash::sha256_hex;

/// A parsed dump file.
#[derive(Debug, Clone)]
pub struct Dump {
    pub dataset: String,
    pub path: PathBuf,
    pub records: Vec<Record>,
    /// SHA-256 of the raw file bytes.
    pub sha256: String,
}

/// Reads and validates a dump file.
pub fn read_dump(path: &Path) -> Result<Dump> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parse_dump(&bytes, path)?;
    let dataset = dataset_name(path).unwrap_or_default();
    debug!(
        dataset = %dataset,
        records = records.len(),
        bytes = bytes.len(),
        "dump loaded"
    );
    Ok(Dump {
        dataset,
        path: path.to_path_buf(),
        records,
        sha256: sha256_hex(&bytes),
    })
}

/// Parses dump bytes into records. `path` is only used for error reporting.
pub fn parse_dump(bytes: &[u8], path: &Path) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| IngestError::malformed(path, format!("invalid JSON: {e}")))?;
    let root_kind = ValueKind::of(&value);
    let Value::Array(items) = value else {
        return Err(IngestError::malformed(
            path,
            format!("expected an array of objects, found {root_kind}"),
        ));
    };
    let mut records = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => records.push(map),
            other => {
                return Err(IngestError::malformed(
                    path,
                    format!("element {idx} is {}, expected object", ValueKind::of(&other)),
                ));
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_array_of_objects() {
        let records = parse_dump(br#"[{"a":1},{"a":2,"b":"x"}]"#, Path::new("t.json")).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("b"), Some(&Value::String("x".to_string())));
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(parse_dump(b"[]", Path::new("t.json")).unwrap().is_empty());
    }

    #[test]
    fn rejects_non_array_root() {
        let err = parse_dump(br#"{"a":1}"#, Path::new("t.json")).unwrap_err();
        assert!(matches!(err, IngestError::MalformedInput { .. }));
        assert!(err.to_string().contains("found object"));
    }

    #[test]
    fn rejects_non_object_element() {
        let err = parse_dump(br#"[{"a":1}, 7]"#, Path::new("t.json")).unwrap_err();
        assert!(err.to_string().contains("element 1 is number"));
    }

    #[test]
    fn rejects_invalid_json() {
        let err = parse_dump(b"[{\"a\":", Path::new("t.json")).unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }
}
