//! Dump file discovery.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};

/// File extension of dump files.
pub const DUMP_EXTENSION: &str = "json";

/// Dataset name of a dump path (`AvatarExcelConfigData.json` -> `AvatarExcelConfigData`).
pub fn dataset_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?.trim();
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

/// Lists dump files in a directory, keyed by dataset name.
pub fn list_dump_files(dir: &Path) -> Result<BTreeMap<String, PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = BTreeMap::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();

        // Skip directories
        if !path.is_file() {
            continue;
        }

        // Check for .json extension (case-insensitive)
        let is_dump = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(DUMP_EXTENSION));
        if !is_dump {
            continue;
        }

        if let Some(name) = dataset_name(&path) {
            files.insert(name, path);
        }
    }

    Ok(files)
}
