//! Master directory path resolution.

use std::path::{Path, PathBuf};

/// Environment variable for overriding the master directory.
pub const MASTER_DIR_ENV_VAR: &str = "EXCEL_MASTER_DIR";

/// Suffix of master schema files.
pub const MASTER_SUFFIX: &str = ".master.json";

/// Get the master directory.
///
/// Resolution order:
/// 1. `EXCEL_MASTER_DIR` environment variable
/// 2. `masterFiles/` relative to the working directory
pub fn default_master_dir() -> PathBuf {
    if let Ok(root) = std::env::var(MASTER_DIR_ENV_VAR) {
        return PathBuf::from(root);
    }
    PathBuf::from("masterFiles")
}

/// `AvatarExcelConfigData` -> `AvatarExcelConfigData.master.json`
pub fn master_file_name(dataset: &str) -> String {
    format!("{}{MASTER_SUFFIX}", dataset.trim())
}

/// Dataset name of a master file path, if it carries the master suffix.
pub fn dataset_from_master_path(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let dataset = name.strip_suffix(MASTER_SUFFIX)?;
    if dataset.is_empty() {
        None
    } else {
        Some(dataset.to_string())
    }
}
