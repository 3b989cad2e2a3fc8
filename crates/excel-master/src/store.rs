//! Master schema store.
//!
//! Each dataset's master schema is one pretty-printed JSON file holding an
//! array of field descriptors:
//! `{master_dir}/{dataset}.master.json`
//!
//! Masters are regenerated only by the offline generation workflow. A save
//! without `force` never overwrites an existing file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use excel_model::{FieldDescriptor, MasterSchema};

use crate::error::{MasterError, Result};
use crate::paths::{dataset_from_master_path, default_master_dir, master_file_name};
use crate::write::WriteLock;

/// Result of [`MasterStore::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Written(PathBuf),
    /// A master already existed and `force` was not set.
    SkippedExisting(PathBuf),
}

impl SaveOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Written(path) | Self::SkippedExisting(path) => path,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written(_))
    }
}

/// Directory-backed store of master schemas.
#[derive(Debug, Clone)]
pub struct MasterStore {
    base_dir: PathBuf,
}

impl Default for MasterStore {
    fn default() -> Self {
        Self::new(default_master_dir())
    }
}

impl MasterStore {
    /// Creates a store rooted at `base_dir`. The directory is created on first save.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the master file for a dataset.
    pub fn path_for(&self, dataset: &str) -> PathBuf {
        self.base_dir.join(master_file_name(dataset))
    }

    pub fn exists(&self, dataset: &str) -> bool {
        self.path_for(dataset).is_file()
    }

    /// Loads a dataset's master schema.
    ///
    /// Fails with [`MasterError::NotFound`] when no master exists and with
    /// [`MasterError::Malformed`] (carrying the file path) when it cannot be parsed.
    pub fn load(&self, dataset: &str) -> Result<MasterSchema> {
        self.try_load(dataset)?.ok_or_else(|| MasterError::NotFound {
            dataset: dataset.to_string(),
            path: self.path_for(dataset),
        })
    }

    /// Like [`Self::load`], returning `None` when no master exists.
    pub fn try_load(&self, dataset: &str) -> Result<Option<MasterSchema>> {
        let path = self.path_for(dataset);
        if !path.is_file() {
            return Ok(None);
        }
        let contents = fs::read(&path).map_err(|e| MasterError::io("read", &path, e))?;
        let fields: Vec<FieldDescriptor> =
            serde_json::from_slice(&contents).map_err(|source| MasterError::Malformed {
                dataset: dataset.to_string(),
                path: path.clone(),
                source,
            })?;
        let schema = MasterSchema::new(dataset, fields)
            .map_err(|source| MasterError::InvalidSchema { path, source })?;
        debug!(dataset, fields = schema.len(), "master schema loaded");
        Ok(Some(schema))
    }

    /// Saves a master schema.
    ///
    /// Without `force`, an existing master is left untouched and
    /// [`SaveOutcome::SkippedExisting`] is returned. The existence check and
    /// the write both happen under the file's write lock.
    pub fn save(&self, schema: &MasterSchema, force: bool) -> Result<SaveOutcome> {
        let path = self.path_for(&schema.dataset);
        let json = serde_json::to_vec_pretty(schema.fields()).map_err(|source| {
            MasterError::Serialization {
                dataset: schema.dataset.clone(),
                source,
            }
        })?;

        let lock = WriteLock::acquire(&path)?;
        if !force && path.is_file() {
            warn!(
                dataset = %schema.dataset,
                path = %path.display(),
                "master exists, not overwriting without force"
            );
            return Ok(SaveOutcome::SkippedExisting(path));
        }
        lock.commit(&json)?;
        info!(
            dataset = %schema.dataset,
            fields = schema.len(),
            path = %path.display(),
            "master schema written"
        );
        Ok(SaveOutcome::Written(path))
    }

    /// Lists datasets that have a master file, sorted by name.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.base_dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.base_dir)
            .map_err(|e| MasterError::io("read directory", &self.base_dir, e))?;
        let mut datasets = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| MasterError::io("read directory", &self.base_dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(dataset) = dataset_from_master_path(&path) {
                datasets.push(dataset);
            }
        }
        datasets.sort();
        Ok(datasets)
    }
}
