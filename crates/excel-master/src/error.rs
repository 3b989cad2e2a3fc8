#![deny(unsafe_code)]

use std::path::PathBuf;

use excel_model::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum MasterError {
    #[error("no master schema for {dataset} (expected {path})")]
    NotFound { dataset: String, path: PathBuf },

    #[error("malformed master file {path} for {dataset}: {source}")]
    Malformed {
        dataset: String,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid master schema {path}: {source}")]
    InvalidSchema {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    #[error("generated master schema for {dataset} is invalid: {source}")]
    GeneratedSchemaInvalid {
        dataset: String,
        #[source]
        source: ModelError,
    },

    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move {temp_path} into place at {target_path}: {source}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize master schema for {dataset}: {source}")]
    Serialization {
        dataset: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot generate a master for {dataset}: the source dump has no records")]
    EmptySource { dataset: String },
}

impl MasterError {
    pub(crate) fn io(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, MasterError>;
