use std::path::PathBuf;

use thiserror::Error;

use excel_ingest::IngestError;
use excel_master::MasterError;

/// Failures that stop a whole load, as opposed to one dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(
        "invalid thresholds: need 0 <= pattern_mismatch_floor ({floor}) <= acceptance_threshold ({acceptance}) <= 1"
    )]
    InvalidThresholds { acceptance: f64, floor: f64 },

    #[error("invalid structural_floor {value}: must be within [0, 1]")]
    InvalidStructuralFloor { value: f64 },

    #[error("cannot list dumps: {source}")]
    DumpDiscovery {
        #[source]
        source: IngestError,
    },

    #[error("cannot list master schemas: {source}")]
    MasterDiscovery {
        #[source]
        source: MasterError,
    },
}

pub type Result<T> = std::result::Result<T, LoadError>;
