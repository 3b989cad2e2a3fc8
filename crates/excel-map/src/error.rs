//! Decode error taxonomy.
//!
//! None of these are retryable: a bad schema match does not improve by
//! running it again. Every variant names the dataset; dump and master paths
//! are attached when the decode was driven from files.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use excel_ingest::IngestError;
use excel_master::MasterError;

/// An obfuscated key that was considered for an unresolved field and rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedKey {
    pub key: String,
    /// Best-scoring unresolved field for this key, if any scored above zero.
    pub best_field: Option<String>,
    pub score: f64,
}

impl fmt::Display for RejectedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.best_field {
            Some(field) => write!(f, "{} (best {field} @ {:.2})", self.key, self.score),
            None => write!(f, "{} (no candidate)", self.key),
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{dataset}: no master schema at {path}")]
    MasterNotFound { dataset: String, path: PathBuf },

    #[error("{dataset}: master schema unusable: {source}")]
    MasterInvalid {
        dataset: String,
        #[source]
        source: MasterError,
    },

    #[error("{dataset}: malformed dump {path}: {reason}")]
    MalformedInput {
        dataset: String,
        path: PathBuf,
        reason: String,
    },

    #[error("{dataset}: cannot read dump: {source}")]
    DumpUnreadable {
        dataset: String,
        #[source]
        source: IngestError,
    },

    #[error(
        "{dataset}: structural pattern mismatch (confidence {achieved:.3} < {floor:.2}){}",
        at(.dump_path)
    )]
    PatternMismatch {
        dataset: String,
        achieved: f64,
        floor: f64,
        dump_path: Option<PathBuf>,
    },

    #[error(
        "{dataset}: low confidence {achieved:.3} (required {required:.2}){}",
        at(.dump_path)
    )]
    LowConfidence {
        dataset: String,
        achieved: f64,
        required: f64,
        dump_path: Option<PathBuf>,
    },

    #[error(
        "{dataset}: unresolved required fields [{}] (confidence {achieved:.3}); rejected keys: [{}]{}",
        .unresolved.join(", "),
        join_rejected(.rejected),
        at(.dump_path)
    )]
    KeyMatchingFailed {
        dataset: String,
        unresolved: Vec<String>,
        rejected: Vec<RejectedKey>,
        achieved: f64,
        dump_path: Option<PathBuf>,
    },
}

/// Coarse classification for callers that branch on the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeErrorKind {
    MasterNotFound,
    Configuration,
    MalformedInput,
    PatternMismatch,
    LowConfidence,
    KeyMatchingFailed,
}

impl DecodeErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MasterNotFound => "master not found",
            Self::Configuration => "configuration",
            Self::MalformedInput => "malformed input",
            Self::PatternMismatch => "pattern mismatch",
            Self::LowConfidence => "low confidence",
            Self::KeyMatchingFailed => "key matching failed",
        }
    }
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DecodeError {
    /// Maps a master store failure onto the decode taxonomy.
    pub fn from_master(dataset: &str, error: MasterError) -> Self {
        match error {
            MasterError::NotFound { dataset, path } => Self::MasterNotFound { dataset, path },
            other => Self::MasterInvalid {
                dataset: dataset.to_string(),
                source: other,
            },
        }
    }

    /// Maps a dump loading failure onto the decode taxonomy.
    pub fn from_ingest(dataset: &str, error: IngestError) -> Self {
        match error {
            IngestError::MalformedInput { path, reason } => Self::MalformedInput {
                dataset: dataset.to_string(),
                path,
                reason,
            },
            other => Self::DumpUnreadable {
                dataset: dataset.to_string(),
                source: other,
            },
        }
    }

    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            Self::MasterNotFound { .. } => DecodeErrorKind::MasterNotFound,
            Self::MasterInvalid { .. } | Self::DumpUnreadable { .. } => {
                DecodeErrorKind::Configuration
            }
            Self::MalformedInput { .. } => DecodeErrorKind::MalformedInput,
            Self::PatternMismatch { .. } => DecodeErrorKind::PatternMismatch,
            Self::LowConfidence { .. } => DecodeErrorKind::LowConfidence,
            Self::KeyMatchingFailed { .. } => DecodeErrorKind::KeyMatchingFailed,
        }
    }

    pub fn dataset(&self) -> &str {
        match self {
            Self::MasterNotFound { dataset, .. }
            | Self::MasterInvalid { dataset, .. }
            | Self::MalformedInput { dataset, .. }
            | Self::DumpUnreadable { dataset, .. }
            | Self::PatternMismatch { dataset, .. }
            | Self::LowConfidence { dataset, .. }
            | Self::KeyMatchingFailed { dataset, .. } => dataset,
        }
    }

    /// Always false.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Achieved confidence, for the confidence-gate failures.
    pub fn achieved_confidence(&self) -> Option<f64> {
        match self {
            Self::PatternMismatch { achieved, .. }
            | Self::LowConfidence { achieved, .. }
            | Self::KeyMatchingFailed { achieved, .. } => Some(*achieved),
            _ => None,
        }
    }
}

fn at(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" [{}]", path.display()),
        None => String::new(),
    }
}

fn join_rejected(rejected: &[RejectedKey]) -> String {
    rejected
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
