//! Decoder configuration.
//!
//! Read from an optional `excel-decoder.toml`:
//!
//! ```toml
//! master_dir = "masterFiles"
//! dump_dir = "cache/ExcelBinOutput"
//! acceptance_threshold = 0.8
//! pattern_mismatch_floor = 0.5
//! accept_partial = false
//! structural_floor = 0.6
//!
//! [[anchors.WeaponExcelConfigData]]
//! field = "id"
//! expected = 11101
//! locate = { by = "value", value = "UI_EquipIcon_Sword_Blunt" }
//!
//! [strategies.ReliquaryExcelConfigData]
//! kind = "direct"
//! id_field = "id"
//! ```
//!
//! `EXCEL_MASTER_DIR` and `EXCEL_DUMP_DIR` override the directories.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use excel_ingest::{DEFAULT_UNIQUENESS_SAMPLE, FingerprintOptions};
use excel_map::options::{DEFAULT_REJECTED_SAMPLE, DEFAULT_STRUCTURAL_FLOOR};
use excel_map::{AnchorTable, ConfidenceThresholds, DecodeOptions};
use excel_master::{MASTER_DIR_ENV_VAR, default_master_dir};

use crate::error::{LoadError, Result};
use crate::strategy::{IndexingStrategy, StrategyTable};

/// Environment variable for overriding the dump directory.
pub const DUMP_DIR_ENV_VAR: &str = "EXCEL_DUMP_DIR";

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "excel-decoder.toml";

/// Get the dump directory.
///
/// Resolution order:
/// 1. `EXCEL_DUMP_DIR` environment variable
/// 2. `cache/ExcelBinOutput/` relative to the working directory
pub fn default_dump_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DUMP_DIR_ENV_VAR) {
        return PathBuf::from(dir);
    }
    PathBuf::from("cache/ExcelBinOutput")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecoderConfig {
    pub master_dir: PathBuf,
    pub dump_dir: PathBuf,
    pub acceptance_threshold: f64,
    pub pattern_mismatch_floor: f64,
    pub accept_partial: bool,
    pub structural_floor: f64,
    pub uniqueness_sample: usize,
    pub rejected_sample: usize,
    /// Extra anchors, appended after the built-in ones.
    pub anchors: AnchorTable,
    /// Strategy entries added to or replacing the built-in ones.
    pub strategies: BTreeMap<String, IndexingStrategy>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        let thresholds = ConfidenceThresholds::default();
        Self {
            master_dir: default_master_dir(),
            dump_dir: default_dump_dir(),
            acceptance_threshold: thresholds.acceptance,
            pattern_mismatch_floor: thresholds.pattern_floor,
            accept_partial: false,
            structural_floor: DEFAULT_STRUCTURAL_FLOOR,
            uniqueness_sample: DEFAULT_UNIQUENESS_SAMPLE,
            rejected_sample: DEFAULT_REJECTED_SAMPLE,
            anchors: AnchorTable::new(),
            strategies: BTreeMap::new(),
        }
    }
}

impl DecoderConfig {
    /// Loads a config file, applies environment overrides and validates.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| LoadError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&contents).map_err(|source| LoadError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.apply_env_overrides();
        config.validate()?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Loads `path` when given, else `excel-decoder.toml` when present, else
    /// the defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let local = Path::new(CONFIG_FILE_NAME);
        if local.is_file() {
            return Self::load(local);
        }
        Ok(Self::default())
    }

    pub fn from_toml_str(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var_os(MASTER_DIR_ENV_VAR).map(PathBuf::from),
            std::env::var_os(DUMP_DIR_ENV_VAR).map(PathBuf::from),
        );
    }

    fn apply_overrides(&mut self, master_dir: Option<PathBuf>, dump_dir: Option<PathBuf>) {
        if let Some(dir) = master_dir {
            self.master_dir = dir;
        }
        if let Some(dir) = dump_dir {
            self.dump_dir = dir;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.thresholds().is_valid() {
            return Err(LoadError::InvalidThresholds {
                acceptance: self.acceptance_threshold,
                floor: self.pattern_mismatch_floor,
            });
        }
        if !(0.0..=1.0).contains(&self.structural_floor) {
            return Err(LoadError::InvalidStructuralFloor {
                value: self.structural_floor,
            });
        }
        Ok(())
    }

    pub fn thresholds(&self) -> ConfidenceThresholds {
        ConfidenceThresholds::new(self.acceptance_threshold, self.pattern_mismatch_floor)
    }

    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            thresholds: self.thresholds(),
            accept_partial: self.accept_partial,
            structural_floor: self.structural_floor,
            fingerprint: FingerprintOptions {
                uniqueness_sample: self.uniqueness_sample,
            },
            rejected_sample: self.rejected_sample,
        }
    }

    /// Built-in anchors followed by the configured ones.
    pub fn anchor_table(&self) -> AnchorTable {
        let mut table = AnchorTable::builtin();
        table.extend(self.anchors.clone());
        table
    }

    /// Built-in strategies with the configured entries applied.
    pub fn strategy_table(&self) -> StrategyTable {
        let mut table = StrategyTable::builtin();
        table.extend(self.strategies.clone());
        table
    }
}
