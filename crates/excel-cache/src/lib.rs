#![deny(unsafe_code)]

pub mod builder;
pub mod config;
pub mod error;
pub mod loader;
pub mod registry;
pub mod strategy;

pub use crate::builder::build_index;
pub use crate::config::{
    CONFIG_FILE_NAME, DUMP_DIR_ENV_VAR, DecoderConfig, default_dump_dir,
};
pub use crate::error::{LoadError, Result};
pub use crate::loader::{DatasetLoader, DatasetOutcome, DatasetSummary, LoadReport, LoadStatus};
pub use crate::registry::{CacheEntry, DecodedCache};
pub use crate::strategy::{IndexingStrategy, RecordFilter, StrategyTable};
