#![deny(unsafe_code)]

pub mod error;
pub mod generate;
pub mod paths;
pub mod store;
pub mod write;

pub use crate::error::{MasterError, Result};
pub use crate::generate::{GenerateOptions, generate_master};
pub use crate::paths::{MASTER_DIR_ENV_VAR, MASTER_SUFFIX, default_master_dir, master_file_name};
pub use crate::store::{MasterStore, SaveOutcome};
pub use crate::write::WriteLock;
