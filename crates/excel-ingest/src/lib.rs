#![deny(unsafe_code)]

pub mod discovery;
pub mod dump;
pub mod error;
pub mod fingerprint;
pub mod hash;

pub use discovery::{DUMP_EXTENSION, dataset_name, list_dump_files};
pub use dump::{Dump, parse_dump, read_dump};
pub use error::{IngestError, Result};
pub use fingerprint::{
    DEFAULT_UNIQUENESS_SAMPLE, FingerprintOptions, fingerprint_records, nested_records,
};
pub use hash::sha256_hex;
