#![deny(unsafe_code)]

pub mod cache;
pub mod decode;
pub mod error;
pub mod fingerprint;
pub mod mapping;
pub mod schema;

pub use cache::{CacheIndex, IndexKey, index_key};
pub use decode::DecodeResult;
pub use error::{MappingError, ModelError, Result};
pub use fingerprint::{FieldFingerprint, ValueRange};
pub use mapping::{KeyAssignment, KeyMapping, MatchMethod};
pub use schema::{FieldDescriptor, MasterSchema, ValueKind};

/// One JSON object from a dump, keyed by (obfuscated or canonical) field name.
pub type Record = serde_json::Map<String, serde_json::Value>;
