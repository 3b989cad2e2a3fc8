use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("duplicate canonical field '{field}' in master schema for {dataset}")]
    DuplicateField { dataset: String, field: String },
    #[error("empty canonical field name in master schema for {dataset}")]
    EmptyFieldName { dataset: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors from inserting into a [`crate::KeyMapping`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// Obfuscated key already mapped to another canonical field.
    #[error("key '{key}' already mapped to '{canonical}'")]
    KeyAlreadyClaimed { key: String, canonical: String },
    /// Canonical field already has an obfuscated key.
    #[error("field '{canonical}' already mapped from '{key}'")]
    FieldAlreadyResolved { canonical: String, key: String },
}
