#![deny(unsafe_code)]

pub mod anchor;
pub mod confidence;
pub mod engine;
pub mod error;
pub mod options;
pub mod rename;
pub mod score;
pub mod structural;

pub use crate::anchor::{Anchor, AnchorOutcome, AnchorStatus, AnchorTable, Locator, resolve_anchors};
pub use crate::confidence::{
    ConfidenceOutcome, ConfidenceThresholds, Evaluation, FieldOutcome, evaluate,
};
pub use crate::engine::{DecodePlan, Decoder};
pub use crate::error::{DecodeError, DecodeErrorKind, RejectedKey};
pub use crate::options::DecodeOptions;
pub use crate::rename::{MappingTree, rename_records};
pub use crate::score::similarity;
pub use crate::structural::{StructuralReport, match_structural};
