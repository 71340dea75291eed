//! Hard construction errors.
//!
//! Everything else about a malformed spec is normalized (see `spec.rs`); only
//! identity-defining fields have no sane default.

/// Error raised when a creature document cannot identify the creature it describes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpecError {
    #[error("creature spec is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("creature spec `{id}` has a non-finite seed")]
    NonFiniteSeed { id: String },
}
