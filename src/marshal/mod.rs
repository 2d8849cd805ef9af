//! Conversion between script values and typed wire values.
//!
//! Wire → script is a direct transcription driven by the wire type tag.
//! Script → wire has no type to go on and infers one from the value's shape,
//! using [`unify`] to pick uniform or heterogeneous containers.

/// Script → wire inference.
pub mod infer;
/// Wire → script transcription.
pub mod transcribe;
/// Collection type unification.
pub mod unify;

pub use infer::{infer, infer_json};
pub use transcribe::{to_script, to_script_args};
pub use unify::{Unified, keyed_type, sequence_type, unify_keyed, unify_sequence};

use thiserror::Error;

/// Convenience result alias for inference.
pub type InferResult<T> = std::result::Result<T, InferError>;

/// Errors raised while inferring a wire value from a script value.
#[derive(Debug, Error)]
pub enum InferError {
    /// The script value could not be rendered as JSON.
    #[error("Error marshaling script value to json: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The rendered JSON could not be decoded into a wire value.
    #[error("Error unmarshaling json to wire value: {0}")]
    Decode(#[source] serde_json::Error),
}
