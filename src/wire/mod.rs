//! Schema-typed wire values and their transport encodings.
//!
//! The provider protocol transmits every value with a concrete structural
//! type. This module holds that value model plus the two encodings the
//! protocol accepts: MessagePack (binary) and JSON (text).

/// Dynamic value envelope carrying either encoding.
pub mod dynamic;
/// JSON text codec.
pub mod json;
/// MessagePack binary codec.
pub mod msgpack;
/// Structural wire types.
pub mod types;
/// Typed wire values.
pub mod value;

pub use dynamic::DynamicValue;
pub use types::Type;
pub use value::Value;

use thiserror::Error;

/// Convenience result alias for wire operations.
pub type WireResult<T> = std::result::Result<T, WireError>;

/// Errors raised while building, encoding or decoding wire values.
#[derive(Debug, Error)]
pub enum WireError {
    /// A type descriptor could not be understood.
    #[error("invalid type descriptor: {0}")]
    InvalidType(String),

    /// A container element did not match the declared element type.
    #[error("element {index} has type {actual}, expected {expected}")]
    ElementMismatch {
        /// Position (or iteration index for maps) of the offending element.
        index: usize,
        /// Declared element type.
        expected: Type,
        /// Type actually found.
        actual: Type,
    },

    /// The payload did not have the shape the target type requires.
    #[error("expected {expected}, found {found}")]
    Mismatch {
        /// Target type being decoded.
        expected: Type,
        /// Description of what was found instead.
        found: String,
    },

    /// Unknown (not yet computed) values cannot be handled.
    #[error("unknown values are not supported")]
    Unknown,

    /// Both payloads of a dynamic value were empty.
    #[error("dynamic value has neither a msgpack nor a json payload")]
    EmptyPayload,

    /// A value cannot be encoded against the requested type.
    #[error("cannot encode {kind} value as {target}")]
    Unencodable {
        /// Kind of the value being encoded.
        kind: &'static str,
        /// Target type.
        target: Type,
    },

    /// MessagePack framing error.
    #[error("msgpack error: {0}")]
    Msgpack(String),

    /// JSON framing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WireError {
    pub(crate) fn mismatch(expected: &Type, found: impl Into<String>) -> Self {
        WireError::Mismatch {
            expected: expected.clone(),
            found: found.into(),
        }
    }
}
