//! Error types for the provider boundary.
//!
//! Request-level errors ([`ProviderError`]) reject the request outright.
//! Everything that can go wrong inside a call of a known procedure is a
//! [`CallError`], reported back as a [`super::FunctionError`].

use thiserror::Error;

use crate::marshal::InferError;
use crate::script::ScriptError;
use crate::wire::WireError;

/// Request-level provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No configured procedure has this name
    #[error("unknown function {0}")]
    UnknownFunction(String),
}

/// Configuration decoding errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration payload could not be decoded
    #[error("{0}")]
    Decode(#[from] WireError),

    /// A required attribute is missing or null
    #[error("Missing required configuration value '{0}'")]
    MissingRequired(String),
}

/// Failures inside a call of a known procedure
#[derive(Debug, Error)]
pub enum CallError {
    /// An argument could not be decoded
    #[error("Error marshaling argument #{index}: {source}")]
    Argument {
        /// Zero-based argument position
        index: usize,
        /// Underlying decode error
        #[source]
        source: WireError,
    },

    /// The script failed while running
    #[error("Error calling {function}(): {source}")]
    Execution {
        /// Procedure name
        function: String,
        /// Underlying script error
        #[source]
        source: ScriptError,
    },

    /// The script produced no value
    #[error("Result is undefined (probably there was an error)")]
    Undefined,

    /// The script's result could not be converted to a wire value
    #[error("Error unmarshaling result: {0}")]
    Result(#[from] InferError),

    /// The converted result could not be encoded
    #[error("Error wrapping result value: {0}")]
    Encode(#[source] WireError),
}

impl CallError {
    /// Index of the argument this error blames, if any.
    pub fn argument_index(&self) -> Option<usize> {
        match self {
            CallError::Argument { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Convenience result alias for provider requests
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
