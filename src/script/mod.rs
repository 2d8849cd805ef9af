//! Embedded script runtime.
//!
//! A script is compiled once into a [`ScriptProgram`]; the program is shared
//! read-only and every call runs in a fresh scope. Uppercase-initial public
//! functions are exposed as procedures through a [`FunctionTable`].

/// Procedure discovery over compiled programs.
pub mod discover;
/// Compiled programs and per-call evaluation.
pub mod program;

pub use discover::{FunctionTable, discover_functions, procedure_name};
pub use program::ScriptProgram;

use rhai::{EvalAltResult, ParseError};
use thiserror::Error;

/// Convenience result alias for script operations.
pub type ScriptResult<T> = std::result::Result<T, ScriptError>;

/// Errors raised by the script runtime.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The source text failed to compile.
    #[error("{0}")]
    Compile(#[source] ParseError),

    /// Top-level statements failed while evaluating the program.
    #[error("{0}")]
    Evaluate(#[source] Box<EvalAltResult>),

    /// A function call failed.
    #[error("{0}")]
    Call(#[source] Box<EvalAltResult>),
}
