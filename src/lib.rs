//! scriptfn – expose script functions as typed provider functions
//!
//! This crate bridges a dynamic script runtime and a schema-typed wire
//! protocol:
//! - Typed wire values with structural types and two transport encodings
//! - Type-tag driven transcription of wire values into script values
//! - Inference of wire types from untyped script results, with collection
//!   type unification
//! - A function provider that compiles a script once and runs every call in
//!   a fresh evaluation context
//! - An NDJSON service and CLI for driving the provider

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Conversion between script values and wire values
pub mod marshal;
/// Provider boundary: configuration, discovery, call dispatch
pub mod provider;
/// Embedded script runtime
pub mod script;
/// NDJSON service front end
pub mod service;
/// Typed wire values and encodings
pub mod wire;

// Re-export key types for convenience
pub use provider::{FunctionProvider, ProviderConfig};
pub use wire::{DynamicValue, Type, Value};

/// Current version of scriptfn
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
