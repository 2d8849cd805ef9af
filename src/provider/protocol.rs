//! Provider protocol structures exchanged with the host.

use serde::{Deserialize, Serialize};

use crate::wire::{DynamicValue, Type};

/// Capabilities advertised by [`super::FunctionProvider::metadata`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMetadata {
    /// The host may skip fetching the provider schema.
    pub get_provider_schema_optional: bool,
    /// Procedures currently exposed, sorted.
    pub functions: Vec<String>,
    /// Fingerprint of the configured script, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_fingerprint: Option<String>,
}

/// Configuration schema of the provider block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema version.
    pub version: i64,
    /// Block attributes.
    pub attributes: Vec<SchemaAttribute>,
}

/// One attribute of a configuration schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaAttribute {
    /// Attribute name.
    pub name: String,
    /// Attribute type.
    #[serde(rename = "type")]
    pub ty: Type,
    /// Attribute must be set.
    pub required: bool,
    /// Attribute may be omitted.
    pub optional: bool,
    /// Human-readable description.
    pub description: String,
}

/// Severity of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The operation failed.
    Error,
    /// The operation succeeded with a caveat.
    Warning,
}

/// Diagnostic returned from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// One-line summary.
    pub summary: String,
    /// Full detail.
    pub detail: String,
}

impl Diagnostic {
    /// Build an error diagnostic.
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

/// Parameter of a function signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionParameter {
    /// Parameter name.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub ty: Type,
    /// Whether null arguments are passed through to the function.
    pub allow_null_value: bool,
}

/// Signature of an exposed procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSignature {
    /// Positional parameters.
    pub parameters: Vec<FunctionParameter>,
    /// Trailing variadic parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variadic_parameter: Option<FunctionParameter>,
    /// Declared return type.
    pub return_type: Type,
}

impl FunctionSignature {
    /// The signature every script procedure shares: any number of dynamic
    /// arguments in, one dynamic result out.
    pub fn variadic_dynamic() -> Self {
        Self {
            parameters: Vec::new(),
            variadic_parameter: Some(FunctionParameter {
                name: "args".to_string(),
                ty: Type::Dynamic,
                allow_null_value: true,
            }),
            return_type: Type::Dynamic,
        }
    }
}

/// Per-call failure reported inside a successful response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionError {
    /// Error text.
    pub text: String,
    /// Index of the offending argument, when one is to blame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_argument: Option<usize>,
}

/// Response to a call of a known procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallFunctionResponse {
    /// The call produced a result.
    Result(DynamicValue),
    /// The call failed.
    Error(FunctionError),
}

impl CallFunctionResponse {
    /// Result payload, if the call succeeded.
    pub fn result(&self) -> Option<&DynamicValue> {
        match self {
            CallFunctionResponse::Result(value) => Some(value),
            CallFunctionResponse::Error(_) => None,
        }
    }

    /// Error, if the call failed.
    pub fn error(&self) -> Option<&FunctionError> {
        match self {
            CallFunctionResponse::Result(_) => None,
            CallFunctionResponse::Error(err) => Some(err),
        }
    }
}
