//! Function provider: the boundary between the host protocol and scripts.
//!
//! Configuration compiles the script once and builds the procedure table.
//! Each call decodes its wire arguments, transcribes them into script values,
//! runs the function in a fresh evaluation context and infers a typed wire
//! value from the result.

/// Provider configuration and schema derivation.
pub mod config;
/// Error types.
pub mod error;
/// Protocol structures.
pub mod protocol;

pub use config::{CONFIG_FIELDS, ConfigField, FieldKind, ProviderConfig};
pub use error::{CallError, ConfigError, ProviderError, ProviderResult};
pub use protocol::{
    CallFunctionResponse, Diagnostic, FunctionError, FunctionParameter, FunctionSignature,
    ProviderMetadata, Schema, SchemaAttribute, Severity,
};

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::marshal::{infer, to_script};
use crate::script::{FunctionTable, ScriptProgram};
use crate::wire::{DynamicValue, Type};

/// A configured script together with its procedure table.
#[derive(Debug)]
struct Configured {
    program: ScriptProgram,
    functions: FunctionTable,
}

/// Exposes script functions as provider procedures.
///
/// Safe to share between threads: configuration swaps the program in under a
/// write lock, calls only hold a reference to the configured program.
#[derive(Debug)]
pub struct FunctionProvider {
    schema: Schema,
    state: RwLock<Option<Arc<Configured>>>,
}

impl Default for FunctionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionProvider {
    /// Create an unconfigured provider.
    pub fn new() -> Self {
        Self {
            schema: ProviderConfig::schema(),
            state: RwLock::new(None),
        }
    }

    /// Advertised capabilities.
    pub fn metadata(&self) -> ProviderMetadata {
        let state = self.state.read();
        ProviderMetadata {
            get_provider_schema_optional: true,
            functions: state
                .as_ref()
                .map(|configured| configured.functions.names().map(str::to_string).collect())
                .unwrap_or_default(),
            script_fingerprint: state
                .as_ref()
                .map(|configured| configured.program.fingerprint().to_string()),
        }
    }

    /// Schema of the provider configuration block.
    pub fn provider_schema(&self) -> &Schema {
        &self.schema
    }

    /// Validation is a passthrough; the payload is returned as prepared config.
    pub fn validate_provider_config(&self, config: &DynamicValue) -> DynamicValue {
        config.clone()
    }

    /// Configure the provider from a configuration payload.
    ///
    /// Returns error diagnostics on failure, in which case no procedures are
    /// exposed until the next successful configuration.
    pub fn configure_provider(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        match self.configure_core(config) {
            Ok(configured) => {
                tracing::info!(
                    functions = configured.functions.len(),
                    fingerprint = configured.program.fingerprint(),
                    strict = configured.program.is_strict(),
                    "script configured"
                );
                *self.state.write() = Some(Arc::new(configured));
                Vec::new()
            }
            Err(diagnostic) => {
                tracing::warn!(
                    summary = %diagnostic.summary,
                    detail = %diagnostic.detail,
                    "configuration failed"
                );
                *self.state.write() = None;
                vec![diagnostic]
            }
        }
    }

    fn configure_core(&self, config: &DynamicValue) -> Result<Configured, Diagnostic> {
        let config = ProviderConfig::from_dynamic(config)
            .map_err(|err| Diagnostic::error("Invalid configure payload", err.to_string()))?;
        let program = ScriptProgram::compile(&config.js, config.strict)
            .map_err(|err| Diagnostic::error("Failed to compile script", err.to_string()))?;
        let functions = program.functions();
        Ok(Configured { program, functions })
    }

    /// Signatures of every exposed procedure.
    pub fn functions(&self) -> BTreeMap<String, FunctionSignature> {
        self.state
            .read()
            .as_ref()
            .map(|configured| {
                configured
                    .functions
                    .names()
                    .map(|name| (name.to_string(), FunctionSignature::variadic_dynamic()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Call procedure `name` with wire arguments.
    ///
    /// An unknown procedure is a request error. Any failure inside the call
    /// is returned as [`CallFunctionResponse::Error`].
    pub fn call_function(
        &self,
        name: &str,
        args: &[DynamicValue],
    ) -> ProviderResult<CallFunctionResponse> {
        let configured = self.state.read().clone();
        let (configured, binding) = configured
            .as_ref()
            .and_then(|configured| {
                let binding = configured.functions.resolve(name)?.to_string();
                Some((Arc::clone(configured), binding))
            })
            .ok_or_else(|| ProviderError::UnknownFunction(name.to_string()))?;

        let call_id = Uuid::new_v4();
        let span = tracing::debug_span!("call_function", %call_id, function = name);
        let _guard = span.enter();
        tracing::debug!(arguments = args.len(), "calling script function");

        match invoke(&configured.program, name, &binding, args) {
            Ok(result) => Ok(CallFunctionResponse::Result(result)),
            Err(err) => {
                tracing::warn!(error = %err, "function call failed");
                Ok(CallFunctionResponse::Error(FunctionError {
                    function_argument: err.argument_index(),
                    text: err.to_string(),
                }))
            }
        }
    }

    /// Stop the provider. Calls in flight are unaffected.
    pub fn stop_provider(&self) {
        tracing::info!("provider stopped");
    }
}

fn invoke(
    program: &ScriptProgram,
    name: &str,
    binding: &str,
    args: &[DynamicValue],
) -> Result<DynamicValue, CallError> {
    let mut script_args = Vec::with_capacity(args.len());
    for (index, arg) in args.iter().enumerate() {
        let value = arg
            .unmarshal(&Type::Dynamic)
            .map_err(|source| CallError::Argument { index, source })?;
        script_args.push(to_script(&value));
    }

    let result = program
        .call(binding, script_args)
        .map_err(|source| CallError::Execution {
            function: name.to_string(),
            source,
        })?;
    if result.is_unit() {
        return Err(CallError::Undefined);
    }

    let value = infer(&result)?;
    DynamicValue::new(&Type::Dynamic, &value).map_err(CallError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Value;

    fn configured(source: &str) -> FunctionProvider {
        let provider = FunctionProvider::new();
        let config = ProviderConfig::new(source).to_value();
        let payload = DynamicValue::new(&ProviderConfig::object_type(), &config).unwrap();
        let diagnostics = provider.configure_provider(&payload);
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
        provider
    }

    fn arg(value: Value) -> DynamicValue {
        DynamicValue::new(&Type::Dynamic, &value).unwrap()
    }

    #[test]
    fn metadata_reports_configured_functions() {
        let provider = configured("fn Hello() { \"hi\" }");
        let metadata = provider.metadata();
        assert!(metadata.get_provider_schema_optional);
        assert_eq!(metadata.functions, vec!["hello".to_string()]);
        assert!(metadata.script_fingerprint.is_some());
    }

    #[test]
    fn unconfigured_provider_knows_no_functions() {
        let provider = FunctionProvider::new();
        assert!(provider.functions().is_empty());
        assert!(matches!(
            provider.call_function("add", &[]),
            Err(ProviderError::UnknownFunction(name)) if name == "add"
        ));
    }

    #[test]
    fn argument_decode_failures_name_the_position() {
        let provider = configured("fn Id(a, b) { a }");
        let args = [arg(Value::from(1.0)), DynamicValue::from_msgpack(vec![0xc1])];
        let response = provider.call_function("id", &args).unwrap();
        let error = response.error().expect("call should fail");
        assert_eq!(error.function_argument, Some(1));
        assert!(error.text.starts_with("Error marshaling argument #1"));
    }

    #[test]
    fn unit_result_is_undefined() {
        let provider = configured("fn Nothing() { }");
        let response = provider.call_function("nothing", &[]).unwrap();
        assert_eq!(
            response.error().map(|e| e.text.as_str()),
            Some("Result is undefined (probably there was an error)")
        );
    }

    #[test]
    fn validate_is_a_passthrough() {
        let provider = FunctionProvider::new();
        let payload = DynamicValue::from_json(b"{}".to_vec());
        assert_eq!(provider.validate_provider_config(&payload), payload);
    }
}
