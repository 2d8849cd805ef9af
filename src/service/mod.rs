//! NDJSON front end for the function provider.
//!
//! Reads newline-delimited JSON requests of the form
//! `{"id": .., "command": .., "params": {..}}` and writes one response line
//! per request. Requests are processed sequentially. Dynamic values travel as
//! `{"msgpack": "<base64>"}` or `{"json": <payload>}`; results are always
//! returned in the msgpack form.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::provider::{CallFunctionResponse, FunctionProvider, ProviderError};
use crate::wire::DynamicValue;

/// Service entry point: wraps a shared [`FunctionProvider`].
pub struct Service {
    provider: Arc<FunctionProvider>,
}

impl Service {
    /// Create a service around `provider`.
    pub fn new(provider: Arc<FunctionProvider>) -> Self {
        Self { provider }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &FunctionProvider {
        &self.provider
    }

    /// Consume requests from `reader` until EOF, writing responses to `writer`.
    pub fn run<R: BufRead, W: Write>(&self, reader: R, mut writer: W) -> io::Result<()> {
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let response = self.handle_line(&line);
            serde_json::to_writer(&mut writer, &response)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        Ok(())
    }

    fn handle_line(&self, line: &str) -> ResponseEnvelope {
        match serde_json::from_str::<RequestEnvelope>(line) {
            Ok(request) => match self.dispatch(&request.command, &request.params) {
                Ok(result) => ResponseEnvelope::success(request.id, result),
                Err(err) => ResponseEnvelope::from_error(request.id, err),
            },
            Err(err) => {
                ResponseEnvelope::from_error(Value::Null, ServiceError::Parse(err.to_string()))
            }
        }
    }

    fn dispatch(&self, command: &str, params: &Value) -> Result<Value, ServiceError> {
        match command {
            "get_metadata" => to_json(&self.provider.metadata()),
            "get_provider_schema" => Ok(json!({ "provider": self.provider.provider_schema() })),
            "validate_provider_config" => self.cmd_validate_provider_config(params),
            "configure_provider" => self.cmd_configure_provider(params),
            "get_functions" => Ok(json!({ "functions": self.provider.functions() })),
            "call_function" => self.cmd_call_function(params),
            "stop_provider" => {
                self.provider.stop_provider();
                Ok(json!({}))
            }
            other => Err(ServiceError::Unsupported(other.to_string())),
        }
    }

    fn cmd_validate_provider_config(&self, params: &Value) -> Result<Value, ServiceError> {
        let config = payload_param(params, "config")?;
        let prepared = self.provider.validate_provider_config(&config);
        Ok(json!({ "prepared_config": payload_to_json(&prepared) }))
    }

    fn cmd_configure_provider(&self, params: &Value) -> Result<Value, ServiceError> {
        let config = payload_param(params, "config")?;
        let diagnostics = self.provider.configure_provider(&config);
        Ok(json!({ "diagnostics": diagnostics }))
    }

    fn cmd_call_function(&self, params: &Value) -> Result<Value, ServiceError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ServiceError::invalid_param("name"))?;
        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    payload_from_json(item).map_err(|err| {
                        ServiceError::InvalidParams(format!("argument #{index}: {err}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(ServiceError::invalid_param("arguments")),
        };

        match self.provider.call_function(name, &arguments)? {
            CallFunctionResponse::Result(result) => {
                Ok(json!({ "result": payload_to_json(&result) }))
            }
            CallFunctionResponse::Error(error) => Ok(json!({ "error": error })),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, ServiceError> {
    serde_json::to_value(value).map_err(|err| ServiceError::Internal(err.to_string()))
}

fn payload_param(params: &Value, name: &str) -> Result<DynamicValue, ServiceError> {
    let payload = params
        .get(name)
        .ok_or_else(|| ServiceError::invalid_param(name))?;
    payload_from_json(payload).map_err(|err| ServiceError::InvalidParams(format!("{name}: {err}")))
}

/// Decode the request form of a dynamic value.
///
/// A `json` member holding a string is taken as the raw payload text; any
/// other JSON value is used as the payload itself.
pub fn payload_from_json(payload: &Value) -> Result<DynamicValue, String> {
    if let Some(encoded) = payload.get("msgpack") {
        let encoded = encoded
            .as_str()
            .ok_or_else(|| "msgpack payload must be a base64 string".to_string())?;
        let bytes = BASE64
            .decode(encoded)
            .map_err(|err| format!("invalid base64: {err}"))?;
        return Ok(DynamicValue::from_msgpack(bytes));
    }
    match payload.get("json") {
        Some(Value::String(text)) => Ok(DynamicValue::from_json(text.as_bytes().to_vec())),
        Some(other) => serde_json::to_vec(other)
            .map(DynamicValue::from_json)
            .map_err(|err| err.to_string()),
        None => Err("expected a \"msgpack\" or \"json\" member".to_string()),
    }
}

/// Render a dynamic value in its response form.
pub fn payload_to_json(payload: &DynamicValue) -> Value {
    let mut members = serde_json::Map::new();
    if !payload.msgpack.is_empty() {
        members.insert("msgpack".into(), Value::String(BASE64.encode(&payload.msgpack)));
    }
    if !payload.json.is_empty() {
        members.insert(
            "json".into(),
            Value::String(String::from_utf8_lossy(&payload.json).into_owned()),
        );
    }
    Value::Object(members)
}

#[derive(Debug)]
enum ServiceError {
    Parse(String),
    InvalidParams(String),
    Unsupported(String),
    Provider(ProviderError),
    Internal(String),
}

impl ServiceError {
    fn invalid_param(name: &str) -> Self {
        ServiceError::InvalidParams(format!("missing or invalid parameter: {}", name))
    }
}

impl From<ProviderError> for ServiceError {
    fn from(err: ProviderError) -> Self {
        ServiceError::Provider(err)
    }
}

#[derive(Deserialize)]
struct RequestEnvelope {
    id: Value,
    command: String,
    #[serde(default)]
    params: Value,
}

#[derive(Serialize)]
struct ResponseEnvelope {
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorEnvelope>,
}

impl ResponseEnvelope {
    fn success(id: Value, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    fn from_error(id: Value, error: ServiceError) -> Self {
        Self {
            id,
            result: None,
            error: Some(ErrorEnvelope::from(error)),
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    code: String,
    message: String,
}

impl From<ServiceError> for ErrorEnvelope {
    fn from(error: ServiceError) -> Self {
        let (code, message) = match error {
            ServiceError::Parse(message) => ("parse_error", message),
            ServiceError::InvalidParams(message) => ("invalid_params", message),
            ServiceError::Unsupported(command) => (
                "unsupported_command",
                format!("Command '{command}' is not supported"),
            ),
            ServiceError::Provider(err @ ProviderError::UnknownFunction(_)) => {
                ("unknown_function", err.to_string())
            }
            ServiceError::Internal(message) => ("internal_error", message),
        };
        ErrorEnvelope {
            code: code.into(),
            message,
        }
    }
}
