//! Dynamic value envelope exchanged at the provider boundary.

use serde::{Deserialize, Serialize};

use super::{Type, Value, WireError, WireResult, json, msgpack};

/// A wire payload in either the binary or the text encoding.
///
/// Exactly one payload is normally populated. When both are present the binary
/// one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicValue {
    /// MessagePack payload.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub msgpack: Vec<u8>,
    /// JSON payload.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub json: Vec<u8>,
}

impl DynamicValue {
    /// Encode `value` in the binary form against the target type `ty`.
    pub fn new(ty: &Type, value: &Value) -> WireResult<Self> {
        Ok(Self {
            msgpack: msgpack::encode(value, ty)?,
            json: Vec::new(),
        })
    }

    /// Encode `value` in the binary form using its own type as the target.
    pub fn from_value(value: &Value) -> WireResult<Self> {
        Self::new(&value.ty(), value)
    }

    /// Wrap an already encoded MessagePack payload.
    pub fn from_msgpack(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            msgpack: payload.into(),
            json: Vec::new(),
        }
    }

    /// Wrap an already encoded JSON payload.
    pub fn from_json(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            msgpack: Vec::new(),
            json: payload.into(),
        }
    }

    /// Decode the payload against the target type `ty`.
    pub fn unmarshal(&self, ty: &Type) -> WireResult<Value> {
        if !self.msgpack.is_empty() {
            msgpack::decode(&self.msgpack, ty)
        } else if !self.json.is_empty() {
            json::decode(&self.json, ty)
        } else {
            Err(WireError::EmptyPayload)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_payload_is_used_when_binary_is_empty() {
        let dv = DynamicValue::from_json(br#"{"type": "string", "value": "hi"}"#.to_vec());
        assert_eq!(dv.unmarshal(&Type::Dynamic).unwrap(), Value::from("hi"));
    }

    #[test]
    fn binary_payload_wins_when_both_present() {
        let mut dv = DynamicValue::new(&Type::Bool, &Value::Bool(true)).unwrap();
        dv.json = b"false".to_vec();
        assert_eq!(dv.unmarshal(&Type::Bool).unwrap(), Value::Bool(true));
    }

    #[test]
    fn empty_envelope_is_an_error() {
        let err = DynamicValue::default().unmarshal(&Type::Dynamic).unwrap_err();
        assert!(matches!(err, WireError::EmptyPayload));
    }
}
