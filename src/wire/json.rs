//! JSON (text) codec.
//!
//! Same shape rules as the binary codec. A dynamic target is encoded as
//! `{"type": <descriptor>, "value": <value>}`.

use serde_json::{Map as JsonMap, Number, Value as Json};
use std::collections::BTreeMap;

use super::{Type, Value, WireError, WireResult};

/// Encode `value` against the target type `ty`.
pub fn encode(value: &Value, ty: &Type) -> WireResult<Vec<u8>> {
    Ok(serde_json::to_vec(&to_json(value, ty)?)?)
}

/// Decode a payload against the target type `ty`.
pub fn decode(payload: &[u8], ty: &Type) -> WireResult<Value> {
    let json: Json = serde_json::from_slice(payload)?;
    from_json(json, ty)
}

/// Render `value` as a JSON tree shaped for the target type `ty`.
pub fn to_json(value: &Value, ty: &Type) -> WireResult<Json> {
    if let Type::Dynamic = ty {
        if let Value::Null(Type::Dynamic) = value {
            return Ok(Json::Null);
        }
        let concrete = value.ty();
        let mut envelope = JsonMap::new();
        envelope.insert("value".into(), to_json(value, &concrete)?);
        envelope.insert("type".into(), concrete.to_json());
        return Ok(Json::Object(envelope));
    }

    let unencodable = || WireError::Unencodable {
        kind: value.kind(),
        target: ty.clone(),
    };

    match (value, ty) {
        (Value::Null(_), _) => Ok(Json::Null),
        (Value::Bool(flag), Type::Bool) => Ok(Json::Bool(*flag)),
        (Value::String(text), Type::String) => Ok(Json::String(text.clone())),
        (Value::Number(number), Type::Number) => number_to_json(*number).ok_or_else(unencodable),
        (Value::List { items, .. }, Type::List(element))
        | (Value::Set { items, .. }, Type::Set(element)) => items
            .iter()
            .map(|item| to_json(item, element))
            .collect::<WireResult<Vec<_>>>()
            .map(Json::Array),
        (Value::Tuple(items), Type::Tuple(elements)) if items.len() == elements.len() => items
            .iter()
            .zip(elements)
            .map(|(item, element)| to_json(item, element))
            .collect::<WireResult<Vec<_>>>()
            .map(Json::Array),
        (Value::Map { entries, .. }, Type::Map(element)) => entries
            .iter()
            .map(|(key, item)| Ok((key.clone(), to_json(item, element)?)))
            .collect::<WireResult<JsonMap<_, _>>>()
            .map(Json::Object),
        (Value::Record(attributes), Type::Object(types)) if attributes.len() == types.len() => {
            attributes
                .iter()
                .map(|(key, item)| {
                    let attribute_ty = types.get(key).ok_or_else(unencodable)?;
                    Ok((key.clone(), to_json(item, attribute_ty)?))
                })
                .collect::<WireResult<JsonMap<_, _>>>()
                .map(Json::Object)
        }
        _ => Err(unencodable()),
    }
}

/// Interpret a JSON tree against the target type `ty`.
pub fn from_json(json: Json, ty: &Type) -> WireResult<Value> {
    if json.is_null() {
        return Ok(Value::Null(ty.clone()));
    }

    match ty {
        Type::Dynamic => {
            let Json::Object(mut envelope) = json else {
                return Err(WireError::mismatch(ty, describe(&json)));
            };
            let descriptor = envelope
                .remove("type")
                .ok_or_else(|| WireError::mismatch(ty, "object without \"type\""))?;
            let inner = envelope
                .remove("value")
                .ok_or_else(|| WireError::mismatch(ty, "object without \"value\""))?;
            let concrete = Type::from_json(&descriptor)?;
            from_json(inner, &concrete)
        }
        Type::Bool => match json {
            Json::Bool(flag) => Ok(Value::Bool(flag)),
            other => Err(WireError::mismatch(ty, describe(&other))),
        },
        Type::Number => match json {
            Json::Number(number) => number
                .as_f64()
                .map(Value::Number)
                .ok_or_else(|| WireError::mismatch(ty, format!("number {number}"))),
            Json::String(text) => text
                .trim()
                .parse::<f64>()
                .map(Value::Number)
                .map_err(|_| WireError::mismatch(ty, format!("string {text:?}"))),
            other => Err(WireError::mismatch(ty, describe(&other))),
        },
        Type::String => match json {
            Json::String(text) => Ok(Value::String(text)),
            other => Err(WireError::mismatch(ty, describe(&other))),
        },
        Type::List(element) => {
            let items = items_from_json(json, ty, element)?;
            Value::list((**element).clone(), items)
        }
        Type::Set(element) => {
            let items = items_from_json(json, ty, element)?;
            Value::set((**element).clone(), items)
        }
        Type::Tuple(elements) => {
            let Json::Array(items) = json else {
                return Err(WireError::mismatch(ty, describe(&json)));
            };
            if items.len() != elements.len() {
                return Err(WireError::mismatch(
                    ty,
                    format!("array of {} elements", items.len()),
                ));
            }
            items
                .into_iter()
                .zip(elements)
                .map(|(item, element)| from_json(item, element))
                .collect::<WireResult<Vec<_>>>()
                .map(Value::Tuple)
        }
        Type::Map(element) => {
            let Json::Object(members) = json else {
                return Err(WireError::mismatch(ty, describe(&json)));
            };
            let entries = members
                .into_iter()
                .map(|(key, item)| Ok((key, from_json(item, element)?)))
                .collect::<WireResult<BTreeMap<_, _>>>()?;
            Value::map((**element).clone(), entries)
        }
        Type::Object(types) => {
            let Json::Object(members) = json else {
                return Err(WireError::mismatch(ty, describe(&json)));
            };
            let mut attributes = BTreeMap::new();
            for (key, item) in members {
                let attribute_ty = types.get(&key).ok_or_else(|| {
                    WireError::mismatch(ty, format!("unexpected attribute {key:?}"))
                })?;
                let item = from_json(item, attribute_ty)?;
                attributes.insert(key, item);
            }
            // Absent attributes are nulls of their declared type.
            for (key, attribute_ty) in types {
                attributes
                    .entry(key.clone())
                    .or_insert_with(|| Value::Null(attribute_ty.clone()));
            }
            Ok(Value::Record(attributes))
        }
    }
}

fn items_from_json(json: Json, ty: &Type, element: &Type) -> WireResult<Vec<Value>> {
    let Json::Array(items) = json else {
        return Err(WireError::mismatch(ty, describe(&json)));
    };
    items
        .into_iter()
        .map(|item| from_json(item, element))
        .collect()
}

fn number_to_json(number: f64) -> Option<Json> {
    if number.is_finite() && number.fract() == 0.0 && number.abs() < 9.007_199_254_740_992e15 {
        Some(Json::from(number as i64))
    } else {
        Number::from_f64(number).map(Json::Number)
    }
}

fn describe(json: &Json) -> &'static str {
    match json {
        Json::Null => "JSON null",
        Json::Bool(_) => "JSON boolean",
        Json::Number(_) => "JSON number",
        Json::String(_) => "JSON string",
        Json::Array(_) => "JSON array",
        Json::Object(_) => "JSON object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dynamic_envelope_names_type_and_value() {
        let value = Value::list(Type::Number, vec![1.0.into(), 2.5.into()]).unwrap();
        let rendered = to_json(&value, &Type::Dynamic).unwrap();
        assert_eq!(
            rendered,
            json!({"type": ["list", "number"], "value": [1, 2.5]})
        );
        assert_eq!(from_json(rendered, &Type::Dynamic).unwrap(), value);
    }

    #[test]
    fn missing_object_attributes_become_typed_nulls() {
        let ty = Type::object([("js", Type::String), ("strict", Type::Bool)]);
        let value = decode(br#"{"js": "fn F() { 1 }"}"#, &ty).unwrap();
        assert_eq!(
            value,
            Value::record([
                ("js", Value::from("fn F() { 1 }")),
                ("strict", Value::Null(Type::Bool)),
            ])
        );
    }

    #[test]
    fn unexpected_attribute_is_an_error() {
        let ty = Type::object([("a", Type::Bool)]);
        assert!(decode(br#"{"a": true, "b": false}"#, &ty).is_err());
    }

    #[test]
    fn numbers_accept_decimal_strings() {
        assert_eq!(
            decode(br#""12.5""#, &Type::Number).unwrap(),
            Value::Number(12.5)
        );
        assert!(decode(br#""twelve""#, &Type::Number).is_err());
    }

    #[test]
    fn non_finite_numbers_are_not_encodable() {
        assert!(encode(&Value::Number(f64::NAN), &Type::Number).is_err());
    }
}
