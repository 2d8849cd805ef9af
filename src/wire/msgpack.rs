//! MessagePack (binary) codec.
//!
//! The binary form is not self-describing: decoding needs the target type.
//! A [`Type::Dynamic`] target is the exception, where the payload is a
//! two-element array of `[type descriptor JSON, value]`.

use rmpv::Value as Packed;
use std::collections::BTreeMap;

use super::{Type, Value, WireError, WireResult};

/// Extension code the protocol uses for unknown values.
const UNKNOWN_EXT: i8 = 0;

/// Largest magnitude below which integral numbers are packed as integers.
const MAX_PACKED_INT: f64 = 9_223_372_036_854_775_808.0;

/// Encode `value` against the target type `ty`.
pub fn encode(value: &Value, ty: &Type) -> WireResult<Vec<u8>> {
    let packed = pack(value, ty)?;
    let mut buf = Vec::new();
    rmpv::encode::write_value(&mut buf, &packed)
        .map_err(|err| WireError::Msgpack(err.to_string()))?;
    Ok(buf)
}

/// Decode a payload against the target type `ty`.
pub fn decode(payload: &[u8], ty: &Type) -> WireResult<Value> {
    let mut cursor = payload;
    let packed = rmpv::decode::read_value(&mut cursor)
        .map_err(|err| WireError::Msgpack(err.to_string()))?;
    if !cursor.is_empty() {
        return Err(WireError::Msgpack(format!(
            "{} trailing bytes after value",
            cursor.len()
        )));
    }
    unpack(packed, ty)
}

fn pack(value: &Value, ty: &Type) -> WireResult<Packed> {
    if let Type::Dynamic = ty {
        if let Value::Null(Type::Dynamic) = value {
            return Ok(Packed::Nil);
        }
        let concrete = value.ty();
        let descriptor = serde_json::to_vec(&concrete.to_json())?;
        return Ok(Packed::Array(vec![
            Packed::Binary(descriptor),
            pack(value, &concrete)?,
        ]));
    }

    match (value, ty) {
        (Value::Null(_), _) => Ok(Packed::Nil),
        (Value::Bool(flag), Type::Bool) => Ok(Packed::Boolean(*flag)),
        (Value::String(text), Type::String) => Ok(Packed::String(text.as_str().into())),
        (Value::Number(number), Type::Number) => Ok(pack_number(*number)),
        (Value::List { items, .. }, Type::List(element))
        | (Value::Set { items, .. }, Type::Set(element)) => items
            .iter()
            .map(|item| pack(item, element))
            .collect::<WireResult<Vec<_>>>()
            .map(Packed::Array),
        (Value::Tuple(items), Type::Tuple(elements)) if items.len() == elements.len() => items
            .iter()
            .zip(elements)
            .map(|(item, element)| pack(item, element))
            .collect::<WireResult<Vec<_>>>()
            .map(Packed::Array),
        (Value::Map { entries, .. }, Type::Map(element)) => entries
            .iter()
            .map(|(key, item)| Ok((Packed::String(key.as_str().into()), pack(item, element)?)))
            .collect::<WireResult<Vec<_>>>()
            .map(Packed::Map),
        (Value::Record(attributes), Type::Object(types)) if attributes.len() == types.len() => {
            attributes
                .iter()
                .map(|(key, item)| {
                    let attribute_ty = types.get(key).ok_or_else(|| WireError::Unencodable {
                        kind: value.kind(),
                        target: ty.clone(),
                    })?;
                    Ok((Packed::String(key.as_str().into()), pack(item, attribute_ty)?))
                })
                .collect::<WireResult<Vec<_>>>()
                .map(Packed::Map)
        }
        _ => Err(WireError::Unencodable {
            kind: value.kind(),
            target: ty.clone(),
        }),
    }
}

fn pack_number(number: f64) -> Packed {
    if number.is_finite() && number.fract() == 0.0 && number.abs() < MAX_PACKED_INT {
        Packed::Integer((number as i64).into())
    } else {
        Packed::F64(number)
    }
}

fn unpack(packed: Packed, ty: &Type) -> WireResult<Value> {
    match packed {
        Packed::Nil => return Ok(Value::Null(ty.clone())),
        Packed::Ext(code, _) if code == UNKNOWN_EXT => return Err(WireError::Unknown),
        _ => {}
    }

    match ty {
        Type::Dynamic => unpack_dynamic(packed),
        Type::Bool => match packed {
            Packed::Boolean(flag) => Ok(Value::Bool(flag)),
            other => Err(WireError::mismatch(ty, describe(&other))),
        },
        Type::Number => unpack_number(packed).map(Value::Number),
        Type::String => unpack_string(packed, ty).map(Value::String),
        Type::List(element) => {
            let items = unpack_items(packed, ty, element)?;
            Value::list((**element).clone(), items)
        }
        Type::Set(element) => {
            let items = unpack_items(packed, ty, element)?;
            Value::set((**element).clone(), items)
        }
        Type::Tuple(elements) => {
            let items = expect_array(packed, ty)?;
            if items.len() != elements.len() {
                return Err(WireError::mismatch(
                    ty,
                    format!("array of {} elements", items.len()),
                ));
            }
            items
                .into_iter()
                .zip(elements)
                .map(|(item, element)| unpack(item, element))
                .collect::<WireResult<Vec<_>>>()
                .map(Value::Tuple)
        }
        Type::Map(element) => {
            let entries = unpack_entries(packed, ty, |_| Some(element.as_ref()))?;
            Value::map((**element).clone(), entries)
        }
        Type::Object(types) => {
            let attributes = unpack_entries(packed, ty, |key| types.get(key))?;
            if let Some(missing) = types.keys().find(|key| !attributes.contains_key(*key)) {
                return Err(WireError::mismatch(
                    ty,
                    format!("object without attribute {missing:?}"),
                ));
            }
            Ok(Value::Record(attributes))
        }
    }
}

fn unpack_dynamic(packed: Packed) -> WireResult<Value> {
    let mut parts = expect_array(packed, &Type::Dynamic)?;
    if parts.len() != 2 {
        return Err(WireError::mismatch(
            &Type::Dynamic,
            format!("array of {} elements", parts.len()),
        ));
    }
    let inner = parts.pop().unwrap_or(Packed::Nil);
    let concrete = match parts.pop() {
        Some(Packed::Binary(bytes)) => Type::from_json_bytes(&bytes)?,
        Some(Packed::String(text)) => Type::from_json_bytes(text.as_bytes())?,
        other => {
            return Err(WireError::InvalidType(format!(
                "expected type descriptor bytes, found {}",
                other.as_ref().map(describe).unwrap_or("nothing")
            )));
        }
    };
    unpack(inner, &concrete)
}

fn unpack_number(packed: Packed) -> WireResult<f64> {
    match packed {
        Packed::Integer(int) => int
            .as_f64()
            .ok_or_else(|| WireError::Msgpack(format!("integer {int} out of range"))),
        Packed::F32(number) => Ok(f64::from(number)),
        Packed::F64(number) => Ok(number),
        Packed::String(text) => {
            let text = text
                .into_str()
                .ok_or_else(|| WireError::Msgpack("number string is not UTF-8".into()))?;
            text.trim()
                .parse::<f64>()
                .map_err(|_| WireError::mismatch(&Type::Number, format!("string {text:?}")))
        }
        other => Err(WireError::mismatch(&Type::Number, describe(&other))),
    }
}

fn unpack_string(packed: Packed, ty: &Type) -> WireResult<String> {
    match packed {
        Packed::String(text) => text
            .into_str()
            .ok_or_else(|| WireError::Msgpack("string is not valid UTF-8".into())),
        other => Err(WireError::mismatch(ty, describe(&other))),
    }
}

fn unpack_items(packed: Packed, ty: &Type, element: &Type) -> WireResult<Vec<Value>> {
    expect_array(packed, ty)?
        .into_iter()
        .map(|item| unpack(item, element))
        .collect()
}

fn unpack_entries<'t>(
    packed: Packed,
    ty: &Type,
    lookup: impl Fn(&str) -> Option<&'t Type>,
) -> WireResult<BTreeMap<String, Value>> {
    let pairs = match packed {
        Packed::Map(pairs) => pairs,
        other => return Err(WireError::mismatch(ty, describe(&other))),
    };
    let mut entries = BTreeMap::new();
    for (key, item) in pairs {
        let key = unpack_string(key, ty)?;
        let entry_ty = lookup(&key)
            .ok_or_else(|| WireError::mismatch(ty, format!("unexpected attribute {key:?}")))?;
        let item = unpack(item, entry_ty)?;
        entries.insert(key, item);
    }
    Ok(entries)
}

fn expect_array(packed: Packed, ty: &Type) -> WireResult<Vec<Packed>> {
    match packed {
        Packed::Array(items) => Ok(items),
        other => Err(WireError::mismatch(ty, describe(&other))),
    }
}

fn describe(packed: &Packed) -> &'static str {
    match packed {
        Packed::Nil => "msgpack nil",
        Packed::Boolean(_) => "msgpack boolean",
        Packed::Integer(_) => "msgpack integer",
        Packed::F32(_) | Packed::F64(_) => "msgpack float",
        Packed::String(_) => "msgpack string",
        Packed::Binary(_) => "msgpack binary",
        Packed::Array(_) => "msgpack array",
        Packed::Map(_) => "msgpack map",
        Packed::Ext(..) => "msgpack extension",
    }
}
