//! Script → wire inference.
//!
//! Script values carry no structural type, so one is reconstructed by
//! example. The value is first rendered as JSON by its own serializer, then
//! that text is decoded in a single recursive-descent pass which builds the
//! wire value and its type together, unifying collection members as each
//! container closes.

use rhai::{Array, Blob, Dynamic, FLOAT, INT, ImmutableString, Map};
use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use super::unify::{EMPTY_ELEMENT, Unified, unify_keyed, unify_sequence};
use super::{InferError, InferResult};
use crate::wire::{Type, Value};

/// Type given to nulls produced by inference.
///
/// A null next to siblings of another type therefore counts as a string
/// sibling during unification: `[1, null]` infers as `tuple([number,
/// string])`.
pub const NULL_TYPE: Type = Type::String;

/// The null value inference produces.
pub fn null() -> Value {
    Value::Null(NULL_TYPE)
}

/// Infer a typed wire value from a script value.
///
/// Values with no JSON form (function pointers, timestamps, custom types) are
/// left out of object maps and become nulls inside arrays. As the result
/// itself they are a serialization error.
pub fn infer(value: &Dynamic) -> InferResult<Value> {
    let text = serde_json::to_string(&ScriptJson(value)).map_err(InferError::Serialize)?;
    infer_json(&text)
}

/// Infer a typed wire value from JSON text.
pub fn infer_json(text: &str) -> InferResult<Value> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    let (value, _) = InferSeed
        .deserialize(&mut deserializer)
        .map_err(InferError::Decode)?;
    deserializer.end().map_err(InferError::Decode)?;
    Ok(value)
}

/// Serializes a script value, skipping members that have no JSON form.
struct ScriptJson<'a>(&'a Dynamic);

impl Serialize for ScriptJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.0;
        if let Some(array) = value.read_lock::<Array>() {
            let mut seq = serializer.serialize_seq(Some(array.len()))?;
            for item in array.iter() {
                if has_json_form(item) {
                    seq.serialize_element(&ScriptJson(item))?;
                } else {
                    seq.serialize_element(&())?;
                }
            }
            return seq.end();
        }
        if let Some(map) = value.read_lock::<Map>() {
            let mut entries = serializer.serialize_map(None)?;
            for (key, item) in map.iter().filter(|(_, item)| has_json_form(item)) {
                entries.serialize_entry(key.as_str(), &ScriptJson(item))?;
            }
            return entries.end();
        }
        if has_json_form(value) {
            value.serialize(serializer)
        } else {
            Err(<S::Error as ser::Error>::custom(format!(
                "{} has no JSON representation",
                value.type_name()
            )))
        }
    }
}

fn has_json_form(value: &Dynamic) -> bool {
    value.is::<()>()
        || value.is::<bool>()
        || value.is::<INT>()
        || value.is::<FLOAT>()
        || value.is::<char>()
        || value.is::<ImmutableString>()
        || value.is::<Array>()
        || value.is::<Blob>()
        || value.is::<Map>()
}

/// Decodes one value, yielding it together with its inferred type.
struct InferSeed;

impl<'de> DeserializeSeed<'de> for InferSeed {
    type Value = (Value, Type);

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(InferVisitor)
    }
}

struct InferVisitor;

impl<'de> Visitor<'de> for InferVisitor {
    type Value = (Value, Type);

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_bool<E>(self, flag: bool) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok((Value::Bool(flag), Type::Bool))
    }

    fn visit_i64<E>(self, number: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok((Value::Number(number as f64), Type::Number))
    }

    fn visit_u64<E>(self, number: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok((Value::Number(number as f64), Type::Number))
    }

    fn visit_f64<E>(self, number: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok((Value::Number(number), Type::Number))
    }

    fn visit_str<E>(self, text: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok((Value::String(text.to_string()), Type::String))
    }

    fn visit_string<E>(self, text: String) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok((Value::String(text), Type::String))
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok((null(), NULL_TYPE))
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        self.visit_unit()
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        InferSeed.deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        let mut types = Vec::with_capacity(items.capacity());
        while let Some((item, ty)) = seq.next_element_seed(InferSeed)? {
            items.push(item);
            types.push(ty);
        }

        Ok(match unify_sequence(types) {
            Unified::Uniform(element) => {
                let element = element.unwrap_or(EMPTY_ELEMENT);
                let ty = Type::list(element.clone());
                (Value::List { element, items }, ty)
            }
            Unified::Mixed(types) => (Value::Tuple(items), Type::Tuple(types)),
        })
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = BTreeMap::new();
        let mut types = BTreeMap::new();
        while let Some(key) = map.next_key::<String>()? {
            let (item, ty) = map.next_value_seed(InferSeed)?;
            types.insert(key.clone(), ty);
            entries.insert(key, item);
        }

        Ok(match unify_keyed(types) {
            Unified::Uniform(element) => {
                let element = element.unwrap_or(EMPTY_ELEMENT);
                let ty = Type::map(element.clone());
                (Value::Map { element, entries }, ty)
            }
            Unified::Mixed(types) => (Value::Record(entries), Type::Object(types)),
        })
    }
}
