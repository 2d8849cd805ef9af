//! Structural wire types and their JSON type-descriptor form.
//!
//! Every value crossing the provider boundary resolves to one of these types.
//! Equality is structural: two object types are equal when they have the same
//! attribute names with pairwise-equal attribute types, recursively.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Value as Json, json};
use std::collections::BTreeMap;
use std::fmt;

use super::{WireError, WireResult};

/// Structural type of a wire value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Placeholder for "any type"; the concrete type travels with the payload.
    Dynamic,
    /// Boolean.
    Bool,
    /// Arbitrary-precision number (carried as `f64` in this crate).
    Number,
    /// UTF-8 string.
    String,
    /// Ordered sequence of values sharing one element type.
    List(Box<Type>),
    /// Unordered collection of distinct values sharing one element type.
    Set(Box<Type>),
    /// String-keyed mapping whose values share one element type.
    Map(Box<Type>),
    /// Ordered sequence whose positions may differ in type.
    Tuple(Vec<Type>),
    /// String-keyed record whose attributes may differ in type.
    Object(BTreeMap<String, Type>),
}

impl Type {
    /// Convenience constructor for `list(element)`.
    pub fn list(element: Type) -> Self {
        Type::List(Box::new(element))
    }

    /// Convenience constructor for `set(element)`.
    pub fn set(element: Type) -> Self {
        Type::Set(Box::new(element))
    }

    /// Convenience constructor for `map(element)`.
    pub fn map(element: Type) -> Self {
        Type::Map(Box::new(element))
    }

    /// Build an object type from `(name, type)` pairs.
    pub fn object<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Type)>,
        K: Into<String>,
    {
        Type::Object(
            attributes
                .into_iter()
                .map(|(name, ty)| (name.into(), ty))
                .collect(),
        )
    }

    /// Whether a value of type `actual` may sit where `self` is declared.
    ///
    /// This is structural equality, except that a [`Type::Dynamic`] slot
    /// admits any concrete type.
    pub fn accepts(&self, actual: &Type) -> bool {
        match (self, actual) {
            (Type::Dynamic, _) => true,
            (Type::List(a), Type::List(b))
            | (Type::Set(a), Type::Set(b))
            | (Type::Map(a), Type::Map(b)) => a.accepts(b),
            (Type::Tuple(a), Type::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.accepts(y))
            }
            (Type::Object(a), Type::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(name, ty)| b.get(name).is_some_and(|other| ty.accepts(other)))
            }
            (a, b) => a == b,
        }
    }

    /// Render the type descriptor used by the wire protocol.
    pub fn to_json(&self) -> Json {
        match self {
            Type::Dynamic => json!("dynamic"),
            Type::Bool => json!("bool"),
            Type::Number => json!("number"),
            Type::String => json!("string"),
            Type::List(element) => json!(["list", element.to_json()]),
            Type::Set(element) => json!(["set", element.to_json()]),
            Type::Map(element) => json!(["map", element.to_json()]),
            Type::Tuple(elements) => {
                let elements: Vec<Json> = elements.iter().map(Type::to_json).collect();
                json!(["tuple", elements])
            }
            Type::Object(attributes) => {
                let attributes: serde_json::Map<String, Json> = attributes
                    .iter()
                    .map(|(name, ty)| (name.clone(), ty.to_json()))
                    .collect();
                json!(["object", attributes])
            }
        }
    }

    /// Parse a type descriptor.
    pub fn from_json(descriptor: &Json) -> WireResult<Self> {
        match descriptor {
            Json::String(name) => match name.as_str() {
                "dynamic" => Ok(Type::Dynamic),
                "bool" => Ok(Type::Bool),
                "number" => Ok(Type::Number),
                "string" => Ok(Type::String),
                other => Err(WireError::InvalidType(format!(
                    "unknown primitive type {other:?}"
                ))),
            },
            Json::Array(parts) => {
                let kind = parts.first().and_then(Json::as_str).ok_or_else(|| {
                    WireError::InvalidType(format!("missing collection kind in {descriptor}"))
                })?;
                let argument = parts.get(1).ok_or_else(|| {
                    WireError::InvalidType(format!("missing type argument for {kind}"))
                })?;
                match kind {
                    "list" => Ok(Type::list(Type::from_json(argument)?)),
                    "set" => Ok(Type::set(Type::from_json(argument)?)),
                    "map" => Ok(Type::map(Type::from_json(argument)?)),
                    "tuple" => {
                        let elements = argument.as_array().ok_or_else(|| {
                            WireError::InvalidType("tuple element types must be an array".into())
                        })?;
                        elements
                            .iter()
                            .map(Type::from_json)
                            .collect::<WireResult<Vec<_>>>()
                            .map(Type::Tuple)
                    }
                    // A third element lists optional attributes; it carries no
                    // information for concrete values.
                    "object" => {
                        let attributes = argument.as_object().ok_or_else(|| {
                            WireError::InvalidType("object attribute types must be a map".into())
                        })?;
                        attributes
                            .iter()
                            .map(|(name, ty)| Ok((name.clone(), Type::from_json(ty)?)))
                            .collect::<WireResult<BTreeMap<_, _>>>()
                            .map(Type::Object)
                    }
                    other => Err(WireError::InvalidType(format!(
                        "unknown collection kind {other:?}"
                    ))),
                }
            }
            other => Err(WireError::InvalidType(format!(
                "type descriptor must be a string or array, got {other}"
            ))),
        }
    }

    /// Parse a type descriptor from its serialized bytes.
    pub fn from_json_bytes(bytes: &[u8]) -> WireResult<Self> {
        let descriptor: Json = serde_json::from_slice(bytes)
            .map_err(|err| WireError::InvalidType(format!("malformed type descriptor: {err}")))?;
        Type::from_json(&descriptor)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Type {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let descriptor = Json::deserialize(deserializer)?;
        Type::from_json(&descriptor).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_match_protocol_spelling() {
        let ty = Type::object([
            ("names", Type::list(Type::String)),
            ("pair", Type::Tuple(vec![Type::Number, Type::Bool])),
        ]);
        assert_eq!(
            ty.to_json(),
            json!(["object", {"names": ["list", "string"], "pair": ["tuple", ["number", "bool"]]}])
        );
        assert_eq!(Type::from_json(&ty.to_json()).unwrap(), ty);
    }

    #[test]
    fn object_descriptor_ignores_optional_attribute_list() {
        let descriptor = json!(["object", {"a": "string"}, ["a"]]);
        assert_eq!(
            Type::from_json(&descriptor).unwrap(),
            Type::object([("a", Type::String)])
        );
    }

    #[test]
    fn rejects_unknown_descriptors() {
        assert!(Type::from_json(&json!("float")).is_err());
        assert!(Type::from_json(&json!(["vector", "number"])).is_err());
        assert!(Type::from_json(&json!(42)).is_err());
    }

    #[test]
    fn object_equality_is_structural() {
        let a = Type::object([("x", Type::Number), ("y", Type::String)]);
        let b = Type::object([("y", Type::String), ("x", Type::Number)]);
        assert_eq!(a, b);
        assert_ne!(a, Type::object([("x", Type::Number)]));
    }

    #[test]
    fn dynamic_slot_accepts_anything() {
        assert!(Type::Dynamic.accepts(&Type::list(Type::Number)));
        assert!(Type::list(Type::Dynamic).accepts(&Type::list(Type::String)));
        assert!(!Type::list(Type::Number).accepts(&Type::list(Type::String)));
        assert!(!Type::Number.accepts(&Type::Dynamic));
    }
}
