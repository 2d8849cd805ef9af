//! Typed wire values.

use std::collections::BTreeMap;

use super::{Type, WireError, WireResult};

/// A wire value together with enough structure to recover its [`Type`].
///
/// Uniform containers (`List`, `Set`, `Map`) declare their element type; the
/// heterogeneous ones (`Tuple`, `Record`) derive theirs from the members.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value, still carrying the type it stands in for.
    Null(Type),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    String(String),
    /// Number, narrowed to double precision.
    Number(f64),
    /// Ordered, uniformly typed sequence.
    List {
        /// Declared element type.
        element: Type,
        /// Elements in order.
        items: Vec<Value>,
    },
    /// Unordered, uniformly typed collection.
    Set {
        /// Declared element type.
        element: Type,
        /// Members, in wire order.
        items: Vec<Value>,
    },
    /// Uniformly typed string-keyed mapping.
    Map {
        /// Declared element type.
        element: Type,
        /// Entries keyed by name.
        entries: BTreeMap<String, Value>,
    },
    /// Ordered sequence with per-position types.
    Tuple(Vec<Value>),
    /// String-keyed record with per-key types.
    Record(BTreeMap<String, Value>),
}

impl Value {
    /// Build a list, checking every item against `element`.
    pub fn list(element: Type, items: Vec<Value>) -> WireResult<Self> {
        check_elements(&element, items.iter())?;
        Ok(Value::List { element, items })
    }

    /// Build a set, checking every item against `element`.
    pub fn set(element: Type, items: Vec<Value>) -> WireResult<Self> {
        check_elements(&element, items.iter())?;
        Ok(Value::Set { element, items })
    }

    /// Build a map, checking every entry against `element`.
    pub fn map(element: Type, entries: BTreeMap<String, Value>) -> WireResult<Self> {
        check_elements(&element, entries.values())?;
        Ok(Value::Map { element, entries })
    }

    /// Build a record from `(key, value)` pairs.
    pub fn record<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Record(
            attributes
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    /// Structural type of this value.
    pub fn ty(&self) -> Type {
        match self {
            Value::Null(ty) => ty.clone(),
            Value::Bool(_) => Type::Bool,
            Value::String(_) => Type::String,
            Value::Number(_) => Type::Number,
            Value::List { element, .. } => Type::list(element.clone()),
            Value::Set { element, .. } => Type::set(element.clone()),
            Value::Map { element, .. } => Type::map(element.clone()),
            Value::Tuple(items) => Type::Tuple(items.iter().map(Value::ty).collect()),
            Value::Record(attributes) => Type::Object(
                attributes
                    .iter()
                    .map(|(key, value)| (key.clone(), value.ty()))
                    .collect(),
            ),
        }
    }

    /// Whether this is a (typed) null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }

    /// Human-readable kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null(_) => "null",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::List { .. } => "list",
            Value::Set { .. } => "set",
            Value::Map { .. } => "map",
            Value::Tuple(_) => "tuple",
            Value::Record(_) => "record",
        }
    }

    /// Borrow the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    /// Numeric payload, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// Boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(flag) => Some(*flag),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::Bool(flag)
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Value::Number(number)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::String(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::String(text)
    }
}

fn check_elements<'a>(
    element: &Type,
    items: impl Iterator<Item = &'a Value>,
) -> WireResult<()> {
    for (index, item) in items.enumerate() {
        let actual = item.ty();
        if !element.accepts(&actual) {
            return Err(WireError::ElementMismatch {
                index,
                expected: element.clone(),
                actual,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_rejects_mismatched_elements() {
        let err = Value::list(Type::Number, vec![1.0.into(), "two".into()]).unwrap_err();
        match err {
            WireError::ElementMismatch { index, expected, actual } => {
                assert_eq!(index, 1);
                assert_eq!(expected, Type::Number);
                assert_eq!(actual, Type::String);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn typed_null_fits_its_declared_slot() {
        let list = Value::list(Type::Number, vec![Value::Null(Type::Number), 2.0.into()]);
        assert!(list.is_ok());
    }

    #[test]
    fn record_type_collects_member_types() {
        let value = Value::record([("a", Value::from(1.0)), ("b", Value::from("x"))]);
        assert_eq!(
            value.ty(),
            Type::object([("a", Type::Number), ("b", Type::String)])
        );
    }

    #[test]
    fn map_type_uses_declared_element() {
        let entries = BTreeMap::from([("k".to_string(), Value::from(true))]);
        let value = Value::map(Type::Bool, entries).unwrap();
        assert_eq!(value.ty(), Type::map(Type::Bool));
    }
}
