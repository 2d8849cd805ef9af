//! Wire → script transcription.
//!
//! Driven purely by the value's own variant; nothing is inferred here.

use rhai::{Array, Dynamic, Map};

use crate::wire::Value;

/// Convert a typed wire value into a script value.
///
/// Numbers become script floats. Sequences of every kind become arrays and
/// keyed collections become object maps, so key names survive the trip.
pub fn to_script(value: &Value) -> Dynamic {
    match value {
        Value::Null(_) => Dynamic::UNIT,
        Value::Bool(flag) => Dynamic::from_bool(*flag),
        Value::String(text) => Dynamic::from(text.clone()),
        Value::Number(number) => Dynamic::from_float(*number),
        Value::List { items, .. } | Value::Set { items, .. } | Value::Tuple(items) => {
            let array: Array = items.iter().map(to_script).collect();
            Dynamic::from_array(array)
        }
        Value::Map { entries, .. } | Value::Record(entries) => {
            let map: Map = entries
                .iter()
                .map(|(key, item)| (key.as_str().into(), to_script(item)))
                .collect();
            Dynamic::from_map(map)
        }
    }
}

/// Convert a sequence of wire values, preserving order.
pub fn to_script_args<'a>(values: impl IntoIterator<Item = &'a Value>) -> Vec<Dynamic> {
    values.into_iter().map(to_script).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Type;

    #[test]
    fn null_becomes_unit() {
        assert!(to_script(&Value::Null(Type::Number)).is_unit());
    }

    #[test]
    fn numbers_become_floats() {
        assert_eq!(to_script(&Value::Number(2.0)).as_float(), Ok(2.0));
    }

    #[test]
    fn tuples_become_arrays_in_order() {
        let value = Value::Tuple(vec![Value::from("a"), Value::from(true)]);
        let array = to_script(&value).into_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[0].clone().into_string().unwrap(), "a");
        assert_eq!(array[1].as_bool(), Ok(true));
    }

    #[test]
    fn records_become_maps() {
        let value = Value::record([("n", Value::from(1.5))]);
        let map = to_script(&value).cast::<Map>();
        assert_eq!(map.get("n").and_then(|n| n.as_float().ok()), Some(1.5));
    }
}
