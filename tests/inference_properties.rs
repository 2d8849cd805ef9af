//! Host → script → host properties of the marshaling layer.

use proptest::prelude::*;
use scriptfn::marshal::{infer, infer_json, to_script};
use scriptfn::script::ScriptProgram;
use scriptfn::wire::{Type, Value, json};
use std::collections::BTreeMap;

fn number() -> impl Strategy<Value = f64> {
    -1.0e12f64..1.0e12f64
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        number().prop_map(Value::Number),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
    ]
}

/// Non-empty uniform lists of one primitive type.
fn primitive_list() -> impl Strategy<Value = Value> {
    prop_oneof![
        prop::collection::vec(any::<bool>().prop_map(Value::Bool), 1..6)
            .prop_map(|items| Value::list(Type::Bool, items).unwrap()),
        prop::collection::vec(number().prop_map(Value::Number), 1..6)
            .prop_map(|items| Value::list(Type::Number, items).unwrap()),
        prop::collection::vec("[a-z]{0,6}".prop_map(Value::String), 1..6)
            .prop_map(|items| Value::list(Type::String, items).unwrap()),
    ]
}

/// Values whose inferred type is unambiguous: every container is non-empty
/// and uniform, so neither tuples nor records are produced.
fn unambiguous() -> impl Strategy<Value = Value> {
    prop_oneof![leaf(), primitive_list()].prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            (inner.clone(), 1..4usize).prop_map(|(item, n)| {
                Value::list(item.ty(), vec![item; n]).unwrap()
            }),
            (
                inner,
                prop::collection::btree_set("[a-z]{1,6}", 1..4)
            )
                .prop_map(|(item, keys)| {
                    let entries: BTreeMap<String, Value> =
                        keys.into_iter().map(|key| (key, item.clone())).collect();
                    Value::map(item.ty(), entries).unwrap()
                }),
        ]
    })
}

proptest! {
    #[test]
    fn unambiguous_values_survive_a_script_round_trip(value in unambiguous()) {
        let back = infer(&to_script(&value)).unwrap();
        prop_assert_eq!(back, value);
    }

    #[test]
    fn inference_agrees_with_the_json_codec(value in unambiguous()) {
        let text = serde_json::to_string(&json::to_json(&value, &value.ty()).unwrap()).unwrap();
        prop_assert_eq!(infer_json(&text).unwrap(), value);
    }

    #[test]
    fn mixed_pairs_become_tuples(number in number(), text in "[a-z]{0,6}") {
        let pair = Value::Tuple(vec![Value::Number(number), Value::String(text)]);
        let back = infer(&to_script(&pair)).unwrap();
        prop_assert_eq!(back.ty(), Type::Tuple(vec![Type::Number, Type::String]));
        prop_assert_eq!(back, pair);
    }
}

#[test]
fn object_shapes() {
    assert_eq!(infer_json("{}").unwrap().ty(), Type::map(Type::Dynamic));
    assert_eq!(infer_json("[]").unwrap().ty(), Type::list(Type::Dynamic));
    assert_eq!(
        infer_json(r#"{"a": 1, "b": "x"}"#).unwrap().ty(),
        Type::object([("a", Type::Number), ("b", Type::String)])
    );
    assert_eq!(
        infer_json(r#"{"a": 1, "b": 2}"#).unwrap().ty(),
        Type::map(Type::Number)
    );
}

#[test]
fn nulls_type_as_strings() {
    assert_eq!(
        infer_json("[1, null]").unwrap().ty(),
        Type::Tuple(vec![Type::Number, Type::String])
    );
    assert_eq!(
        infer_json(r#"["a", null]"#).unwrap().ty(),
        Type::list(Type::String)
    );
    assert_eq!(infer_json("null").unwrap(), Value::Null(Type::String));
}

#[test]
fn nested_containers_unify_structurally() {
    assert_eq!(
        infer_json("[[1, 2], [3]]").unwrap().ty(),
        Type::list(Type::list(Type::Number))
    );
    assert_eq!(
        infer_json(r#"[[1], ["x"]]"#).unwrap().ty(),
        Type::Tuple(vec![Type::list(Type::Number), Type::list(Type::String)])
    );
    assert_eq!(
        infer_json(r#"{"p": {"x": 1, "y": 2}, "q": {"x": 3, "y": 4}}"#)
            .unwrap()
            .ty(),
        Type::map(Type::map(Type::Number))
    );
}

#[test]
fn script_built_values_infer_like_their_json() {
    let program = ScriptProgram::compile(
        r#"
        fn Build() {
            #{ name: "widget", sizes: [1, 2, 3], tags: #{ a: true, b: false } }
        }
        "#,
        true,
    )
    .unwrap();
    let result = infer(&program.call("Build", Vec::new()).unwrap()).unwrap();
    assert_eq!(
        result.ty(),
        Type::object([
            ("name", Type::String),
            ("sizes", Type::list(Type::Number)),
            ("tags", Type::map(Type::Bool)),
        ])
    );
}

#[test]
fn trailing_input_is_rejected() {
    assert!(infer_json("1 2").is_err());
    assert!(infer_json("[1,]").is_err());
}
