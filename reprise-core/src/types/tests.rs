//! Tests for the descriptor codec

use super::*;
use crate::value::{MapValue, Object, Sequence, Value};
use std::sync::Arc;

fn codec() -> TypeCodec {
    let registry = TypeRegistry::with_builtins();
    registry.register(
        TypeDef::builder("Response", TypeKind::Object)
            .param("T")
            .slot("T", "data")
            .build(),
    );
    registry.register(
        TypeDef::builder("Page", TypeKind::Object)
            .param("T")
            .sequence_slot("T", "items")
            .build(),
    );
    registry.register(
        TypeDef::builder("Pair", TypeKind::Object)
            .param("L")
            .param("R")
            .slot("L", "left")
            .slot("R", "right")
            .build(),
    );
    registry.register(
        TypeDef::builder("Envelope", TypeKind::Object)
            .param("T")
            .supertype("Response")
            .build(),
    );
    registry.register(
        TypeDef::builder("Properties", TypeKind::Map)
            .param("V")
            .build(),
    );
    registry.register(TypeDef::object("User"));
    TypeCodec::new(Arc::new(registry))
}

#[test]
fn test_describe_scalars_and_fallback() {
    let codec = codec();
    assert_eq!(codec.describe(&Value::Null), None);
    assert_eq!(codec.describe(&Value::str("x")).as_deref(), Some("String"));
    assert_eq!(codec.describe(&Value::Int(3)).as_deref(), Some("Integer"));
    assert_eq!(
        codec.describe(&Value::Object(Object::new("User"))).as_deref(),
        Some("User")
    );
    assert_eq!(
        codec.describe(&Value::failure("TimeoutException", "slow")).as_deref(),
        Some("TimeoutException")
    );
}

#[test]
fn test_describe_sequences() {
    let codec = codec();

    assert_eq!(codec.describe(&Value::list(vec![])).as_deref(), Some("List"));

    let strings = Value::list(vec![Value::Null, Value::str("a"), Value::Int(1)]);
    assert_eq!(codec.describe(&strings).as_deref(), Some("List-String"));

    let nested = Value::list(vec![Value::list(vec![]), Value::list(vec![Value::str("a")])]);
    assert_eq!(codec.describe(&nested).as_deref(), Some("List-List,String"));

    let mixed = Value::Seq(Sequence::new(
        "Set",
        vec![
            Value::list(vec![Value::Null, Value::str("a"), Value::Int(9)]),
            Value::Null,
            Value::list(vec![Value::Int(1)]),
        ],
    ));
    assert_eq!(
        codec.describe(&mixed).as_deref(),
        Some("Set-List,String,Integer")
    );
}

#[test]
fn test_describe_maps() {
    let codec = codec();

    assert_eq!(codec.describe(&Value::map(vec![])).as_deref(), Some("Map"));

    let map = Value::map(vec![
        (Value::str("a"), Value::Int(1)),
        (Value::str("b"), Value::str("ignored")),
    ]);
    assert_eq!(codec.describe(&map).as_deref(), Some("Map-String,Integer"));

    let null_value = Value::map(vec![(Value::Int(1), Value::Null)]);
    assert_eq!(
        codec.describe(&null_value).as_deref(),
        Some("Map-Integer,String")
    );

    let nested = Value::map(vec![(
        Value::str("k"),
        Value::list(vec![Value::Int(1)]),
    )]);
    assert_eq!(codec.describe(&nested).as_deref(), Some("Map-String,List-Integer"));

    let single = Value::Map(MapValue::new(
        "Properties",
        vec![(Value::str("k"), Value::Bool(true))],
    ));
    assert_eq!(codec.describe(&single).as_deref(), Some("Properties-Boolean"));
}

#[test]
fn test_describe_optional() {
    let codec = codec();
    assert_eq!(codec.describe(&Value::optional(None)).as_deref(), Some("Optional"));
    assert_eq!(
        codec
            .describe(&Value::optional(Some(Value::list(vec![Value::str("a")]))))
            .as_deref(),
        Some("Optional-List-String")
    );
}

#[test]
fn test_describe_type_handles() {
    let codec = codec();
    let list = codec.resolve("List-String").unwrap();
    assert_eq!(codec.describe(&Value::Type(list)).as_deref(), Some("List-String"));

    let raw = codec.resolve("User").unwrap();
    assert_eq!(codec.describe(&Value::Type(raw)).as_deref(), Some("User"));

    // a parameterized first argument keeps its own arguments
    for descriptor in ["Optional-List-String", "Optional-Map-String,Integer", "Response-List-User"] {
        let handle = codec.resolve(descriptor).unwrap();
        let described = codec.describe(&Value::Type(handle.clone())).unwrap();
        assert_eq!(described, descriptor);
        assert!(Arc::ptr_eq(&codec.resolve(&described).unwrap(), &handle));
    }
}

#[test]
fn test_describe_generic_objects() {
    let codec = codec();

    let response = Object::new("Response").with_field("data", Object::new("User"));
    assert_eq!(
        codec.describe(&response.into()).as_deref(),
        Some("Response-User")
    );

    // sequence-typed slot drops the sequence wrapper
    let page = Object::new("Page").with_field("items", Value::list(vec![Value::str("a")]));
    assert_eq!(codec.describe(&page.into()).as_deref(), Some("Page-String"));

    let empty_page = Object::new("Page");
    assert_eq!(codec.describe(&empty_page.into()).as_deref(), Some("Page-"));

    let pair = Object::new("Pair")
        .with_field("left", Value::Int(1))
        .with_field("right", Value::str("r"));
    assert_eq!(
        codec.describe(&pair.into()).as_deref(),
        Some("Pair-Integer,String")
    );

    // slot inherited from the supertype
    let envelope = Object::new("Envelope").with_field("data", Value::Bool(true));
    assert_eq!(
        codec.describe(&envelope.into()).as_deref(),
        Some("Envelope-Boolean")
    );
}

#[test]
fn test_describe_is_idempotent() {
    let codec = codec();
    let value = Value::list(vec![Value::list(vec![Value::Int(1)])]);
    assert_eq!(codec.describe(&value), codec.describe(&value));
}

#[test]
fn test_resolve_shapes() {
    let codec = codec();

    let map = codec.resolve("Map-String,Integer").unwrap();
    assert_eq!(map.name(), "Map");
    assert_eq!(map.args().len(), 2);
    assert_eq!(map.arg(0).unwrap().name(), "String");
    assert_eq!(map.arg(1).unwrap().name(), "Integer");

    let nested = codec.resolve("Map-String,List-Integer").unwrap();
    assert_eq!(nested.to_string(), "Map<String, List<Integer>>");

    let response = codec.resolve("Response-User").unwrap();
    assert_eq!(response.to_string(), "Response<User>");

    let raw = codec.resolve("User").unwrap();
    assert!(raw.args().is_empty());
}

#[test]
fn test_resolve_rejects_bad_descriptors() {
    let codec = codec();
    assert!(codec.resolve("").is_none());
    assert!(codec.resolve("-").is_none());
    assert!(codec.resolve("com.missing.Type").is_none());
    assert!(codec.resolve("Map-String").is_none());
    assert!(codec.try_resolve("Unknown").is_err());
}

#[test]
fn test_resolve_is_cached() {
    let codec = codec();
    let first = codec.resolve("List-String").unwrap();
    let second = codec.resolve("List-String").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_round_trip_descriptor_is_assignable() {
    let codec = codec();
    let values = [
        Value::list(vec![Value::str("a")]),
        Value::map(vec![(Value::str("a"), Value::Int(1))]),
        Value::optional(Some(Value::Float(1.5))),
        Object::new("Response").with_field("data", Value::Int(1)).into(),
    ];

    for value in values {
        let descriptor = codec.describe(&value).unwrap();
        let handle = codec.resolve(&descriptor).unwrap();
        assert_eq!(handle.name(), value.type_name());
        assert!(handle.is_assignable_from(&handle));
    }
}
