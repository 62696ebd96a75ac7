//! Tests for the serialization facade

use super::*;
use crate::types::{TypeDef, TypeKind, TypeRegistry};
use crate::value::Object;

/// Serializer that refuses to decode anything
struct BrokenSerializer;

impl StringSerializer for BrokenSerializer {
    fn name(&self) -> &str {
        "broken"
    }

    fn serialize(&self, _value: &Value) -> Result<String> {
        Err(RepriseError::Other("broken".to_string()))
    }

    fn deserialize(&self, _text: &str, handle: &TypeHandle) -> Result<Value> {
        Err(RepriseError::deserialize(handle.to_string(), "broken"))
    }
}

fn facade() -> Serializer {
    let registry = TypeRegistry::with_builtins();
    registry.register(TypeDef::failure("TimeoutException"));
    registry.register(
        TypeDef::builder("Page", TypeKind::Object)
            .param("T")
            .sequence_slot("T", "items")
            .build(),
    );
    registry.register(TypeDef::object("User"));
    let registry = Arc::new(registry);

    Serializer::builder(Arc::new(TypeCodec::new(registry.clone())))
        .default_serializer(Arc::new(JsonSerializer::new(registry.clone())))
        .add_serializer(Arc::new(YamlSerializer::new(registry)))
        .add_serializer(Arc::new(BrokenSerializer))
        .build()
        .unwrap()
}

/// describe, serialize, then deserialize against the descriptor
fn round_trip(serializer: &Serializer, value: &Value, name: Option<&str>) -> Option<Value> {
    let descriptor = serializer.codec().describe(value)?;
    let text = serializer.serialize(value, name)?;
    serializer.deserialize(&text, &descriptor, name)
}

#[test]
fn test_builder_requires_default() {
    let codec = Arc::new(TypeCodec::new(Arc::new(TypeRegistry::with_builtins())));
    let result = Serializer::builder(codec).add_serializer(Arc::new(BrokenSerializer)).build();
    assert!(matches!(result, Err(RepriseError::Configuration(_))));
}

#[test]
fn test_from_serializers_picks_default() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let codec = Arc::new(TypeCodec::new(registry.clone()));
    let serializer = Serializer::from_serializers(
        codec,
        vec![
            Arc::new(YamlSerializer::new(registry.clone())),
            Arc::new(JsonSerializer::new(registry)),
        ],
    )
    .unwrap();

    assert_eq!(serializer.default_serializer().name(), "json");
    assert_eq!(serializer.serializer(Some("yaml")).name(), "yaml");
    assert_eq!(serializer.serializer(Some("missing")).name(), "json");
    assert_eq!(serializer.serializer(None).name(), "json");
}

#[test]
fn test_round_trip_shapes() {
    let serializer = facade();
    let values = vec![
        Value::str("plain"),
        Value::Int(42),
        Value::Bool(true),
        Value::list(vec![Value::str("a"), Value::str("b")]),
        Value::set(vec![Value::Int(1)]),
        Value::map(vec![
            (Value::str("a"), Value::Int(1)),
            (Value::str("b"), Value::Int(2)),
        ]),
        Value::map(vec![(Value::Int(3), Value::list(vec![Value::Float(0.5)]))]),
        Value::optional(Some(Value::str("x"))),
        Object::new("Page")
            .with_field("items", Value::list(vec![Object::new("User").into()]))
            .into(),
    ];

    for value in &values {
        for name in [None, Some("yaml")] {
            let restored = round_trip(&serializer, value, name);
            assert_eq!(restored.as_ref(), Some(value), "round trip via {:?}", name);
        }
    }
}

#[test]
fn test_nested_sequence_format() {
    let serializer = facade();
    let nested = Value::list(vec![
        Value::list(vec![]),
        Value::Null,
        Value::list(vec![Value::str("a")]),
    ]);

    let text = serializer.serialize(&nested, None).unwrap();
    assert_eq!(text, r#"[]A@R#E$XnullA@R#E$X["a"]"#);
}

#[test]
fn test_nested_sequence_round_trip() {
    let serializer = facade();
    let nested = Value::list(vec![
        Value::list(vec![]),
        Value::list(vec![Value::str("a")]),
        Value::Null,
        Value::list(vec![Value::Int(1), Value::Int(2)]),
    ]);

    let descriptor = serializer.codec().describe(&nested).unwrap();
    assert_eq!(descriptor, "List-List,String,Integer");

    let restored = round_trip(&serializer, &nested, None).unwrap();
    assert_eq!(restored, nested);
}

#[test]
fn test_nested_sequence_drops_untyped_chunks() {
    let serializer = facade();
    let text = format!(r#"["a"]{0}["b"]{0}[]"#, SERIALIZE_SEPARATOR);

    let restored = serializer
        .deserialize(&text, "Set-List,String", None)
        .unwrap();
    assert_eq!(
        restored,
        Value::Seq(Sequence::new(
            "Set",
            vec![Value::list(vec![Value::str("a")]), Value::list(vec![])],
        ))
    );
}

#[test]
fn test_mixed_sequence_is_not_nested() {
    let serializer = facade();
    let mixed = Value::list(vec![Value::list(vec![]), Value::str("a")]);
    assert_eq!(serializer.serialize(&mixed, None).as_deref(), Some(r#"[[],"a"]"#));
}

#[test]
fn test_map_values_restored() {
    let serializer = facade();
    let map = MapValue::map(vec![
        (Value::str("k1"), Value::str("a")),
        (Value::str("k2"), Value::str("b")),
    ]);
    let values = Value::Seq(map.values());

    let descriptor = serializer.codec().describe(&values).unwrap();
    assert_eq!(descriptor, "MapValues-String");

    let restored = round_trip(&serializer, &values, None).unwrap();
    assert_eq!(restored, values);

    assert_eq!(
        serializer.deserialize("not json", &descriptor, None),
        Some(Value::Seq(Sequence::empty("MapValues")))
    );
}

#[test]
fn test_failures_always_use_json() {
    let serializer = facade();
    let failure = Value::failure("TimeoutException", "too slow");

    let text = serializer.serialize(&failure, Some("broken")).unwrap();
    assert_eq!(text, r#"{"message":"too slow"}"#);

    let restored = serializer.deserialize(&text, "TimeoutException", Some("broken"));
    assert_eq!(restored, Some(failure));
}

#[test]
fn test_failures_are_logged_not_raised() {
    let serializer = facade();
    let opaque = Value::Array(vec![Value::Opaque("Socket".to_string()), Value::Int(1)]);

    assert!(serializer.serialize(&opaque, None).is_none());
    assert!(serializer.serialize_with_error(&opaque, None).is_err());
    assert!(serializer.serialize(&Value::str("x"), Some("broken")).is_none());
    assert!(serializer.deserialize("\"x\"", "String", Some("broken")).is_none());
}

#[test]
fn test_empty_inputs() {
    let serializer = facade();
    assert_eq!(serializer.serialize_with_error(&Value::Null, None).unwrap(), None);
    assert!(serializer.deserialize("", "String", None).is_none());
    assert!(serializer.deserialize("\"x\"", "", None).is_none());
    assert!(serializer.deserialize("\"x\"", "com.missing.Type", None).is_none());
    assert!(serializer.deserialize("null", "String", None).is_none());
}
