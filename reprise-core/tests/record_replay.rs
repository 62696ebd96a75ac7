//! End-to-end record and replay through a persisted record file

use std::io::Write;
use std::sync::Arc;

use reprise_core::prelude::*;
use tempfile::NamedTempFile;
use tokio_test::assert_ok;

const RATES: &str = "com.acme.Rates";

fn registry() -> Arc<TypeRegistry> {
    let registry = TypeRegistry::with_builtins();
    registry.register(
        TypeDef::builder("Response", TypeKind::Object)
            .param("T")
            .slot("T", "data")
            .build(),
    );
    registry.register(TypeDef::object("Quote"));
    registry.register(TypeDef::failure("RateLimitError"));
    Arc::new(registry)
}

fn engine(config: RepriseConfig, store: Arc<dyn MockStore>, contexts: Arc<ContextManager>) -> Arc<Engine> {
    let engine = EngineBuilder::new(config)
        .registry(registry())
        .mock_store(store)
        .context_manager(contexts)
        .build();
    Arc::new(assert_ok!(engine))
}

fn config_file() -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    write!(
        file,
        r##"
record_size_limit: 50
dynamic_classes:
  - class_name: com.acme.Rates
    method_name: quote
    parameter_types: [Quote]
    key_formula: "#quote.base + #quote.target"
  - class_name: com.acme.Rates
    method_name: currencies
    actual_type: String
context_store:
  ttl: 2m
  cleanup_threshold: 4
"##
    )
    .unwrap();
    file
}

fn quote(base: &str, target: &str) -> Value {
    Object::new("Quote")
        .with_field("base", base)
        .with_field("target", target)
        .into()
}

/// Record a few calls, persist the records, then replay them in a fresh engine
#[test]
fn test_record_persist_replay() {
    let file = config_file();
    let config = assert_ok!(RepriseConfig::from_file(file.path()));
    assert_eq!(config.record_size_limit, 50);
    assert_eq!(config.context_store.ttl, std::time::Duration::from_secs(120));

    let quote_method = MethodInfo::new(RATES, "quote").with_parameter("quote", "Quote");
    let currencies = MethodInfo::new(RATES, "currencies");
    let history = MethodInfo::new(RATES, "history").with_parameter("days", "Integer");

    let response: Value = Object::new("Response")
        .with_field("code", 200i64)
        .with_field("data", quote("EUR", "USD"))
        .into();
    let nested = Value::list(vec![
        Value::list(vec![Value::Float(1.08), Value::Float(1.09)]),
        Value::list(vec![]),
        Value::list(vec![Value::str("closed")]),
    ]);

    // recording run
    let recorded = {
        let store = Arc::new(InMemoryMockStore::new());
        let contexts = Arc::new(ContextManager::new(config.context_store.clone()));
        let engine = engine(config.clone(), store.clone(), contexts.clone());

        contexts.create_context("case-1", None);
        let _scope = contexts.enter("case-1");

        let extractor = CallExtractor::new(engine.clone(), quote_method.clone(), vec![quote("EUR", "USD")]);
        assert_eq!(extractor.method_key(), Some("EURUSD"));
        extractor.record_response(response.clone());

        CallExtractor::new(engine.clone(), currencies.clone(), vec![]).record_response(Value::list(vec![]));
        CallExtractor::new(engine.clone(), history.clone(), vec![Value::Int(3)]).record_response(nested.clone());
        CallExtractor::new(engine, history.clone(), vec![Value::Int(4)])
            .record_response(Value::failure("RateLimitError", "slow down"));

        contexts.remove_context("case-1");
        store.records()
    };
    assert_eq!(recorded.len(), 4);
    assert_eq!(
        recorded[0].target_response.type_name.as_deref(),
        Some("Response-Quote")
    );
    assert_eq!(
        recorded[1].target_response.type_name.as_deref(),
        Some("List-String")
    );
    assert_eq!(
        recorded[2].target_response.type_name.as_deref(),
        Some("List-List,Float,String")
    );

    let mut records_file = NamedTempFile::new().unwrap();
    serde_json::to_writer(&mut records_file, &recorded).unwrap();
    let text = std::fs::read_to_string(records_file.path()).unwrap();
    let loaded: Vec<Mocker> = serde_json::from_str(&text).unwrap();
    assert_eq!(loaded, recorded);

    // replay run
    let contexts = Arc::new(ContextManager::new(config.context_store.clone()));
    let engine = engine(
        config,
        Arc::new(InMemoryMockStore::with_records(loaded)),
        contexts.clone(),
    );
    let context = contexts.create_context("case-2", Some("case-1"));
    assert!(context.is_replay());
    let _scope = contexts.enter("case-2");

    let replayed = CallExtractor::new(engine.clone(), quote_method, vec![quote("EUR", "USD")]).replay();
    assert_eq!(replayed, MockResult::success(false, response));

    let replayed = CallExtractor::new(engine.clone(), currencies, vec![]).replay();
    assert_eq!(replayed.result, Value::list(vec![]));

    let replayed = CallExtractor::new(engine.clone(), history.clone(), vec![Value::Int(3)]).replay();
    assert_eq!(replayed.result, nested);

    let replayed = CallExtractor::new(engine, history, vec![Value::Int(4)]).replay();
    assert_eq!(replayed.result, Value::failure("RateLimitError", "slow down"));
}

#[test]
fn test_pending_result_recorded_on_runtime() {
    let store = Arc::new(InMemoryMockStore::new());
    let contexts = Arc::new(ContextManager::default());
    let engine = engine(RepriseConfig::default(), store.clone(), contexts.clone());
    let method = MethodInfo::new(RATES, "latest")
        .with_parameter("currency", "String")
        .with_return_type("Future");

    contexts.create_context("case-1", None);
    let _scope = contexts.enter("case-1");

    tokio_test::block_on(async {
        let pending = AsyncValue::new(async {
            tokio::task::yield_now().await;
            Ok(Value::Float(1.08))
        });
        let handle = CallExtractor::new(engine.clone(), method.clone(), vec![Value::str("EUR")])
            .record_response(Value::Pending(pending))
            .expect("deferred record");
        assert_ok!(handle.await);
    });
    assert_eq!(store.len(), 1);

    let Value::Pending(handle) = CallExtractor::new(engine, method, vec![Value::str("EUR")])
        .replay()
        .result
    else {
        panic!("expected an async handle");
    };
    let outcome = tokio_test::block_on(handle.outcome());
    assert_eq!(outcome, Ok(Value::Float(1.08)));
}

#[test]
fn test_cache_advice_gate() {
    let file = config_file();
    let config = assert_ok!(RepriseConfig::from_file(file.path()));
    let contexts = ContextManager::default();
    let method = MethodInfo::new(RATES, "quote").with_parameter("quote", "Quote");

    assert!(!need_record_or_replay(&contexts, &config, Some(&method)));

    contexts.create_context("case-1", None);
    let _scope = contexts.enter("case-1");
    assert!(need_record_or_replay(&contexts, &config, Some(&method)));

    let other = MethodInfo::new(RATES, "quote").with_parameter("pair", "String");
    assert!(!need_record_or_replay(&contexts, &config, Some(&other)));
}
