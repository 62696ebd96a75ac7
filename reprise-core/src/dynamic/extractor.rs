//! Call extractor: the record/replay decision for one intercepted call

use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::key::generate_key;
use super::MethodInfo;
use crate::context::ExecutionContext;
use crate::engine::Engine;
use crate::mock::{MockResult, MockStrategy, Mocker};
use crate::serializer::{is_protobuf_format, JsonSerializer, FORMAT_ATTRIBUTE, PROTOBUF_FORMAT};
use crate::types::names::{self, HORIZONTAL_LINE};
use crate::value::{AsyncValue, Value};

/// Serializer for argument keys and results; fixed so records stay portable
const SERIALIZER: &str = JsonSerializer::NAME;

/// Per-invocation record/replay state
///
/// The method key is derived once, at construction, from the call's
/// arguments. A deferred record works on a clone.
#[derive(Clone)]
pub struct CallExtractor {
    engine: Arc<Engine>,
    method: MethodInfo,
    dynamic_signature: String,
    method_key: Option<String>,
    actual_type: Option<String>,
}

impl std::fmt::Debug for CallExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallExtractor")
            .field("type_name", &self.method.type_name)
            .field("method_name", &self.method.method_name)
            .field("dynamic_signature", &self.dynamic_signature)
            .field("method_key", &self.method_key)
            .finish()
    }
}

impl CallExtractor {
    /// Extractor for a configured call site
    ///
    /// The key comes from the site's configured key formula when there is
    /// one, otherwise from serializing the whole argument list.
    pub fn new(engine: Arc<Engine>, method: MethodInfo, args: Vec<Value>) -> Self {
        let mut extractor = Self::unkeyed(engine, method, &args, None);
        let formula = extractor
            .engine
            .config()
            .dynamic_entity(&extractor.dynamic_signature)
            .and_then(|entity| entity.key_formula.clone())
            .filter(|formula| !formula.is_empty());
        extractor.method_key = extractor.build_method_key(&args, formula.as_deref());
        extractor
    }

    /// Extractor for a call site that names its own key expression and
    /// actual result type
    pub fn with_key_expression(
        engine: Arc<Engine>,
        method: MethodInfo,
        args: Vec<Value>,
        key_expression: Option<&str>,
        actual_type: Option<&str>,
    ) -> Self {
        let mut extractor = Self::unkeyed(engine, method, &args, actual_type);
        extractor.method_key = extractor.build_method_key(&args, key_expression);
        extractor
    }

    fn unkeyed(engine: Arc<Engine>, method: MethodInfo, args: &[Value], actual_type: Option<&str>) -> Self {
        let dynamic_signature = if args.is_empty() {
            format!("{}{}", method.type_name, method.method_name)
        } else {
            format!("{}{}{}", method.type_name, method.method_name, args.len())
        };

        Self {
            engine,
            method,
            dynamic_signature,
            method_key: None,
            actual_type: actual_type.map(str::to_string),
        }
    }

    /// Call-site identity used for config lookup and invalid-operation marking
    pub fn dynamic_signature(&self) -> &str {
        &self.dynamic_signature
    }

    /// Key derived from the arguments; `None` for calls without arguments
    pub fn method_key(&self) -> Option<&str> {
        self.method_key.as_deref()
    }

    fn build_method_key(&self, args: &[Value], expression: Option<&str>) -> Option<String> {
        if args.is_empty() {
            return None;
        }

        if let Some(expression) = expression {
            let key = generate_key(
                expression,
                &self.method.parameter_names,
                args,
                self.engine.serializer(),
            );
            if key.is_some() {
                return key;
            }
        }

        self.serialize(&Value::Array(args.to_vec()))
    }

    /// Record the real call's result
    ///
    /// A pending result is recorded once it resolves, by whichever executor
    /// completes it. Inside a tokio runtime the handle is also driven by a
    /// spawned task, which is returned; awaiting it waits for the record.
    /// Nothing here fails the caller.
    pub fn record_response(&self, result: Value) -> Option<JoinHandle<()>> {
        let context = self.engine.context_provider().current_context();
        self.record_in_context(context, result)
    }

    fn record_in_context(&self, context: Option<Arc<ExecutionContext>>, result: Value) -> Option<JoinHandle<()>> {
        if self.is_invalid() {
            tracing::warn!(
                signature = %self.dynamic_signature,
                "Not recording invalid operation: arguments or result cannot be serialized"
            );
            return None;
        }

        match result {
            Value::Pending(pending) => self.record_deferred(context, pending),
            result => {
                self.record_value(context.as_deref(), &result);
                None
            }
        }
    }

    fn record_deferred(&self, context: Option<Arc<ExecutionContext>>, pending: AsyncValue) -> Option<JoinHandle<()>> {
        let extractor = self.clone();
        pending.when_complete(move |outcome| {
            let result = match outcome {
                Ok(value) => value.clone(),
                Err(failure) => Value::Failure(failure.clone()),
            };
            extractor.record_in_context(context, result);
        });

        // drive the handle on the current runtime; without one, the caller's
        // executor completes it and the callback records there
        let runtime = Handle::try_current().ok()?;
        Some(runtime.spawn(async move {
            pending.outcome().await;
        }))
    }

    fn record_value(&self, context: Option<&ExecutionContext>, result: &Value) {
        let signature_hash = encode_and_hash(&self.duplicate_key(result));
        if !self.need_record(context, result, signature_hash) {
            return;
        }

        let mut mocker = self.make_mocker();
        mocker.record_id = context.map(|context| context.case_id().to_string());
        mocker.target_response.type_name = self.build_result_type(self.engine.codec().describe(result));
        let body = if self.engine.registry().is_protobuf(result) {
            mocker
                .target_response
                .set_attribute(FORMAT_ATTRIBUTE, PROTOBUF_FORMAT);
            match self.engine.proto_codec().serialize(result) {
                Ok(body) => Some(body),
                Err(e) => {
                    tracing::warn!(signature = %self.dynamic_signature, error = %e, "Failed to encode protobuf result");
                    None
                }
            }
        } else {
            self.serialize(result)
        };
        mocker.target_response.body = body;

        self.engine.mock_store().record_mocker(mocker);
    }

    /// Size check first, then claim the duplicate hash in the context
    fn need_record(&self, context: Option<&ExecutionContext>, result: &Value, signature_hash: u64) -> bool {
        if !result.is_null() && !result.is_failure() {
            let limit = self.engine.config().record_size_limit;
            if let Some(size) = result.len().filter(|size| *size > limit) {
                tracing::warn!(
                    signature = %self.dynamic_signature,
                    size,
                    limit,
                    "Not recording: result size exceeds limit"
                );
                return false;
            }
        }

        if context.is_some_and(|context| !context.mark_recorded(signature_hash)) {
            if self.engine.config().enable_debug {
                tracing::warn!(
                    signature = %self.dynamic_signature,
                    key = %self.duplicate_key(result),
                    "Not recording: same method signature already recorded"
                );
            }
            return false;
        }

        true
    }

    /// `type_method_key_no_result`, or `type_method_key_has_result_<shape>`
    /// where the shape is the runtime type name plus the element count of
    /// containers
    fn duplicate_key(&self, result: &Value) -> String {
        let key = self.method_key.as_deref().unwrap_or(names::NULL);
        if result.is_null() {
            return format!(
                "{}_{}_{}_no_result",
                self.method.type_name, self.method.method_name, key
            );
        }

        let shape = match result.len() {
            Some(len) => format!("{}{}", result.type_name(), len),
            None => result.type_name().to_string(),
        };
        format!(
            "{}_{}_{}_has_result_{}",
            self.method.type_name, self.method.method_name, key, shape
        )
    }

    /// Append the actual type to raw descriptors: from the call site first,
    /// then from the dynamic-class configuration
    fn build_result_type(&self, descriptor: Option<String>) -> Option<String> {
        let descriptor = descriptor?;
        if descriptor.is_empty() || descriptor.contains(HORIZONTAL_LINE) {
            return Some(descriptor);
        }

        if let Some(actual_type) = self.actual_type.as_deref().filter(|t| *t != names::OBJECT) {
            return Some(format!("{}{}{}", descriptor, HORIZONTAL_LINE, actual_type));
        }

        match self
            .engine
            .config()
            .dynamic_entity(&self.dynamic_signature)
            .and_then(|entity| entity.actual_type.as_deref())
            .filter(|t| !t.is_empty())
        {
            Some(actual_type) => Some(format!("{}{}{}", descriptor, HORIZONTAL_LINE, actual_type)),
            None => Some(descriptor),
        }
    }

    /// Replay a recorded result
    ///
    /// Results for calls with a method key are cached in the current
    /// context; calls without one are looked up every time.
    pub fn replay(&self) -> MockResult {
        if self.is_invalid() {
            tracing::warn!(
                signature = %self.dynamic_signature,
                "Not replaying invalid operation: arguments or result cannot be serialized"
            );
            return MockResult::ignore();
        }

        let key = self.cache_key();
        let context = self.engine.context_provider().current_context();
        let cached = match (&key, &context) {
            (Some(key), Some(context)) => context.cached_replay(key),
            _ => None,
        };

        let result = match cached {
            Some(result) => result,
            None => {
                let store = self.engine.mock_store();
                let replayed = store
                    .replay_mocker(&self.make_mocker(), MockStrategy::FindLast)
                    .filter(|mocker| store.check_response_mocker(mocker))
                    .and_then(|mocker| self.deserialize_result(&mocker))
                    .unwrap_or(Value::Null);
                let restored = self.restore_response(replayed);

                if let (Some(key), Some(context)) = (key, context) {
                    if !restored.is_null() {
                        context.cache_replay(key, restored.clone());
                    }
                }
                restored
            }
        };

        let ignore = self
            .engine
            .ignore_policy()
            .ignore_mock_result(&self.method.type_name, &self.method.method_name);
        MockResult::success(ignore, result)
    }

    fn deserialize_result(&self, mocker: &Mocker) -> Option<Value> {
        let response = &mocker.target_response;
        let body = response.body.as_deref()?;
        let type_name = response.type_name.as_deref()?;

        if !is_protobuf_format(&response.attributes) {
            return self.engine.serializer().deserialize(body, type_name, Some(SERIALIZER));
        }

        let handle = self.engine.codec().resolve(type_name)?;
        match self.engine.proto_codec().deserialize(body, &handle) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(type_name = %type_name, error = %e, "Failed to decode protobuf result");
                None
            }
        }
    }

    /// Shape a replayed value the way the call site expects it: wrapped in
    /// an already-completed handle when the method returns an async handle
    fn restore_response(&self, result: Value) -> Value {
        match self.method.return_type.as_deref() {
            Some(return_type) if self.engine.registry().is_async_handle(return_type) => {
                let handle = match result {
                    Value::Failure(failure) => AsyncValue::failed(return_type, failure),
                    value => AsyncValue::ready(return_type, value),
                };
                Value::Pending(handle)
            }
            _ => result,
        }
    }

    fn cache_key(&self) -> Option<String> {
        self.method_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .map(|key| format!("{}_{}_{}", self.method.type_name, self.method.method_name, key))
    }

    fn make_mocker(&self) -> Mocker {
        let mut mocker = Mocker::dynamic_class(&self.method.type_name, &self.method.method_name);
        mocker.target_request.body = self.method_key.clone();
        mocker
    }

    fn is_invalid(&self) -> bool {
        self.engine
            .ignore_policy()
            .invalid_operation(&self.dynamic_signature)
    }

    /// Serialize with the fixed serializer; a failure marks this call site invalid
    fn serialize(&self, value: &Value) -> Option<String> {
        if self.is_invalid() {
            return None;
        }

        match self
            .engine
            .serializer()
            .serialize_with_error(value, Some(SERIALIZER))
        {
            Ok(text) => text,
            Err(e) => {
                self.engine
                    .ignore_policy()
                    .add_invalid_operation(&self.dynamic_signature);
                tracing::warn!(
                    signature = %self.dynamic_signature,
                    value_type = %self.engine.codec().error_description(value),
                    error = %e,
                    "Failed to serialize, operation marked invalid"
                );
                None
            }
        }
    }
}

/// First eight bytes of the SHA-256 digest, big-endian
fn encode_and_hash(text: &str) -> u64 {
    let digest = Sha256::digest(text.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}
