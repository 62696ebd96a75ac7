//! # Reprise - Record and Replay for Intercepted Calls
//!
//! Reprise captures the results of selected method calls while a service
//! handles a request, and substitutes those results when the same request
//! is replayed later. It provides:
//! - A type descriptor codec that describes and rebuilds generic shapes
//! - A serialization facade with nested-sequence and failure handling
//! - Per-request execution contexts with TTL-based cleanup
//! - A call extractor that decides what to record and what to replay
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use reprise_core::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let contexts = Arc::new(ContextManager::default());
//!     let engine = Arc::new(Engine::builder().context_manager(contexts.clone()).build()?);
//!
//!     contexts.create_context("case-1", None);
//!     let _scope = contexts.enter("case-1");
//!
//!     let method = MethodInfo::new("com.acme.Rates", "latest").with_parameter("currency", "String");
//!     let args = vec![Value::str("EUR")];
//!
//!     // record the real result
//!     CallExtractor::new(engine.clone(), method.clone(), args.clone())
//!         .record_response(Value::Float(1.08));
//!
//!     // replay it
//!     let mocked = CallExtractor::new(engine, method, args).replay();
//!     assert_eq!(mocked.result, Value::Float(1.08));
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **types**: type registry, handles and the descriptor grammar
//! - **serializer**: named string serializers behind one facade
//! - **context**: execution contexts keyed by case id
//! - **dynamic**: the per-call record/replay decision
//! - **mock**: the record format and the store records go through

pub mod config;
pub mod context;
pub mod dynamic;
pub mod engine;
pub mod error;
pub mod ignore;
pub mod logging;
pub mod mock;
pub mod serializer;
pub mod types;
pub mod value;

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{ConfigBuilder, DynamicClassEntity, RepriseConfig};
    pub use crate::context::{
        ContextManager, ContextProvider, ContextScope, ContextStore, ContextStoreConfig,
        ExecutionContext,
    };
    pub use crate::dynamic::{need_record_or_replay, CallExtractor, KeyExpression, MethodInfo};
    pub use crate::engine::{Engine, EngineBuilder};
    pub use crate::error::{RepriseError, Result};
    pub use crate::ignore::{IgnorePolicy, InvalidOperations};
    pub use crate::mock::{
        InMemoryMockStore, MockCategory, MockResult, MockStore, MockStrategy, Mocker,
        TargetRequest, TargetResponse,
    };
    pub use crate::serializer::{
        JsonSerializer, ProtoCodec, ProtoJsonCodec, Serializer, SerializerBuilder,
        StringSerializer, YamlSerializer,
    };
    pub use crate::types::{TypeCodec, TypeDef, TypeHandle, TypeKind, TypeRegistry};
    pub use crate::value::{AsyncValue, Failure, MapValue, Object, Sequence, Value};
}
