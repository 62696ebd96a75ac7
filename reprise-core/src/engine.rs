//! Process-wide collaborators of the record/replay engine
//!
//! An [`Engine`] is built once at startup, after the type registry is
//! populated, and shared as `Arc<Engine>` by every call extractor. The
//! serialization facade therefore exists before the first serialize or
//! deserialize call.

use std::sync::Arc;

use crate::config::RepriseConfig;
use crate::context::{ContextManager, ContextProvider};
use crate::error::{RepriseError, Result};
use crate::ignore::{IgnorePolicy, InvalidOperations};
use crate::mock::{InMemoryMockStore, MockStore};
use crate::serializer::{JsonSerializer, ProtoCodec, ProtoJsonCodec, Serializer, StringSerializer, YamlSerializer};
use crate::types::{TypeCodec, TypeRegistry};

/// Shared engine state
pub struct Engine {
    config: RepriseConfig,
    registry: Arc<TypeRegistry>,
    serializer: Serializer,
    proto_codec: Arc<dyn ProtoCodec>,
    mock_store: Arc<dyn MockStore>,
    ignore_policy: Arc<dyn IgnorePolicy>,
    context_provider: Arc<dyn ContextProvider>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("serializer", &self.serializer)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Start building an engine with default configuration
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new(RepriseConfig::default())
    }

    /// Engine configuration
    pub fn config(&self) -> &RepriseConfig {
        &self.config
    }

    /// Type registry
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Descriptor codec
    pub fn codec(&self) -> &Arc<TypeCodec> {
        self.serializer.codec()
    }

    /// Serialization facade
    pub fn serializer(&self) -> &Serializer {
        &self.serializer
    }

    /// Protocol-buffer codec
    pub fn proto_codec(&self) -> &Arc<dyn ProtoCodec> {
        &self.proto_codec
    }

    /// Mock store
    pub fn mock_store(&self) -> &Arc<dyn MockStore> {
        &self.mock_store
    }

    /// Ignore policy
    pub fn ignore_policy(&self) -> &Arc<dyn IgnorePolicy> {
        &self.ignore_policy
    }

    /// Execution context provider
    pub fn context_provider(&self) -> &Arc<dyn ContextProvider> {
        &self.context_provider
    }
}

/// Builder for [`Engine`]
///
/// Unset collaborators default to the in-process implementations: an
/// [`InMemoryMockStore`], [`InvalidOperations`], a [`ContextManager`] over
/// the configured store settings, the JSON and YAML serializers and
/// [`ProtoJsonCodec`].
pub struct EngineBuilder {
    config: RepriseConfig,
    registry: Option<Arc<TypeRegistry>>,
    serializers: Vec<Arc<dyn StringSerializer>>,
    proto_codec: Option<Arc<dyn ProtoCodec>>,
    mock_store: Option<Arc<dyn MockStore>>,
    ignore_policy: Option<Arc<dyn IgnorePolicy>>,
    context_provider: Option<Arc<dyn ContextProvider>>,
}

impl EngineBuilder {
    /// Create a builder over a configuration
    pub fn new(config: RepriseConfig) -> Self {
        Self {
            config,
            registry: None,
            serializers: Vec::new(),
            proto_codec: None,
            mock_store: None,
            ignore_policy: None,
            context_provider: None,
        }
    }

    /// Replace the configuration
    pub fn config(mut self, config: RepriseConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a populated type registry instead of the built-ins only
    pub fn registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Register an extra serializer
    pub fn serializer(mut self, serializer: Arc<dyn StringSerializer>) -> Self {
        self.serializers.push(serializer);
        self
    }

    /// Set the protocol-buffer codec
    pub fn proto_codec(mut self, codec: Arc<dyn ProtoCodec>) -> Self {
        self.proto_codec = Some(codec);
        self
    }

    /// Set the mock store
    pub fn mock_store(mut self, store: Arc<dyn MockStore>) -> Self {
        self.mock_store = Some(store);
        self
    }

    /// Set the ignore policy
    pub fn ignore_policy(mut self, policy: Arc<dyn IgnorePolicy>) -> Self {
        self.ignore_policy = Some(policy);
        self
    }

    /// Set the context provider
    pub fn context_provider(mut self, provider: Arc<dyn ContextProvider>) -> Self {
        self.context_provider = Some(provider);
        self
    }

    /// Use a context manager the caller keeps a handle to
    pub fn context_manager(self, manager: Arc<ContextManager>) -> Self {
        self.context_provider(manager)
    }

    /// Validate the configuration and assemble the engine
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid or names a default
    /// serializer that is not registered.
    pub fn build(self) -> Result<Engine> {
        self.config.validate()?;

        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(TypeRegistry::with_builtins()));
        let codec = Arc::new(TypeCodec::new(registry.clone()));

        let mut serializers: Vec<Arc<dyn StringSerializer>> = vec![
            Arc::new(JsonSerializer::new(registry.clone()).with_default(false)),
            Arc::new(YamlSerializer::new(registry.clone())),
        ];
        serializers.extend(self.serializers);

        let default = serializers
            .iter()
            .rev()
            .find(|serializer| serializer.name() == self.config.default_serializer)
            .cloned()
            .ok_or_else(|| {
                RepriseError::Configuration(format!(
                    "default serializer '{}' is not registered",
                    self.config.default_serializer
                ))
            })?;

        let serializer = serializers
            .into_iter()
            .fold(Serializer::builder(codec), |builder, serializer| {
                builder.add_serializer(serializer)
            })
            .default_serializer(default)
            .build()?;

        let context_provider = self.context_provider.unwrap_or_else(|| {
            Arc::new(ContextManager::new(self.config.context_store.clone()))
        });

        tracing::debug!(
            default_serializer = %self.config.default_serializer,
            dynamic_classes = self.config.dynamic_classes.len(),
            "Built record/replay engine"
        );

        Ok(Engine {
            config: self.config,
            registry,
            serializer,
            proto_codec: self
                .proto_codec
                .unwrap_or_else(|| Arc::new(ProtoJsonCodec::new())),
            mock_store: self
                .mock_store
                .unwrap_or_else(|| Arc::new(InMemoryMockStore::new())),
            ignore_policy: self
                .ignore_policy
                .unwrap_or_else(|| Arc::new(InvalidOperations::new())),
            context_provider,
        })
    }
}

#[cfg(test)]
mod engine_tests {
    use super::*;
    use crate::config::ConfigBuilder;

    #[test]
    fn test_default_engine() {
        let engine = Engine::builder().build().unwrap();
        assert_eq!(engine.serializer().default_serializer().name(), "json");
        assert_eq!(engine.serializer().serializer(Some("yaml")).name(), "yaml");
        assert!(engine.context_provider().current_context().is_none());
    }

    #[test]
    fn test_default_serializer_from_config() {
        let config = ConfigBuilder::new().default_serializer("yaml").build();
        let engine = EngineBuilder::new(config).build().unwrap();
        assert_eq!(engine.serializer().default_serializer().name(), "yaml");

        let config = ConfigBuilder::new().default_serializer("xml").build();
        assert!(matches!(
            EngineBuilder::new(config).build(),
            Err(RepriseError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ConfigBuilder::new().record_size_limit(0).build();
        assert!(EngineBuilder::new(config).build().is_err());
    }
}
