//! Configuration types for the Reprise engine

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::context::ContextStoreConfig;
use crate::error::{RepriseError, Result};
use crate::serializer::JsonSerializer;

/// Default maximum element count of a recordable result
pub const DEFAULT_RECORD_SIZE_LIMIT: usize = 1000;

/// Main configuration for the Reprise engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepriseConfig {
    /// Log skipped duplicate recordings
    pub enable_debug: bool,

    /// Results with more elements, entries or array items than this are not recorded
    pub record_size_limit: usize,

    /// Serializer used when a caller does not name one
    pub default_serializer: String,

    /// Call sites whose methods are recorded and replayed
    pub dynamic_classes: Vec<DynamicClassEntity>,

    /// Context store expiry settings
    pub context_store: ContextStoreConfig,
}

impl Default for RepriseConfig {
    fn default() -> Self {
        Self {
            enable_debug: false,
            record_size_limit: DEFAULT_RECORD_SIZE_LIMIT,
            default_serializer: JsonSerializer::NAME.to_string(),
            dynamic_classes: Vec::new(),
            context_store: ContextStoreConfig::default(),
        }
    }
}

/// One configured dynamic-class call site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicClassEntity {
    /// Owning type name
    pub class_name: String,

    /// Method name; `None` configures the type without selecting a method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_name: Option<String>,

    /// Parameter type names; `None` matches any overload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_types: Option<Vec<String>>,

    /// Key expression used instead of serializing all arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_formula: Option<String>,

    /// Type appended to raw result descriptors (`List` becomes `List-Order`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_type: Option<String>,
}

impl DynamicClassEntity {
    /// Configure every method of a type
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: None,
            parameter_types: None,
            key_formula: None,
            actual_type: None,
        }
    }

    /// Builder: select a method
    pub fn with_method(mut self, method_name: impl Into<String>) -> Self {
        self.method_name = Some(method_name.into());
        self
    }

    /// Builder: select an overload by parameter types
    pub fn with_parameter_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameter_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Builder: set the key expression
    pub fn with_key_formula(mut self, formula: impl Into<String>) -> Self {
        self.key_formula = Some(formula.into());
        self
    }

    /// Builder: set the actual result type
    pub fn with_actual_type(mut self, actual_type: impl Into<String>) -> Self {
        self.actual_type = Some(actual_type.into());
        self
    }

    /// `class + method + parameter count`, the count omitted without parameter types
    ///
    /// Matches the dynamic signature the call extractor derives from a call.
    pub fn signature(&self) -> String {
        let method = self.method_name.as_deref().unwrap_or_default();
        match self.parameter_types.as_ref().filter(|types| !types.is_empty()) {
            Some(types) => format!("{}{}{}", self.class_name, method, types.len()),
            None => format!("{}{}", self.class_name, method),
        }
    }
}

/// Builder for RepriseConfig
pub struct ConfigBuilder {
    config: RepriseConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            config: RepriseConfig::default(),
        }
    }

    /// Enable debug logging of skipped recordings
    pub fn enable_debug(mut self, enabled: bool) -> Self {
        self.config.enable_debug = enabled;
        self
    }

    /// Set the record size limit
    pub fn record_size_limit(mut self, limit: usize) -> Self {
        self.config.record_size_limit = limit;
        self
    }

    /// Set the default serializer name
    pub fn default_serializer(mut self, name: impl Into<String>) -> Self {
        self.config.default_serializer = name.into();
        self
    }

    /// Add a dynamic-class call site
    pub fn dynamic_class(mut self, entity: DynamicClassEntity) -> Self {
        self.config.dynamic_classes.push(entity);
        self
    }

    /// Replace all dynamic-class call sites
    pub fn dynamic_classes(mut self, entities: Vec<DynamicClassEntity>) -> Self {
        self.config.dynamic_classes = entities;
        self
    }

    /// Set context store configuration
    pub fn context_store(mut self, config: ContextStoreConfig) -> Self {
        self.config.context_store = config;
        self
    }

    /// Build the configuration
    pub fn build(self) -> RepriseConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RepriseConfig {
    /// Load configuration from file and environment variables.
    ///
    /// Loads in this order:
    /// 1. Default configuration
    /// 2. Configuration file (reprise.toml)
    /// 3. Environment variable overrides (`REPRISE_`, `__` for nesting)
    /// 4. Configuration file from REPRISE_CONFIG_PATH, if set
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration source is invalid or the result
    /// fails validation.
    pub fn load() -> Result<Self> {
        use figment::{
            Figment,
            providers::{Env, Format, Serialized, Toml},
        };

        let mut figment = Figment::from(Serialized::defaults(RepriseConfig::default()))
            .merge(Toml::file("reprise.toml"))
            .merge(Env::prefixed("REPRISE_").split("__"));

        // Check for custom config path
        if let Ok(path) = std::env::var("REPRISE_CONFIG_PATH") {
            figment = figment.merge(Toml::file(path));
        }

        let config: RepriseConfig = figment.extract().map_err(|e| {
            RepriseError::Configuration(format!("Failed to load configuration: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    ///
    /// TOML, YAML and JSON files are accepted, chosen by extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        use figment::{
            Figment,
            providers::{Format, Json, Serialized, Toml, Yaml},
        };

        let path = path.as_ref();
        let figment = Figment::from(Serialized::defaults(RepriseConfig::default()));
        let figment = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
            Some("json") => figment.merge(Json::file(path)),
            _ => figment.merge(Toml::file(path)),
        };

        let config: RepriseConfig = figment.extract().map_err(|e| {
            RepriseError::Configuration(format!("Failed to load configuration file: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Look a dynamic-class entry up by its signature
    pub fn dynamic_entity(&self, signature: &str) -> Option<&DynamicClassEntity> {
        self.dynamic_classes
            .iter()
            .find(|entity| entity.signature() == signature)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero record size limit, an unnamed dynamic
    /// class, or two dynamic classes sharing a signature.
    pub fn validate(&self) -> Result<()> {
        if self.record_size_limit == 0 {
            return Err(RepriseError::Configuration(
                "record_size_limit must be greater than zero".to_string(),
            ));
        }

        let mut signatures = HashSet::new();
        for entity in &self.dynamic_classes {
            if entity.class_name.is_empty() {
                return Err(RepriseError::Configuration(
                    "dynamic class entry without class_name".to_string(),
                ));
            }
            if !signatures.insert(entity.signature()) {
                return Err(RepriseError::Configuration(format!(
                    "duplicate dynamic class signature: {}",
                    entity.signature()
                )));
            }
        }

        Ok(())
    }
}
