//! Configuration management for the schema registry
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schemas.toml)
//! - Environment variables (SCHEMAS__*)
//!
//! ## Example config file (schemas.toml):
//! ```toml
//! [registry]
//! auto_register = true
//! formats = ["bytes", "json", "protobuf"]
//!
//! [naming]
//! strategy = "namespace"
//! namespace_id = "identity"
//! output_format = "kebab_case"
//! ```

use std::path::Path;
use std::sync::Arc;

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::client::SchemaRegistryClient;
use crate::error::{Result, SchemaError};
use crate::naming::{SchemaNameOutputFormat, SchemaNameStrategy};
use crate::registry::SchemaRegistry;
use crate::resolver::SchemaRegistryOptions;
use crate::schema::SchemaDataFormat;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemasConfig {
    /// Registry settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Schema naming settings
    #[serde(default)]
    pub naming: NamingConfig,
}

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Register unseen message types on first serialization
    #[serde(default = "default_true")]
    pub auto_register: bool,

    /// Data formats to install serializers for
    #[serde(default = "default_formats")]
    pub formats: Vec<SchemaDataFormat>,
}

/// Which naming strategy derives schema names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategyKind {
    #[default]
    Message,
    Category,
    Namespace,
    NamespaceCategory,
}

/// Naming configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamingConfig {
    #[serde(default)]
    pub strategy: NamingStrategyKind,

    /// Required by the namespace strategies
    #[serde(default)]
    pub namespace_id: Option<String>,

    #[serde(default)]
    pub output_format: SchemaNameOutputFormat,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_formats() -> Vec<SchemaDataFormat> {
    vec![
        SchemaDataFormat::Bytes,
        SchemaDataFormat::Json,
        SchemaDataFormat::Protobuf,
    ]
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            auto_register: true,
            formats: default_formats(),
        }
    }
}

impl NamingConfig {
    /// Build the configured strategy
    pub fn strategy(&self) -> Result<SchemaNameStrategy> {
        let namespace_id = || {
            self.namespace_id.as_deref().ok_or(SchemaError::InvalidInput {
                argument: "naming.namespace_id",
                reason: format!("required by the {:?} strategy", self.strategy),
            })
        };

        match self.strategy {
            NamingStrategyKind::Message => Ok(SchemaNameStrategy::message(self.output_format)),
            NamingStrategyKind::Category => Ok(SchemaNameStrategy::category(self.output_format)),
            NamingStrategyKind::Namespace => {
                SchemaNameStrategy::namespace(namespace_id()?, self.output_format)
            }
            NamingStrategyKind::NamespaceCategory => {
                SchemaNameStrategy::namespace_category(namespace_id()?, self.output_format)
            }
        }
    }
}

impl SchemasConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, layering a specific file over the default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["schemas.toml", ".schemas.toml", "config/schemas.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "message-schemas", "schemas") {
            let xdg_config = config_dir.config_dir().join("schemas.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // Load from environment variables (SCHEMAS__*)
        builder = builder.add_source(
            Environment::with_prefix("SCHEMAS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Registry options for this configuration
    pub fn registry_options(&self) -> Result<SchemaRegistryOptions> {
        let strategy = self.naming.strategy()?;
        if strategy.requires_stream() {
            warn!(
                strategy = ?self.naming.strategy,
                "strategy needs a stream; registrations without a schema name will fail"
            );
        }

        Ok(SchemaRegistryOptions {
            subject_name_strategy: Arc::new(strategy),
            auto_register: self.registry.auto_register,
        })
    }

    /// Registry over `client` with a serializer for each configured format
    pub fn build_registry(&self, client: Arc<dyn SchemaRegistryClient>) -> Result<SchemaRegistry> {
        let mut registry = SchemaRegistry::new(client, self.registry_options()?);
        for format in &self.registry.formats {
            registry = match format {
                SchemaDataFormat::Bytes => registry.use_bytes(),
                SchemaDataFormat::Json => registry.use_json(),
                SchemaDataFormat::Protobuf => registry.use_protobuf(),
                other => {
                    return Err(SchemaError::InvalidInput {
                        argument: "registry.formats",
                        reason: format!("no built-in serializer for {}", other),
                    })
                }
            };
        }
        Ok(registry)
    }
}
