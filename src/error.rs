//! Error types for the schema registry and serializers

use thiserror::Error;

use crate::schema::{SchemaDataFormat, SchemaInfo};

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Boxed failure raised by a concrete codec, kept as the source of the wrapping error
pub type CodecError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Schema registry errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Invalid argument `{argument}`: {reason}")]
    InvalidInput {
        argument: &'static str,
        reason: String,
    },

    #[error("Unsupported schema format: serializer handles {expected}, context requested {actual}")]
    UnsupportedSchemaFormat {
        expected: SchemaDataFormat,
        actual: SchemaDataFormat,
    },

    #[error("No serializer registered for {format} (supported: {})", format_list(.supported))]
    SerializerNotFound {
        format: SchemaDataFormat,
        supported: Vec<SchemaDataFormat>,
    },

    #[error("The message schema for {message_type} is not registered and auto registration is disabled")]
    NotRegistered { message_type: String },

    #[error("Failed to serialize {format} message with schema {}", schema_info.schema_name)]
    SerializationFailed {
        format: SchemaDataFormat,
        schema_info: SchemaInfo,
        #[source]
        source: CodecError,
    },

    #[error("Failed to deserialize {format} message with schema {}", schema_info.schema_name)]
    DeserializationFailed {
        format: SchemaDataFormat,
        schema_info: SchemaInfo,
        #[source]
        source: CodecError,
    },

    #[error("Header already present: {key}")]
    HeaderAlreadyPresent { key: String },

    #[error("Operation cancelled before the schema registry responded")]
    Cancelled,

    #[error("Remote registry error: {0}")]
    Remote(String),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaError {
    /// Shorthand for an [`SchemaError::InvalidInput`] about an empty or whitespace argument
    pub(crate) fn blank(argument: &'static str) -> Self {
        SchemaError::InvalidInput {
            argument,
            reason: "cannot be empty or whitespace".to_string(),
        }
    }
}

fn format_list(formats: &[SchemaDataFormat]) -> String {
    if formats.is_empty() {
        return "none".to_string();
    }
    formats
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
