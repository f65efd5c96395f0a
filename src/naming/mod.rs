//! Schema naming strategies
//!
//! A strategy derives a `(namespace id, local name)` pair from a message type
//! and an optional stream name; the output format then decides how the pair
//! is rendered:
//!
//! | format       | result                                  |
//! |--------------|-----------------------------------------|
//! | `None`       | `{nid}.{nss}`                           |
//! | `KebabCase`  | `{kebab(nid)}.{kebab(nss)}`             |
//! | `SnakeCase`  | `{snake(nid)}.{snake(nss)}`             |
//! | `Urn`        | `urn:{snake(nid)}:{snake(nss)}`         |

pub mod case;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::message::MessageType;
use crate::stream::{category_of, StreamId};

pub use case::{to_kebab_case, to_snake_case};

/// How the generated name pair is rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaNameOutputFormat {
    #[default]
    None,
    KebabCase,
    SnakeCase,
    Urn,
}

impl SchemaNameOutputFormat {
    fn render(&self, nid: &str, nss: &str) -> String {
        match self {
            SchemaNameOutputFormat::None => format!("{}.{}", nid, nss),
            SchemaNameOutputFormat::KebabCase => {
                format!("{}.{}", to_kebab_case(nid), to_kebab_case(nss))
            }
            SchemaNameOutputFormat::SnakeCase => {
                format!("{}.{}", to_snake_case(nid), to_snake_case(nss))
            }
            SchemaNameOutputFormat::Urn => {
                format!("urn:{}:{}", to_snake_case(nid), to_snake_case(nss))
            }
        }
    }
}

impl FromStr for SchemaNameOutputFormat {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "none" => Ok(SchemaNameOutputFormat::None),
            "kebab_case" | "kebab" => Ok(SchemaNameOutputFormat::KebabCase),
            "snake_case" | "snake" => Ok(SchemaNameOutputFormat::SnakeCase),
            "urn" => Ok(SchemaNameOutputFormat::Urn),
            other => Err(SchemaError::InvalidInput {
                argument: "format",
                reason: format!("unsupported schema name format '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StrategyKind {
    /// Declaring namespace + type name
    Message,
    /// Stream category + type name
    Category,
    /// Fixed namespace + type name
    Namespace(String),
    /// Fixed namespace and stream category + type name
    NamespaceCategory(String),
}

/// Rule for turning a message type (and stream) into a schema name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNameStrategy {
    kind: StrategyKind,
    format: SchemaNameOutputFormat,
}

impl SchemaNameStrategy {
    pub fn message(format: SchemaNameOutputFormat) -> Self {
        Self {
            kind: StrategyKind::Message,
            format,
        }
    }

    /// Requires a stream name at generation time
    pub fn category(format: SchemaNameOutputFormat) -> Self {
        Self {
            kind: StrategyKind::Category,
            format,
        }
    }

    pub fn namespace(namespace_id: &str, format: SchemaNameOutputFormat) -> Result<Self> {
        Ok(Self {
            kind: StrategyKind::Namespace(validated_namespace(namespace_id)?),
            format,
        })
    }

    /// Requires a stream name at generation time
    pub fn namespace_category(namespace_id: &str, format: SchemaNameOutputFormat) -> Result<Self> {
        Ok(Self {
            kind: StrategyKind::NamespaceCategory(validated_namespace(namespace_id)?),
            format,
        })
    }

    pub fn format(&self) -> SchemaNameOutputFormat {
        self.format
    }

    pub fn requires_stream(&self) -> bool {
        matches!(
            self.kind,
            StrategyKind::Category | StrategyKind::NamespaceCategory(_)
        )
    }

    /// Generate the schema name for `message_type`, optionally within a stream
    pub fn generate_schema_name(
        &self,
        message_type: &MessageType,
        stream_name: Option<&str>,
    ) -> Result<String> {
        if message_type.is_missing() {
            return Err(SchemaError::InvalidInput {
                argument: "message_type",
                reason: "message type is missing".to_string(),
            });
        }

        let stream_name = stream_name.unwrap_or_default();
        if self.requires_stream() && stream_name.trim().is_empty() {
            return Err(SchemaError::blank("stream_name"));
        }

        let (nid, nss) = self.components(message_type, stream_name);
        Ok(self.format.render(&nid, nss))
    }

    fn components(&self, message_type: &MessageType, stream_name: &str) -> (String, &'static str) {
        let nss = message_type.name();
        let nid = match &self.kind {
            StrategyKind::Message => message_type.namespace().to_string(),
            StrategyKind::Category => category_of(stream_name).to_string(),
            StrategyKind::Namespace(namespace) => namespace.clone(),
            StrategyKind::NamespaceCategory(namespace) => {
                format!("{}.{}", namespace, category_of(stream_name))
            }
        };
        (nid, nss)
    }
}

impl Default for SchemaNameStrategy {
    fn default() -> Self {
        Self::message(SchemaNameOutputFormat::None)
    }
}

fn validated_namespace(namespace_id: &str) -> Result<String> {
    if namespace_id.trim().is_empty() {
        return Err(SchemaError::blank("namespace_id"));
    }
    Ok(namespace_id.to_string())
}

/// Derives the registry subject for a message type within a stream context
pub trait SubjectNameStrategy: Send + Sync + fmt::Debug {
    fn subject_name(&self, message_type: &MessageType, stream: &StreamId) -> Result<String>;
}

/// Subject is the message type's full name; the default
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageSubjectName;

impl SubjectNameStrategy for MessageSubjectName {
    fn subject_name(&self, message_type: &MessageType, _stream: &StreamId) -> Result<String> {
        if message_type.is_missing() {
            return Err(SchemaError::InvalidInput {
                argument: "message_type",
                reason: "message type is missing".to_string(),
            });
        }
        Ok(message_type.full_name())
    }
}

impl SubjectNameStrategy for SchemaNameStrategy {
    fn subject_name(&self, message_type: &MessageType, stream: &StreamId) -> Result<String> {
        let stream_name = (!stream.is_none()).then(|| stream.as_str());
        self.generate_schema_name(message_type, stream_name)
    }
}
