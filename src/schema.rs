//! Schema value types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::headers::{header_keys, Headers};

/// MIME type for JSON payloads
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// MIME type for Protobuf payloads
pub const PROTOBUF_CONTENT_TYPE: &str = "application/vnd.google.protobuf";
/// MIME type for Avro payloads
pub const AVRO_CONTENT_TYPE: &str = "application/vnd.apache.avro+json";
/// MIME type for raw bytes, also the fallback for unspecified formats
pub const BYTES_CONTENT_TYPE: &str = "application/octet-stream";

/// Wire encoding family of a message body
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SchemaDataFormat {
    #[default]
    Unspecified = 0,
    Json = 1,
    Protobuf = 2,
    Avro = 3,
    Bytes = 4,
}

impl SchemaDataFormat {
    /// Lower-case name used in headers and config
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaDataFormat::Unspecified => "unspecified",
            SchemaDataFormat::Json => "json",
            SchemaDataFormat::Protobuf => "protobuf",
            SchemaDataFormat::Avro => "avro",
            SchemaDataFormat::Bytes => "bytes",
        }
    }

    /// Negotiable content type for this format
    pub fn content_type(&self) -> &'static str {
        match self {
            SchemaDataFormat::Json => JSON_CONTENT_TYPE,
            SchemaDataFormat::Protobuf => PROTOBUF_CONTENT_TYPE,
            SchemaDataFormat::Avro => AVRO_CONTENT_TYPE,
            SchemaDataFormat::Bytes | SchemaDataFormat::Unspecified => BYTES_CONTENT_TYPE,
        }
    }

    /// Map a legacy content type back to a format; unknown types are `Unspecified`
    pub fn from_content_type(content_type: &str) -> Self {
        match content_type {
            JSON_CONTENT_TYPE => SchemaDataFormat::Json,
            PROTOBUF_CONTENT_TYPE => SchemaDataFormat::Protobuf,
            AVRO_CONTENT_TYPE => SchemaDataFormat::Avro,
            BYTES_CONTENT_TYPE => SchemaDataFormat::Bytes,
            _ => SchemaDataFormat::Unspecified,
        }
    }
}

impl fmt::Display for SchemaDataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaDataFormat {
    type Err = SchemaError;

    /// Case-insensitive, accepts the numeric discriminant as well
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unspecified" | "0" => Ok(SchemaDataFormat::Unspecified),
            "json" | "1" => Ok(SchemaDataFormat::Json),
            "protobuf" | "2" => Ok(SchemaDataFormat::Protobuf),
            "avro" | "3" => Ok(SchemaDataFormat::Avro),
            "bytes" | "4" => Ok(SchemaDataFormat::Bytes),
            other => Err(SchemaError::InvalidInput {
                argument: "data_format",
                reason: format!("unknown schema data format '{}'", other),
            }),
        }
    }
}

/// Schema name paired with a data format
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub schema_name: String,
    pub data_format: SchemaDataFormat,
}

impl SchemaInfo {
    pub fn new(schema_name: impl Into<String>, data_format: SchemaDataFormat) -> Self {
        Self {
            schema_name: schema_name.into(),
            data_format,
        }
    }

    /// The undefined schema info
    pub fn none() -> Self {
        Self::default()
    }

    /// Copy of this info with another schema name
    pub fn with_schema_name(&self, schema_name: impl Into<String>) -> Self {
        Self::new(schema_name, self.data_format)
    }

    pub fn schema_name_missing(&self) -> bool {
        self.schema_name.trim().is_empty()
    }

    pub fn content_type(&self) -> &'static str {
        self.data_format.content_type()
    }

    /// Write both the schema name and data format into the headers
    pub fn inject_into_headers(&self, headers: &mut Headers) {
        headers.set(header_keys::SCHEMA_NAME, Some(self.schema_name.clone()));
        headers.set(
            header_keys::SCHEMA_DATA_FORMAT,
            Some(self.data_format.as_str().to_string()),
        );
    }

    /// Write only the schema name into the headers
    pub fn inject_schema_name_into_headers(&self, headers: &mut Headers) {
        headers.set(header_keys::SCHEMA_NAME, Some(self.schema_name.clone()));
    }

    /// Read schema info from headers, falling back to the deprecated keys
    pub fn from_headers(headers: &Headers) -> Self {
        let legacy_name = headers.get_string(header_keys::LEGACY_SCHEMA_SUBJECT, "");
        let schema_name = headers.get_string(header_keys::SCHEMA_NAME, legacy_name);

        let legacy_format =
            headers.get_enum(header_keys::LEGACY_SCHEMA_TYPE, SchemaDataFormat::Unspecified);
        let data_format = headers.get_enum(header_keys::SCHEMA_DATA_FORMAT, legacy_format);

        Self::new(schema_name, data_format)
    }

    /// Legacy inference from an event type name and its content type
    pub fn from_content_type(schema_name: &str, content_type: &str) -> Result<Self> {
        if schema_name.is_empty() {
            return Err(SchemaError::blank("schema_name"));
        }
        if content_type.is_empty() {
            return Err(SchemaError::blank("content_type"));
        }
        Ok(Self::new(
            schema_name,
            SchemaDataFormat::from_content_type(content_type),
        ))
    }
}

impl fmt::Display for SchemaInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.schema_name, self.data_format)
    }
}

/// A schema as known by the remote registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredSchema {
    pub subject: String,
    pub data_format: SchemaDataFormat,
    /// Remote-assigned revision identifier
    pub revision_id: String,
    /// Serialized schema definition, empty for schema-less formats
    pub definition: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

impl RegisteredSchema {
    /// Sentinel for "no schema found"
    pub fn none() -> Self {
        Self::default()
    }

    /// True only for a value equal in every field to [`RegisteredSchema::none`]
    pub fn is_none(&self) -> bool {
        *self == Self::none()
    }

    pub fn to_schema_info(&self) -> SchemaInfo {
        SchemaInfo::new(self.subject.clone(), self.data_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_name_missing() {
        assert!(SchemaInfo::none().schema_name_missing());
        assert!(SchemaInfo::new(" \t", SchemaDataFormat::Json).schema_name_missing());
        assert!(!SchemaInfo::new("user.UserRegistered", SchemaDataFormat::Json).schema_name_missing());
    }

    #[test]
    fn test_content_type_mapping() {
        assert_eq!(SchemaDataFormat::Json.content_type(), "application/json");
        assert_eq!(SchemaDataFormat::Protobuf.content_type(), "application/vnd.google.protobuf");
        assert_eq!(SchemaDataFormat::Avro.content_type(), "application/vnd.apache.avro+json");
        assert_eq!(SchemaDataFormat::Bytes.content_type(), "application/octet-stream");
        assert_eq!(SchemaDataFormat::Unspecified.content_type(), "application/octet-stream");
    }

    #[test]
    fn test_from_content_type() {
        let info = SchemaInfo::from_content_type("UserRegistered", "application/json").unwrap();
        assert_eq!(info, SchemaInfo::new("UserRegistered", SchemaDataFormat::Json));

        let info = SchemaInfo::from_content_type("UserRegistered", "text/plain").unwrap();
        assert_eq!(info.data_format, SchemaDataFormat::Unspecified);

        assert!(SchemaInfo::from_content_type("", "application/json").is_err());
        assert!(SchemaInfo::from_content_type("UserRegistered", "").is_err());
    }

    #[test]
    fn test_data_format_parsing_is_case_insensitive() {
        assert_eq!("JSON".parse::<SchemaDataFormat>().unwrap(), SchemaDataFormat::Json);
        assert_eq!("Protobuf".parse::<SchemaDataFormat>().unwrap(), SchemaDataFormat::Protobuf);
        assert_eq!("4".parse::<SchemaDataFormat>().unwrap(), SchemaDataFormat::Bytes);
        assert!("xml".parse::<SchemaDataFormat>().is_err());
    }

    #[test]
    fn test_headers_round_trip() {
        let info = SchemaInfo::new("identity.UserRegistered", SchemaDataFormat::Protobuf);
        let mut headers = Headers::new();
        info.inject_into_headers(&mut headers);

        assert_eq!(headers.get(header_keys::SCHEMA_DATA_FORMAT), Some("protobuf"));
        assert_eq!(SchemaInfo::from_headers(&headers), info);
    }

    #[test]
    fn test_legacy_keys_reconstruct_same_info() {
        let current = SchemaInfo::new("identity.UserRegistered", SchemaDataFormat::Json);

        let mut legacy = Headers::new();
        legacy.set(header_keys::LEGACY_SCHEMA_SUBJECT, Some("identity.UserRegistered".to_string()));
        legacy.set(header_keys::LEGACY_SCHEMA_TYPE, Some("Json".to_string()));

        assert_eq!(SchemaInfo::from_headers(&legacy), current);
    }

    #[test]
    fn test_current_keys_take_precedence_over_legacy() {
        let mut headers = Headers::new();
        headers.set(header_keys::LEGACY_SCHEMA_SUBJECT, Some("old".to_string()));
        headers.set(header_keys::SCHEMA_NAME, Some("new".to_string()));
        assert_eq!(SchemaInfo::from_headers(&headers).schema_name, "new");
    }

    #[test]
    fn test_registered_schema_none_sentinel() {
        assert!(RegisteredSchema::none().is_none());

        let empty_definition = RegisteredSchema {
            subject: "identity.UserRegistered".to_string(),
            data_format: SchemaDataFormat::Json,
            revision_id: "abc".to_string(),
            definition: String::new(),
            version: 1,
            created_at: Utc::now(),
        };
        assert!(!empty_definition.is_none());
    }
}
