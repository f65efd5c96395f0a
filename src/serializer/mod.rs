//! Schema-aware serializers
//!
//! A [`SchemaSerializer`] turns messages into bytes and back for one data
//! format. Every concrete serializer is a [`Serializer`] wrapping a
//! [`SchemaCodec`]: the wrapper owns the shared rules (format guard, empty
//! and raw byte shortcuts, schema registration, error wrapping) and the codec
//! only knows its wire format.

mod json;
mod protobuf;
mod raw;

pub use self::json::JsonCodec;
pub use self::protobuf::ProtobufCodec;
pub use self::raw::BytesCodec;

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::context::SerializationContext;
use crate::error::{CodecError, Result, SchemaError};
use crate::headers::Headers;
use crate::message::{Message, MessageType};
use crate::resolver::SchemaResolver;
use crate::schema::{SchemaDataFormat, SchemaInfo};

#[async_trait]
pub trait SchemaSerializer: Send + Sync {
    /// Format this serializer produces; `Unspecified` for dispatchers
    fn data_format(&self) -> SchemaDataFormat;

    /// Encode `value`, registering its schema when needed.
    /// `None` encodes to an empty buffer.
    async fn serialize(
        &self,
        value: Option<&dyn Message>,
        context: &mut SerializationContext<'_>,
    ) -> Result<Bytes>;

    /// Decode `data` into the message type cached for the schema in the headers.
    /// Empty input decodes to `None`.
    async fn deserialize(
        &self,
        data: Bytes,
        context: &SerializationContext<'_>,
    ) -> Result<Option<Box<dyn Message>>>;
}

impl fmt::Debug for dyn SchemaSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemaSerializer({})", self.data_format())
    }
}

/// Wire-format primitive plugged into [`Serializer`]
pub trait SchemaCodec: Send + Sync {
    fn data_format(&self) -> SchemaDataFormat;

    fn encode(
        &self,
        value: &dyn Message,
        context: &SerializationContext<'_>,
    ) -> std::result::Result<Bytes, CodecError>;

    /// `message_type` is [`MessageType::MISSING`] when the subject was never cached
    fn decode(
        &self,
        data: &[u8],
        message_type: MessageType,
        context: &SerializationContext<'_>,
    ) -> std::result::Result<Option<Box<dyn Message>>, CodecError>;
}

/// Applies the registry rules around a codec
#[derive(Debug)]
pub struct Serializer<C> {
    codec: C,
    resolver: SchemaResolver,
}

pub type BytesSerializer = Serializer<BytesCodec>;
pub type JsonSerializer = Serializer<JsonCodec>;
pub type ProtobufSerializer = Serializer<ProtobufCodec>;

impl<C: SchemaCodec> Serializer<C> {
    pub fn new(codec: C, resolver: SchemaResolver) -> Self {
        Self { codec, resolver }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    fn ensure_format(&self, schema_info: &SchemaInfo) -> Result<()> {
        let expected = self.codec.data_format();
        if schema_info.data_format != expected {
            return Err(SchemaError::UnsupportedSchemaFormat {
                expected,
                actual: schema_info.data_format,
            });
        }
        Ok(())
    }
}

impl BytesSerializer {
    pub fn bytes(resolver: SchemaResolver) -> Self {
        Self::new(BytesCodec, resolver)
    }
}

impl JsonSerializer {
    pub fn json(resolver: SchemaResolver) -> Self {
        let codec = JsonCodec::new(resolver.catalog().clone());
        Self::new(codec, resolver)
    }
}

impl ProtobufSerializer {
    pub fn protobuf(resolver: SchemaResolver) -> Self {
        let codec = ProtobufCodec::new(resolver.catalog().clone());
        Self::new(codec, resolver)
    }
}

#[async_trait]
impl<C: SchemaCodec> SchemaSerializer for Serializer<C> {
    fn data_format(&self) -> SchemaDataFormat {
        self.codec.data_format()
    }

    async fn serialize(
        &self,
        value: Option<&dyn Message>,
        context: &mut SerializationContext<'_>,
    ) -> Result<Bytes> {
        let schema_info = context.schema_info();
        self.ensure_format(&schema_info)?;

        let Some(value) = value else {
            return Ok(Bytes::new());
        };

        if let Some(raw) = value.raw_bytes() {
            if schema_info.schema_name_missing() {
                warn!(
                    format = %schema_info.data_format,
                    "raw bytes serialized without a schema name"
                );
            }
            return Ok(match value.downcast_ref::<Bytes>() {
                Some(bytes) => bytes.clone(),
                None => Bytes::copy_from_slice(raw),
            });
        }

        let registered = self
            .resolver
            .get_or_register_schema(&schema_info, value.message_type(), context.cancellation())
            .await?;
        let resolved = registered.to_schema_info();

        if schema_info.schema_name_missing() {
            resolved.inject_schema_name_into_headers(context.headers_mut());
        }

        debug!(schema = %resolved, message_type = %value.message_type(), "serializing message");

        self.codec
            .encode(value, context)
            .map_err(|source| SchemaError::SerializationFailed {
                format: resolved.data_format,
                schema_info: resolved,
                source,
            })
    }

    async fn deserialize(
        &self,
        data: Bytes,
        context: &SerializationContext<'_>,
    ) -> Result<Option<Box<dyn Message>>> {
        let schema_info = context.schema_info();
        self.ensure_format(&schema_info)?;

        if data.is_empty() {
            return Ok(None);
        }

        if schema_info.data_format == SchemaDataFormat::Bytes {
            return Ok(Some(Box::new(data) as Box<dyn Message>));
        }

        let message_type = self
            .resolver
            .resolve_message_type(&schema_info.schema_name, schema_info.data_format);

        self.codec
            .decode(&data, message_type, context)
            .map_err(|source| SchemaError::DeserializationFailed {
                format: schema_info.data_format,
                schema_info,
                source,
            })
    }
}

/// Outcome of [`SchemaSerializerExt::try_deserialize`]
#[derive(Debug)]
pub enum DeserializeResult {
    Deserialized(Box<dyn Message>),
    Empty,
    Error(SchemaError),
}

impl DeserializeResult {
    pub fn is_deserialized(&self) -> bool {
        matches!(self, DeserializeResult::Deserialized(_))
    }

    pub fn into_result(self) -> Result<Option<Box<dyn Message>>> {
        match self {
            DeserializeResult::Deserialized(message) => Ok(Some(message)),
            DeserializeResult::Empty => Ok(None),
            DeserializeResult::Error(err) => Err(err),
        }
    }
}

/// Conveniences for callers that have a [`SchemaInfo`] rather than headers
#[async_trait]
pub trait SchemaSerializerExt: SchemaSerializer {
    /// Serialize with fresh headers seeded from `schema_info`; returns the
    /// headers as left by the serializer
    async fn serialize_with(
        &self,
        value: Option<&dyn Message>,
        schema_info: &SchemaInfo,
    ) -> Result<(Bytes, Headers)> {
        let mut headers = Headers::new().with_schema_info(schema_info);
        let mut context = SerializationContext::new(&mut headers);
        let data = self.serialize(value, &mut context).await?;
        Ok((data, headers))
    }

    async fn deserialize_with(
        &self,
        data: Bytes,
        schema_info: &SchemaInfo,
    ) -> Result<Option<Box<dyn Message>>> {
        let mut headers = Headers::new().with_schema_info(schema_info);
        let context = SerializationContext::new(&mut headers);
        self.deserialize(data, &context).await
    }

    /// Like [`SchemaSerializerExt::deserialize_with`], folding errors into the result
    async fn try_deserialize(&self, data: Bytes, schema_info: &SchemaInfo) -> DeserializeResult {
        match self.deserialize_with(data, schema_info).await {
            Ok(Some(message)) => DeserializeResult::Deserialized(message),
            Ok(None) => DeserializeResult::Empty,
            Err(err) => DeserializeResult::Error(err),
        }
    }
}

impl<S: SchemaSerializer + ?Sized> SchemaSerializerExt for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde::{Deserialize, Serialize};

    use crate::client::InMemorySchemaRegistryClient;
    use crate::message::TypedMessage;
    use crate::resolver::SchemaRegistryOptions;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct UserRegistered {
        user_id: String,
    }

    impl TypedMessage for UserRegistered {
        const NAMESPACE: &'static str = "Identity.Schema";
        const NAME: &'static str = "UserRegistered";
    }

    fn resolver() -> SchemaResolver {
        let resolver = SchemaResolver::new(
            Arc::new(InMemorySchemaRegistryClient::new()),
            SchemaRegistryOptions::default(),
        );
        resolver.catalog().register_json::<UserRegistered>();
        resolver
    }

    #[tokio::test]
    async fn test_format_guard() {
        let serializer = JsonSerializer::json(resolver());
        let value = UserRegistered { user_id: "1".to_string() };

        let err = serializer
            .serialize_with(Some(&value), &SchemaInfo::new("x", SchemaDataFormat::Protobuf))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnsupportedSchemaFormat {
                expected: SchemaDataFormat::Json,
                actual: SchemaDataFormat::Protobuf,
            }
        ));
    }

    #[tokio::test]
    async fn test_none_serializes_to_empty() {
        let serializer = JsonSerializer::json(resolver());
        let (data, _) = serializer
            .serialize_with(None, &SchemaInfo::new("x", SchemaDataFormat::Json))
            .await
            .unwrap();
        assert!(data.is_empty());
    }

    #[tokio::test]
    async fn test_raw_bytes_pass_through() {
        let resolver = resolver();
        let serializer = JsonSerializer::json(resolver.clone());
        let raw = Bytes::from_static(b"\x00\x01raw");

        let (data, _) = serializer
            .serialize_with(Some(&raw), &SchemaInfo::new("", SchemaDataFormat::Json))
            .await
            .unwrap();
        assert_eq!(data, raw);
        assert!(resolver.type_registry().is_empty());
    }

    #[tokio::test]
    async fn test_missing_name_is_written_back() {
        let serializer = JsonSerializer::json(resolver());
        let value = UserRegistered { user_id: "1".to_string() };

        let (data, headers) = serializer
            .serialize_with(Some(&value), &SchemaInfo::new("", SchemaDataFormat::Json))
            .await
            .unwrap();

        assert_eq!(data, Bytes::from_static(br#"{"user_id":"1"}"#));
        assert_eq!(
            SchemaInfo::from_headers(&headers).schema_name,
            "Identity.Schema.UserRegistered"
        );
    }

    #[tokio::test]
    async fn test_json_round_trip_through_cache() {
        let serializer = JsonSerializer::json(resolver());
        let value = UserRegistered { user_id: "42".to_string() };

        let (data, headers) = serializer
            .serialize_with(Some(&value), &SchemaInfo::new("", SchemaDataFormat::Json))
            .await
            .unwrap();

        let decoded = serializer
            .deserialize_with(data, &SchemaInfo::from_headers(&headers))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(decoded.downcast_ref::<UserRegistered>(), Some(&value));
    }

    #[tokio::test]
    async fn test_empty_data_deserializes_to_none() {
        let serializer = JsonSerializer::json(resolver());
        let result = serializer
            .try_deserialize(Bytes::new(), &SchemaInfo::new("x", SchemaDataFormat::Json))
            .await;
        assert!(matches!(result, DeserializeResult::Empty));
    }

    #[tokio::test]
    async fn test_unknown_subject_fails_to_deserialize() {
        let serializer = JsonSerializer::json(resolver());
        let result = serializer
            .try_deserialize(
                Bytes::from_static(b"{}"),
                &SchemaInfo::new("never.Registered", SchemaDataFormat::Json),
            )
            .await;
        assert!(matches!(
            result,
            DeserializeResult::Error(SchemaError::DeserializationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_bytes_format_returns_input() {
        let serializer = BytesSerializer::bytes(resolver());
        let decoded = serializer
            .deserialize_with(Bytes::from_static(b"abc"), &SchemaInfo::new("", SchemaDataFormat::Bytes))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(decoded.downcast_ref::<Bytes>().map(|b| b.as_ref()), Some(&b"abc"[..]));
    }

    #[tokio::test]
    async fn test_auto_register_off_rejects_unknown_type() {
        let resolver = SchemaResolver::new(
            Arc::new(InMemorySchemaRegistryClient::new()),
            SchemaRegistryOptions {
                auto_register: false,
                ..Default::default()
            },
        );
        resolver.catalog().register_json::<UserRegistered>();
        let serializer = JsonSerializer::json(resolver);

        let err = serializer
            .serialize_with(
                Some(&UserRegistered { user_id: "1".to_string() }),
                &SchemaInfo::new("", SchemaDataFormat::Json),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SchemaError::NotRegistered { .. }));
    }
}
