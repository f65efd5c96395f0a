//! Schema Registry
//!
//! Front door of the crate: a [`SchemaResolver`] plus a table of serializers
//! keyed by data format. The registry is itself a [`SchemaSerializer`] that
//! dispatches on the data format found in the headers.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::{InMemorySchemaRegistryClient, SchemaRegistryClient};
use crate::context::SerializationContext;
use crate::error::{Result, SchemaError};
use crate::message::{Message, MessageCatalog, MessageType};
use crate::resolver::{SchemaRegistryOptions, SchemaResolver};
use crate::schema::{RegisteredSchema, SchemaDataFormat, SchemaInfo};
use crate::serializer::{BytesSerializer, JsonSerializer, ProtobufSerializer, SchemaSerializer};

static GLOBAL: OnceLock<SchemaRegistry> = OnceLock::new();

/// The main schema registry
#[derive(Debug)]
pub struct SchemaRegistry {
    resolver: SchemaResolver,
    serializers: RwLock<HashMap<SchemaDataFormat, Arc<dyn SchemaSerializer>>>,
}

impl SchemaRegistry {
    /// A registry with no serializers; add them with `use_*` or [`SchemaRegistry::register_serializer`]
    pub fn new(client: Arc<dyn SchemaRegistryClient>, options: SchemaRegistryOptions) -> Self {
        Self {
            resolver: SchemaResolver::new(client, options),
            serializers: RwLock::new(HashMap::new()),
        }
    }

    /// Process-local registry with the bytes, JSON and Protobuf serializers
    pub fn in_memory(options: SchemaRegistryOptions) -> Self {
        Self::new(Arc::new(InMemorySchemaRegistryClient::new()), options)
            .use_bytes()
            .use_json()
            .use_protobuf()
    }

    /// Lazily created process-wide registry, backed by an in-memory client
    pub fn global() -> &'static SchemaRegistry {
        GLOBAL.get_or_init(|| Self::in_memory(SchemaRegistryOptions::default()))
    }

    pub fn resolver(&self) -> &SchemaResolver {
        &self.resolver
    }

    pub fn options(&self) -> &SchemaRegistryOptions {
        self.resolver.options()
    }

    /// Where message types declare their JSON and Protobuf codecs
    pub fn catalog(&self) -> &MessageCatalog {
        self.resolver.catalog()
    }

    pub fn use_bytes(self) -> Self {
        self.register_serializer(Arc::new(BytesSerializer::bytes(self.resolver.clone())));
        self
    }

    pub fn use_json(self) -> Self {
        self.register_serializer(Arc::new(JsonSerializer::json(self.resolver.clone())));
        self
    }

    pub fn use_protobuf(self) -> Self {
        self.register_serializer(Arc::new(ProtobufSerializer::protobuf(
            self.resolver.clone(),
        )));
        self
    }

    /// Install a serializer for its data format, replacing any previous one
    pub fn register_serializer(&self, serializer: Arc<dyn SchemaSerializer>) -> &Self {
        let format = serializer.data_format();
        debug!(%format, "registering serializer");
        self.serializers.write().insert(format, serializer);
        self
    }

    pub fn get_serializer(&self, format: SchemaDataFormat) -> Result<Arc<dyn SchemaSerializer>> {
        let serializers = self.serializers.read();
        serializers
            .get(&format)
            .cloned()
            .ok_or_else(|| SchemaError::SerializerNotFound {
                format,
                supported: sorted_formats(serializers.keys().copied()),
            })
    }

    pub fn supports_schema(&self, format: SchemaDataFormat) -> bool {
        self.serializers.read().contains_key(&format)
    }

    pub fn supported_formats(&self) -> Vec<SchemaDataFormat> {
        sorted_formats(self.serializers.read().keys().copied())
    }

    pub fn create_schema_info(
        &self,
        message_type: &MessageType,
        format: SchemaDataFormat,
    ) -> Result<SchemaInfo> {
        self.resolver.create_schema_info(message_type, format)
    }

    pub fn resolve_message_type(&self, subject: &str, format: SchemaDataFormat) -> MessageType {
        self.resolver.resolve_message_type(subject, format)
    }

    pub async fn register_schema(
        &self,
        schema_info: &SchemaInfo,
        definition: &str,
        message_type: MessageType,
        cancellation: &CancellationToken,
    ) -> Result<RegisteredSchema> {
        self.resolver
            .register_schema(schema_info, definition, message_type, cancellation)
            .await
    }

    pub async fn get_schema(
        &self,
        schema_info: &SchemaInfo,
        cancellation: &CancellationToken,
    ) -> Result<RegisteredSchema> {
        self.resolver.get_schema(schema_info, cancellation).await
    }

    pub async fn get_or_register_schema(
        &self,
        schema_info: &SchemaInfo,
        message_type: MessageType,
        cancellation: &CancellationToken,
    ) -> Result<RegisteredSchema> {
        self.resolver
            .get_or_register_schema(schema_info, message_type, cancellation)
            .await
    }

    pub async fn list_message_schemas(
        &self,
        message_type: &MessageType,
        format: SchemaDataFormat,
        cancellation: &CancellationToken,
    ) -> Result<Vec<RegisteredSchema>> {
        self.resolver
            .list_message_schemas(message_type, format, cancellation)
            .await
    }
}

fn sorted_formats(formats: impl Iterator<Item = SchemaDataFormat>) -> Vec<SchemaDataFormat> {
    let mut formats: Vec<_> = formats.collect();
    formats.sort();
    formats
}

#[async_trait]
impl SchemaSerializer for SchemaRegistry {
    fn data_format(&self) -> SchemaDataFormat {
        SchemaDataFormat::Unspecified
    }

    async fn serialize(
        &self,
        value: Option<&dyn Message>,
        context: &mut SerializationContext<'_>,
    ) -> Result<Bytes> {
        let serializer = self.get_serializer(context.schema_info().data_format)?;
        serializer.serialize(value, context).await
    }

    async fn deserialize(
        &self,
        data: Bytes,
        context: &SerializationContext<'_>,
    ) -> Result<Option<Box<dyn Message>>> {
        let serializer = self.get_serializer(context.schema_info().data_format)?;
        serializer.deserialize(data, context).await
    }
}
