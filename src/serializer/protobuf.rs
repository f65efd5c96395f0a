use std::sync::Arc;

use bytes::Bytes;

use super::SchemaCodec;
use crate::context::SerializationContext;
use crate::error::CodecError;
use crate::message::{Message, MessageCatalog, MessageType};
use crate::schema::SchemaDataFormat;

/// Protobuf through prost, for types registered with [`MessageCatalog::register_protobuf`]
#[derive(Debug, Clone)]
pub struct ProtobufCodec {
    catalog: Arc<MessageCatalog>,
}

impl ProtobufCodec {
    pub fn new(catalog: Arc<MessageCatalog>) -> Self {
        Self { catalog }
    }
}

impl SchemaCodec for ProtobufCodec {
    fn data_format(&self) -> SchemaDataFormat {
        SchemaDataFormat::Protobuf
    }

    fn encode(
        &self,
        value: &dyn Message,
        _context: &SerializationContext<'_>,
    ) -> Result<Bytes, CodecError> {
        let message_type = value.message_type();
        let codec = self
            .catalog
            .protobuf_codec(&message_type)
            .ok_or_else(|| format!("{} is not a registered protobuf message", message_type))?;
        Ok(Bytes::from(codec.encode(value)?))
    }

    fn decode(
        &self,
        data: &[u8],
        message_type: MessageType,
        context: &SerializationContext<'_>,
    ) -> Result<Option<Box<dyn Message>>, CodecError> {
        let codec = self.catalog.protobuf_codec(&message_type).ok_or_else(|| {
            format!(
                "schema '{}' does not resolve to a registered protobuf message",
                context.schema_info().schema_name
            )
        })?;
        codec.decode(data).map(Some)
    }
}
