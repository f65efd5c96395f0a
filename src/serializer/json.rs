use std::sync::Arc;

use bytes::Bytes;

use super::SchemaCodec;
use crate::context::SerializationContext;
use crate::error::CodecError;
use crate::message::{Message, MessageCatalog, MessageType};
use crate::schema::SchemaDataFormat;

/// JSON through serde, for types registered with [`MessageCatalog::register_json`]
#[derive(Debug, Clone)]
pub struct JsonCodec {
    catalog: Arc<MessageCatalog>,
}

impl JsonCodec {
    pub fn new(catalog: Arc<MessageCatalog>) -> Self {
        Self { catalog }
    }
}

impl SchemaCodec for JsonCodec {
    fn data_format(&self) -> SchemaDataFormat {
        SchemaDataFormat::Json
    }

    fn encode(
        &self,
        value: &dyn Message,
        _context: &SerializationContext<'_>,
    ) -> Result<Bytes, CodecError> {
        let message_type = value.message_type();
        let codec = self
            .catalog
            .json_codec(&message_type)
            .ok_or_else(|| format!("{} has no json codec in the catalog", message_type))?;
        Ok(Bytes::from(codec.encode(value)?))
    }

    fn decode(
        &self,
        data: &[u8],
        message_type: MessageType,
        context: &SerializationContext<'_>,
    ) -> Result<Option<Box<dyn Message>>, CodecError> {
        if message_type.is_missing() {
            return Err(format!(
                "no message type is registered for schema '{}'",
                context.schema_info().schema_name
            )
            .into());
        }
        let codec = self
            .catalog
            .json_codec(&message_type)
            .ok_or_else(|| format!("{} has no json codec in the catalog", message_type))?;
        codec.decode(data).map(Some)
    }
}
