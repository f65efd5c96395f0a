use bytes::Bytes;

use super::SchemaCodec;
use crate::context::SerializationContext;
use crate::error::CodecError;
use crate::message::{Message, MessageType};
use crate::schema::SchemaDataFormat;

/// Opaque byte payloads, no schema definition
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

impl SchemaCodec for BytesCodec {
    fn data_format(&self) -> SchemaDataFormat {
        SchemaDataFormat::Bytes
    }

    fn encode(
        &self,
        value: &dyn Message,
        _context: &SerializationContext<'_>,
    ) -> Result<Bytes, CodecError> {
        value.raw_bytes().map(Bytes::copy_from_slice).ok_or_else(|| {
            format!("{} is not a raw byte buffer", value.message_type()).into()
        })
    }

    fn decode(
        &self,
        data: &[u8],
        _message_type: MessageType,
        _context: &SerializationContext<'_>,
    ) -> Result<Option<Box<dyn Message>>, CodecError> {
        Ok(Some(Box::new(Bytes::copy_from_slice(data)) as Box<dyn Message>))
    }
}
