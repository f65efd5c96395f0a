//! Message types
//!
//! Message types are identified by an explicit `(namespace, name)` pair that
//! the application declares through [`TypedMessage`]. The registry never
//! inspects Rust type metadata; it only stores these identifiers.
//!
//! ```
//! use message_schemas::TypedMessage;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct UserRegistered {
//!     user_id: String,
//! }
//!
//! impl TypedMessage for UserRegistered {
//!     const NAMESPACE: &'static str = "Identity.Schema";
//!     const NAME: &'static str = "UserRegistered";
//! }
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;

/// Opaque identifier of an application message type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageType {
    namespace: &'static str,
    name: &'static str,
}

impl MessageType {
    /// The "missing/unset" sentinel
    pub const MISSING: MessageType = MessageType::new("", "");

    pub const fn new(namespace: &'static str, name: &'static str) -> Self {
        Self { namespace, name }
    }

    /// Identifier declared by a [`TypedMessage`]
    pub fn of<T: TypedMessage>() -> Self {
        Self::new(T::NAMESPACE, T::NAME)
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_missing(&self) -> bool {
        self.name.is_empty()
    }

    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.to_string()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_missing() {
            return f.write_str("<missing>");
        }
        f.write_str(&self.full_name())
    }
}

/// Implemented by application message types
pub trait TypedMessage: Any + Send + Sync + fmt::Debug {
    /// Declaring namespace, e.g. `Identity.Schema`
    const NAMESPACE: &'static str;
    /// Simple type name, e.g. `UserRegistered`
    const NAME: &'static str;

    /// Raw byte buffers return their contents to opt out of the schema system
    fn as_raw_bytes(&self) -> Option<&[u8]> {
        None
    }
}

impl TypedMessage for Bytes {
    const NAMESPACE: &'static str = "bytes";
    const NAME: &'static str = "Bytes";

    fn as_raw_bytes(&self) -> Option<&[u8]> {
        Some(self.as_ref())
    }
}

impl TypedMessage for Vec<u8> {
    const NAMESPACE: &'static str = "std.vec";
    const NAME: &'static str = "Vec<u8>";

    fn as_raw_bytes(&self) -> Option<&[u8]> {
        Some(self.as_slice())
    }
}

/// Object-safe view of a [`TypedMessage`]
pub trait Message: Any + Send + Sync + fmt::Debug + 'static {
    fn message_type(&self) -> MessageType;
    fn raw_bytes(&self) -> Option<&[u8]>;
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T: TypedMessage> Message for T {
    fn message_type(&self) -> MessageType {
        MessageType::of::<T>()
    }

    fn raw_bytes(&self) -> Option<&[u8]> {
        self.as_raw_bytes()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

impl dyn Message {
    pub fn downcast_ref<T: TypedMessage>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Recover the concrete message, handing the box back on a type mismatch
    pub fn downcast<T: TypedMessage>(self: Box<Self>) -> Result<Box<T>, Box<dyn Message>> {
        if self.as_any().is::<T>() {
            // checked above
            Ok(self.into_any().downcast::<T>().unwrap_or_else(|_| unreachable!()))
        } else {
            Err(self)
        }
    }
}

type EncodeFn = fn(&dyn Message) -> Result<Vec<u8>, CodecError>;
type DecodeFn = fn(&[u8]) -> Result<Box<dyn Message>, CodecError>;

/// Encode/decode pair for one message type in one wire format
#[derive(Clone, Copy)]
pub struct MessageCodec {
    encode: EncodeFn,
    decode: DecodeFn,
}

impl MessageCodec {
    pub fn encode(&self, value: &dyn Message) -> Result<Vec<u8>, CodecError> {
        (self.encode)(value)
    }

    pub fn decode(&self, data: &[u8]) -> Result<Box<dyn Message>, CodecError> {
        (self.decode)(data)
    }
}

impl fmt::Debug for MessageCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageCodec").finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct CatalogEntry {
    json: Option<MessageCodec>,
    protobuf: Option<MessageCodec>,
}

/// Explicit registration of how each message type is built from and written to the wire
#[derive(Debug, Default)]
pub struct MessageCatalog {
    entries: RwLock<HashMap<MessageType, CatalogEntry>>,
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `T` available to the JSON codec
    pub fn register_json<T>(&self) -> &Self
    where
        T: TypedMessage + Serialize + DeserializeOwned,
    {
        let codec = MessageCodec {
            encode: |value| {
                let typed = value
                    .downcast_ref::<T>()
                    .ok_or_else(|| type_mismatch::<T>(value.message_type()))?;
                Ok(serde_json::to_vec(typed)?)
            },
            decode: |data| {
                let typed: T = serde_json::from_slice(data)?;
                Ok(Box::new(typed) as Box<dyn Message>)
            },
        };
        self.entries.write().entry(MessageType::of::<T>()).or_default().json = Some(codec);
        self
    }

    /// Make `T` available to the Protobuf codec
    pub fn register_protobuf<T>(&self) -> &Self
    where
        T: TypedMessage + prost::Message + Default,
    {
        let codec = MessageCodec {
            encode: |value| {
                let typed = value
                    .downcast_ref::<T>()
                    .ok_or_else(|| type_mismatch::<T>(value.message_type()))?;
                Ok(prost::Message::encode_to_vec(typed))
            },
            decode: |data| {
                let typed = <T as prost::Message>::decode(data)?;
                Ok(Box::new(typed) as Box<dyn Message>)
            },
        };
        self.entries.write().entry(MessageType::of::<T>()).or_default().protobuf = Some(codec);
        self
    }

    pub fn json_codec(&self, message_type: &MessageType) -> Option<MessageCodec> {
        self.entries.read().get(message_type).and_then(|e| e.json)
    }

    pub fn protobuf_codec(&self, message_type: &MessageType) -> Option<MessageCodec> {
        self.entries.read().get(message_type).and_then(|e| e.protobuf)
    }

    pub fn contains(&self, message_type: &MessageType) -> bool {
        self.entries.read().contains_key(message_type)
    }
}

fn type_mismatch<T: TypedMessage>(actual: MessageType) -> CodecError {
    format!(
        "codec for {} received a {} value",
        MessageType::of::<T>(),
        actual
    )
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct UserRegistered {
        user_id: String,
    }

    impl TypedMessage for UserRegistered {
        const NAMESPACE: &'static str = "Identity.Schema";
        const NAME: &'static str = "UserRegistered";
    }

    #[test]
    fn test_message_type_identity() {
        let ty = MessageType::of::<UserRegistered>();
        assert_eq!(ty.full_name(), "Identity.Schema.UserRegistered");
        assert!(!ty.is_missing());
        assert!(MessageType::MISSING.is_missing());
    }

    #[test]
    fn test_raw_bytes_are_detected() {
        let raw = Bytes::from_static(b"abc");
        let message: &dyn Message = &raw;
        assert_eq!(message.raw_bytes(), Some(&b"abc"[..]));

        let typed = UserRegistered { user_id: "1".to_string() };
        let message: &dyn Message = &typed;
        assert_eq!(message.raw_bytes(), None);
    }

    #[test]
    fn test_downcast() {
        let boxed: Box<dyn Message> = Box::new(UserRegistered { user_id: "42".to_string() });
        assert!(boxed.downcast_ref::<Bytes>().is_none());

        let boxed = boxed.downcast::<Bytes>().unwrap_err();
        let typed = boxed.downcast::<UserRegistered>().unwrap();
        assert_eq!(typed.user_id, "42");
    }

    #[test]
    fn test_catalog_json_codec() {
        let catalog = MessageCatalog::new();
        catalog.register_json::<UserRegistered>();

        let ty = MessageType::of::<UserRegistered>();
        let codec = catalog.json_codec(&ty).unwrap();
        assert!(catalog.protobuf_codec(&ty).is_none());

        let value = UserRegistered { user_id: "7".to_string() };
        let bytes = codec.encode(&value).unwrap();
        assert_eq!(bytes, br#"{"user_id":"7"}"#);

        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!(decoded.downcast_ref::<UserRegistered>(), Some(&value));
    }

    #[test]
    fn test_catalog_codec_rejects_foreign_value() {
        let catalog = MessageCatalog::new();
        catalog.register_json::<UserRegistered>();

        let codec = catalog.json_codec(&MessageType::of::<UserRegistered>()).unwrap();
        assert!(codec.encode(&Bytes::from_static(b"x")).is_err());
    }
}
