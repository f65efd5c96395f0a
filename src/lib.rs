//! Message Schema Registry
//!
//! A pluggable schema and codec registry that sits between application code
//! and an event log. Producers and consumers exchange typed messages over an
//! untyped `bytes + headers` wire protocol; the wire format (JSON, Protobuf,
//! raw bytes) can differ per message type without changing calling code.
//!
//! ## Features
//!
//! - **Naming Strategies**: Schema names derived from the message type, the
//!   stream category or a fixed namespace, rendered as-is, kebab, snake or URN
//! - **Type Cache**: Lazily populated `(subject, format) <-> message type` map
//! - **Auto-Registration**: Unseen message types are registered on first use
//! - **Format Dispatch**: One serializer per data format, chosen from headers
//! - **Header Side-Channel**: Schema name and format travel in the headers and
//!   round-trip exactly
//!
//! ## Architecture
//!
//! ```text
//! SchemaRegistry ── serializers: format -> SchemaSerializer
//!       │                         └── Serializer<C: SchemaCodec>
//!       └── SchemaResolver ◄──────────┘
//!             ├── SchemaRegistryClient   (remote store)
//!             ├── MessageTypeRegistry    (type cache)
//!             ├── MessageCatalog         (per-type codecs)
//!             └── SubjectNameStrategy
//! ```

pub mod checksum;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod headers;
pub mod message;
pub mod naming;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod serializer;
pub mod stream;
pub mod type_registry;

pub use checksum::Checksum;
pub use client::{InMemorySchemaRegistryClient, SchemaRegistryClient};
pub use config::SchemasConfig;
pub use context::SerializationContext;
pub use error::{Result, SchemaError};
pub use headers::{header_keys, Headers};
pub use message::{Message, MessageCatalog, MessageType, TypedMessage};
pub use naming::{MessageSubjectName, SchemaNameOutputFormat, SchemaNameStrategy, SubjectNameStrategy};
pub use registry::SchemaRegistry;
pub use resolver::{SchemaRegistryOptions, SchemaResolver};
pub use schema::{RegisteredSchema, SchemaDataFormat, SchemaInfo};
pub use serializer::{
    BytesSerializer, DeserializeResult, JsonSerializer, ProtobufSerializer, SchemaCodec,
    SchemaSerializer, SchemaSerializerExt, Serializer,
};
pub use stream::StreamId;
pub use type_registry::MessageTypeRegistry;

// Re-exported so callers can name the token type without a direct dependency
pub use tokio_util::sync::CancellationToken;
