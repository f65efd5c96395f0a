//! Schema resolution and registration
//!
//! [`SchemaResolver`] owns everything the serializers need from the registry:
//! the remote client, the options, the message type cache and the message
//! catalog. It is a cheap handle; clones share the same state.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::{CreateOrUpdateSchema, GetLatestSchema, SchemaRegistryClient};
use crate::error::{Result, SchemaError};
use crate::message::{MessageCatalog, MessageType};
use crate::naming::{MessageSubjectName, SubjectNameStrategy};
use crate::schema::{RegisteredSchema, SchemaDataFormat, SchemaInfo};
use crate::stream::StreamId;
use crate::type_registry::MessageTypeRegistry;

/// Registry behaviour settings
#[derive(Debug, Clone)]
pub struct SchemaRegistryOptions {
    /// Derives a subject when a schema name is missing at registration
    pub subject_name_strategy: Arc<dyn SubjectNameStrategy>,
    /// Register unseen message types on first use
    pub auto_register: bool,
}

impl Default for SchemaRegistryOptions {
    fn default() -> Self {
        Self {
            subject_name_strategy: Arc::new(MessageSubjectName),
            auto_register: true,
        }
    }
}

struct ResolverState {
    client: Arc<dyn SchemaRegistryClient>,
    options: SchemaRegistryOptions,
    types: MessageTypeRegistry,
    catalog: Arc<MessageCatalog>,
}

/// Shared handle over naming, remote registration and the type cache
#[derive(Clone)]
pub struct SchemaResolver {
    state: Arc<ResolverState>,
}

impl fmt::Debug for SchemaResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaResolver")
            .field("options", &self.state.options)
            .field("cached_types", &self.state.types.len())
            .finish_non_exhaustive()
    }
}

impl SchemaResolver {
    pub fn new(client: Arc<dyn SchemaRegistryClient>, options: SchemaRegistryOptions) -> Self {
        Self {
            state: Arc::new(ResolverState {
                client,
                options,
                types: MessageTypeRegistry::new(),
                catalog: Arc::new(MessageCatalog::new()),
            }),
        }
    }

    pub fn options(&self) -> &SchemaRegistryOptions {
        &self.state.options
    }

    pub fn type_registry(&self) -> &MessageTypeRegistry {
        &self.state.types
    }

    pub fn catalog(&self) -> &Arc<MessageCatalog> {
        &self.state.catalog
    }

    /// Cached type for `(subject, format)`, or [`MessageType::MISSING`]
    pub fn resolve_message_type(&self, subject: &str, format: SchemaDataFormat) -> MessageType {
        self.state
            .types
            .try_get_message_type(subject, format)
            .unwrap_or(MessageType::MISSING)
    }

    /// Schema info for a type named by the subject strategy, outside any stream
    pub fn create_schema_info(
        &self,
        message_type: &MessageType,
        format: SchemaDataFormat,
    ) -> Result<SchemaInfo> {
        let subject = self
            .state
            .options
            .subject_name_strategy
            .subject_name(message_type, &StreamId::NONE)?;
        Ok(SchemaInfo::new(subject, format))
    }

    /// Create or update the schema remotely and cache the type mapping
    pub async fn register_schema(
        &self,
        schema_info: &SchemaInfo,
        definition: &str,
        message_type: MessageType,
        cancellation: &CancellationToken,
    ) -> Result<RegisteredSchema> {
        if message_type.is_missing() {
            return Err(SchemaError::InvalidInput {
                argument: "message_type",
                reason: "message type is missing".to_string(),
            });
        }

        let schema_info = if schema_info.schema_name_missing() {
            self.create_schema_info(&message_type, schema_info.data_format)?
        } else {
            schema_info.clone()
        };

        let request = CreateOrUpdateSchema {
            subject: schema_info.schema_name.clone(),
            data_format: schema_info.data_format,
            definition: if definition.trim().is_empty() {
                Vec::new()
            } else {
                definition.as_bytes().to_vec()
            },
        };

        let revision = until_cancelled(
            cancellation,
            self.state.client.create_or_update_schema(request),
        )
        .await?;

        self.state
            .types
            .register(message_type, &schema_info.schema_name, schema_info.data_format);

        debug!(
            subject = %schema_info.schema_name,
            format = %schema_info.data_format,
            message_type = %message_type,
            version = revision.version,
            "registered schema"
        );

        Ok(RegisteredSchema {
            subject: schema_info.schema_name,
            data_format: schema_info.data_format,
            revision_id: revision.revision_id,
            definition: definition.to_string(),
            version: revision.version,
            created_at: revision.created_at,
        })
    }

    /// Latest schema for a named subject, or [`RegisteredSchema::none`]
    pub async fn get_schema(
        &self,
        schema_info: &SchemaInfo,
        cancellation: &CancellationToken,
    ) -> Result<RegisteredSchema> {
        if schema_info.schema_name_missing() {
            return Err(SchemaError::InvalidInput {
                argument: "schema_name",
                reason: "the subject is missing from the schema info".to_string(),
            });
        }

        let request = GetLatestSchema {
            subject: schema_info.schema_name.clone(),
            data_format: schema_info.data_format,
        };

        let found = until_cancelled(cancellation, self.state.client.get_latest_schema(request)).await?;

        let Some(remote) = found else {
            debug!(subject = %schema_info.schema_name, format = %schema_info.data_format, "schema not found");
            return Ok(RegisteredSchema::none());
        };

        Ok(RegisteredSchema {
            subject: schema_info.schema_name.clone(),
            data_format: schema_info.data_format,
            revision_id: remote.revision_id,
            definition: String::from_utf8_lossy(&remote.definition).into_owned(),
            version: remote.version,
            created_at: remote.created_at,
        })
    }

    /// Look the schema up and register it when absent and auto-registration is on.
    ///
    /// Two concurrent calls for an uncached type may both miss and both
    /// register; the remote create-or-update must tolerate that.
    pub async fn get_or_register_schema(
        &self,
        schema_info: &SchemaInfo,
        message_type: MessageType,
        cancellation: &CancellationToken,
    ) -> Result<RegisteredSchema> {
        let registered = if schema_info.schema_name_missing() {
            match self
                .state
                .types
                .try_get_subject(&message_type, schema_info.data_format)
            {
                Some(subject) => {
                    self.get_schema(&schema_info.with_schema_name(subject), cancellation)
                        .await?
                }
                None => RegisteredSchema::none(),
            }
        } else {
            self.get_schema(schema_info, cancellation).await?
        };

        if !registered.is_none() {
            if !message_type.is_missing() {
                self.state
                    .types
                    .register(message_type, &registered.subject, registered.data_format);
            }
            return Ok(registered);
        }

        if !self.state.options.auto_register {
            return Err(SchemaError::NotRegistered {
                message_type: message_type.to_string(),
            });
        }

        self.register_schema(schema_info, "", message_type, cancellation)
            .await
    }

    /// Every schema cached for the type, fetched one at a time.
    /// `Unspecified` lists all formats.
    pub async fn list_message_schemas(
        &self,
        message_type: &MessageType,
        format: SchemaDataFormat,
        cancellation: &CancellationToken,
    ) -> Result<Vec<RegisteredSchema>> {
        let mut schemas = Vec::new();
        for schema_info in self.state.types.schemas_of(message_type, format) {
            schemas.push(self.get_schema(&schema_info, cancellation).await?);
        }
        Ok(schemas)
    }
}

/// Race a remote call against cancellation; nothing after the call runs if cancelled first
async fn until_cancelled<T>(
    cancellation: &CancellationToken,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancellation.cancelled() => Err(SchemaError::Cancelled),
        result = call => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemorySchemaRegistryClient;
    use crate::naming::{SchemaNameOutputFormat, SchemaNameStrategy};

    const USER_REGISTERED: MessageType = MessageType::new("Identity.Schema", "UserRegistered");

    fn resolver() -> SchemaResolver {
        SchemaResolver::new(
            Arc::new(InMemorySchemaRegistryClient::new()),
            SchemaRegistryOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_register_derives_missing_subject() {
        let resolver = resolver();
        let cancel = CancellationToken::new();

        let schema = resolver
            .register_schema(&SchemaInfo::new("", SchemaDataFormat::Json), "", USER_REGISTERED, &cancel)
            .await
            .unwrap();

        assert_eq!(schema.subject, "Identity.Schema.UserRegistered");
        assert_eq!(schema.version, 1);
        assert_eq!(
            resolver.resolve_message_type("Identity.Schema.UserRegistered", SchemaDataFormat::Json),
            USER_REGISTERED
        );
    }

    #[tokio::test]
    async fn test_register_rejects_missing_type() {
        let resolver = resolver();
        let err = resolver
            .register_schema(
                &SchemaInfo::new("x", SchemaDataFormat::Json),
                "",
                MessageType::MISSING,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidInput { argument: "message_type", .. }));
    }

    #[tokio::test]
    async fn test_get_schema_requires_name() {
        let err = resolver()
            .get_schema(&SchemaInfo::new(" ", SchemaDataFormat::Json), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidInput { argument: "schema_name", .. }));
    }

    #[tokio::test]
    async fn test_unknown_schema_is_none() {
        let schema = resolver()
            .get_schema(&SchemaInfo::new("nope", SchemaDataFormat::Json), &CancellationToken::new())
            .await
            .unwrap();
        assert!(schema.is_none());
    }

    #[tokio::test]
    async fn test_resolve_unknown_subject_is_missing() {
        assert!(resolver()
            .resolve_message_type("nope", SchemaDataFormat::Json)
            .is_missing());
    }

    #[tokio::test]
    async fn test_subject_strategy_from_options() {
        let options = SchemaRegistryOptions {
            subject_name_strategy: Arc::new(
                SchemaNameStrategy::namespace("identity", SchemaNameOutputFormat::KebabCase).unwrap(),
            ),
            auto_register: true,
        };
        let resolver = SchemaResolver::new(Arc::new(InMemorySchemaRegistryClient::new()), options);

        let info = resolver
            .create_schema_info(&USER_REGISTERED, SchemaDataFormat::Protobuf)
            .unwrap();
        assert_eq!(info, SchemaInfo::new("identity.user-registered", SchemaDataFormat::Protobuf));
    }

    #[tokio::test]
    async fn test_list_filters_by_format() {
        let resolver = resolver();
        let cancel = CancellationToken::new();
        for format in [SchemaDataFormat::Json, SchemaDataFormat::Protobuf] {
            resolver
                .register_schema(&SchemaInfo::new("", format), "", USER_REGISTERED, &cancel)
                .await
                .unwrap();
        }

        let all = resolver
            .list_message_schemas(&USER_REGISTERED, SchemaDataFormat::Unspecified, &cancel)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let json = resolver
            .list_message_schemas(&USER_REGISTERED, SchemaDataFormat::Json, &cancel)
            .await
            .unwrap();
        assert_eq!(json.len(), 1);
        assert_eq!(json[0].data_format, SchemaDataFormat::Json);
    }
}
