//! Remote schema registry client
//!
//! The registry talks to its backing store only through
//! [`SchemaRegistryClient`]. Transport concerns (connections, retries,
//! deadlines) live behind this trait.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::debug;

use crate::checksum::Checksum;
use crate::error::Result;
use crate::schema::SchemaDataFormat;

/// Create-or-update request for a subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrUpdateSchema {
    pub subject: String,
    pub data_format: SchemaDataFormat,
    /// UTF-8 schema definition, empty for schema-less formats
    pub definition: Vec<u8>,
}

/// Identity stamped on a successful create-or-update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRevision {
    pub revision_id: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

/// Lookup of the latest schema for a subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetLatestSchema {
    pub subject: String,
    pub data_format: SchemaDataFormat,
}

/// Latest schema as stored remotely
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSchema {
    pub revision_id: String,
    pub definition: Vec<u8>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait SchemaRegistryClient: Send + Sync {
    async fn create_or_update_schema(&self, request: CreateOrUpdateSchema) -> Result<SchemaRevision>;

    /// `None` when the subject has no schema in that format
    async fn get_latest_schema(&self, request: GetLatestSchema) -> Result<Option<RemoteSchema>>;
}

/// Process-local client, the default backing store of the global registry
#[derive(Debug, Default)]
pub struct InMemorySchemaRegistryClient {
    schemas: Mutex<HashMap<(String, SchemaDataFormat), RemoteSchema>>,
}

impl InMemorySchemaRegistryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.schemas.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.lock().is_empty()
    }
}

#[async_trait]
impl SchemaRegistryClient for InMemorySchemaRegistryClient {
    async fn create_or_update_schema(&self, request: CreateOrUpdateSchema) -> Result<SchemaRevision> {
        let mut schemas = self.schemas.lock();
        let key = (request.subject.clone(), request.data_format);

        let version = schemas.get(&key).map(|s| s.version + 1).unwrap_or(1);
        let definition = String::from_utf8_lossy(&request.definition);
        let version_field = version.to_string();
        let revision_id = Checksum::of_fields(&[
            request.subject.as_str(),
            request.data_format.as_str(),
            version_field.as_str(),
            definition.as_ref(),
        ])
        .into_string();

        let stored = RemoteSchema {
            revision_id,
            definition: request.definition,
            version,
            created_at: Utc::now(),
        };
        debug!(subject = %request.subject, format = %request.data_format, version, "stored schema revision");

        let revision = SchemaRevision {
            revision_id: stored.revision_id.clone(),
            version: stored.version,
            created_at: stored.created_at,
        };
        schemas.insert(key, stored);
        Ok(revision)
    }

    async fn get_latest_schema(&self, request: GetLatestSchema) -> Result<Option<RemoteSchema>> {
        Ok(self
            .schemas
            .lock()
            .get(&(request.subject, request.data_format))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(subject: &str, definition: &str) -> CreateOrUpdateSchema {
        CreateOrUpdateSchema {
            subject: subject.to_string(),
            data_format: SchemaDataFormat::Json,
            definition: definition.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn test_versions_increase_per_subject() {
        let client = InMemorySchemaRegistryClient::new();

        let first = client.create_or_update_schema(create("a", "")).await.unwrap();
        let second = client.create_or_update_schema(create("a", "{}")).await.unwrap();
        let other = client.create_or_update_schema(create("b", "")).await.unwrap();

        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);
        assert_eq!(other.version, 1);
        assert_ne!(first.revision_id, second.revision_id);
        assert_eq!(client.len(), 2);
    }

    #[tokio::test]
    async fn test_latest_is_scoped_by_format() {
        let client = InMemorySchemaRegistryClient::new();
        client.create_or_update_schema(create("a", "{}")).await.unwrap();

        let found = client
            .get_latest_schema(GetLatestSchema {
                subject: "a".to_string(),
                data_format: SchemaDataFormat::Json,
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.definition, b"{}");

        let missing = client
            .get_latest_schema(GetLatestSchema {
                subject: "a".to_string(),
                data_format: SchemaDataFormat::Protobuf,
            })
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
