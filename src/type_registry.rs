//! Process-lifetime cache of `(subject, format) <-> message type`
//!
//! Entries are added on every successful registration or lookup and never
//! evicted. Writes are last-writer-wins.

use std::collections::{BTreeSet, HashMap};

use parking_lot::RwLock;

use crate::message::MessageType;
use crate::schema::{SchemaDataFormat, SchemaInfo};

type SubjectKey = (String, SchemaDataFormat);

#[derive(Debug, Default)]
struct Mappings {
    types_by_subject: HashMap<SubjectKey, MessageType>,
    subjects_by_type: HashMap<MessageType, BTreeSet<SubjectKey>>,
}

/// Bidirectional message type cache
#[derive(Debug, Default)]
pub struct MessageTypeRegistry {
    mappings: RwLock<Mappings>,
}

impl MessageTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `subject` in `format` resolves to `message_type`
    pub fn register(&self, message_type: MessageType, subject: &str, format: SchemaDataFormat) {
        let key = (subject.to_string(), format);
        let mut mappings = self.mappings.write();

        if let Some(previous) = mappings.types_by_subject.insert(key.clone(), message_type) {
            if previous != message_type {
                if let Some(keys) = mappings.subjects_by_type.get_mut(&previous) {
                    keys.remove(&key);
                }
            }
        }
        mappings
            .subjects_by_type
            .entry(message_type)
            .or_default()
            .insert(key);
    }

    pub fn try_get_message_type(&self, subject: &str, format: SchemaDataFormat) -> Option<MessageType> {
        self.mappings
            .read()
            .types_by_subject
            .get(&(subject.to_string(), format))
            .copied()
    }

    /// A subject previously cached for the type in `format`
    pub fn try_get_subject(&self, message_type: &MessageType, format: SchemaDataFormat) -> Option<String> {
        self.mappings
            .read()
            .subjects_by_type
            .get(message_type)?
            .iter()
            .find(|(_, f)| *f == format)
            .map(|(subject, _)| subject.clone())
    }

    /// Every cached `(subject, format)` of the type; `Unspecified` matches all formats
    pub fn schemas_of(&self, message_type: &MessageType, format: SchemaDataFormat) -> Vec<SchemaInfo> {
        self.mappings
            .read()
            .subjects_by_type
            .get(message_type)
            .map(|keys| {
                keys.iter()
                    .filter(|(_, f)| format == SchemaDataFormat::Unspecified || *f == format)
                    .map(|(subject, f)| SchemaInfo::new(subject.clone(), *f))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.mappings.read().types_by_subject.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
