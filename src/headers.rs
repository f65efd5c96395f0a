//! Message headers
//!
//! Out-of-band metadata attached to every record. Keys starting with
//! [`header_keys::SYSTEM_PREFIX`] are reserved for registry and runtime
//! metadata; everything else belongs to the application.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::schema::SchemaInfo;

/// Reserved header keys
pub mod header_keys {
    pub const SYSTEM_PREFIX: &str = "$";

    pub const PRODUCER_ID: &str = "$producer.id";
    pub const PRODUCER_REQUEST_ID: &str = "$producer.request-id";

    pub const SCHEMA_NAME: &str = "$schema.name";
    pub const SCHEMA_DATA_FORMAT: &str = "$schema.data-format";
    pub const SCHEMA_VERSION_ID: &str = "$schema.version-id";
    /// Schema name and version id combined in urn form
    pub const SCHEMA_ID: &str = "$schema.id";

    pub const PARTITION_KEY: &str = "$record.partition-key";
    pub const RECORD_TIMESTAMP: &str = "$record.timestamp";

    pub const LEGACY_EVENT_METADATA: &str = "$legacy-metadata";

    /// Read-only alias of [`SCHEMA_NAME`]
    #[deprecated(note = "use SCHEMA_NAME")]
    pub const SCHEMA_SUBJECT: &str = LEGACY_SCHEMA_SUBJECT;
    /// Read-only alias of [`SCHEMA_DATA_FORMAT`]
    #[deprecated(note = "use SCHEMA_DATA_FORMAT")]
    pub const SCHEMA_TYPE: &str = LEGACY_SCHEMA_TYPE;

    pub(crate) const LEGACY_SCHEMA_SUBJECT: &str = "kurrentdb.schema.subject";
    pub(crate) const LEGACY_SCHEMA_TYPE: &str = "kurrentdb.schema.type";

    /// Every key that carries schema information, current and legacy
    pub(crate) const SCHEMA_KEYS: [&str; 4] = [
        SCHEMA_NAME,
        SCHEMA_DATA_FORMAT,
        LEGACY_SCHEMA_SUBJECT,
        LEGACY_SCHEMA_TYPE,
    ];
}

/// Ordered string to optional-string mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, Option<String>>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new key, failing if it is already present
    pub fn add(&mut self, key: impl Into<String>, value: Option<String>) -> Result<&mut Self> {
        let key = key.into();
        if self.0.contains_key(&key) {
            return Err(SchemaError::HeaderAlreadyPresent { key });
        }
        self.0.insert(key, value);
        Ok(self)
    }

    /// Insert or overwrite a key
    pub fn set(&mut self, key: impl Into<String>, value: Option<String>) -> &mut Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn add_number<T: Display>(&mut self, key: impl Into<String>, value: T) -> Result<&mut Self> {
        self.add(key, Some(value.to_string()))
    }

    pub fn set_number<T: Display>(&mut self, key: impl Into<String>, value: T) -> &mut Self {
        self.set(key, Some(value.to_string()))
    }

    pub fn remove(&mut self, key: &str) -> Option<Option<String>> {
        self.0.remove(key)
    }

    /// Value for a key, `None` when missing or null
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_deref())
    }

    pub fn get_string<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Parse an enum value, falling back to `default` when missing or unparsable
    pub fn get_enum<T: FromStr>(&self, key: &str, default: T) -> T {
        self.get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Parse a numeric value, falling back to `default` when missing or unparsable
    pub fn get_number<T: FromStr>(&self, key: &str, default: T) -> T {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Encode as a UTF-8 JSON object
    pub fn encode(&self) -> Vec<u8> {
        // A map of strings to nullable strings always serializes
        serde_json::to_vec(&self.0).unwrap_or_else(|_| b"{}".to_vec())
    }

    /// Decode an encoded payload. Empty or malformed payloads yield empty headers.
    pub fn decode(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::new();
        }
        match serde_json::from_slice(bytes) {
            Ok(headers) => headers,
            Err(e) => {
                debug!(error = %e, len = bytes.len(), "discarding malformed header payload");
                Self::new()
            }
        }
    }

    pub fn with_schema_info(mut self, schema_info: &SchemaInfo) -> Self {
        schema_info.inject_into_headers(&mut self);
        self
    }

    /// Application headers only
    pub fn without_system_info(&self) -> Headers {
        self.filtered(|k| !k.starts_with(header_keys::SYSTEM_PREFIX))
    }

    /// Everything except the schema keys, legacy ones included
    pub fn without_schema_info(&self) -> Headers {
        self.filtered(|k| !header_keys::SCHEMA_KEYS.contains(&k))
    }

    /// System headers only
    pub fn system_info(&self) -> Headers {
        self.filtered(|k| k.starts_with(header_keys::SYSTEM_PREFIX))
    }

    fn filtered(&self, keep: impl Fn(&str) -> bool) -> Headers {
        Headers(
            self.0
                .iter()
                .filter(|(k, _)| keep(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        Headers(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a String, &'a Option<String>);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Option<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaDataFormat;

    fn sample() -> Headers {
        let mut headers = Headers::new();
        headers
            .set(header_keys::SCHEMA_NAME, Some("identity.UserRegistered".to_string()))
            .set(header_keys::PRODUCER_ID, Some("producer-1".to_string()))
            .set("tenant", Some("acme".to_string()))
            .set("trace", None);
        headers
    }

    #[test]
    fn test_add_rejects_duplicate_key() {
        let mut headers = Headers::new();
        headers.add("tenant", Some("acme".to_string())).unwrap();

        let err = headers.add("tenant", Some("other".to_string())).unwrap_err();
        assert!(matches!(err, SchemaError::HeaderAlreadyPresent { ref key } if key == "tenant"));
        assert_eq!(headers.get("tenant"), Some("acme"));
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let mut headers = Headers::new();
        headers.add("Tenant", Some("a".to_string())).unwrap();
        headers.add("tenant", Some("b".to_string())).unwrap();
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_typed_accessors() {
        let mut headers = Headers::new();
        headers.set_number(header_keys::RECORD_TIMESTAMP, 1_700_000_000_i64);
        headers.set(header_keys::SCHEMA_DATA_FORMAT, Some("JSON".to_string()));
        headers.set("broken", Some("not-a-number".to_string()));

        assert_eq!(headers.get_number(header_keys::RECORD_TIMESTAMP, 0_i64), 1_700_000_000);
        assert_eq!(headers.get_number("broken", 7_u32), 7);
        assert_eq!(
            headers.get_enum(header_keys::SCHEMA_DATA_FORMAT, SchemaDataFormat::Unspecified),
            SchemaDataFormat::Json
        );
        assert_eq!(headers.get_string("missing", "fallback"), "fallback");
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let headers = sample();
        assert_eq!(Headers::decode(&headers.encode()), headers);
    }

    #[test]
    fn test_null_values_survive_round_trip() {
        let headers = sample();
        let decoded = Headers::decode(&headers.encode());
        assert!(decoded.contains_key("trace"));
        assert_eq!(decoded.get("trace"), None);
    }

    #[test]
    fn test_decode_empty_and_malformed() {
        assert!(Headers::decode(&[]).is_empty());
        assert!(Headers::decode(b"{not json").is_empty());
        assert!(Headers::decode(b"[1,2,3]").is_empty());
        assert!(Headers::decode(&[0xff, 0xfe, 0x00]).is_empty());
    }

    #[test]
    fn test_system_and_user_partitions() {
        let headers = sample();

        let user = headers.without_system_info();
        assert_eq!(user.len(), 2);
        assert!(user.contains_key("tenant"));

        let system = headers.system_info();
        assert_eq!(system.len(), 2);
        assert!(system.contains_key(header_keys::PRODUCER_ID));

        let without_schema = headers.without_schema_info();
        assert!(!without_schema.contains_key(header_keys::SCHEMA_NAME));
        assert!(without_schema.contains_key(header_keys::PRODUCER_ID));
    }
}
