//! Stream identifiers

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};

/// Validated identifier of a stream in the event log
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(String);

impl StreamId {
    /// No stream, used when a name is derived outside of any stream context
    pub const NONE: StreamId = StreamId(String::new());

    /// Parse a stream id, rejecting empty or whitespace values
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(SchemaError::blank("stream_id"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }

    /// First hyphen-delimited segment, e.g. `user` for `user-123abc`
    pub fn category(&self) -> &str {
        category_of(&self.0)
    }
}

/// First hyphen-delimited segment of a stream name
pub(crate) fn category_of(stream_name: &str) -> &str {
    stream_name.split('-').next().unwrap_or(stream_name)
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for StreamId {
    type Error = SchemaError;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl TryFrom<String> for StreamId {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl AsRef<str> for StreamId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
