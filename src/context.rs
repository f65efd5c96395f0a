//! Per-call serialization context

use tokio_util::sync::CancellationToken;

use crate::headers::Headers;
use crate::schema::SchemaInfo;

/// Headers and cancellation for a single serialize or deserialize call.
///
/// The headers are borrowed, so anything a serializer writes (such as a
/// resolved schema name) is visible to the caller once the call returns.
#[derive(Debug)]
pub struct SerializationContext<'h> {
    headers: &'h mut Headers,
    cancellation: CancellationToken,
}

impl<'h> SerializationContext<'h> {
    pub fn new(headers: &'h mut Headers) -> Self {
        Self::with_cancellation(headers, CancellationToken::new())
    }

    pub fn with_cancellation(headers: &'h mut Headers, cancellation: CancellationToken) -> Self {
        Self {
            headers,
            cancellation,
        }
    }

    pub fn headers(&self) -> &Headers {
        &*self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut *self.headers
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Read from the headers on every call, never cached
    pub fn schema_info(&self) -> SchemaInfo {
        SchemaInfo::from_headers(&*self.headers)
    }
}
