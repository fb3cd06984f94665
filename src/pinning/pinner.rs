use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Content pinning provider trait
///
/// Pinning failures are ordinary outcomes, not errors: an unreachable or
/// refusing provider surfaces as `Ok(None)` and the caller decides how to
/// react. Providers never retry on their own.
#[async_trait]
pub trait Pinner: Send + Sync {
    /// Pin raw bytes under a display name, returning the content id.
    async fn pin_bytes(&self, data: Bytes, name: &str) -> Result<Option<String>>;

    /// Pin a JSON document under a display name, returning the content id.
    async fn pin_json(&self, value: &serde_json::Value, name: &str) -> Result<Option<String>>;

    /// Provider tag stored alongside file records.
    fn provider_name(&self) -> &'static str;
}
