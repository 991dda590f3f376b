//! The object store binding (R2-equivalent): blob storage with metadata,
//! presigned URLs, and a public URL surface.

use crate::error::Result;
use std::time::Duration;

/// Metadata returned alongside an object's bytes, or from `head`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Content hash or version tag, opaque to the core.
    pub etag: String,
    /// Size in bytes.
    pub size: u64,
    /// Milliseconds since the Unix epoch the object was last written.
    pub last_modified: u128,
    /// `Content-Type`, if set at write time.
    pub content_type: Option<String>,
    /// Arbitrary caller-supplied key/value metadata.
    pub custom_metadata: Vec<(String, String)>,
}

/// Blob storage with metadata and URL-generation helpers.
pub trait ObjectStore: Send + Sync {
    /// Reads `key`'s bytes and metadata.
    ///
    /// # Errors
    /// Returns a runtime error on a backing-store failure.
    fn get(&self, key: &str) -> Result<Option<(Vec<u8>, ObjectMetadata)>>;

    /// Writes `value` under `key`, with optional content type and custom
    /// metadata.
    ///
    /// # Errors
    /// Returns a runtime error on a backing-store failure.
    fn put(&self, key: &str, value: &[u8], content_type: Option<&str>, custom_metadata: &[(String, String)]) -> Result<ObjectMetadata>;

    /// Reads just `key`'s metadata, without its bytes.
    ///
    /// # Errors
    /// Returns a runtime error on a backing-store failure.
    fn head(&self, key: &str) -> Result<Option<ObjectMetadata>>;

    /// Deletes `key`, if present.
    ///
    /// # Errors
    /// Returns a runtime error on a backing-store failure.
    fn delete(&self, key: &str) -> Result<()>;

    /// Lists keys with the given `prefix`, up to `limit`.
    ///
    /// # Errors
    /// Returns a runtime error on a backing-store failure.
    fn list(&self, prefix: &str, limit: usize) -> Result<Vec<String>>;

    /// Builds a time-limited, pre-signed GET URL for `key`.
    ///
    /// # Errors
    /// Returns a runtime error if the backing store cannot sign a URL.
    fn presigned_get_url(&self, key: &str, ttl: Duration) -> Result<String>;

    /// Builds a stable public URL for `key`, for buckets configured for
    /// public access.
    ///
    /// # Errors
    /// Returns a policy error if the bucket is not publicly readable.
    fn public_url(&self, key: &str) -> Result<String>;
}
