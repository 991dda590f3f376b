//! The KV store binding: simple get/put/delete/list with optional TTL.

use crate::error::Result;
use std::time::Duration;

/// One entry returned from [`KvStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvListEntry {
    /// The key name.
    pub name: String,
    /// Opaque metadata attached at `put` time, if any.
    pub metadata: Option<String>,
}

/// A page of [`KvStore::list`] results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvList {
    /// Matching keys, in the binding's iteration order.
    pub keys: Vec<KvListEntry>,
    /// Whether this page was the last one.
    pub list_complete: bool,
    /// Opaque cursor to resume listing, present iff `!list_complete`.
    pub cursor: Option<String>,
}

/// A simple key-value capability: `get`, `get_with_metadata`, `put`,
/// `delete`, `list`. Expired entries behave as absent on read and are
/// opportunistically purged by the implementation; the core does not model
/// expiry itself.
pub trait KvStore: Send + Sync {
    /// Reads the value for `key`, or `None` if absent or expired.
    ///
    /// # Errors
    /// Returns a runtime error on a backing-store failure.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Reads the value and its metadata for `key`.
    ///
    /// # Errors
    /// Returns a runtime error on a backing-store failure.
    fn get_with_metadata(&self, key: &str) -> Result<Option<(Vec<u8>, Option<String>)>>;

    /// Writes `value` under `key`, with optional metadata and expiry.
    ///
    /// # Errors
    /// Returns a validation error if `value` exceeds the configured maximum
    /// size, or a runtime error on a backing-store failure.
    fn put(&self, key: &str, value: &[u8], metadata: Option<&str>, ttl: Option<Duration>) -> Result<()>;

    /// Deletes `key`, if present.
    ///
    /// # Errors
    /// Returns a runtime error on a backing-store failure.
    fn delete(&self, key: &str) -> Result<()>;

    /// Lists up to `limit` keys with the given `prefix`, resuming from
    /// `cursor` if given.
    ///
    /// # Errors
    /// Returns a validation error for a malformed cursor, or a runtime error
    /// on a backing-store failure.
    fn list(&self, prefix: &str, limit: usize, cursor: Option<&str>) -> Result<KvList>;
}
