//! Identifier and cursor utilities shared across bridges.
//!
//! Small newtypes wrapping a monotonic [`std::sync::atomic`] counter, rather
//! than exposing raw integers that could be confused with any other `u64`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide monotonic request-id counter. Never resets, never reused.
static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A process-wide, strictly-increasing identifier for one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    /// Allocates the next request id. Strictly greater than every id
    /// returned previously in this process.
    #[must_use]
    pub fn next() -> Self {
        Self(REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric value, for logging and diagnostics only.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// An opaque cursor for paginated `list` operations.
///
/// Cursors are base64url(no-pad) encodings of the last key seen; callers
/// must not assume any structure beyond "feed it back to continue".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(String);

impl Cursor {
    /// Builds a cursor continuing after `last_key`.
    #[must_use]
    pub fn after(last_key: &[u8]) -> Self {
        Self(URL_SAFE_NO_PAD.encode(last_key))
    }

    /// Decodes the cursor back into the raw key bytes it was built from.
    ///
    /// # Errors
    /// Returns an error if the cursor is not valid base64url.
    pub fn decode(&self) -> crate::error::Result<Vec<u8>> {
        URL_SAFE_NO_PAD
            .decode(&self.0)
            .map_err(|e| crate::error::Error::validation(format!("invalid cursor: {e}")))
    }

    /// Wraps an already-encoded opaque string, e.g. one received from script.
    #[must_use]
    pub fn from_opaque(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the opaque wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Derives a deterministic 32-hex-character id from a `(namespace, name)`
/// pair, used to address named durable-object-style state:
/// `hex(sha256(namespace ++ ":" ++ name))`, truncated to 32 hex chars (128
/// bits) to match the object-id width used elsewhere in this crate.
#[must_use]
pub fn deterministic_id(namespace: &str, name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b":");
    hasher.update(name.as_bytes());
    let digest = hasher.finalize();
    hex_encode(&digest[..16])
}

/// Generates a random, unique 16-byte id (32 hex characters), used to
/// address anonymous durable-object-style state.
#[must_use]
pub fn random_id() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    hex_encode(&bytes)
}

/// Generates a RFC 4122 version-4 UUID string, for `crypto.randomUUID()`.
#[must_use]
pub fn random_uuid_v4() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_are_strictly_increasing() {
        let a = RequestId::next();
        let b = RequestId::next();
        assert!(b.as_u64() > a.as_u64());
    }

    #[test]
    fn deterministic_id_is_stable() {
        let a = deterministic_id("ns", "name");
        let b = deterministic_id("ns", "name");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn deterministic_id_varies_with_name() {
        let x = deterministic_id("ns", "one");
        let y = deterministic_id("ns", "two");
        assert_ne!(x, y);
    }

    #[test]
    fn random_id_is_32_hex_chars() {
        let id = random_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn random_uuid_has_version_nibble_four() {
        let id = random_uuid_v4();
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 5);
        assert!(parts[2].starts_with('4'));
    }

    #[test]
    fn cursor_round_trips() {
        let cursor = Cursor::after(b"last-key-seen");
        let decoded = cursor.decode().unwrap();
        assert_eq!(decoded, b"last-key-seen");
    }
}
