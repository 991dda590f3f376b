//! Running hash state for `crypto.subtle.digest`-style incremental hashing.

use crate::crypto::normalize;
use crate::error::{Error, Result};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::collections::HashMap;

/// An in-progress digest, fed chunks over multiple calls and finalized once.
pub enum DigestStream {
    /// `SHA-1`.
    Sha1(Sha1),
    /// `SHA-256`.
    Sha256(Sha256),
    /// `SHA-384`.
    Sha384(Sha384),
    /// `SHA-512`.
    Sha512(Sha512),
}

impl DigestStream {
    /// Starts a new stream for the named algorithm, accepting any spelling
    /// [`normalize`] understands.
    ///
    /// # Errors
    /// Returns a validation error for any algorithm other than the four
    /// SHA variants.
    pub fn new(algorithm: &str) -> Result<Self> {
        match normalize(algorithm).as_str() {
            "SHA-1" => Ok(Self::Sha1(Sha1::new())),
            "SHA-256" => Ok(Self::Sha256(Sha256::new())),
            "SHA-384" => Ok(Self::Sha384(Sha384::new())),
            "SHA-512" => Ok(Self::Sha512(Sha512::new())),
            other => Err(Error::validation(format!("unsupported digest algorithm: {other}"))),
        }
    }

    /// Feeds `data` into the running hash.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha1(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha384(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
        }
    }

    /// Consumes the stream and returns the final digest bytes.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        match self {
            Self::Sha1(h) => h.finalize().to_vec(),
            Self::Sha256(h) => h.finalize().to_vec(),
            Self::Sha384(h) => h.finalize().to_vec(),
            Self::Sha512(h) => h.finalize().to_vec(),
        }
    }
}

/// Per-request registry of in-progress digest streams, keyed by id.
#[derive(Default)]
pub struct DigestRegistry {
    streams: HashMap<u64, DigestStream>,
    next_id: u64,
}

impl DigestRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            streams: HashMap::new(),
            next_id: 1,
        }
    }

    /// Starts a new stream for `algorithm`, returning its id.
    ///
    /// # Errors
    /// Returns a validation error for an unsupported algorithm.
    pub fn init(&mut self, algorithm: &str) -> Result<u64> {
        let stream = DigestStream::new(algorithm)?;
        let id = self.next_id;
        self.next_id += 1;
        self.streams.insert(id, stream);
        Ok(id)
    }

    /// Feeds `data` into stream `id`.
    ///
    /// # Errors
    /// Returns a not-found error if `id` is unknown.
    pub fn update(&mut self, id: u64, data: &[u8]) -> Result<()> {
        self.streams
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("digest stream"))?
            .update(data);
        Ok(())
    }

    /// Finalizes and removes stream `id`, returning its digest.
    ///
    /// # Errors
    /// Returns a not-found error if `id` is unknown.
    pub fn finish(&mut self, id: u64) -> Result<Vec<u8>> {
        let stream = self
            .streams
            .remove(&id)
            .ok_or_else(|| Error::not_found("digest stream"))?;
        Ok(stream.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_empty_input_matches_known_digest() {
        use std::fmt::Write;
        let mut registry = DigestRegistry::new();
        let id = registry.init("sha-256").unwrap();
        let digest = registry.finish(id).unwrap();
        let mut hex = String::new();
        for byte in &digest {
            let _ = write!(hex, "{byte:02x}");
        }
        assert_eq!(hex, "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b85");
    }

    #[test]
    fn finish_removes_the_stream() {
        let mut registry = DigestRegistry::new();
        let id = registry.init("SHA-1").unwrap();
        registry.finish(id).unwrap();
        assert!(registry.finish(id).is_err());
    }

    #[test]
    fn unsupported_algorithm_is_rejected() {
        assert!(DigestStream::new("md5").is_err());
    }
}
