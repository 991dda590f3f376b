//! Key material entries held in a request's key registry.

/// What role a key plays, mirroring `CryptoKey.type` on the web platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    /// Symmetric key material (HMAC, AES, ...).
    Secret,
    /// The public half of an asymmetric keypair.
    Public,
    /// The private half of an asymmetric keypair.
    Private,
}

/// An imported or generated key, scoped to one request.
#[derive(Clone)]
pub struct KeyEntry {
    /// Raw key bytes. For asymmetric keys this may be empty; see
    /// `asym_handle`.
    pub data: Vec<u8>,
    /// Canonicalized algorithm name (e.g. `"HMAC"`, `"AES-GCM"`).
    pub algorithm: String,
    /// Canonicalized hash algorithm used alongside `algorithm`, if any
    /// (e.g. HMAC's inner hash).
    pub hash_algorithm: Option<String>,
    /// Secret, public, or private.
    pub key_type: KeyType,
    /// Named elliptic curve, for EC keys.
    pub named_curve: Option<String>,
    /// Opaque handle to host-managed asymmetric key state, when `data` alone
    /// does not carry the full key (e.g. an RSA keypair held by the host's
    /// crypto library).
    pub asym_key_handle: Option<u64>,
    /// Whether `subtle.exportKey` may read `data` back out.
    pub extractable: bool,
}

impl KeyEntry {
    /// Builds a secret-key entry from raw bytes, the common case for
    /// `importKey("raw", ...)`.
    #[must_use]
    pub fn secret(
        data: Vec<u8>,
        algorithm: impl Into<String>,
        hash_algorithm: Option<String>,
        extractable: bool,
    ) -> Self {
        Self {
            data,
            algorithm: algorithm.into(),
            hash_algorithm,
            key_type: KeyType::Secret,
            named_curve: None,
            asym_key_handle: None,
            extractable,
        }
    }

    /// Returns `data` if this key is extractable, otherwise a policy error.
    ///
    /// # Errors
    /// Returns [`crate::error::Error::Policy`] if the key was imported with
    /// `extractable: false`.
    pub fn export(&self) -> crate::error::Result<&[u8]> {
        if !self.extractable {
            return Err(crate::error::Error::policy(
                "key is not extractable".to_string(),
            ));
        }
        Ok(&self.data)
    }
}

impl std::fmt::Debug for KeyEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyEntry")
            .field("algorithm", &self.algorithm)
            .field("hash_algorithm", &self.hash_algorithm)
            .field("key_type", &self.key_type)
            .field("named_curve", &self.named_curve)
            .field("extractable", &self.extractable)
            .field("data", &format_args!("[{} bytes]", self.data.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_extractable_key_denies_export() {
        let key = KeyEntry::secret(vec![1, 2, 3], "HMAC", Some("SHA-256".into()), false);
        assert!(key.export().is_err());
    }

    #[test]
    fn extractable_key_allows_export() {
        let key = KeyEntry::secret(vec![1, 2, 3], "HMAC", Some("SHA-256".into()), true);
        assert_eq!(key.export().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn debug_does_not_print_raw_key_bytes() {
        let key = KeyEntry::secret(vec![0xAA; 32], "AES-GCM", None, true);
        let debug = format!("{key:?}");
        assert!(!debug.contains("170")); // 0xAA == 170
        assert!(debug.contains("32 bytes"));
    }
}
