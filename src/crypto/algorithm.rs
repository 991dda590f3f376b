//! Canonicalizes the many spellings scripts use for algorithm names.

/// The canonical algorithm-name labels this crate recognizes.
const CANONICAL: &[&str] = &[
    "SHA-1",
    "SHA-256",
    "SHA-384",
    "SHA-512",
    "HMAC",
    "AES-GCM",
    "AES-CBC",
    "AES-CTR",
    "AES-KW",
    "ECDSA",
    "HKDF",
    "PBKDF2",
    "RSA-OAEP",
    "RSASSA-PKCS1-v1_5",
    "RSA-PSS",
    "Ed25519",
];

/// Maps a (case- and punctuation-insensitive) algorithm spelling to its
/// canonical label. Unknown names pass through unchanged, verbatim.
#[must_use]
pub fn normalize(name: &str) -> String {
    let folded = fold(name);
    for canonical in CANONICAL {
        if fold(canonical) == folded {
            return (*canonical).to_string();
        }
    }
    name.to_string()
}

/// Whether `name`, once normalized, is one of this crate's canonical labels.
#[must_use]
pub fn is_known_algorithm(name: &str) -> bool {
    let normalized = normalize(name);
    CANONICAL.contains(&normalized.as_str())
}

/// Case- and separator-insensitive folding: lowercases and drops `-`/`_`/` `.
fn fold(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_spellings_normalize() {
        for spelling in ["sha1", "sha-1", "SHA1", "SHA-1", "Sha_1"] {
            assert_eq!(normalize(spelling), "SHA-1");
        }
    }

    #[test]
    fn aes_gcm_spellings_normalize() {
        for spelling in ["aes-gcm", "AESGCM", "AES_GCM"] {
            assert_eq!(normalize(spelling), "AES-GCM");
        }
    }

    #[test]
    fn ed25519_is_known() {
        assert!(is_known_algorithm("ed25519"));
    }

    #[test]
    fn unknown_name_passes_through_unchanged() {
        assert_eq!(normalize("totally-unknown-thing"), "totally-unknown-thing");
        assert!(!is_known_algorithm("totally-unknown-thing"));
    }

    #[test]
    fn rsassa_pkcs1_v1_5_preserves_version_suffix() {
        assert_eq!(normalize("RSASSA-PKCS1-v1_5"), "RSASSA-PKCS1-v1_5");
        assert_eq!(normalize("rsassapkcs1v15"), "RSASSA-PKCS1-v1_5");
    }
}
