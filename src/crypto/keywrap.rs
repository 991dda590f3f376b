//! RFC 3394 AES key wrap / unwrap.
//!
//! `wrap` produces `|plaintext| + 8` bytes; `unwrap` verifies the default
//! integrity-check value `A6A6A6A6A6A6A6A6` and rejects a mismatch with
//! "integrity check failed".

use crate::error::{Error, Result};
use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256};

const DEFAULT_IV: u64 = 0xA6A6_A6A6_A6A6_A6A6;

enum Kek {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

impl Kek {
    fn new(key: &[u8]) -> Result<Self> {
        match key.len() {
            16 => Ok(Self::Aes128(Aes128::new(GenericArray::from_slice(key)))),
            24 => Ok(Self::Aes192(Aes192::new(GenericArray::from_slice(key)))),
            32 => Ok(Self::Aes256(Aes256::new(GenericArray::from_slice(key)))),
            n => Err(Error::runtime(format!(
                "invalid AES key length: {n} bytes (must be 16, 24, or 32)"
            ))),
        }
    }

    fn encrypt_block(&self, block: &mut [u8; 16]) {
        let ga = GenericArray::from_mut_slice(block);
        match self {
            Self::Aes128(c) => c.encrypt_block(ga),
            Self::Aes192(c) => c.encrypt_block(ga),
            Self::Aes256(c) => c.encrypt_block(ga),
        }
    }

    fn decrypt_block(&self, block: &mut [u8; 16]) {
        let ga = GenericArray::from_mut_slice(block);
        match self {
            Self::Aes128(c) => c.decrypt_block(ga),
            Self::Aes192(c) => c.decrypt_block(ga),
            Self::Aes256(c) => c.decrypt_block(ga),
        }
    }
}

/// Wraps `plaintext` under `kek` following RFC 3394 §2.2.1.
///
/// # Errors
/// Returns an error if `kek` is not a valid AES key size, or if `plaintext`
/// is not a positive multiple of 8 bytes of at least 16 bytes.
pub fn wrap_key(kek: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    if plaintext.len() < 16 || plaintext.len() % 8 != 0 {
        return Err(Error::validation(
            "plaintext must be a multiple of 8 bytes, at least 16",
        ));
    }
    let cipher = Kek::new(kek)?;
    let n = plaintext.len() / 8;
    let mut r: Vec<[u8; 8]> = plaintext
        .chunks_exact(8)
        .map(|c| c.try_into().unwrap())
        .collect();
    let mut a = DEFAULT_IV.to_be_bytes();

    for j in 0..6u64 {
        for (i, block) in r.iter_mut().enumerate() {
            let mut buf = [0u8; 16];
            buf[..8].copy_from_slice(&a);
            buf[8..].copy_from_slice(block);
            cipher.encrypt_block(&mut buf);
            let t = j * (n as u64) + (i as u64 + 1);
            let msb = u64::from_be_bytes(buf[..8].try_into().unwrap()) ^ t;
            a = msb.to_be_bytes();
            block.copy_from_slice(&buf[8..]);
        }
    }

    let mut out = Vec::with_capacity(8 + plaintext.len());
    out.extend_from_slice(&a);
    for block in r {
        out.extend_from_slice(&block);
    }
    Ok(out)
}

/// Unwraps `ciphertext` under `kek`, verifying the default integrity-check
/// value. Follows RFC 3394 §2.2.2.
///
/// # Errors
/// Returns an error if `kek` is not a valid AES key size, if `ciphertext` is
/// shorter than 24 bytes or not a multiple of 8, or if the integrity check
/// fails (wrong key, or corrupted data) — in which case the message is
/// exactly `"integrity check failed"`.
pub fn unwrap_key(kek: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < 24 || ciphertext.len() % 8 != 0 {
        return Err(Error::validation(
            "ciphertext must be a multiple of 8 bytes, at least 24",
        ));
    }
    let cipher = Kek::new(kek)?;
    let n = ciphertext.len() / 8 - 1;
    let mut a: [u8; 8] = ciphertext[..8].try_into().unwrap();
    let mut r: Vec<[u8; 8]> = ciphertext[8..]
        .chunks_exact(8)
        .map(|c| c.try_into().unwrap())
        .collect();

    for j in (0..6u64).rev() {
        for i in (0..n).rev() {
            let t = j * (n as u64) + (i as u64 + 1);
            let a_val = u64::from_be_bytes(a) ^ t;
            let mut buf = [0u8; 16];
            buf[..8].copy_from_slice(&a_val.to_be_bytes());
            buf[8..].copy_from_slice(&r[i]);
            cipher.decrypt_block(&mut buf);
            a = buf[..8].try_into().unwrap();
            r[i].copy_from_slice(&buf[8..]);
        }
    }

    if u64::from_be_bytes(a) != DEFAULT_IV {
        return Err(Error::runtime("integrity check failed"));
    }

    let mut out = Vec::with_capacity(n * 8);
    for block in r {
        out.extend_from_slice(&block);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    #[test]
    fn rfc3394_test_vector_a1() {
        let kek = hex("000102030405060708090A0B0C0D0E0F");
        let plaintext = hex("00112233445566778899AABBCCDDEEFF");
        let expected = hex("1FA68B0A8112B447AEF34BD8FB5A7B829D3E862371D2CFE5");

        let wrapped = wrap_key(&kek, &plaintext).unwrap();
        assert_eq!(wrapped, expected);

        let unwrapped = unwrap_key(&kek, &wrapped).unwrap();
        assert_eq!(unwrapped, plaintext);
    }

    #[test]
    fn wrap_output_is_plaintext_len_plus_8() {
        let kek = [0u8; 16];
        let plaintext = [0u8; 24];
        let wrapped = wrap_key(&kek, &plaintext).unwrap();
        assert_eq!(wrapped.len(), plaintext.len() + 8);
    }

    #[test]
    fn cross_kek_unwrap_fails_integrity_check() {
        let kek1 = [1u8; 16];
        let kek2 = [2u8; 16];
        let plaintext = [0xAB; 16];
        let wrapped = wrap_key(&kek1, &plaintext).unwrap();
        let err = unwrap_key(&kek2, &wrapped).unwrap_err();
        assert_eq!(err.script_message(), "integrity check failed");
    }

    #[test]
    fn rejects_short_plaintext() {
        assert!(wrap_key(&[0u8; 16], &[0u8; 8]).is_err());
    }

    #[test]
    fn rejects_bad_kek_size() {
        assert!(wrap_key(&[0u8; 20], &[0u8; 16]).is_err());
    }

    proptest::proptest! {
        #[test]
        fn wrap_unwrap_round_trips(
            kek in proptest::collection::vec(proptest::prelude::any::<u8>(), 16),
            plaintext in proptest::collection::vec(proptest::prelude::any::<u8>(), 2..10usize).prop_map(|v| {
                let mut v = v;
                while v.len() % 8 != 0 || v.len() < 16 { v.push(0); }
                v
            }),
        ) {
            let wrapped = wrap_key(&kek, &plaintext).unwrap();
            proptest::prop_assert_eq!(wrapped.len(), plaintext.len() + 8);
            let unwrapped = unwrap_key(&kek, &wrapped).unwrap();
            proptest::prop_assert_eq!(unwrapped, plaintext);
        }
    }
}
