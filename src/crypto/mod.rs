//! Algorithm-name normalization and RFC 3394 key wrap/unwrap.
//!
//! The cryptographic primitives themselves (digest, HMAC, AES) are assumed
//! to come from the host's standard-library-equivalent; this module only
//! canonicalizes the names the script surface uses to select them, and
//! implements the key-wrap/unwrap envelope used to move key material in and
//! out of the registry.

mod algorithm;
mod keywrap;

pub use algorithm::{is_known_algorithm, normalize};
pub use keywrap::{unwrap_key, wrap_key};
