//! The compression formats the engine understands.

use crate::error::{Error, Result};

/// A supported compression format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// gzip container (RFC 1952).
    Gzip,
    /// zlib-wrapped deflate (RFC 1950/1951).
    Deflate,
    /// raw deflate, no zlib header (RFC 1951).
    DeflateRaw,
    /// Brotli.
    Brotli,
}

impl Format {
    /// Parses the script-facing format name. Unknown names are a
    /// constructor-time type error.
    ///
    /// # Errors
    /// Returns a validation error for any name other than `"gzip"`,
    /// `"deflate"`, `"deflate-raw"`, or `"br"`.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "gzip" => Ok(Self::Gzip),
            "deflate" => Ok(Self::Deflate),
            "deflate-raw" => Ok(Self::DeflateRaw),
            "br" => Ok(Self::Brotli),
            other => Err(Error::validation(format!(
                "unsupported compression format: {other}"
            ))),
        }
    }

    /// Returns the script-facing format name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Deflate => "deflate",
            Self::DeflateRaw => "deflate-raw",
            Self::Brotli => "br",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_known_names() {
        for name in ["gzip", "deflate", "deflate-raw", "br"] {
            assert_eq!(Format::parse(name).unwrap().as_str(), name);
        }
    }

    #[test]
    fn unknown_format_is_validation_error() {
        assert!(Format::parse("zstd").is_err());
    }
}
