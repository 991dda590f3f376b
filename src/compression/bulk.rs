//! One-shot compress/decompress for callers that already hold the whole
//! buffer in memory.

use super::format::Format;
use crate::error::{Error, Result};
use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
use flate2::Compression;
use std::io::{Read, Write};

/// Maximum number of bytes `decompress` will produce before aborting. A
/// hostile input that expands far beyond this is rejected rather than
/// exhausting memory.
pub const MAX_DECOMPRESSED_BYTES: usize = 128 * 1024 * 1024;

/// Compresses `data` in the given `format`, returning the whole output.
///
/// # Errors
/// Returns a runtime error if the underlying encoder fails.
pub fn compress(format: Format, data: &[u8]) -> Result<Vec<u8>> {
    match format {
        Format::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }
        Format::Deflate => {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }
        Format::DeflateRaw => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }
        Format::Brotli => {
            let mut output = Vec::new();
            let params = brotli::enc::BrotliEncoderParams::default();
            brotli::BrotliCompress(&mut &data[..], &mut output, &params)
                .map_err(|e| Error::runtime(format!("brotli compress failed: {e}")))?;
            Ok(output)
        }
    }
}

/// Decompresses `data` in the given `format`, enforcing
/// [`MAX_DECOMPRESSED_BYTES`].
///
/// # Errors
/// Returns a capacity error if the decompressed output would exceed
/// [`MAX_DECOMPRESSED_BYTES`], or a runtime error if the decoder fails.
pub fn decompress(format: Format, data: &[u8]) -> Result<Vec<u8>> {
    match format {
        Format::Gzip => read_bounded(GzDecoder::new(data)),
        Format::Deflate => read_bounded(ZlibDecoder::new(data)),
        Format::DeflateRaw => read_bounded(DeflateDecoder::new(data)),
        Format::Brotli => {
            let mut output = Vec::new();
            let mut limited = data.take((MAX_DECOMPRESSED_BYTES + 1) as u64);
            brotli::BrotliDecompress(&mut limited, &mut output)
                .map_err(|e| Error::runtime(format!("brotli decompress failed: {e}")))?;
            if output.len() > MAX_DECOMPRESSED_BYTES {
                return Err(Error::capacity(format!(
                    "decompressed output exceeds {MAX_DECOMPRESSED_BYTES} bytes"
                )));
            }
            Ok(output)
        }
    }
}

fn read_bounded<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut limited = (&mut reader).take((MAX_DECOMPRESSED_BYTES + 1) as u64);
    limited.read_to_end(&mut output)?;
    if output.len() > MAX_DECOMPRESSED_BYTES {
        return Err(Error::capacity(format!(
            "decompressed output exceeds {MAX_DECOMPRESSED_BYTES} bytes"
        )));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_all_formats() {
        for format in [
            Format::Gzip,
            Format::Deflate,
            Format::DeflateRaw,
            Format::Brotli,
        ] {
            let data = b"Hello, streaming compression! ".repeat(10);
            let compressed = compress(format, &data).unwrap();
            assert!(compressed.len() < data.len());
            let decompressed = decompress(format, &compressed).unwrap();
            assert_eq!(decompressed, data);
        }
    }

    #[test]
    fn zero_length_input_round_trips() {
        for format in [
            Format::Gzip,
            Format::Deflate,
            Format::DeflateRaw,
            Format::Brotli,
        ] {
            let compressed = compress(format, &[]).unwrap();
            assert!(!compressed.is_empty());
            let decompressed = decompress(format, &compressed).unwrap();
            assert!(decompressed.is_empty());
        }
    }
}
