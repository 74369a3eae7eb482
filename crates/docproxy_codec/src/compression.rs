//! General-purpose compression of the checksummed payload.

use crate::error::{CodecError, CodecResult};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::fmt::Debug;
use std::io::{Read, Write};

/// Tag prepended to every compressed frame.
///
/// JSON text never starts with this byte, so tagged frames and raw
/// documents cannot be confused.
pub const COMPRESSION_TAG: &[u8] = b"\x01";

/// A lossless byte compressor.
pub trait Compressor: Send + Sync + Debug {
    /// Compresses `data`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EncodingFailed`] if compression fails.
    fn compress(&self, data: &[u8]) -> CodecResult<Vec<u8>>;

    /// Reverses [`Compressor::compress`].
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::DecompressionFailed`] if `data` is not a valid
    /// compressed stream.
    fn decompress(&self, data: &[u8]) -> CodecResult<Vec<u8>>;
}

/// Raw DEFLATE (RFC 1951) compressor.
#[derive(Debug, Clone, Copy)]
pub struct DeflateCompressor {
    level: Compression,
}

impl DeflateCompressor {
    /// Creates a compressor with the given level (0-9).
    #[must_use]
    pub fn new(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }
}

impl Default for DeflateCompressor {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl Compressor for DeflateCompressor {
    fn compress(&self, data: &[u8]) -> CodecResult<Vec<u8>> {
        let mut encoder = DeflateEncoder::new(Vec::with_capacity(data.len() / 2), self.level);
        encoder
            .write_all(data)
            .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| CodecError::encoding_failed(e.to_string()))
    }

    fn decompress(&self, data: &[u8]) -> CodecResult<Vec<u8>> {
        let mut decoded = Vec::with_capacity(data.len() * 2);
        DeflateDecoder::new(data)
            .read_to_end(&mut decoded)
            .map_err(|e| CodecError::decompression_failed(e.to_string()))?;
        Ok(decoded)
    }
}
