//! Frame encoding and decoding.
//!
//! ## Frame Format
//!
//! ```text
//! <COMPRESSION_TAG><compressed( <checksum: 40 chars><JSON text> )>
//! ```
//!
//! The checksum covers `JSON text + salt`. The JSON text is the compacted
//! document.

use crate::checksum::{expected_checksum, ChecksumGeneration, CHECKSUM_LEN};
use crate::compaction::{Compaction, IdentityCompaction};
use crate::compression::{Compressor, DeflateCompressor, COMPRESSION_TAG};
use crate::error::{CodecError, CodecResult};
use crate::salt::Salt;
use serde_json::Value;
use std::sync::Arc;

/// Encodes documents into frames and back.
///
/// A codec is immutable once built and cheap to clone; share one per
/// document kind.
///
/// # Example
///
/// ```
/// use docproxy_codec::{FrameCodec, Salt};
/// use serde_json::json;
///
/// let codec = FrameCodec::new(Salt::new("salt"));
/// let doc = json!({ "version": 1, "x": 5 });
/// let frame = codec.encode(&doc).unwrap();
/// assert_eq!(codec.decode(&frame).unwrap(), doc);
/// ```
#[derive(Debug, Clone)]
pub struct FrameCodec {
    salt: Salt,
    generation: ChecksumGeneration,
    compressor: Arc<dyn Compressor>,
    compaction: Arc<dyn Compaction>,
}

/// Inspection result for a frame, produced by [`FrameCodec::inspect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    /// The 40-character checksum stored in the frame.
    pub checksum: String,
    /// Generation announced by the stored checksum.
    pub generation: ChecksumGeneration,
    /// Whether the stored checksum matches the payload.
    pub checksum_valid: bool,
    /// Size of the frame in bytes.
    pub frame_len: usize,
    /// Length of the decompressed JSON text in bytes.
    pub payload_len: usize,
}

impl FrameCodec {
    /// Creates a codec with DEFLATE compression, no compaction and
    /// marked-generation checksums.
    #[must_use]
    pub fn new(salt: Salt) -> Self {
        Self {
            salt,
            generation: ChecksumGeneration::default(),
            compressor: Arc::new(DeflateCompressor::default()),
            compaction: Arc::new(IdentityCompaction),
        }
    }

    /// Sets the checksum generation used when encoding.
    ///
    /// Decoding always accepts both generations.
    #[must_use]
    pub fn with_generation(mut self, generation: ChecksumGeneration) -> Self {
        self.generation = generation;
        self
    }

    /// Sets the compressor.
    #[must_use]
    pub fn with_compressor(mut self, compressor: impl Compressor + 'static) -> Self {
        self.compressor = Arc::new(compressor);
        self
    }

    /// Sets the object compaction codec.
    #[must_use]
    pub fn with_compaction(mut self, compaction: impl Compaction + 'static) -> Self {
        self.compaction = Arc::new(compaction);
        self
    }

    /// Returns the salt.
    #[must_use]
    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    /// Returns the checksum generation used when encoding.
    #[must_use]
    pub fn generation(&self) -> ChecksumGeneration {
        self.generation
    }

    /// Returns `true` if `bytes` start with the compression tag.
    #[must_use]
    pub fn is_framed(bytes: &[u8]) -> bool {
        bytes.starts_with(COMPRESSION_TAG)
    }

    /// Encodes a document into a frame.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EncodingFailed`] if compaction, serialization
    /// or compression fails.
    pub fn encode(&self, document: &Value) -> CodecResult<Vec<u8>> {
        let compacted = self.compaction.compact(document)?;
        let json = serde_json::to_string(&compacted)
            .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
        let checksum = self.generation.compute(&json, &self.salt);

        let mut body = String::with_capacity(CHECKSUM_LEN + json.len());
        body.push_str(&checksum);
        body.push_str(&json);

        let compressed = self.compressor.compress(body.as_bytes())?;
        let mut frame = Vec::with_capacity(COMPRESSION_TAG.len() + compressed.len());
        frame.extend_from_slice(COMPRESSION_TAG);
        frame.extend_from_slice(&compressed);
        Ok(frame)
    }

    /// Decodes a frame into a document.
    ///
    /// Equivalent to [`FrameCodec::unframe`] followed by
    /// [`FrameCodec::parse`].
    ///
    /// # Errors
    ///
    /// See [`FrameCodec::unframe`] and [`FrameCodec::parse`].
    pub fn decode(&self, frame: &[u8]) -> CodecResult<Value> {
        let json = self.unframe(frame)?;
        self.parse(&json)
    }

    /// Decompresses a frame and verifies its checksum, returning the JSON
    /// text it carries.
    ///
    /// A missing compression tag is treated like any other undecodable
    /// body.
    ///
    /// # Errors
    ///
    /// - [`CodecError::DecompressionFailed`] if the body does not
    ///   decompress to UTF-8 text
    /// - [`CodecError::PayloadTooSmall`] if the text cannot hold a checksum
    /// - [`CodecError::ChecksumMismatch`] if the checksum does not match
    pub fn unframe(&self, frame: &[u8]) -> CodecResult<String> {
        let (checksum, json) = self.split(frame)?;
        let expected = expected_checksum(&checksum, &json, &self.salt);
        if expected != checksum {
            return Err(CodecError::ChecksumMismatch {
                expected,
                actual: checksum,
            });
        }
        Ok(json)
    }

    /// Parses JSON text and expands it through the compaction codec.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::ParseFailed`] if `json` is not valid JSON and
    /// [`CodecError::CompactionFailed`] if it cannot be expanded.
    pub fn parse(&self, json: &str) -> CodecResult<Value> {
        let parsed: Value =
            serde_json::from_str(json).map_err(|e| CodecError::parse_failed(e.to_string()))?;
        self.compaction.expand(parsed)
    }

    /// Reports the checksum layout of a frame without parsing its JSON.
    ///
    /// # Errors
    ///
    /// Fails like [`FrameCodec::unframe`], except that a checksum mismatch
    /// is reported through [`FrameInfo::checksum_valid`].
    pub fn inspect(&self, frame: &[u8]) -> CodecResult<FrameInfo> {
        let (checksum, json) = self.split(frame)?;
        let expected = expected_checksum(&checksum, &json, &self.salt);
        Ok(FrameInfo {
            generation: ChecksumGeneration::detect(&checksum),
            checksum_valid: expected == checksum,
            checksum,
            frame_len: frame.len(),
            payload_len: json.len(),
        })
    }

    fn split(&self, frame: &[u8]) -> CodecResult<(String, String)> {
        let body = frame
            .strip_prefix(COMPRESSION_TAG)
            .ok_or_else(|| CodecError::decompression_failed("missing compression tag"))?;
        let decompressed = self.compressor.decompress(body)?;
        let mut text = String::from_utf8(decompressed)
            .map_err(|e| CodecError::decompression_failed(e.to_string()))?;

        let len = text.chars().count();
        if len < CHECKSUM_LEN {
            return Err(CodecError::PayloadTooSmall { len });
        }
        let split_at = text
            .char_indices()
            .nth(CHECKSUM_LEN)
            .map_or(text.len(), |(idx, _)| idx);
        let json = text.split_off(split_at);
        Ok((text, json))
    }
}
