//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while framing or unframing a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The compressed body could not be decompressed into text.
    #[error("bad-content / decompression-failed: {message}")]
    DecompressionFailed {
        /// Description of the decompression error.
        message: String,
    },

    /// The decompressed text is too short to hold a checksum.
    #[error("bad-content / payload-too-small: {len} characters")]
    PayloadTooSmall {
        /// Length of the decompressed text in characters.
        len: usize,
    },

    /// The stored checksum does not match the payload.
    #[error("bad-content / checksum-mismatch: {expected} vs {actual}")]
    ChecksumMismatch {
        /// Checksum recomputed from the payload.
        expected: String,
        /// Checksum found in the frame.
        actual: String,
    },

    /// The payload is not valid JSON.
    #[error("invalid-serialized-data: {message}")]
    ParseFailed {
        /// Description of the parse error.
        message: String,
    },

    /// The document could not be serialized or compressed.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// A compacted document could not be expanded.
    #[error("compaction failed: {message}")]
    CompactionFailed {
        /// Description of the compaction error.
        message: String,
    },
}

impl CodecError {
    /// Create a decompression failed error.
    pub fn decompression_failed(message: impl Into<String>) -> Self {
        Self::DecompressionFailed {
            message: message.into(),
        }
    }

    /// Create a parse failed error.
    pub fn parse_failed(message: impl Into<String>) -> Self {
        Self::ParseFailed {
            message: message.into(),
        }
    }

    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create a compaction failed error.
    pub fn compaction_failed(message: impl Into<String>) -> Self {
        Self::CompactionFailed {
            message: message.into(),
        }
    }
}
