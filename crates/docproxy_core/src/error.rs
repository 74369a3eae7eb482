//! Error types for docproxy core.

use docproxy_codec::CodecError;
use docproxy_storage::StorageError;
use std::sync::Arc;
use thiserror::Error;

/// Result type for proxy operations.
pub type ProxyResult<T> = Result<T, ProxyError>;

/// Errors that can occur while reading, persisting or deleting a document.
///
/// Errors are `Clone` because one physical flush reports its outcome to
/// every `persist` call that was coalesced into it.
#[derive(Debug, Clone, Error)]
pub enum ProxyError {
    /// The frame body could not be decompressed.
    #[error("bad-content / decompression-failed: {reason}")]
    DecompressionFailure {
        /// Description of the failure.
        reason: String,
    },

    /// The decompressed frame is too short to hold a checksum.
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

    /// The payload is not valid JSON or could not be expanded.
    #[error("invalid-serialized-data: {reason}")]
    ParseFailure {
        /// Description of the failure.
        reason: String,
    },

    /// Stored content is not a compressed frame.
    #[error("bad-content / missing-compression")]
    MissingCompression,

    /// The document is absent or has no valid `version`.
    #[error("verify-failed: {reason}")]
    StructuralInvalid {
        /// Description of the failure.
        reason: String,
    },

    /// The stored document was written by a newer schema.
    #[error("stored-data-is-newer: stored version {stored}, current version {current}")]
    VersionTooNew {
        /// Version found in storage.
        stored: u64,
        /// Version this process understands.
        current: u64,
    },

    /// The schema's migration rejected the stored document.
    #[error("migration-failed from version {from}: {reason}")]
    MigrationFailure {
        /// Version the migration started from.
        from: u64,
        /// Reason reported by the migration.
        reason: String,
    },

    /// The document failed the verification gate for the current version.
    #[error("invalid-data: {reason}")]
    SemanticInvalid {
        /// Description of the failure.
        reason: String,
    },

    /// The storage backend failed.
    #[error("file-error on {name}: {source}")]
    BackendFailure {
        /// Name of the document.
        name: String,
        /// The backend error.
        source: Arc<StorageError>,
    },

    /// The document could not be encoded into a frame.
    #[error("encoding failed: {reason}")]
    EncodingFailure {
        /// Description of the failure.
        reason: String,
    },

    /// A scheduled flush was torn down before it reported an outcome.
    #[error("flush aborted before completion")]
    FlushAborted,
}

impl ProxyError {
    /// Creates a structural validation error.
    pub fn structural(reason: impl Into<String>) -> Self {
        Self::StructuralInvalid {
            reason: reason.into(),
        }
    }

    /// Creates a semantic validation error.
    pub fn semantic(reason: impl Into<String>) -> Self {
        Self::SemanticInvalid {
            reason: reason.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::ParseFailure {
            reason: reason.into(),
        }
    }

    /// Wraps a backend error for the document `name`.
    pub fn backend(name: impl Into<String>, source: StorageError) -> Self {
        Self::BackendFailure {
            name: name.into(),
            source: Arc::new(source),
        }
    }

    /// Returns `true` for failures caused by the stored bytes rather than
    /// by the backend or the in-memory document.
    #[must_use]
    pub fn is_bad_content(&self) -> bool {
        matches!(
            self,
            Self::DecompressionFailure { .. }
                | Self::PayloadTooSmall { .. }
                | Self::ChecksumMismatch { .. }
                | Self::ParseFailure { .. }
                | Self::MissingCompression
        )
    }
}

impl From<CodecError> for ProxyError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::DecompressionFailed { message } => {
                Self::DecompressionFailure { reason: message }
            }
            CodecError::PayloadTooSmall { len } => Self::PayloadTooSmall { len },
            CodecError::ChecksumMismatch { expected, actual } => {
                Self::ChecksumMismatch { expected, actual }
            }
            CodecError::ParseFailed { message } | CodecError::CompactionFailed { message } => {
                Self::ParseFailure { reason: message }
            }
            CodecError::EncodingFailed { message } => Self::EncodingFailure { reason: message },
        }
    }
}
