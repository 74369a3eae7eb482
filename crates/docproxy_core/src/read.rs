//! The read pipeline.
//!
//! One read attempt walks a linear state machine:
//!
//! ```text
//! Fetching -> Decoded -> Parsed -> StructurallyValid
//!          -> VersionResolved -> SemanticallyValid -> Committed
//! ```
//!
//! Any stage can reject, which aborts the attempt. The pipeline only
//! produces a staged document; committing it is the caller's job, so a
//! rejected read never touches the authoritative copy.

use crate::error::{ProxyError, ProxyResult};
use crate::migration::{resolve_version, VersionResolution};
use crate::schema::{document_version, DocumentSchema};
use crate::verify::{verify_basic_structure, verify_entry};
use docproxy_codec::FrameCodec;
use docproxy_storage::StorageBackend;
use serde_json::Value;
use std::fmt;
use tracing::{debug, info, warn};

/// Stages of a read attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStage {
    /// Reading bytes from the backend.
    Fetching,
    /// Frame decompressed and checksum verified.
    Decoded,
    /// JSON parsed and expanded.
    Parsed,
    /// Basic structure verified.
    StructurallyValid,
    /// Version reconciled, possibly by migration.
    VersionResolved,
    /// Verification gate passed.
    SemanticallyValid,
    /// Document installed as the authoritative copy.
    Committed,
}

impl fmt::Display for ReadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetching => "fetching",
            Self::Decoded => "decoded",
            Self::Parsed => "parsed",
            Self::StructurallyValid => "structurally-valid",
            Self::VersionResolved => "version-resolved",
            Self::SemanticallyValid => "semantically-valid",
            Self::Committed => "committed",
        };
        f.write_str(name)
    }
}

/// Where a read document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOrigin {
    /// Decoded from the backend.
    Stored,
    /// Nothing was stored; the schema's default data was used.
    Default,
}

/// The result of a successful read.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOutcome {
    /// The document that was (or is to be) committed.
    pub document: Value,
    /// Where the document came from.
    pub origin: DocumentOrigin,
    /// How the stored version was reconciled.
    pub resolution: VersionResolution,
}

impl ReadOutcome {
    /// The version the document was migrated from, if it was migrated.
    #[must_use]
    pub fn migrated_from(&self) -> Option<u64> {
        match self.resolution {
            VersionResolution::Migrated { from } => Some(from),
            VersionResolution::Current => None,
        }
    }

    /// The document's version.
    #[must_use]
    pub fn version(&self) -> Option<u64> {
        document_version(&self.document)
    }
}

/// Runs the read stages for one named document.
pub struct ReadPipeline<'a, S: ?Sized, B: ?Sized> {
    name: &'a str,
    schema: &'a S,
    backend: &'a B,
    codec: &'a FrameCodec,
    allow_raw: bool,
}

impl<'a, S, B> ReadPipeline<'a, S, B>
where
    S: DocumentSchema + ?Sized,
    B: StorageBackend + ?Sized,
{
    /// Creates a pipeline. `allow_raw` accepts untagged raw JSON.
    pub fn new(
        name: &'a str,
        schema: &'a S,
        backend: &'a B,
        codec: &'a FrameCodec,
        allow_raw: bool,
    ) -> Self {
        Self {
            name,
            schema,
            backend,
            codec,
            allow_raw,
        }
    }

    /// Runs every stage up to, but not including, the commit.
    ///
    /// # Errors
    ///
    /// Returns the error of the first stage that rejects.
    pub async fn run(&self) -> ProxyResult<ReadOutcome> {
        self.enter(ReadStage::Fetching);
        let bytes = match self.backend.read(self.name).await {
            Ok(bytes) => bytes,
            Err(err) if err.is_not_found() => {
                info!(name = self.name, "file not found, using default data");
                return Ok(ReadOutcome {
                    document: self.schema.default_data(),
                    origin: DocumentOrigin::Default,
                    resolution: VersionResolution::Current,
                });
            }
            Err(err) => return Err(ProxyError::backend(self.name, err)),
        };

        let text = self.decode(&bytes)?;
        self.enter(ReadStage::Decoded);

        let mut staged = self.codec.parse(&text)?;
        self.enter(ReadStage::Parsed);

        verify_basic_structure(&staged).into_result(ProxyError::structural)?;
        self.enter(ReadStage::StructurallyValid);

        let resolution = resolve_version(self.schema, &mut staged)?;
        self.enter(ReadStage::VersionResolved);

        verify_entry(self.schema, &staged).into_result(ProxyError::semantic)?;
        self.enter(ReadStage::SemanticallyValid);

        Ok(ReadOutcome {
            document: staged,
            origin: DocumentOrigin::Stored,
            resolution,
        })
    }

    fn decode(&self, bytes: &[u8]) -> ProxyResult<String> {
        if self.allow_raw && !FrameCodec::is_framed(bytes) {
            warn!(name = self.name, "accepting uncompressed document (debug mode)");
        }
        decode_stored(self.codec, bytes, self.allow_raw)
    }

    fn enter(&self, stage: ReadStage) {
        debug!(name = self.name, %stage, "read stage");
    }
}

/// Turns stored bytes into the document's JSON text.
///
/// Framed bytes are unframed and their checksum checked. Unframed bytes are
/// taken as raw JSON only when `allow_raw` is set.
///
/// # Errors
///
/// Returns [`ProxyError::MissingCompression`] for unframed bytes when raw
/// JSON is not allowed, a codec error for a bad frame, or
/// [`ProxyError::ParseFailure`] for raw bytes that are not UTF-8.
pub fn decode_stored(codec: &FrameCodec, bytes: &[u8], allow_raw: bool) -> ProxyResult<String> {
    if FrameCodec::is_framed(bytes) {
        return Ok(codec.unframe(bytes)?);
    }
    if !allow_raw {
        return Err(ProxyError::MissingCompression);
    }
    String::from_utf8(bytes.to_vec()).map_err(|e| ProxyError::parse(e.to_string()))
}
