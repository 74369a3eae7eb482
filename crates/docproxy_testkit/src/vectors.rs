//! Frame test vectors.
//!
//! Frames here are assembled by hand from their parts (tag, DEFLATE body,
//! checksum, JSON text) so tests can cover layouts the codec never
//! produces itself: legacy checksums, tampered payloads, truncated bodies.

use crate::fixtures::{settings_v1, settings_v3, TEST_SALT};
use docproxy_codec::{
    ChecksumGeneration, Compressor, DeflateCompressor, Salt, COMPRESSION_TAG, MARKER,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A frame together with the outcome of decoding it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Salt the frame was built with.
    pub salt: String,
    /// The frame (hex-encoded).
    pub frame_hex: String,
    /// The decoded document, if decoding should succeed.
    pub document: Option<Value>,
    /// Expected error kind (if this should fail).
    pub expected_error: Option<String>,
}

impl FrameVector {
    /// Returns the frame bytes.
    pub fn frame(&self) -> Vec<u8> {
        hex::decode(&self.frame_hex).expect("vector frames are valid hex")
    }

    fn ok(id: &str, description: &str, frame: &[u8], document: Value) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            salt: TEST_SALT.into(),
            frame_hex: hex::encode(frame),
            document: Some(document),
            expected_error: None,
        }
    }

    fn err(id: &str, description: &str, frame: &[u8], error: &str) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            salt: TEST_SALT.into(),
            frame_hex: hex::encode(frame),
            document: None,
            expected_error: Some(error.into()),
        }
    }
}

/// Wraps `body` in a frame without computing any checksum.
pub fn frame_from_body(body: &str) -> Vec<u8> {
    let compressed = DeflateCompressor::default()
        .compress(body.as_bytes())
        .expect("in-memory compression cannot fail");
    let mut frame = COMPRESSION_TAG.to_vec();
    frame.extend_from_slice(&compressed);
    frame
}

/// Builds a frame for `document` with the given checksum generation.
pub fn frame_with(document: &Value, salt: &str, generation: ChecksumGeneration) -> Vec<u8> {
    let json = document.to_string();
    let checksum = generation.compute(&json, &Salt::new(salt));
    frame_from_body(&format!("{checksum}{json}"))
}

/// Builds a frame with a legacy SHA-1 checksum, as older writers produced.
pub fn legacy_frame(document: &Value, salt: &str) -> Vec<u8> {
    frame_with(document, salt, ChecksumGeneration::Legacy)
}

/// Builds a frame whose payload was altered after checksumming.
pub fn tampered_frame(document: &Value, salt: &str) -> Vec<u8> {
    let json = document.to_string();
    let checksum = ChecksumGeneration::Marked.compute(&json, &Salt::new(salt));
    let tampered = format!("{json} ");
    frame_from_body(&format!("{checksum}{tampered}"))
}

/// Builds a frame whose body is too short to hold a checksum.
pub fn short_frame() -> Vec<u8> {
    frame_from_body("{\"version\":1}")
}

/// Builds a frame whose body is not a DEFLATE stream.
pub fn garbage_frame() -> Vec<u8> {
    let mut frame = COMPRESSION_TAG.to_vec();
    frame.extend_from_slice(&[0xff, 0xfe, 0xfd, 0xfc, 0xfb, 0xfa]);
    frame
}

/// Builds a frame with a correct checksum around text that is not JSON.
pub fn non_json_frame(salt: &str) -> Vec<u8> {
    let text = "version=1";
    let checksum = ChecksumGeneration::Marked.compute(text, &Salt::new(salt));
    frame_from_body(&format!("{checksum}{text}"))
}

/// Builds a frame whose marked checksum has the right marker but the
/// wrong digest.
pub fn wrong_digest_frame(document: &Value) -> Vec<u8> {
    frame_from_body(&format!("{MARKER}00000000{document}"))
}

/// The standard set of frame vectors, all built with [`TEST_SALT`].
pub fn frame_vectors() -> Vec<FrameVector> {
    let current = settings_v3(40, "dark");
    let old = settings_v1(70);
    vec![
        FrameVector::ok(
            "marked_current",
            "marked checksum, current version",
            &frame_with(&current, TEST_SALT, ChecksumGeneration::Marked),
            current.clone(),
        ),
        FrameVector::ok(
            "legacy_current",
            "legacy SHA-1 checksum, current version",
            &legacy_frame(&current, TEST_SALT),
            current.clone(),
        ),
        FrameVector::ok(
            "legacy_v1",
            "legacy SHA-1 checksum, version 1 document",
            &legacy_frame(&old, TEST_SALT),
            old,
        ),
        FrameVector::err(
            "tampered",
            "payload changed after checksumming",
            &tampered_frame(&current, TEST_SALT),
            "checksum-mismatch",
        ),
        FrameVector::err(
            "wrong_salt",
            "checksum computed with another salt",
            &frame_with(&current, "other-salt", ChecksumGeneration::Marked),
            "checksum-mismatch",
        ),
        FrameVector::err(
            "wrong_digest",
            "marker present, digest wrong",
            &wrong_digest_frame(&current),
            "checksum-mismatch",
        ),
        FrameVector::err(
            "short",
            "body shorter than a checksum",
            &short_frame(),
            "payload-too-small",
        ),
        FrameVector::err(
            "garbage",
            "body is not a DEFLATE stream",
            &garbage_frame(),
            "decompression-failed",
        ),
        FrameVector::err(
            "not_json",
            "valid checksum around non-JSON text",
            &non_json_frame(TEST_SALT),
            "parse-failed",
        ),
    ]
}

/// Names the error kind of a codec error the way vectors spell it.
pub fn codec_error_kind(err: &docproxy_codec::CodecError) -> &'static str {
    use docproxy_codec::CodecError;
    match err {
        CodecError::DecompressionFailed { .. } => "decompression-failed",
        CodecError::PayloadTooSmall { .. } => "payload-too-small",
        CodecError::ChecksumMismatch { .. } => "checksum-mismatch",
        CodecError::ParseFailed { .. } => "parse-failed",
        CodecError::EncodingFailed { .. } => "encoding-failed",
        CodecError::CompactionFailed { .. } => "compaction-failed",
    }
}
