//! Fuzz testing harnesses for docproxy.
//!
//! This module provides fuzz targets that can be used with cargo-fuzz
//! or other fuzzing frameworks.

use crate::fixtures::{test_codec, SettingsSchema, SETTINGS_NAME};
use docproxy_codec::{FrameCodec, KeyTableCompaction};
use docproxy_core::ReadPipeline;
use docproxy_storage::InMemoryBackend;

/// Fuzz target for frame decoding.
///
/// Tests that arbitrary byte sequences either decode to a document or
/// return a proper error (no panics).
pub fn fuzz_frame_decode(data: &[u8]) {
    let codec = test_codec();
    let _ = codec.decode(data);
    let _ = codec.inspect(data);

    // Same bytes behind a tag, so the DEFLATE path is always reached.
    let mut framed = docproxy_codec::COMPRESSION_TAG.to_vec();
    framed.extend_from_slice(data);
    let _ = codec.decode(&framed);
}

/// Fuzz target for key-table expansion.
///
/// Any JSON text that parses must either expand or report a compaction
/// error.
pub fn fuzz_compaction_expand(data: &[u8]) {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let codec = FrameCodec::new(test_codec().salt().clone()).with_compaction(KeyTableCompaction);
    let _ = codec.parse(text);
}

/// Fuzz target for the read pipeline.
///
/// Stores arbitrary bytes and runs a full read over them, in both strict
/// and debug mode. A read must never panic and must never yield a document
/// that fails verification.
pub fn fuzz_read_pipeline(data: &[u8]) {
    let Ok(runtime) = tokio::runtime::Builder::new_current_thread().build() else {
        return;
    };
    let schema = SettingsSchema::new();
    let backend = InMemoryBackend::with_blob(SETTINGS_NAME, data.to_vec());
    let codec = test_codec();

    for allow_raw in [false, true] {
        let pipeline = ReadPipeline::new(SETTINGS_NAME, &schema, &backend, &codec, allow_raw);
        if let Ok(outcome) = runtime.block_on(pipeline.run()) {
            assert!(
                docproxy_core::verify_entry(&schema, &outcome.document).is_good(),
                "read produced an invalid document"
            );
        }
    }
}
