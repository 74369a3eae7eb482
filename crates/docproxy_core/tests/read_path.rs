//! Integration tests for reading documents through a proxy.

use docproxy_codec::{ChecksumGeneration, FrameCodec, Salt};
use docproxy_core::{
    DocumentOrigin, DocumentProxy, DocumentSchema, ProxyConfig, ProxyError, VerifyResult,
};
use docproxy_storage::InMemoryBackend;
use docproxy_testkit::prelude::*;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;

/// A single-version schema with one integer field.
struct Plain;

impl DocumentSchema for Plain {
    fn current_version(&self) -> u64 {
        1
    }

    fn default_data(&self) -> Value {
        json!({ "version": 1, "x": 0 })
    }

    fn verify(&self, document: &Value) -> VerifyResult {
        if document["x"].is_i64() {
            VerifyResult::good()
        } else {
            VerifyResult::bad("x must be an integer")
        }
    }
}

fn seeded(frame: Vec<u8>) -> (DocumentProxy<SettingsSchema, RecordingBackend>, RecordingBackend) {
    let (proxy, backend) = recording_proxy();
    backend.insert(SETTINGS_NAME, frame);
    (proxy, backend)
}

/// Puts a recognizable value in memory so tests can check it survives.
fn mark_memory(proxy: &DocumentProxy<SettingsSchema, RecordingBackend>) -> Value {
    let marked = settings_v3(11, "marked");
    proxy.replace(marked.clone());
    marked
}

#[tokio::test]
async fn round_trip_through_storage() {
    let backend = Arc::new(InMemoryBackend::new());
    let codec = FrameCodec::new(Salt::new("s"));
    let writer = DocumentProxy::new(
        "doc",
        Plain,
        Arc::clone(&backend),
        codec.clone(),
        ProxyConfig::default(),
    )
    .unwrap();
    writer.replace(json!({ "version": 1, "x": 5 }));
    writer.flush().await.unwrap();

    let reader = DocumentProxy::new("doc", Plain, backend, codec, ProxyConfig::default()).unwrap();
    let outcome = reader.read().await.unwrap();
    assert_eq!(outcome.origin, DocumentOrigin::Stored);
    assert_eq!(reader.snapshot(), json!({ "version": 1, "x": 5 }));
}

#[tokio::test]
async fn missing_document_reads_defaults() {
    let (proxy, backend) = recording_proxy();
    proxy.replace(settings_v3(1, "x"));

    let outcome = proxy.read().await.unwrap();
    assert_eq!(outcome.origin, DocumentOrigin::Default);
    assert_eq!(proxy.snapshot(), SettingsSchema::new().default_data());
    assert_eq!(backend.reads(), 1);
    assert_eq!(backend.writes(), 0);
}

#[tokio::test]
async fn legacy_frames_stay_readable() {
    let stored = settings_v3(80, "solarized");
    let (proxy, _backend) = seeded(legacy_frame(&stored, TEST_SALT));

    proxy.read().await.unwrap();
    assert_eq!(proxy.snapshot(), stored);
}

#[tokio::test]
async fn legacy_frames_are_rewritten_with_marked_checksums() {
    let stored = settings_v3(80, "solarized");
    let (proxy, backend) = seeded(legacy_frame(&stored, TEST_SALT));

    proxy.read().await.unwrap();
    proxy.persist().await.unwrap();

    let rewritten = backend.get(SETTINGS_NAME).unwrap();
    let info = test_codec().inspect(&rewritten).unwrap();
    assert_eq!(info.generation, ChecksumGeneration::Marked);
    assert!(info.checksum_valid);
}

#[tokio::test]
async fn tampered_frame_is_rejected_and_memory_kept() {
    let (proxy, _backend) = seeded(tampered_frame(&settings_v3(10, "dark"), TEST_SALT));
    let before = mark_memory(&proxy);

    let err = proxy.read().await.unwrap_err();
    assert!(matches!(err, ProxyError::ChecksumMismatch { .. }));
    assert!(err.is_bad_content());
    assert_eq!(proxy.snapshot(), before);
}

#[tokio::test]
async fn foreign_salt_is_rejected() {
    let frame = frame_with(&settings_v3(10, "dark"), "another-salt", ChecksumGeneration::Marked);
    let (proxy, _backend) = seeded(frame);
    assert!(matches!(
        proxy.read().await,
        Err(ProxyError::ChecksumMismatch { .. })
    ));
}

#[tokio::test]
async fn malformed_frames_map_to_bad_content() {
    let cases = [
        (short_frame(), "payload-too-small"),
        (garbage_frame(), "decompression-failed"),
        (non_json_frame(TEST_SALT), "parse-failed"),
    ];
    for (frame, kind) in cases {
        let (proxy, _backend) = seeded(frame);
        let before = mark_memory(&proxy);
        let err = proxy.read().await.unwrap_err();
        let matched = match kind {
            "payload-too-small" => matches!(err, ProxyError::PayloadTooSmall { .. }),
            "decompression-failed" => matches!(err, ProxyError::DecompressionFailure { .. }),
            _ => matches!(err, ProxyError::ParseFailure { .. }),
        };
        assert!(matched, "{kind}: got {err}");
        assert_eq!(proxy.snapshot(), before);
    }
}

#[tokio::test]
async fn newer_version_is_refused_without_migrating() {
    let stored = json!({ "version": 4, "theme": "dark", "audio": { "volume": 1 } });
    let (proxy, _backend) = seeded(frame_with(&stored, TEST_SALT, ChecksumGeneration::Marked));
    let before = mark_memory(&proxy);

    let err = proxy.read().await.unwrap_err();
    assert!(matches!(
        err,
        ProxyError::VersionTooNew {
            stored: 4,
            current: 3
        }
    ));
    assert_eq!(proxy.schema().migrate_calls(), 0);
    assert_eq!(proxy.snapshot(), before);
}

#[tokio::test]
async fn older_version_migrates_exactly_once() {
    let (proxy, _backend) = seeded(legacy_frame(&settings_v1(70), TEST_SALT));

    let outcome = proxy.read().await.unwrap();
    assert_eq!(outcome.migrated_from(), Some(1));
    assert_eq!(outcome.version(), Some(3));
    assert_eq!(proxy.schema().migrate_calls(), 1);
    assert_eq!(proxy.snapshot(), settings_v3(70, "light"));
}

#[tokio::test]
async fn failed_migration_keeps_memory() {
    let stored = json!({ "version": 2, "theme": "dark" });
    let (proxy, _backend) = seeded(frame_with(&stored, TEST_SALT, ChecksumGeneration::Marked));
    let before = mark_memory(&proxy);

    let err = proxy.read().await.unwrap_err();
    assert!(matches!(err, ProxyError::MigrationFailure { from: 2, .. }));
    assert_eq!(proxy.schema().migrate_calls(), 1);
    assert_eq!(proxy.snapshot(), before);
}

#[tokio::test]
async fn migrated_document_must_still_verify() {
    let (proxy, _backend) = seeded(legacy_frame(&settings_v1(500), TEST_SALT));
    let err = proxy.read().await.unwrap_err();
    assert!(matches!(err, ProxyError::SemanticInvalid { .. }));
}

#[tokio::test]
async fn structural_failures_are_classified() {
    for stored in [Value::Null, json!({ "version": "3" }), json!([3])] {
        let (proxy, _backend) = seeded(frame_with(&stored, TEST_SALT, ChecksumGeneration::Marked));
        let err = proxy.read().await.unwrap_err();
        assert!(
            matches!(err, ProxyError::StructuralInvalid { .. }),
            "{stored}: got {err}"
        );
    }
}

#[tokio::test]
async fn raw_json_needs_debug_mode() {
    let raw = settings_v3(20, "dark").to_string().into_bytes();

    let (strict, _backend) = seeded(raw.clone());
    assert!(matches!(
        strict.read().await,
        Err(ProxyError::MissingCompression)
    ));

    let (debug, backend) = recording_proxy_with(test_config().debug(true));
    backend.insert(SETTINGS_NAME, raw);
    debug.read().await.unwrap();
    assert_eq!(debug.snapshot(), settings_v3(20, "dark"));
}

#[tokio::test]
async fn backend_failure_is_not_treated_as_missing() {
    let (proxy, backend) = seeded(legacy_frame(&settings_v3(1, "a"), TEST_SALT));
    backend.fail_reads(true);
    let before = mark_memory(&proxy);

    let err = proxy.read().await.unwrap_err();
    match &err {
        ProxyError::BackendFailure { name, source } => {
            assert_eq!(name, SETTINGS_NAME);
            assert!(!source.is_not_found());
        }
        other => panic!("expected backend failure, got {other}"),
    }
    assert_eq!(proxy.snapshot(), before);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn stored_settings_read_back_unchanged(doc in settings_strategy()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let read_back = runtime.block_on(async {
            let (proxy, _backend) = seeded(frame_with(&doc, TEST_SALT, ChecksumGeneration::Marked));
            proxy.read().await.map(|_| proxy.snapshot())
        });
        prop_assert_eq!(read_back.ok(), Some(doc));
    }
}
