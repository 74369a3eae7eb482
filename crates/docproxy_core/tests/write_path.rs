//! Integration tests for persisting and deleting documents.

use docproxy_core::{DocumentProxy, DocumentSchema, ProxyConfig, ProxyError};
use docproxy_storage::InMemoryBackend;
use docproxy_testkit::prelude::*;
use serde_json::json;
use std::time::Duration;

fn stored(backend: &RecordingBackend) -> serde_json::Value {
    let frame = backend.get(SETTINGS_NAME).expect("document was written");
    test_codec().decode(&frame).unwrap()
}

#[tokio::test]
async fn burst_of_persists_writes_once_with_latest_state() {
    let (proxy, backend) = recording_proxy();

    let mut pending = Vec::new();
    for volume in 1..=5 {
        proxy.update(|doc| doc["audio"]["volume"] = json!(volume));
        pending.push(proxy.persist());
    }
    proxy.update(|doc| doc["theme"] = json!("late"));

    for outcome in pending {
        outcome.await.unwrap();
    }
    assert_eq!(backend.writes(), 1);
    assert_eq!(stored(&backend), settings_v3(5, "late"));
}

#[tokio::test]
async fn persists_in_separate_windows_write_separately() {
    let (proxy, backend) = recording_proxy();

    proxy.persist().await.unwrap();
    proxy.update(|doc| doc["theme"] = json!("second"));
    proxy.persist().await.unwrap();

    assert_eq!(backend.writes(), 2);
    assert_eq!(proxy.scheduler().flush_count(), 2);
    assert_eq!(stored(&backend), settings_v3(50, "second"));
}

#[tokio::test(start_paused = true)]
async fn persists_closer_than_the_window_write_once() {
    let (proxy, backend) = recording_proxy();
    let step = TEST_WINDOW * 6 / 10;

    let mut pending = Vec::new();
    for volume in 1..=4 {
        proxy.update(|doc| doc["audio"]["volume"] = json!(volume));
        pending.push(proxy.persist());
        tokio::time::sleep(step).await;
    }
    assert_eq!(backend.writes(), 0);

    for outcome in pending {
        outcome.await.unwrap();
    }
    assert_eq!(backend.writes(), 1);
    assert_eq!(stored(&backend), settings_v3(4, "dark"));
}

#[tokio::test(start_paused = true)]
async fn persist_during_slow_write_waits_for_it() {
    let (proxy, backend) = recording_proxy();
    backend.delay_writes(Some(TEST_WINDOW * 5));

    let first = proxy.persist();
    tokio::time::sleep(TEST_WINDOW * 2).await;
    assert_eq!(backend.writes(), 1);

    proxy.update(|doc| doc["theme"] = json!("newer"));
    let second = proxy.persist();
    tokio::time::sleep(TEST_WINDOW * 2).await;
    assert_eq!(backend.writes(), 1, "second write started before the first finished");

    first.await.unwrap();
    second.await.unwrap();
    let written = backend.written();
    assert_eq!(written.len(), 2);
    assert_eq!(
        test_codec().decode(&written[0]).unwrap(),
        SettingsSchema::new().default_data()
    );
    assert_eq!(stored(&backend), settings_v3(50, "newer"));
}

#[tokio::test]
async fn invalid_document_is_never_written() {
    let (proxy, backend) = recording_proxy();
    proxy.update(|doc| doc["audio"]["volume"] = json!(500));

    let err = proxy.persist().await.unwrap_err();
    assert!(matches!(err, ProxyError::SemanticInvalid { .. }));
    assert!(!proxy.scheduler().is_pending());

    proxy.replace(json!({ "theme": "dark" }));
    assert!(matches!(
        proxy.persist().await,
        Err(ProxyError::StructuralInvalid { .. })
    ));

    assert_eq!(backend.writes(), 0);
    assert!(!backend.contains(SETTINGS_NAME));
}

#[tokio::test]
async fn document_invalidated_inside_window_is_not_written() {
    let (proxy, backend) = recording_proxy();

    let pending = proxy.persist();
    proxy.update(|doc| doc["audio"]["volume"] = json!("loud"));

    assert!(matches!(
        pending.await,
        Err(ProxyError::SemanticInvalid { .. })
    ));
    assert_eq!(backend.writes(), 0);
}

#[tokio::test]
async fn backend_failure_reaches_every_waiter() {
    let (proxy, backend) = recording_proxy();
    backend.fail_writes(true);

    let first = proxy.persist();
    let second = proxy.persist();
    for outcome in [first.await, second.await] {
        match outcome {
            Err(ProxyError::BackendFailure { name, .. }) => assert_eq!(name, SETTINGS_NAME),
            other => panic!("expected backend failure, got {other:?}"),
        }
    }
    assert_eq!(backend.writes(), 1);
    assert_eq!(proxy.snapshot(), SettingsSchema::new().default_data());
    assert!(proxy.settled().await.is_err());

    backend.fail_writes(false);
    proxy.persist().await.unwrap();
    assert!(proxy.settled().await.is_ok());
}

#[tokio::test]
async fn flush_bypasses_the_window() {
    let (proxy, backend) = recording_proxy_with(
        test_config().coalesce_window(Duration::from_secs(3600)),
    );
    proxy.update(|doc| doc["theme"] = json!("now"));

    proxy.flush().await.unwrap();
    assert_eq!(backend.writes(), 1);
    assert_eq!(stored(&backend), settings_v3(50, "now"));
}

#[tokio::test]
async fn offloaded_compression_writes_the_same_document() {
    let (proxy, backend) = recording_proxy_with(test_config().offload_compression(true));
    proxy.update(|doc| doc["audio"]["volume"] = json!(9));

    proxy.persist().await.unwrap();
    assert_eq!(stored(&backend), settings_v3(9, "dark"));
}

#[tokio::test]
async fn slow_backend_still_coalesces() {
    let (proxy, backend) = recording_proxy();
    backend.delay_writes(Some(Duration::from_millis(20)));

    let a = proxy.persist();
    let b = proxy.persist();
    a.await.unwrap();
    b.await.unwrap();
    assert_eq!(backend.writes(), 1);
}

#[tokio::test]
async fn settled_waits_for_the_latest_flush() {
    let (proxy, backend) = recording_proxy();
    assert!(proxy.settled().await.is_ok());

    drop(proxy.persist());
    proxy.settled().await.unwrap();
    assert_eq!(backend.writes(), 1);
}

#[tokio::test]
async fn reset_persists_defaults() {
    let (proxy, backend) = recording_proxy();
    proxy.update(|doc| doc["theme"] = json!("custom"));
    proxy.persist().await.unwrap();

    proxy.reset().await.unwrap();
    assert_eq!(proxy.snapshot(), SettingsSchema::new().default_data());
    assert_eq!(stored(&backend), SettingsSchema::new().default_data());
}

#[tokio::test]
async fn delete_keeps_memory_and_next_read_gives_defaults() {
    let (proxy, backend) = recording_proxy();
    proxy.update(|doc| doc["theme"] = json!("kept"));
    proxy.persist().await.unwrap();

    proxy.delete().await.unwrap();
    assert!(!backend.contains(SETTINGS_NAME));
    assert_eq!(proxy.snapshot(), settings_v3(50, "kept"));

    proxy.read().await.unwrap();
    assert_eq!(proxy.snapshot(), SettingsSchema::new().default_data());
}

#[tokio::test]
async fn deleting_nothing_is_a_backend_failure() {
    let (proxy, backend) = recording_proxy();
    match proxy.delete().await {
        Err(ProxyError::BackendFailure { source, .. }) => assert!(source.is_not_found()),
        other => panic!("expected backend failure, got {other:?}"),
    }
    assert_eq!(backend.deletes(), 1);
}

#[tokio::test]
async fn debug_mode_self_tests_default_data() {
    let err = DocumentProxy::new(
        "broken",
        BrokenDefaultsSchema,
        InMemoryBackend::new(),
        test_codec(),
        ProxyConfig::new().debug(true),
    )
    .unwrap_err();
    assert!(err
        .to_string()
        .contains("verify() failed for default data: name is required"));

    let proxy = DocumentProxy::new(
        "broken",
        BrokenDefaultsSchema,
        InMemoryBackend::new(),
        test_codec(),
        ProxyConfig::new(),
    );
    assert!(proxy.is_ok());
}

#[tokio::test]
async fn file_backed_document_survives_restart() {
    let store = TestStore::new().await;
    store.update(|doc| doc["audio"]["volume"] = json!(33));
    store.persist().await.unwrap();
    assert!(store.path().join(SETTINGS_NAME).exists());

    let restarted = store.reopen().await;
    assert_eq!(restarted.snapshot(), restarted.schema().default_data());
    restarted.read().await.unwrap();
    assert_eq!(restarted.snapshot(), settings_v3(33, "dark"));
}

#[tokio::test]
async fn file_backed_old_document_is_upgraded_on_disk() {
    let store = TestStore::new().await;
    std::fs::write(
        store.path().join(SETTINGS_NAME),
        legacy_frame(&settings_v1(12), TEST_SALT),
    )
    .unwrap();

    store.read().await.unwrap();
    store.persist().await.unwrap();

    let restarted = store.reopen().await;
    let outcome = restarted.read().await.unwrap();
    assert_eq!(outcome.migrated_from(), None);
    assert_eq!(restarted.snapshot(), settings_v3(12, "light"));
    assert_eq!(restarted.schema().migrate_calls(), 0);
}
