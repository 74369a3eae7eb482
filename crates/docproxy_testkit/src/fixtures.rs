//! Test fixtures and proxy helpers.
//!
//! [`SettingsSchema`] is a small three-version schema used throughout the
//! test suites:
//!
//! | version | shape |
//! |---------|-------|
//! | 1 | `{ "volume": n }` |
//! | 2 | `{ "volume": n, "theme": s }` |
//! | 3 | `{ "audio": { "volume": n }, "theme": s }` |

use crate::backends::RecordingBackend;
use docproxy_codec::{FrameCodec, Salt};
use docproxy_core::{DocumentProxy, DocumentSchema, MigrationChain, ProxyConfig, VerifyResult};
use docproxy_storage::FileBackend;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Salt used by every fixture codec.
pub const TEST_SALT: &str = "docproxy-test-salt";

/// Storage name used by the proxy fixtures.
pub const SETTINGS_NAME: &str = "settings.bin";

/// Coalescing window used by the proxy fixtures.
pub const TEST_WINDOW: Duration = Duration::from_millis(10);

/// The current version of [`SettingsSchema`].
pub const SETTINGS_VERSION: u64 = 3;

/// A three-version settings document.
///
/// Counts calls to `migrate` so tests can assert the single-call contract.
#[derive(Debug)]
pub struct SettingsSchema {
    chain: MigrationChain,
    migrate_calls: Arc<AtomicUsize>,
}

impl SettingsSchema {
    /// Creates the schema with its v1 -> v2 -> v3 migration chain.
    pub fn new() -> Self {
        let chain = MigrationChain::new(SETTINGS_VERSION)
            .step(1, |doc| {
                doc["theme"] = json!("light");
                VerifyResult::good()
            })
            .step(2, |doc| {
                let Some(map) = doc.as_object_mut() else {
                    return VerifyResult::bad("not an object");
                };
                match map.remove("volume") {
                    Some(volume) => {
                        map.insert("audio".to_string(), json!({ "volume": volume }));
                        VerifyResult::good()
                    }
                    None => VerifyResult::bad("volume is missing"),
                }
            });
        Self {
            chain,
            migrate_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns the number of times `migrate` has been called.
    pub fn migrate_calls(&self) -> usize {
        self.migrate_calls.load(Ordering::SeqCst)
    }

    /// Returns a shared handle on the migrate call counter.
    pub fn migrate_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.migrate_calls)
    }
}

impl Default for SettingsSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentSchema for SettingsSchema {
    fn current_version(&self) -> u64 {
        SETTINGS_VERSION
    }

    fn default_data(&self) -> Value {
        settings_v3(50, "dark")
    }

    fn verify(&self, document: &Value) -> VerifyResult {
        if !document["theme"].is_string() {
            return VerifyResult::bad("theme must be a string");
        }
        match document["audio"]["volume"].as_u64() {
            Some(volume) if volume <= 100 => VerifyResult::good(),
            Some(volume) => VerifyResult::bad(format!("volume {volume} is above 100")),
            None => VerifyResult::bad("audio.volume must be a non-negative integer"),
        }
    }

    fn migrate(&self, document: &mut Value) -> VerifyResult {
        self.migrate_calls.fetch_add(1, Ordering::SeqCst);
        self.chain.run(document)
    }
}

/// A schema whose default data fails its own verification.
#[derive(Debug, Default)]
pub struct BrokenDefaultsSchema;

impl DocumentSchema for BrokenDefaultsSchema {
    fn current_version(&self) -> u64 {
        1
    }

    fn default_data(&self) -> Value {
        json!({ "version": 1 })
    }

    fn verify(&self, document: &Value) -> VerifyResult {
        if document.get("name").is_some_and(Value::is_string) {
            VerifyResult::good()
        } else {
            VerifyResult::bad("name is required")
        }
    }
}

/// A version 1 settings document.
pub fn settings_v1(volume: u64) -> Value {
    json!({ "version": 1, "volume": volume })
}

/// A version 3 settings document.
pub fn settings_v3(volume: u64, theme: &str) -> Value {
    json!({ "version": 3, "theme": theme, "audio": { "volume": volume } })
}

/// The codec every fixture uses.
pub fn test_codec() -> FrameCodec {
    FrameCodec::new(Salt::new(TEST_SALT))
}

/// The configuration every fixture uses.
pub fn test_config() -> ProxyConfig {
    ProxyConfig::new().coalesce_window(TEST_WINDOW)
}

/// A settings proxy over a fresh [`RecordingBackend`].
///
/// The returned backend shares its storage and counters with the proxy's.
pub fn recording_proxy() -> (DocumentProxy<SettingsSchema, RecordingBackend>, RecordingBackend) {
    recording_proxy_with(test_config())
}

/// Like [`recording_proxy`], with an explicit configuration.
pub fn recording_proxy_with(
    config: ProxyConfig,
) -> (DocumentProxy<SettingsSchema, RecordingBackend>, RecordingBackend) {
    let backend = RecordingBackend::new();
    let proxy = DocumentProxy::new(
        SETTINGS_NAME,
        SettingsSchema::new(),
        backend.clone(),
        test_codec(),
        config,
    )
    .expect("settings defaults are valid");
    (proxy, backend)
}

/// A settings proxy over files in a temporary directory.
pub struct TestStore {
    /// The proxy.
    pub proxy: DocumentProxy<SettingsSchema, FileBackend>,
    temp_dir: TempDir,
}

impl TestStore {
    /// Creates a store in a new temporary directory.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let proxy = Self::open_proxy(temp_dir.path()).await;
        Self { proxy, temp_dir }
    }

    /// Opens a second proxy on the same directory, as a restarted process
    /// would.
    pub async fn reopen(&self) -> DocumentProxy<SettingsSchema, FileBackend> {
        Self::open_proxy(self.temp_dir.path()).await
    }

    /// Returns the directory holding the document.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    async fn open_proxy(root: &Path) -> DocumentProxy<SettingsSchema, FileBackend> {
        let backend = FileBackend::open(root)
            .await
            .expect("Failed to open file backend");
        DocumentProxy::new(
            SETTINGS_NAME,
            SettingsSchema::new(),
            backend,
            test_codec(),
            test_config(),
        )
        .expect("settings defaults are valid")
    }
}

impl std::ops::Deref for TestStore {
    type Target = DocumentProxy<SettingsSchema, FileBackend>;

    fn deref(&self) -> &Self::Target {
        &self.proxy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docproxy_core::verify_entry;

    #[test]
    fn defaults_are_valid() {
        let schema = SettingsSchema::new();
        assert!(verify_entry(&schema, &schema.default_data()).is_good());
    }

    #[test]
    fn chain_upgrades_v1_to_v3() {
        let schema = SettingsSchema::new();
        let mut doc = settings_v1(30);
        assert!(schema.migrate(&mut doc).is_good());
        assert_eq!(doc, settings_v3(30, "light"));
        assert_eq!(schema.migrate_calls(), 1);
    }

    #[test]
    fn broken_defaults_fail_verification() {
        let schema = BrokenDefaultsSchema;
        assert!(verify_entry(&schema, &schema.default_data()).is_bad());
    }
}
