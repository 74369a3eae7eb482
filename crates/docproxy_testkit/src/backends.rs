//! Instrumented storage backends.

use async_trait::async_trait;
use docproxy_storage::{InMemoryBackend, StorageBackend, StorageError, StorageResult};
use parking_lot::Mutex;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct Recorder {
    reads: AtomicUsize,
    writes: AtomicUsize,
    deletes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    write_delay: Mutex<Option<Duration>>,
    written: Mutex<Vec<Vec<u8>>>,
}

/// An in-memory backend that counts calls and can inject failures.
///
/// Clones share storage, counters and failure switches, so a test can keep
/// one handle while the proxy owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    store: Arc<InMemoryBackend>,
    recorder: Arc<Recorder>,
}

impl RecordingBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend holding one blob.
    pub fn with_blob(name: impl Into<String>, data: Vec<u8>) -> Self {
        let backend = Self::new();
        backend.store.insert(name, data);
        backend
    }

    /// Stores a blob without counting it as a write.
    pub fn insert(&self, name: impl Into<String>, data: Vec<u8>) {
        self.store.insert(name, data);
    }

    /// Returns the stored blob, if any.
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.store.get(name)
    }

    /// Returns `true` if a blob is stored under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.store.contains(name)
    }

    /// Number of `read` calls so far.
    pub fn reads(&self) -> usize {
        self.recorder.reads.load(Ordering::SeqCst)
    }

    /// Number of `write` calls so far, failed ones included.
    pub fn writes(&self) -> usize {
        self.recorder.writes.load(Ordering::SeqCst)
    }

    /// Number of `delete` calls so far.
    pub fn deletes(&self) -> usize {
        self.recorder.deletes.load(Ordering::SeqCst)
    }

    /// Every payload successfully written, oldest first.
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.recorder.written.lock().clone()
    }

    /// Makes subsequent reads fail with an I/O error.
    pub fn fail_reads(&self, fail: bool) {
        self.recorder.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent writes fail with an I/O error.
    pub fn fail_writes(&self, fail: bool) {
        self.recorder.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delays every subsequent write.
    pub fn delay_writes(&self, delay: Option<Duration>) {
        *self.recorder.write_delay.lock() = delay;
    }
}

#[async_trait]
impl StorageBackend for RecordingBackend {
    async fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        self.recorder.reads.fetch_add(1, Ordering::SeqCst);
        if self.recorder.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Io(io::Error::other("injected read failure")));
        }
        self.store.read(name).await
    }

    async fn write(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        self.recorder.writes.fetch_add(1, Ordering::SeqCst);
        let delay = *self.recorder.write_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.recorder.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(io::Error::other("injected write failure")));
        }
        self.store.write(name, data).await?;
        self.recorder.written.lock().push(data.to_vec());
        Ok(())
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        self.recorder.deletes.fetch_add(1, Ordering::SeqCst);
        self.store.delete(name).await
    }
}
