//! In-memory storage backend for testing.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory storage backend.
///
/// This backend stores all blobs in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral documents that don't need persistence
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across tasks.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory backend with one pre-existing blob.
    ///
    /// Useful for testing read paths against hand-built frames.
    #[must_use]
    pub fn with_blob(name: impl Into<String>, data: Vec<u8>) -> Self {
        let backend = Self::new();
        backend.insert(name, data);
        backend
    }

    /// Stores a blob without going through the async interface.
    pub fn insert(&self, name: impl Into<String>, data: Vec<u8>) {
        self.blobs.write().insert(name.into(), data);
    }

    /// Returns a copy of the blob stored under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.blobs.read().get(name).cloned()
    }

    /// Returns `true` if a blob is stored under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.blobs.read().contains_key(name)
    }

    /// Returns the number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    /// Clears all blobs from the backend.
    pub fn clear(&self) {
        self.blobs.write().clear();
    }
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    async fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        self.get(name).ok_or_else(|| StorageError::not_found(name))
    }

    async fn write(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        self.blobs.write().insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        match self.blobs.write().remove(name) {
            Some(_) => Ok(()),
            None => Err(StorageError::not_found(name)),
        }
    }
}
