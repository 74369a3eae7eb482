//! Storage backend trait definition.

use crate::error::StorageResult;
use async_trait::async_trait;
use std::sync::Arc;

/// A named-blob storage backend.
///
/// Backends are **opaque byte stores**. Each name maps to at most one blob,
/// which is always replaced as a whole. The document proxy owns all
/// interpretation of the stored bytes.
///
/// # Invariants
///
/// - `read` returns exactly the bytes of the last successful `write`
/// - `read` of a name that was never written (or was deleted) fails with
///   [`crate::StorageError::NotFound`]
/// - Every call is a suspension point and runs to completion or failure
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Reads the whole blob stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::NotFound`] if nothing is stored under
    /// `name`, or another error if the read itself fails.
    async fn read(&self, name: &str) -> StorageResult<Vec<u8>>;

    /// Stores `data` under `name`, replacing any previous blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob could not be stored.
    async fn write(&self, name: &str, data: &[u8]) -> StorageResult<()>;

    /// Removes the blob stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::NotFound`] if nothing is stored under
    /// `name`, or another error if the removal fails.
    async fn delete(&self, name: &str) -> StorageResult<()>;
}

#[async_trait]
impl<T: StorageBackend + ?Sized> StorageBackend for Arc<T> {
    async fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        (**self).read(name).await
    }

    async fn write(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        (**self).write(name, data).await
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        (**self).delete(name).await
    }
}

#[async_trait]
impl<T: StorageBackend + ?Sized> StorageBackend for Box<T> {
    async fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        (**self).read(name).await
    }

    async fn write(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        (**self).write(name, data).await
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        (**self).delete(name).await
    }
}
