//! File-based storage backend for persistent storage.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;

const TEMP_SUFFIX: &str = ".tmp";

/// Distinguishes the staging files of writes in flight.
static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// A file-based storage backend.
///
/// Every name maps to one file directly under the root directory. Data
/// survives process restarts.
///
/// # Durability
///
/// `write` stages the blob in a temporary sibling file of its own, syncs
/// it, then renames it over the target. A crash mid-write leaves either the
/// old blob or the new one, never a torn mix. Overlapping writes to the
/// same name each stage separately, and the last rename wins.
///
/// # Example
///
/// ```no_run
/// use docproxy_storage::{FileBackend, StorageBackend};
/// use std::path::Path;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let backend = FileBackend::open(Path::new("data")).await.unwrap();
/// backend.write("settings.bin", b"persistent data").await.unwrap();
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Opens a file backend rooted at `root`, creating the directory if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn open(root: &Path) -> StorageResult<Self> {
        tokio::fs::create_dir_all(root).await?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path of the file backing `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidName`] if `name` could escape the
    /// root directory.
    pub fn path_for(&self, name: &str) -> StorageResult<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    fn staging_path(&self, name: &str) -> PathBuf {
        let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
        self.root
            .join(format!("{name}.{}.{seq}{TEMP_SUFFIX}", std::process::id()))
    }
}

fn validate_name(name: &str) -> StorageResult<()> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name == "." || name == ".." {
        "name is a relative directory"
    } else if name.contains(['/', '\\', '\0']) {
        "name contains a path separator"
    } else if name.ends_with(TEMP_SUFFIX) {
        "name uses the reserved temporary suffix"
    } else {
        return Ok(());
    };
    Err(StorageError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

fn map_not_found(err: io::Error, name: &str) -> StorageError {
    if err.kind() == io::ErrorKind::NotFound {
        StorageError::not_found(name)
    } else {
        StorageError::Io(err)
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        let path = self.path_for(name)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| map_not_found(e, name))
    }

    async fn write(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        let path = self.path_for(name)?;
        let temp = self.staging_path(name);

        let staged = async {
            let mut file = tokio::fs::File::create(&temp).await?;
            file.write_all(data).await?;
            file.sync_all().await
        };
        if let Err(err) = staged.await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(err.into());
        }

        if let Err(err) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(err.into());
        }
        tracing::trace!(path = %path.display(), bytes = data.len(), "blob written");
        Ok(())
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        let path = self.path_for(name)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| map_not_found(e, name))
    }
}
