//! # docproxy Storage
//!
//! Storage backend trait and implementations for docproxy.
//!
//! Backends are **opaque named-blob stores**: they read, write and delete
//! whole byte buffers addressed by a name, and never interpret the bytes.
//!
//! ## Design Principles
//!
//! - A missing blob is reported as [`StorageError::NotFound`], which callers
//!   can tell apart from real failures via [`StorageError::is_not_found`]
//! - No knowledge of frames, checksums or document schemas
//! - Must be `Send + Sync` so one backend can serve many documents
//! - No retries and no timeouts; callers own both
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral storage
//! - [`FileBackend`] - One file per name under a root directory
//!
//! ## Example
//!
//! ```rust
//! use docproxy_storage::{InMemoryBackend, StorageBackend};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let backend = InMemoryBackend::new();
//! backend.write("settings.bin", b"hello").await.unwrap();
//! assert_eq!(backend.read("settings.bin").await.unwrap(), b"hello");
//! assert!(backend.read("missing.bin").await.unwrap_err().is_not_found());
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
