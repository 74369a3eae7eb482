//! # Docproxy Core
//!
//! Versioned, integrity-checked persistence for a single JSON document.
//!
//! This crate provides:
//! - [`DocumentProxy`], the owner of one named document and its storage
//! - The verification gate applied before every write and after every read
//! - Forward-only schema migration, optionally built from a [`MigrationChain`]
//! - The read pipeline state machine
//! - Write coalescing, so bursts of `persist` calls become one write
//!
//! Documents are framed by `docproxy_codec` and stored through any
//! `docproxy_storage` backend.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod migration;
mod proxy;
mod read;
mod scheduler;
mod schema;
mod verify;

pub use config::{ProxyConfig, DEFAULT_COALESCE_WINDOW};
pub use error::{ProxyError, ProxyResult};
pub use migration::{resolve_version, MigrationChain, SchemaVersion, VersionResolution};
pub use proxy::DocumentProxy;
pub use read::{decode_stored, DocumentOrigin, ReadOutcome, ReadPipeline, ReadStage};
pub use scheduler::{FlushTicket, WriteScheduler};
pub use schema::{document_version, DocumentSchema, VERSION_FIELD};
pub use verify::{gate, verify_basic_structure, verify_entry, VerifyResult};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
