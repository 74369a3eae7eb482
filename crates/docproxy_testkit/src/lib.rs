//! # docproxy Testkit
//!
//! Test utilities for docproxy.
//!
//! This crate provides:
//! - A versioned example schema and proxy fixtures
//! - A recording storage backend with failure injection
//! - Property-based test generators using proptest
//! - Fuzz targets for frame decoding and the read pipeline
//! - Frame test vectors, including hand-built legacy and tampered frames
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docproxy_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn reads_defaults() {
//!     let (proxy, _backend) = recording_proxy();
//!     proxy.read().await.unwrap();
//!     assert_eq!(proxy.snapshot(), SettingsSchema::new().default_data());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod backends;
pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::backends::*;
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
    pub use crate::vectors::*;
    pub use docproxy_core::DocumentSchema;
}

pub use backends::*;
pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use vectors::*;
