//! # docproxy Codec
//!
//! The framing codec for docproxy documents.
//!
//! A document is persisted as a *frame*:
//!
//! ```text
//! <compression tag><compressed( <40-char checksum><JSON text> )>
//! ```
//!
//! This crate provides:
//! - [`FrameCodec`] - encodes documents into frames and verifies them back
//! - [`ChecksumGeneration`] - the two readable checksum generations
//! - [`Compressor`] / [`DeflateCompressor`] - the general-purpose compressor
//! - [`Compaction`] / [`KeyTableCompaction`] - object compaction
//! - [`Salt`] - the configuration-derived checksum salt
//!
//! The checksum detects corruption and casual tampering. It is not a MAC
//! and the frame is not encrypted.
//!
//! ## Usage
//!
//! ```
//! use docproxy_codec::{FrameCodec, KeyTableCompaction, Salt};
//! use serde_json::json;
//!
//! let codec = FrameCodec::new(Salt::new("build-1234")).with_compaction(KeyTableCompaction);
//! let doc = json!({ "version": 2, "settings": { "volume": 0.5 } });
//!
//! let frame = codec.encode(&doc).unwrap();
//! assert_eq!(codec.decode(&frame).unwrap(), doc);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod checksum;
mod compaction;
mod compression;
mod error;
mod frame;
mod salt;

pub use checksum::{expected_checksum, ChecksumGeneration, CHECKSUM_LEN, MARKER};
pub use compaction::{Compaction, IdentityCompaction, KeyTableCompaction};
pub use compression::{Compressor, DeflateCompressor, COMPRESSION_TAG};
pub use error::{CodecError, CodecResult};
pub use frame::{FrameCodec, FrameInfo};
pub use salt::Salt;
