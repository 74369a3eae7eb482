//! Verify command implementation.

use super::{codec, open_blob, CommandResult};
use docproxy_codec::FrameCodec;
use docproxy_core::{
    decode_stored, document_version, verify_basic_structure, ProxyError, ProxyResult,
};
use docproxy_storage::StorageBackend;
use std::cmp::Ordering;
use std::path::Path;

/// Options for the verify command.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyOptions {
    /// Accept uncompressed raw JSON.
    pub allow_raw: bool,
    /// Expand key-table compaction after parsing.
    pub compact: bool,
    /// Schema version the document is expected to carry.
    pub expect_version: Option<u64>,
}

/// Checks a stored frame up to the structural stage of a read.
///
/// Returns the document version on success.
pub fn verify_bytes(bytes: &[u8], codec: &FrameCodec, options: VerifyOptions) -> ProxyResult<u64> {
    let text = decode_stored(codec, bytes, options.allow_raw)?;
    let document = codec.parse(&text)?;
    verify_basic_structure(&document).into_result(ProxyError::structural)?;
    let version = document_version(&document)
        .ok_or_else(|| ProxyError::structural("Data has no valid version"))?;

    if let Some(current) = options.expect_version {
        if version > current {
            return Err(ProxyError::VersionTooNew {
                stored: version,
                current,
            });
        }
    }
    Ok(version)
}

/// Runs the verify command.
pub async fn run(path: &Path, salt: &str, options: VerifyOptions) -> CommandResult {
    println!("Verifying {}", path.display());

    let (backend, name) = open_blob(path).await?;
    let bytes = backend.read(&name).await?;

    match verify_bytes(&bytes, &codec(salt, options.compact), options) {
        Ok(version) => {
            println!("  ✓ Frame is intact (version {version})");
            if let Some(current) = options.expect_version {
                match version.cmp(&current) {
                    Ordering::Less => println!("  ○ Will migrate from {version} to {current}"),
                    Ordering::Equal => println!("  ✓ Version is current"),
                    Ordering::Greater => {}
                }
            }
            Ok(())
        }
        Err(err) => {
            println!("  ✗ {err}");
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_valid_frame() {
        let codec = codec("s", false);
        let frame = codec.encode(&json!({ "version": 2, "a": 1 })).unwrap();
        assert_eq!(verify_bytes(&frame, &codec, VerifyOptions::default()).unwrap(), 2);
    }

    #[test]
    fn raw_json_needs_flag() {
        let codec = codec("s", false);
        let raw = br#"{"version":1}"#;
        assert!(matches!(
            verify_bytes(raw, &codec, VerifyOptions::default()),
            Err(ProxyError::MissingCompression)
        ));
        let options = VerifyOptions {
            allow_raw: true,
            ..VerifyOptions::default()
        };
        assert_eq!(verify_bytes(raw, &codec, options).unwrap(), 1);
    }

    #[test]
    fn flags_newer_versions() {
        let codec = codec("s", false);
        let frame = codec.encode(&json!({ "version": 9 })).unwrap();
        let options = VerifyOptions {
            expect_version: Some(3),
            ..VerifyOptions::default()
        };
        assert!(matches!(
            verify_bytes(&frame, &codec, options),
            Err(ProxyError::VersionTooNew { stored: 9, current: 3 })
        ));
    }

    #[test]
    fn rejects_missing_version() {
        let codec = codec("s", false);
        let frame = codec.encode(&json!({ "a": 1 })).unwrap();
        assert!(matches!(
            verify_bytes(&frame, &codec, VerifyOptions::default()),
            Err(ProxyError::StructuralInvalid { .. })
        ));
    }
}
