//! Fixed-width payload checksums.
//!
//! Every checksum is exactly [`CHECKSUM_LEN`] ASCII characters, so a frame
//! can be split into checksum and payload at a fixed offset whichever
//! generation wrote it.
//!
//! Two generations are readable:
//!
//! | Generation | Layout                                           |
//! |------------|--------------------------------------------------|
//! | `Marked`   | [`MARKER`] (32 chars) + CRC-32 as 8 hex digits   |
//! | `Legacy`   | SHA-1 as 40 hex digits, no marker                |
//!
//! Both digest `payload + salt`. A stored checksum is checked with the
//! generation its prefix announces.

use crate::salt::Salt;
use sha1::{Digest, Sha1};

/// Width of every checksum in characters.
pub const CHECKSUM_LEN: usize = 40;

/// Prefix identifying a marked-generation checksum.
pub const MARKER: &str = "crc32---------------------------";

/// Which digest algorithm produced a checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChecksumGeneration {
    /// Unmarked SHA-1 hex digest. Read-only in normal operation.
    Legacy,
    /// Marker prefix followed by a CRC-32 hex digest.
    #[default]
    Marked,
}

impl ChecksumGeneration {
    /// Detects the generation of a stored checksum from its prefix.
    #[must_use]
    pub fn detect(stored: &str) -> Self {
        if stored.starts_with(MARKER) {
            Self::Marked
        } else {
            Self::Legacy
        }
    }

    /// Computes the checksum of `payload` salted with `salt`.
    #[must_use]
    pub fn compute(self, payload: &str, salt: &Salt) -> String {
        match self {
            Self::Legacy => {
                let mut hasher = Sha1::new();
                hasher.update(payload.as_bytes());
                hasher.update(salt.as_str().as_bytes());
                hex::encode(hasher.finalize())
            }
            Self::Marked => {
                let mut hasher = crc32fast::Hasher::new();
                hasher.update(payload.as_bytes());
                hasher.update(salt.as_str().as_bytes());
                format!("{MARKER}{:08x}", hasher.finalize())
            }
        }
    }

    /// Short lowercase name, used in logs and CLI output.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Legacy => "legacy-sha1",
            Self::Marked => "marked-crc32",
        }
    }
}

/// Recomputes the checksum `stored` claims for `payload`.
///
/// The generation is picked by inspecting `stored`; the caller compares the
/// result against `stored` itself.
#[must_use]
pub fn expected_checksum(stored: &str, payload: &str, salt: &Salt) -> String {
    ChecksumGeneration::detect(stored).compute(payload, salt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_fills_prefix() {
        assert_eq!(MARKER.len(), 32);
        assert!(MARKER.starts_with("crc32"));
    }

    #[test]
    fn both_generations_are_fixed_width() {
        let salt = Salt::new("salt");
        let long = "x".repeat(10_000);
        for payload in ["", "{}", "{\"version\":1}", long.as_str()] {
            for generation in [ChecksumGeneration::Legacy, ChecksumGeneration::Marked] {
                assert_eq!(generation.compute(payload, &salt).len(), CHECKSUM_LEN);
            }
        }
    }

    #[test]
    fn legacy_is_salted_sha1() {
        // sha1("abc")
        let digest = ChecksumGeneration::Legacy.compute("ab", &Salt::new("c"));
        assert_eq!(digest, "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn marked_is_salted_crc32() {
        // crc32("123456789") = cbf43926
        let digest = ChecksumGeneration::Marked.compute("12345", &Salt::new("6789"));
        assert_eq!(digest, format!("{MARKER}cbf43926"));
    }

    #[test]
    fn detect_by_marker() {
        let salt = Salt::new("s");
        let marked = ChecksumGeneration::Marked.compute("p", &salt);
        let legacy = ChecksumGeneration::Legacy.compute("p", &salt);
        assert_eq!(ChecksumGeneration::detect(&marked), ChecksumGeneration::Marked);
        assert_eq!(ChecksumGeneration::detect(&legacy), ChecksumGeneration::Legacy);
        assert_eq!(ChecksumGeneration::detect(&"0".repeat(40)), ChecksumGeneration::Legacy);
    }

    #[test]
    fn salt_changes_checksum() {
        let a = ChecksumGeneration::Marked.compute("payload", &Salt::new("a"));
        let b = ChecksumGeneration::Marked.compute("payload", &Salt::new("b"));
        assert_ne!(a, b);
    }

    #[test]
    fn expected_checksum_follows_stored_generation() {
        let salt = Salt::new("s");
        let legacy = ChecksumGeneration::Legacy.compute("p", &salt);
        assert_eq!(expected_checksum(&legacy, "p", &salt), legacy);
        let marked = ChecksumGeneration::Marked.compute("p", &salt);
        assert_eq!(expected_checksum(&marked, "p", &salt), marked);
    }
}
