//! Inspect command implementation.

use super::{codec, open_blob, CommandResult};
use docproxy_codec::FrameCodec;
use docproxy_storage::StorageBackend;
use serde::Serialize;
use std::path::Path;

/// Frame inspection result.
#[derive(Debug, Serialize)]
pub struct InspectReport {
    /// File path.
    pub path: String,
    /// Whether the file starts with the compression tag.
    pub framed: bool,
    /// File size in bytes.
    pub frame_len: usize,
    /// Decompressed JSON length in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_len: Option<usize>,
    /// Stored checksum.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    /// Checksum generation (`legacy-sha1` or `marked-crc32`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<&'static str>,
    /// Whether the checksum matches under the given salt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum_valid: Option<bool>,
    /// Why the frame could not be opened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Builds the report for a frame held in memory.
pub fn inspect_bytes(path: &Path, bytes: &[u8], codec: &FrameCodec) -> InspectReport {
    let mut report = InspectReport {
        path: path.display().to_string(),
        framed: FrameCodec::is_framed(bytes),
        frame_len: bytes.len(),
        payload_len: None,
        checksum: None,
        generation: None,
        checksum_valid: None,
        error: None,
    };
    if !report.framed {
        report.error = Some("missing compression tag".to_string());
        return report;
    }
    match codec.inspect(bytes) {
        Ok(info) => {
            report.payload_len = Some(info.payload_len);
            report.generation = Some(info.generation.name());
            report.checksum_valid = Some(info.checksum_valid);
            report.checksum = Some(info.checksum);
        }
        Err(err) => report.error = Some(err.to_string()),
    }
    report
}

/// Runs the inspect command.
pub async fn run(path: &Path, salt: &str, format: &str) -> CommandResult {
    let (backend, name) = open_blob(path).await?;
    let bytes = backend.read(&name).await?;
    let report = inspect_bytes(path, &bytes, &codec(salt, false));

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_text(&report),
    }
    Ok(())
}

fn print_text(report: &InspectReport) {
    println!("Frame: {}", report.path);
    println!("  Size:      {} bytes", report.frame_len);
    println!("  Framed:    {}", if report.framed { "yes" } else { "no" });
    if let Some(len) = report.payload_len {
        println!("  Payload:   {len} bytes");
    }
    if let Some(checksum) = &report.checksum {
        println!("  Checksum:  {checksum}");
    }
    if let Some(generation) = report.generation {
        println!("  Generation: {generation}");
    }
    if let Some(valid) = report.checksum_valid {
        println!("  Valid:     {}", if valid { "yes" } else { "NO" });
    }
    if let Some(error) = &report.error {
        println!("  Error:     {error}");
    }
}
