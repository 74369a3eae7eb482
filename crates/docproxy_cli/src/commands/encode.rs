//! Encode command implementation.

use super::{codec, open_blob, CommandResult};
use docproxy_codec::ChecksumGeneration;
use docproxy_core::{verify_basic_structure, ProxyError};
use docproxy_storage::StorageBackend;
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Runs the encode command, framing a JSON file.
pub async fn run(
    input: &Path,
    output: &Path,
    salt: &str,
    compact: bool,
    legacy: bool,
) -> CommandResult {
    let text = tokio::fs::read_to_string(input).await?;
    let document: Value = serde_json::from_str(&text)?;
    verify_basic_structure(&document).into_result(ProxyError::structural)?;

    let generation = if legacy {
        ChecksumGeneration::Legacy
    } else {
        ChecksumGeneration::Marked
    };
    let frame = codec(salt, compact)
        .with_generation(generation)
        .encode(&document)?;

    let (backend, name) = open_blob(output).await?;
    backend.write(&name, &frame).await?;
    info!(
        output = %output.display(),
        bytes = frame.len(),
        generation = generation.name(),
        "wrote frame"
    );
    println!("Wrote {} bytes to {}", frame.len(), output.display());
    Ok(())
}
