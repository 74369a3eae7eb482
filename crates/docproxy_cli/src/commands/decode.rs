//! Decode command implementation.

use super::{codec, open_blob, CommandResult};
use docproxy_storage::StorageBackend;
use std::path::Path;

/// Runs the decode command, printing the document as JSON.
pub async fn run(path: &Path, salt: &str, compact: bool, pretty: bool) -> CommandResult {
    let (backend, name) = open_blob(path).await?;
    let bytes = backend.read(&name).await?;
    let document = codec(salt, compact).decode(&bytes)?;

    let text = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    println!("{text}");
    Ok(())
}
