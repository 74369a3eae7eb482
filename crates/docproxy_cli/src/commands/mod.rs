//! CLI command implementations.

pub mod decode;
pub mod encode;
pub mod inspect;
pub mod rewrite;
pub mod verify;

use docproxy_codec::{FrameCodec, KeyTableCompaction, Salt};
use docproxy_storage::FileBackend;
use std::path::Path;

/// Result type shared by every command.
pub type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Opens the directory holding `path` and returns it with the blob name.
pub async fn open_blob(path: &Path) -> CommandResult<(FileBackend, String)> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("Not a file path: {}", path.display()))?
        .to_string();
    let root = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok((FileBackend::open(root).await?, name))
}

/// Builds the codec for the given salt and compaction flag.
pub fn codec(salt: &str, compact: bool) -> FrameCodec {
    let codec = FrameCodec::new(Salt::new(salt));
    if compact {
        codec.with_compaction(KeyTableCompaction)
    } else {
        codec
    }
}
