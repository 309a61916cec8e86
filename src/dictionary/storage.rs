//! Writing rendered dictionaries to disk.

use super::metadata::DataDictionary;
use crate::error::{DictError, Result, ResultExt as _};
use std::io::Write as _;
use std::path::Path;

/// Write `bytes` to `path` through a temporary file in the same directory,
/// then rename it into place. On failure `path` is left untouched.
///
/// # Errors
///
/// Returns `DictError::Io` if the directory is missing or not writable, or
/// the rename fails.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    file.write_all(bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    file.as_file()
        .sync_all()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    file.persist(path)
        .map_err(|e| DictError::Io(e.error))
        .with_context(|| format!("Failed to move output into place at {}", path.display()))?;

    tracing::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Save `dictionary` as pretty-printed JSON at `path`.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn save_json(dictionary: &DataDictionary, path: &Path) -> Result<()> {
    let json =
        serde_json::to_string_pretty(dictionary).context("Failed to serialize data dictionary")?;
    write_atomically(path, json.as_bytes())
}
