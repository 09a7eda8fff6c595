use crate::error::{PortsError, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Either the whole file lands or the previous content stays in place.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| PortsError::filesystem(dir, e))?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| PortsError::filesystem(dir, e))?;
    tmp.write_all(data)
        .map_err(|e| PortsError::filesystem(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| PortsError::filesystem(path, e.error))?;
    Ok(())
}

/// Read a text file that may legitimately be absent. `Ok(None)` when it does
/// not exist. Invalid UTF-8 is replaced rather than rejected.
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PortsError::filesystem(path, e)),
    }
}
