//! Lenient JSON loading and atomic JSON saving for registry documents.
//!
//! A manifest, ledger, or baseline that is missing or fails to parse is
//! treated as empty rather than as an error, so a partially-written registry
//! can always be repaired by re-running the command. Writes use the `.tmp` +
//! rename pattern so readers never observe a half-written file.

use std::io::ErrorKind;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{io_err, RegistryError};

/// Load `path` as `T`, falling back to `T::default()` when the file is
/// missing or malformed. Other I/O failures (permissions, etc.) propagate.
pub fn load_lenient<T>(path: &Path) -> Result<T, RegistryError>
where
    T: DeserializeOwned + Default,
{
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(err) => return Err(io_err(path, err)),
    };
    match serde_json::from_str(&contents) {
        Ok(value) => Ok(value),
        Err(err) => {
            tracing::warn!("ignoring malformed JSON in {}: {err}", path.display());
            Ok(T::default())
        }
    }
}

/// Serialize `value` as two-space-indented JSON with a trailing newline.
pub fn to_pretty(path: &Path, value: &impl Serialize) -> Result<String, RegistryError> {
    let mut json = serde_json::to_string_pretty(value).map_err(|source| RegistryError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    json.push('\n');
    Ok(json)
}

/// Serialize and atomically write `value` to `path`, creating parent
/// directories as needed.
pub fn save_atomic(path: &Path, value: &impl Serialize) -> Result<(), RegistryError> {
    let json = to_pretty(path, value)?;
    write_atomic(path, &json)
}

/// Atomically replace `path` with `contents`.
///
/// Writes to `<path>.tmp` in the same directory, then renames. The `.tmp`
/// file is removed if the rename fails.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), RegistryError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    std::fs::write(&tmp, contents).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    tracing::debug!("wrote {}", path.display());
    Ok(())
}
