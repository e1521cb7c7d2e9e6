//! Atomic TOML file operations.
//!
//! Every record is written whole: serialize, write to a temporary sibling,
//! fsync, then rename over the target. Readers therefore see either the old
//! or the new record, never a torn one. There is no locking; concurrent
//! writers of the same record race and the last rename wins.

use ensemble_core::error::{EnsembleError, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::fs;
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Writes `contents` to `path` via temp file + rename.
///
/// Every call gets its own randomly named temp file in the target's
/// directory, so concurrent writers (threads or processes) never share one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| EnsembleError::io(format!("Path has no parent directory: {}", path.display())))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| EnsembleError::io(format!("Path has no file name: {}", path.display())))?;

    if !parent.exists() {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_file = tempfile::Builder::new()
        .prefix(&format!(".{}.", file_name.to_string_lossy()))
        .suffix(".tmp")
        .tempfile_in(parent)?;
    tmp_file.write_all(contents)?;

    // Ensure data is written to disk
    tmp_file.as_file().sync_all()?;

    // On failure the temp file is removed when the handle drops.
    tmp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// A handle to one TOML-encoded record on disk.
pub struct AtomicTomlFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicTomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the record.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err(Malformed)`: File exists but is not a valid record
    /// - `Err(Io)`: File could not be read
    pub fn load(&self) -> Result<Option<T>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                return Err(EnsembleError::malformed(self.path.display().to_string(), e.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        toml::from_str(&content)
            .map(Some)
            .map_err(|e| EnsembleError::malformed(self.path.display().to_string(), e.to_string()))
    }

    /// Serializes and saves the record atomically.
    pub fn save(&self, data: &T) -> Result<()> {
        let toml_string = toml::to_string_pretty(data)?;
        write_atomic(&self.path, toml_string.as_bytes())
    }
}
