// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};
use serde_json::Value;
use crate::utils::error::StorageError;

/// Writes one JSON document per source file into a single output directory.
pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .map_err(StorageError::IoError)?;
            tracing::debug!("Created output directory {}", base_path.display());
        }

        Ok(Self { base_dir: base_path })
    }

    #[cfg(test)]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// `<base_dir>/<source stem>.json`
    pub fn result_path_for(&self, source: &Path) -> Result<PathBuf, StorageError> {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| StorageError::InvalidSourceName(source.display().to_string()))?;

        Ok(self.base_dir.join(format!("{}.json", stem)))
    }

    /// Saves an extraction result as pretty-printed JSON named after its source
    /// document. An existing file with the same name is overwritten.
    pub fn save_result(&self, source: &Path, data: &Value) -> Result<PathBuf, StorageError> {
        let file_path = self.result_path_for(source)?;

        let json = serde_json::to_string_pretty(data)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, json)
            .map_err(StorageError::IoError)?;

        tracing::debug!("Wrote {}", file_path.display());

        Ok(file_path)
    }
}
