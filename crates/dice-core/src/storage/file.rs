//! File-based storage implementation for native platforms.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// File-based storage for native platforms.
///
/// Stores each document as a JSON file in a base directory.
pub struct FileStorage {
    /// Base directory for document storage.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Linux: `~/.local/share/dice/canvases/`
    /// On Windows: `%LOCALAPPDATA%\dice\canvases\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        Self::new(base.join("dice").join("canvases"))
    }

    /// Get the file path for a key.
    fn document_path(&self, key: &str) -> PathBuf {
        let safe_key: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_key))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

impl Storage for FileStorage {
    fn save(&self, key: &str, json: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.document_path(key);
        let json = json.to_string();

        Box::pin(async move {
            // Readers only ever see a complete document.
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, json).map_err(|e| {
                StorageError::Io(format!("Failed to write {}: {}", tmp.display(), e))
            })?;
            fs::rename(&tmp, &path).map_err(|e| {
                StorageError::Io(format!("Failed to replace {}: {}", path.display(), e))
            })
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<String>> {
        let path = self.document_path(key);
        let key = key.to_string();

        Box::pin(async move {
            fs::read_to_string(&path).map_err(|e| match e.kind() {
                ErrorKind::NotFound => StorageError::NotFound(key),
                _ => StorageError::Io(format!("Failed to read {}: {}", path.display(), e)),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollster::block_on;
    use tempfile::tempdir;

    #[test]
    fn test_file_storage_save_load() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.save("school-7", r#"{"strokes":[]}"#)).unwrap();
        let loaded = block_on(storage.load("school-7")).unwrap();

        assert_eq!(loaded, r#"{"strokes":[]}"#);
        assert!(dir.path().join("school-7.json").exists());
        assert!(!dir.path().join("school-7.json.tmp").exists());
    }

    #[test]
    fn test_file_storage_not_found() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let result = block_on(storage.load("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_file_storage_creates_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let storage = FileStorage::new(nested.clone()).unwrap();

        assert!(nested.is_dir());
        assert_eq!(storage.base_path(), &nested);
    }

    #[test]
    fn test_file_storage_sanitizes_key() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.save("../school:7", "{}")).unwrap();

        assert!(dir.path().join("___school_7.json").exists());
        assert_eq!(block_on(storage.load("../school:7")).unwrap(), "{}");
    }
}
