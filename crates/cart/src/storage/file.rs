//! File-backed storage: one JSON file per key.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use tempfile::NamedTempFile;
use tracing::debug;

use super::{DurableStorage, StorageError, validate_key};

/// Stores each key as `<dir>/<key>.json`.
///
/// The directory is created on first write. Each write goes to its own
/// temporary file that is renamed over the target, so readers never see a
/// partial value and concurrent writers never share a temporary file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a storage rooted at `dir`. Nothing is touched on disk yet.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file holding `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] if the key is not file-safe.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl DurableStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        let mut temp = NamedTempFile::new_in(&self.dir)?;
        temp.write_all(value.as_bytes())?;
        temp.persist(&path).map_err(|e| e.error)?;

        debug!(path = %path.display(), bytes = value.len(), "Wrote storage file");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert_eq!(storage.read("cart").unwrap(), None);
    }

    #[test]
    fn test_write_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested").join("carts"));

        storage.write("cart", "[]").unwrap();

        assert!(dir.path().join("nested/carts/cart.json").exists());
        assert_eq!(storage.read("cart").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_write_replaces_value() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.write("cart", "[1]").unwrap();
        storage.write("cart", "[2]").unwrap();

        assert_eq!(storage.read("cart").unwrap().as_deref(), Some("[2]"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_concurrent_writers_all_succeed() {
        let dir = tempfile::tempdir().unwrap();

        std::thread::scope(|scope| {
            for writer in 0..4 {
                let dir = dir.path();
                scope.spawn(move || {
                    let storage = FileStorage::new(dir);
                    for round in 0..50 {
                        storage.write("cart", &format!("[{writer},{round}]")).unwrap();
                    }
                });
            }
        });

        let storage = FileStorage::new(dir.path());
        let value = storage.read("cart").unwrap().unwrap();
        assert!(value.ends_with(",49]"), "last write of some writer wins: {value}");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.write("cart", "[]").unwrap();
        storage.remove("cart").unwrap();
        storage.remove("cart").unwrap();

        assert_eq!(storage.read("cart").unwrap(), None);
    }

    #[test]
    fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        assert!(matches!(
            storage.write("../escape", "[]"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            storage.read("a/b"),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
