//! Durable key-value storage for the cart.
//!
//! The cart keeps exactly one record under one key. Backends only need to
//! read, replace, and remove whole string values.
//!
//! # Backends
//!
//! - [`MemoryStorage`] - Shared in-process map with an optional byte quota
//! - [`FileStorage`] - One JSON file per key in a directory

mod error;
mod file;
mod memory;

pub use error::StorageError;
pub use file::FileStorage;
pub use memory::MemoryStorage;

/// A durable key-value store holding string values.
///
/// All methods take `&self`; implementations use interior mutability so a
/// handle can be shared by several stores. Writes replace the whole value.
pub trait DurableStorage: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key has never been written or was removed.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the value cannot be stored.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value stored under `key`.
    ///
    /// Returns `Ok(())` even if the key did not exist.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be modified.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: DurableStorage + ?Sized> DurableStorage for &S {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Check that a key is usable with every backend.
///
/// Keys must be non-empty, must not start with `.`, and may only contain
/// ASCII alphanumerics, `-`, `_` and `.`.
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] otherwise.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_accepts_simple_keys() {
        assert!(validate_key("cart").is_ok());
        assert!(validate_key("cart-v1.main_tab").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_bad_keys() {
        for key in ["", ".hidden", "../cart", "a/b", "a\\b", "cart key", "kärt"] {
            assert!(
                matches!(validate_key(key), Err(StorageError::InvalidKey(_))),
                "{key:?} should be rejected"
            );
        }
    }
}
