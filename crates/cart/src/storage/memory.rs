//! In-process storage shared between handles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{DurableStorage, StorageError};

/// Shared in-memory key-value storage.
///
/// Clones share the same map, the way every tab of one origin shares the
/// browser's local storage. An optional quota bounds the total bytes of
/// keys plus values.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    values: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryInner {
    fn used_bytes(&self) -> usize {
        self.values.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.values
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl MemoryStorage {
    /// Create an empty storage without a quota.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty storage limited to `quota` bytes.
    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryInner {
                values: HashMap::new(),
                quota: Some(quota),
            })),
        }
    }

    /// Change the quota. `None` removes the limit.
    ///
    /// Existing values are kept even if they exceed the new quota.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] if the map lock is poisoned.
    pub fn set_quota(&self, quota: Option<usize>) -> Result<(), StorageError> {
        self.lock()?.quota = quota;
        Ok(())
    }

    /// Total bytes of keys plus values currently stored.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] if the map lock is poisoned.
    pub fn used_bytes(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.used_bytes())
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryInner>, StorageError> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage lock poisoned".to_string()))
    }
}

impl DurableStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.lock()?;

        if let Some(quota) = inner.quota {
            let needed = inner.used_bytes_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }

        inner.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.values.remove(key);
        Ok(())
    }
}
