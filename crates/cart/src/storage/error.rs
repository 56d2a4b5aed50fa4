//! Storage error types.

use thiserror::Error;

/// Errors from a durable storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The write would exceed the backend's byte quota.
    #[error("storage quota exceeded: {needed} bytes needed, quota is {quota}")]
    QuotaExceeded {
        /// Total bytes the backend would hold after the write.
        needed: usize,
        /// Configured quota in bytes.
        quota: usize,
    },

    /// The key cannot be used with this backend.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// The backend is not usable right now.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
