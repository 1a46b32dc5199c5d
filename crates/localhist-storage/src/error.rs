//! Storage error types.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error outside of a write (listing, reading the index).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Creating a directory, writing a snapshot or persisting an index failed.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The index cannot be parsed or does not belong to the resource.
    #[error("Corrupt history index at {}: {message}", path.display())]
    CorruptIndex { path: PathBuf, message: String },

    /// Lock was poisoned (another thread panicked while holding the lock)
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl StorageError {
    /// Create a write error for the given path.
    pub fn write(path: &Path, source: std::io::Error) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create a corrupt index error.
    pub fn corrupt_index(path: &Path, message: impl Into<String>) -> Self {
        Self::CorruptIndex {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Whether this error reports a corrupt index.
    pub fn is_corrupt_index(&self) -> bool {
        matches!(self, Self::CorruptIndex { .. })
    }
}
