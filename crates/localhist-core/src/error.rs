//! Error types for the history service.

use thiserror::Error;

/// Result type for history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// History service errors.
///
/// Ineligible resources and cancelled operations are not errors; they
/// resolve to `Ok(None)` or an empty list.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The read capability could not produce the working copy's bytes.
    #[error("failed to read {resource}: {source}")]
    Read {
        resource: String,
        #[source]
        source: std::io::Error,
    },

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] localhist_storage::StorageError),

    /// The platform reports no per-user data directory.
    #[error("no per-user data directory is available")]
    NoDataDir,

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] localhist_util::Error),
}

impl HistoryError {
    /// Create a read error for a resource.
    pub fn read(resource: &localhist_storage::Resource, source: std::io::Error) -> Self {
        Self::Read {
            resource: resource.to_string(),
            source,
        }
    }
}
