//! History service configuration.
//!
//! The host decides where configuration lives; this module only knows how to
//! parse it. All fields are optional in JSON and fall back to defaults.
//!
//! ```json
//! {
//!   "enabled": true,
//!   "maxEntries": 50,
//!   "maxFileSizeKb": 256
//! }
//! ```

use localhist_util::Error;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Configuration for the history service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistoryConfig {
    /// Whether captures are recorded at all.
    pub enabled: bool,

    /// Maximum number of entries kept per resource; `0` keeps everything.
    pub max_entries: usize,

    /// Content larger than this is not captured; `0` disables the check.
    pub max_file_size_kb: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 50,
            max_file_size_kb: 256,
        }
    }
}

impl HistoryConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> localhist_util::Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::config(e.to_string(), e))
    }

    /// Load a configuration file, falling back to defaults if it does not exist.
    pub async fn load(path: &Path) -> localhist_util::Result<Self> {
        match fs::read_to_string(path).await {
            Ok(content) => {
                debug!(path = %path.display(), "Loading history config");
                serde_json::from_str(&content)
                    .map_err(|e| Error::config(format!("{}: {}", path.display(), e), e))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No history config, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Per-resource retention limit, if any.
    pub fn retention_limit(&self) -> Option<usize> {
        (self.max_entries > 0).then_some(self.max_entries)
    }

    /// Maximum captured content size in bytes, if any.
    pub fn max_file_size_bytes(&self) -> Option<u64> {
        (self.max_file_size_kb > 0).then(|| self.max_file_size_kb.saturating_mul(1024))
    }
}
