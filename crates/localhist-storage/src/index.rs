//! The per-resource history index.
//!
//! Each resource directory holds one `entries.json` listing its snapshots in
//! creation order:
//!
//! ```text
//! {
//!   "version": 1,
//!   "resource": "file:///home/user/foo.txt",
//!   "entries": [
//!     { "id": "ent_01h...", "timestamp": "2024-01-01T00:00:00Z", "source": "save", "file": "ent_01h....txt" }
//!   ]
//! }
//! ```

use crate::{EntryId, HistoryEntry, Resource, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// File name of the index inside a resource directory.
pub const INDEX_FILE: &str = "entries.json";

/// Current on-disk index format.
pub const INDEX_VERSION: u32 = 1;

/// Metadata of one snapshot as recorded in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: EntryId,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Snapshot file name, relative to the resource directory.
    pub file: String,
}

impl IndexRecord {
    /// Resolve this record into an entry located under `dir`.
    pub fn to_entry(&self, resource: &Resource, dir: &Path) -> HistoryEntry {
        HistoryEntry {
            id: self.id.clone(),
            resource: resource.clone(),
            timestamp: self.timestamp,
            location: dir.join(&self.file),
            source: self.source.clone(),
        }
    }
}

/// Ordered snapshot metadata for one resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryIndex {
    pub version: u32,
    pub resource: Resource,
    #[serde(default)]
    pub entries: Vec<IndexRecord>,
}

impl HistoryIndex {
    /// Create an empty index for a resource.
    pub fn new(resource: Resource) -> Self {
        Self {
            version: INDEX_VERSION,
            resource,
            entries: Vec::new(),
        }
    }

    /// The most recently appended entry ID.
    pub fn last_id(&self) -> Option<&EntryId> {
        self.entries.last().map(|r| &r.id)
    }

    /// Remove a record by ID.
    pub fn remove(&mut self, id: &EntryId) -> Option<IndexRecord> {
        let pos = self.entries.iter().position(|r| &r.id == id)?;
        Some(self.entries.remove(pos))
    }

    /// Remove and return the oldest records so that at most `max` remain.
    pub fn truncate_oldest(&mut self, max: usize) -> Vec<IndexRecord> {
        let excess = self.entries.len().saturating_sub(max);
        self.entries.drain(..excess).collect()
    }

    /// Resolve all records into entries located under `dir`.
    pub fn to_entries(&self, dir: &Path) -> Vec<HistoryEntry> {
        self.entries
            .iter()
            .map(|r| r.to_entry(&self.resource, dir))
            .collect()
    }

    /// Load the index for `resource` from `path`.
    ///
    /// Returns `None` if no index has been written yet.
    pub async fn load(resource: &Resource, path: &Path) -> StorageResult<Option<Self>> {
        debug!(path = %path.display(), "Reading history index");

        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Io(e)),
        };

        let index: HistoryIndex = serde_json::from_str(&content)
            .map_err(|e| StorageError::corrupt_index(path, e.to_string()))?;

        if index.version != INDEX_VERSION {
            return Err(StorageError::corrupt_index(
                path,
                format!("unsupported index version {}", index.version),
            ));
        }
        if &index.resource != resource {
            return Err(StorageError::corrupt_index(
                path,
                format!("index belongs to {} not {}", index.resource, resource),
            ));
        }

        Ok(Some(index))
    }

    /// Persist the index to `path`, replacing any previous version atomically.
    pub async fn persist(&self, path: &Path) -> StorageResult<()> {
        debug!(path = %path.display(), entries = self.entries.len(), "Writing history index");
        let content = serde_json::to_string_pretty(self)?;
        write_atomic(path, content.as_bytes()).await
    }
}

/// Write `bytes` to `path` via a temp file and rename.
///
/// On failure the temp file is removed best-effort and nothing is left at `path`
/// that was not there before.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    let temp_path = temp_path(path);

    let result = async {
        fs::write(&temp_path, bytes).await?;
        fs::rename(&temp_path, path).await
    }
    .await;

    if let Err(e) = result {
        if let Err(cleanup) = fs::remove_file(&temp_path).await {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %temp_path.display(), "Failed to remove temp file: {}", cleanup);
            }
        }
        return Err(StorageError::write(path, e));
    }

    Ok(())
}

/// `foo.txt` -> `foo.txt.tmp`
fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(id: &str) -> IndexRecord {
        IndexRecord {
            id: EntryId::from_string(id),
            timestamp: Utc::now(),
            source: None,
            file: format!("{id}.txt"),
        }
    }

    #[tokio::test]
    async fn test_persist_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(INDEX_FILE);
        let resource = Resource::file("/a/foo.txt");

        let mut index = HistoryIndex::new(resource.clone());
        index.entries.push(record("ent_1"));
        index.entries.push(record("ent_2"));
        index.persist(&path).await.unwrap();

        let loaded = HistoryIndex::load(&resource, &path).await.unwrap().unwrap();
        assert_eq!(loaded.entries, index.entries);
        assert_eq!(loaded.last_id(), Some(&EntryId::from_string("ent_2")));
        assert!(!temp_path(&path).exists());
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let dir = tempdir().unwrap();
        let loaded = HistoryIndex::load(&Resource::file("/a"), &dir.path().join(INDEX_FILE))
            .await
            .unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_load_garbage_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(INDEX_FILE);
        fs::write(&path, "{not json").await.unwrap();

        let err = HistoryIndex::load(&Resource::file("/a"), &path)
            .await
            .unwrap_err();
        assert!(err.is_corrupt_index());
    }

    #[tokio::test]
    async fn test_load_foreign_resource_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(INDEX_FILE);
        HistoryIndex::new(Resource::file("/a"))
            .persist(&path)
            .await
            .unwrap();

        let err = HistoryIndex::load(&Resource::file("/b"), &path)
            .await
            .unwrap_err();
        assert!(err.is_corrupt_index());
    }

    #[test]
    fn test_remove_and_truncate() {
        let mut index = HistoryIndex::new(Resource::file("/a"));
        for id in ["ent_1", "ent_2", "ent_3", "ent_4"] {
            index.entries.push(record(id));
        }

        let removed = index.remove(&EntryId::from_string("ent_2")).unwrap();
        assert_eq!(removed.id.as_str(), "ent_2");
        assert!(index.remove(&EntryId::from_string("ent_2")).is_none());

        let pruned = index.truncate_oldest(1);
        let pruned: Vec<_> = pruned.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(pruned, vec!["ent_1", "ent_3"]);
        assert_eq!(index.entries.len(), 1);
        assert!(index.truncate_oldest(5).is_empty());
    }

    #[tokio::test]
    async fn test_write_atomic_into_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("file.txt");
        let err = write_atomic(&path, b"data").await.unwrap_err();
        assert!(matches!(err, StorageError::Write { .. }));
        assert!(!path.exists());
    }
}
