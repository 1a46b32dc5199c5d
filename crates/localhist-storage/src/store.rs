//! Content store implementation.

use crate::index::{write_atomic, HistoryIndex, IndexRecord, INDEX_FILE};
use crate::{EntryId, HistoryEntry, Resource, ResourceLocks, StorageError, StorageResult};
use chrono::Utc;
use localhist_util::path::dotted_extension;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Number of digest bytes used for resource directory names.
const DIR_HASH_BYTES: usize = 16;

/// Durable storage for history snapshots.
///
/// Snapshots are stored as plain file copies, one directory per resource:
/// ```text
/// root/
///   <hash of resource id>/
///     entries.json         # Ordered index of snapshot metadata
///     ent_<ulid>.<ext>     # Snapshot bytes, one file per entry
/// ```
///
/// A snapshot file is written before its index record and an index record is
/// removed before its file, so an interrupted operation can leave an orphan
/// file but never an index record without bytes.
pub struct ContentStore {
    /// Root directory of the store.
    root: PathBuf,

    /// Serializes index mutation per resource.
    locks: ResourceLocks,
}

impl ContentStore {
    /// Create a store rooted at `root`.
    ///
    /// Nothing is created on disk until the first snapshot is written.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: ResourceLocks::new(),
        }
    }

    /// The store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The directory holding the history of `resource`.
    pub fn resource_dir(&self, resource: &Resource) -> PathBuf {
        self.root.join(resource_dir_name(resource))
    }

    /// Create the directory for `resource` if it does not exist yet.
    pub async fn ensure_resource_directory(&self, resource: &Resource) -> StorageResult<PathBuf> {
        let dir = self.resource_dir(resource);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::write(&dir, e))?;
        Ok(dir)
    }

    /// Persist `bytes` as a new snapshot of `resource`.
    ///
    /// Either the snapshot file and its index record are both written, or
    /// neither is visible when this returns an error.
    pub async fn write_snapshot(
        &self,
        resource: &Resource,
        bytes: &[u8],
        source: Option<&str>,
    ) -> StorageResult<HistoryEntry> {
        let _guard = self.locks.acquire(resource).await?;

        let dir = self.ensure_resource_directory(resource).await?;
        let index_path = dir.join(INDEX_FILE);
        let mut index = HistoryIndex::load(resource, &index_path)
            .await?
            .unwrap_or_else(|| HistoryIndex::new(resource.clone()));

        let id = EntryId::after(index.last_id());
        let file = format!("{}{}", id, dotted_extension(resource.path()));
        let location = dir.join(&file);

        write_atomic(&location, bytes).await?;
        debug!(resource = %resource, file = %file, bytes = bytes.len(), "Wrote snapshot");

        let record = IndexRecord {
            id,
            timestamp: Utc::now(),
            source: source.map(str::to_string),
            file,
        };
        index.entries.push(record.clone());

        if let Err(e) = index.persist(&index_path).await {
            remove_snapshot_file(&location).await;
            return Err(e);
        }

        info!(
            resource = %resource,
            entry = %record.id,
            total = index.entries.len(),
            "Created history entry"
        );

        Ok(record.to_entry(resource, &dir))
    }

    /// Load the index for `resource`, oldest first.
    ///
    /// A resource that was never captured has an empty history.
    pub async fn read_index(&self, resource: &Resource) -> StorageResult<Vec<HistoryEntry>> {
        let dir = self.resource_dir(resource);
        Ok(HistoryIndex::load(resource, &dir.join(INDEX_FILE))
            .await?
            .map(|index| index.to_entries(&dir))
            .unwrap_or_default())
    }

    /// Load the index for `resource`, keeping only entries whose file exists.
    ///
    /// Index records without a file and files without an index record are
    /// logged and otherwise ignored.
    pub async fn verified_entries(&self, resource: &Resource) -> StorageResult<Vec<HistoryEntry>> {
        let entries = self.read_index(resource).await?;
        if entries.is_empty() {
            return Ok(entries);
        }

        let mut verified = Vec::with_capacity(entries.len());
        for entry in entries {
            if fs::try_exists(&entry.location).await.unwrap_or(false) {
                verified.push(entry);
            } else {
                warn!(
                    resource = %resource,
                    entry = %entry.id,
                    location = %entry.location.display(),
                    "History entry has no snapshot file, skipping"
                );
            }
        }

        self.report_orphans(resource, &verified).await;

        Ok(verified)
    }

    /// Remove one entry from the history of `resource`.
    ///
    /// Returns `None` if no such entry is indexed.
    pub async fn remove_entry(
        &self,
        resource: &Resource,
        id: &EntryId,
    ) -> StorageResult<Option<HistoryEntry>> {
        let _guard = self.locks.acquire(resource).await?;

        let dir = self.resource_dir(resource);
        let index_path = dir.join(INDEX_FILE);
        let Some(mut index) = HistoryIndex::load(resource, &index_path).await? else {
            return Ok(None);
        };
        let Some(record) = index.remove(id) else {
            return Ok(None);
        };

        index.persist(&index_path).await?;

        let entry = record.to_entry(resource, &dir);
        remove_snapshot_file(&entry.location).await;
        info!(resource = %resource, entry = %id, "Removed history entry");

        Ok(Some(entry))
    }

    /// Drop the oldest entries of `resource` so that at most `max_entries` remain.
    ///
    /// Returns the removed entries, oldest first.
    pub async fn enforce_limit(
        &self,
        resource: &Resource,
        max_entries: usize,
    ) -> StorageResult<Vec<HistoryEntry>> {
        let _guard = self.locks.acquire(resource).await?;

        let dir = self.resource_dir(resource);
        let index_path = dir.join(INDEX_FILE);
        let Some(mut index) = HistoryIndex::load(resource, &index_path).await? else {
            return Ok(Vec::new());
        };

        let pruned = index.truncate_oldest(max_entries);
        if pruned.is_empty() {
            return Ok(Vec::new());
        }

        index.persist(&index_path).await?;

        let mut removed = Vec::with_capacity(pruned.len());
        for record in &pruned {
            let entry = record.to_entry(resource, &dir);
            remove_snapshot_file(&entry.location).await;
            removed.push(entry);
        }

        info!(
            resource = %resource,
            removed = removed.len(),
            max_entries,
            "Pruned history entries"
        );

        Ok(removed)
    }

    /// Delete the whole history of `resource`.
    ///
    /// Returns the entries that were indexed. An unreadable index does not
    /// prevent removal.
    pub async fn remove_all(&self, resource: &Resource) -> StorageResult<Vec<HistoryEntry>> {
        let _guard = self.locks.acquire(resource).await?;

        let dir = self.resource_dir(resource);
        let entries = match HistoryIndex::load(resource, &dir.join(INDEX_FILE)).await {
            Ok(index) => index.map(|i| i.to_entries(&dir)).unwrap_or_default(),
            Err(e) if e.is_corrupt_index() => {
                warn!(resource = %resource, "Removing history with corrupt index: {}", e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        match fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::Io(e)),
        }

        if !entries.is_empty() {
            info!(resource = %resource, removed = entries.len(), "Removed all history entries");
        }

        Ok(entries)
    }

    /// Warn about snapshot files in the resource directory that no entry references.
    async fn report_orphans(&self, resource: &Resource, entries: &[HistoryEntry]) {
        let dir = self.resource_dir(resource);
        let known: HashSet<&Path> = entries.iter().map(|e| e.location.as_path()).collect();

        let mut dir_entries = match fs::read_dir(&dir).await {
            Ok(d) => d,
            Err(e) => {
                debug!(path = %dir.display(), "Could not list history directory: {}", e);
                return;
            }
        };

        while let Ok(Some(dir_entry)) = dir_entries.next_entry().await {
            let path = dir_entry.path();
            let name = dir_entry.file_name();
            let name = name.to_string_lossy();
            if name == INDEX_FILE || name.ends_with(".tmp") {
                continue;
            }
            if !known.contains(path.as_path()) {
                warn!(
                    resource = %resource,
                    path = %path.display(),
                    "Snapshot file is not referenced by the history index"
                );
            }
        }
    }
}

/// Deterministic, filesystem-safe directory name for a resource.
///
/// Lowercase hex of the first 16 bytes of the SHA-256 digest of the resource
/// identifier string.
pub fn resource_dir_name(resource: &Resource) -> String {
    let mut hasher = Sha256::new();
    hasher.update(resource.key().as_bytes());
    let digest = hasher.finalize();

    digest[..DIR_HASH_BYTES]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Best-effort removal of a snapshot file.
async fn remove_snapshot_file(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), "Failed to remove snapshot file: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup_test() -> (TempDir, ContentStore) {
        let dir = TempDir::new().unwrap();
        let store = ContentStore::new(dir.path().join("history"));
        (dir, store)
    }

    #[test]
    fn test_resource_dir_name_is_stable_hex() {
        let resource = Resource::file("/home/user/foo.txt");
        let name = resource_dir_name(&resource);
        assert_eq!(name.len(), 32);
        assert!(name.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(name, resource_dir_name(&Resource::file("/home/user/./foo.txt")));
        assert_ne!(name, resource_dir_name(&Resource::file("/home/user/bar.txt")));
        assert_ne!(
            name,
            resource_dir_name(&Resource::new("untitled", "/home/user/foo.txt"))
        );
    }

    #[tokio::test]
    async fn test_ensure_resource_directory_is_idempotent() {
        let (_dir, store) = setup_test();
        let resource = Resource::file("/a/foo.txt");

        let first = store.ensure_resource_directory(&resource).await.unwrap();
        let second = store.ensure_resource_directory(&resource).await.unwrap();

        assert_eq!(first, second);
        assert!(first.is_dir());
        assert!(first.starts_with(store.root()));
    }

    #[tokio::test]
    async fn test_write_and_read_index() {
        let (_dir, store) = setup_test();
        let resource = Resource::file("/a/foo.txt");

        let first = store
            .write_snapshot(&resource, b"one", Some("save"))
            .await
            .unwrap();
        let second = store.write_snapshot(&resource, b"two", None).await.unwrap();

        assert!(second.id > first.id);
        assert_eq!(first.resource, resource);
        assert_eq!(first.source.as_deref(), Some("save"));
        assert!(first.location.to_string_lossy().ends_with(".txt"));

        let entries = store.read_index(&resource).await.unwrap();
        assert_eq!(entries, vec![first.clone(), second.clone()]);
        assert_eq!(fs::read(&first.location).await.unwrap(), b"one");
        assert_eq!(second.read_contents().await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_read_index_of_unknown_resource_is_empty() {
        let (_dir, store) = setup_test();
        let entries = store.read_index(&Resource::file("/nope")).await.unwrap();
        assert!(entries.is_empty());
        assert!(!store.root().exists());
    }

    #[tokio::test]
    async fn test_index_survives_new_store_instance() {
        let (dir, store) = setup_test();
        let resource = Resource::file("/a/foo.txt");
        let entry = store.write_snapshot(&resource, b"one", None).await.unwrap();
        drop(store);

        let reopened = ContentStore::new(dir.path().join("history"));
        assert_eq!(reopened.read_index(&resource).await.unwrap(), vec![entry]);
    }

    #[tokio::test]
    async fn test_write_refuses_to_overwrite_corrupt_index() {
        let (_dir, store) = setup_test();
        let resource = Resource::file("/a/foo.txt");
        let dir = store.ensure_resource_directory(&resource).await.unwrap();
        fs::write(dir.join(INDEX_FILE), "garbage").await.unwrap();

        let err = store
            .write_snapshot(&resource, b"one", None)
            .await
            .unwrap_err();
        assert!(err.is_corrupt_index());

        // No snapshot file was left behind
        let mut files = fs::read_dir(&dir).await.unwrap();
        let mut names = Vec::new();
        while let Some(f) = files.next_entry().await.unwrap() {
            names.push(f.file_name().to_string_lossy().to_string());
        }
        assert_eq!(names, vec![INDEX_FILE.to_string()]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_write_failure_leaves_no_entry() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = setup_test();
        let resource = Resource::file("/a/foo.txt");
        let dir = store.ensure_resource_directory(&resource).await.unwrap();

        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o555)).unwrap();
        let result = store.write_snapshot(&resource, b"one", None).await;
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();

        // Running as root ignores directory permissions
        if let Err(err) = result {
            assert!(matches!(err, StorageError::Write { .. }));
            assert!(store.read_index(&resource).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_verified_entries_skips_missing_files() {
        let (_dir, store) = setup_test();
        let resource = Resource::file("/a/foo.txt");
        let first = store.write_snapshot(&resource, b"one", None).await.unwrap();
        let second = store.write_snapshot(&resource, b"two", None).await.unwrap();

        fs::remove_file(&first.location).await.unwrap();
        fs::write(store.resource_dir(&resource).join("stray.txt"), "x")
            .await
            .unwrap();

        let verified = store.verified_entries(&resource).await.unwrap();
        assert_eq!(verified, vec![second]);
        assert_eq!(store.read_index(&resource).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_remove_entry() {
        let (_dir, store) = setup_test();
        let resource = Resource::file("/a/foo.txt");
        let first = store.write_snapshot(&resource, b"one", None).await.unwrap();
        let second = store.write_snapshot(&resource, b"two", None).await.unwrap();

        let removed = store.remove_entry(&resource, &first.id).await.unwrap();
        assert_eq!(removed, Some(first.clone()));
        assert!(!first.location.exists());
        assert_eq!(store.read_index(&resource).await.unwrap(), vec![second]);

        assert!(store
            .remove_entry(&resource, &first.id)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .remove_entry(&Resource::file("/other"), &first.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_enforce_limit_drops_oldest() {
        let (_dir, store) = setup_test();
        let resource = Resource::file("/a/foo.txt");
        let mut written = Vec::new();
        for i in 0..5 {
            written.push(
                store
                    .write_snapshot(&resource, format!("v{i}").as_bytes(), None)
                    .await
                    .unwrap(),
            );
        }

        let removed = store.enforce_limit(&resource, 3).await.unwrap();
        assert_eq!(removed, written[..2].to_vec());
        assert!(removed.iter().all(|e| !e.location.exists()));
        assert_eq!(store.read_index(&resource).await.unwrap(), written[2..].to_vec());

        assert!(store.enforce_limit(&resource, 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_all() {
        let (_dir, store) = setup_test();
        let resource = Resource::file("/a/foo.txt");
        store.write_snapshot(&resource, b"one", None).await.unwrap();
        store.write_snapshot(&resource, b"two", None).await.unwrap();

        let removed = store.remove_all(&resource).await.unwrap();
        assert_eq!(removed.len(), 2);
        assert!(!store.resource_dir(&resource).exists());
        assert!(store.read_index(&resource).await.unwrap().is_empty());

        assert!(store.remove_all(&resource).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_do_not_lose_updates() {
        let (_dir, store) = setup_test();
        let store = Arc::new(store);
        let resource = Resource::file("/a/foo.txt");

        let tasks = (0..20).map(|i| {
            let store = store.clone();
            let resource = resource.clone();
            tokio::spawn(async move {
                store
                    .write_snapshot(&resource, format!("content {i}").as_bytes(), None)
                    .await
                    .unwrap()
            })
        });
        let written: Vec<HistoryEntry> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        let entries = store.read_index(&resource).await.unwrap();
        assert_eq!(entries.len(), written.len());

        let ids: HashSet<_> = entries.iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids.len(), 20);
        assert!(entries.windows(2).all(|w| w[0].id < w[1].id));
    }
}
