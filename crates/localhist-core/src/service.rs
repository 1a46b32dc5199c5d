//! The history service.

use crate::capability::{LocalFileReader, LocalSchemes, ResourceReader, SchemeSupport, WorkingCopy};
use crate::events::{EntryAdded, EntryRemoved, HistoryEvents, Subscription};
use crate::{HistoryConfig, HistoryError, HistoryResult};
use localhist_storage::{ContentStore, HistoryEntry, Resource, ResourceLocks};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Captures and lists content snapshots of working copies.
///
/// Each service owns one store root; several services over different roots
/// can coexist in one process.
pub struct HistoryService {
    /// Snapshot persistence.
    store: ContentStore,

    /// Serializes commit and notification per resource, so add-events of one
    /// resource fire in commit order.
    commits: ResourceLocks,

    reader: Arc<dyn ResourceReader>,
    schemes: Arc<dyn SchemeSupport>,
    config: HistoryConfig,
    events: HistoryEvents,
}

impl HistoryService {
    /// Create a service that captures local files under `root`.
    pub fn new(root: impl Into<PathBuf>, config: HistoryConfig) -> Self {
        Self::with_capabilities(
            root,
            config,
            Arc::new(LocalFileReader),
            Arc::new(LocalSchemes::default()),
        )
    }

    /// Create a service with explicit read and eligibility capabilities.
    pub fn with_capabilities(
        root: impl Into<PathBuf>,
        config: HistoryConfig,
        reader: Arc<dyn ResourceReader>,
        schemes: Arc<dyn SchemeSupport>,
    ) -> Self {
        let store = ContentStore::new(root);
        debug!(root = %store.root().display(), ?config, "Created history service");

        Self {
            store,
            commits: ResourceLocks::new(),
            reader,
            schemes,
            config,
            events: HistoryEvents::new(),
        }
    }

    /// Create a local-file service with configuration loaded from `config_path`.
    pub async fn from_config_file(
        root: impl Into<PathBuf>,
        config_path: &Path,
    ) -> HistoryResult<Self> {
        let config = HistoryConfig::load(config_path).await?;
        Ok(Self::new(root, config))
    }

    /// Create a local-file service rooted at the per-user history directory.
    pub fn open_default(config: HistoryConfig) -> HistoryResult<Self> {
        let root = localhist_util::path::history_dir().ok_or(HistoryError::NoDataDir)?;
        Ok(Self::new(root, config))
    }

    /// The underlying content store.
    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Subscribe to committed entries.
    ///
    /// Events of one resource arrive in commit order; there is no ordering
    /// across resources.
    pub fn on_did_add_entry(&self) -> Subscription<EntryAdded> {
        self.events.on_did_add_entry()
    }

    /// Subscribe to removed entries.
    pub fn on_did_remove_entry(&self) -> Subscription<EntryRemoved> {
        self.events.on_did_remove_entry()
    }

    /// Whether captures of `resource` can be recorded at all.
    pub fn is_eligible(&self, resource: &Resource) -> bool {
        self.config.enabled && self.schemes.supports(resource.scheme())
    }

    /// Capture the current content of `working_copy`.
    ///
    /// Returns `None` without side effects when the resource is ineligible or
    /// `cancel` fires before the capture is committed. Read and storage
    /// failures are returned as errors.
    pub async fn add_entry(
        &self,
        working_copy: &dyn WorkingCopy,
        cancel: &CancellationToken,
    ) -> HistoryResult<Option<HistoryEntry>> {
        self.add_entry_with_source(working_copy, None, cancel).await
    }

    /// Capture the current content of `working_copy`, recording what triggered it.
    pub async fn add_entry_with_source(
        &self,
        working_copy: &dyn WorkingCopy,
        source: Option<&str>,
        cancel: &CancellationToken,
    ) -> HistoryResult<Option<HistoryEntry>> {
        let resource = working_copy.resource();

        if cancel.is_cancelled() {
            debug!(resource = %resource, "Capture cancelled before start");
            return Ok(None);
        }

        if !self.is_eligible(resource) {
            debug!(
                resource = %resource,
                enabled = self.config.enabled,
                "Resource is not eligible for history"
            );
            return Ok(None);
        }

        let bytes = self
            .reader
            .read(resource)
            .await
            .map_err(|e| HistoryError::read(resource, e))?;

        if let Some(limit) = self.config.max_file_size_bytes() {
            if bytes.len() as u64 > limit {
                debug!(
                    resource = %resource,
                    size = bytes.len(),
                    limit,
                    "Content exceeds history size limit"
                );
                return Ok(None);
            }
        }

        if cancel.is_cancelled() {
            debug!(resource = %resource, "Capture cancelled after read");
            return Ok(None);
        }

        let _commit = self.commits.acquire(resource).await?;
        let entry = self.store.write_snapshot(resource, &bytes, source).await?;
        debug!(name = %working_copy.name(), entry = %entry.id, "Captured working copy");

        self.settle(entry, cancel).await
    }

    /// Publish a freshly written entry, or roll it back if the capture was
    /// cancelled while the write was in flight.
    ///
    /// Runs under the resource's commit lock, so add-events of one resource
    /// follow its index order. Events of different resources may interleave
    /// in any order.
    async fn settle(
        &self,
        entry: HistoryEntry,
        cancel: &CancellationToken,
    ) -> HistoryResult<Option<HistoryEntry>> {
        if cancel.is_cancelled() {
            info!(resource = %entry.resource, entry = %entry.id, "Capture cancelled after write, rolling back");
            if let Err(e) = self.store.remove_entry(&entry.resource, &entry.id).await {
                warn!(entry = %entry.id, "Failed to roll back cancelled capture: {}", e);
            }
            return Ok(None);
        }

        if let Some(limit) = self.config.retention_limit() {
            match self.store.enforce_limit(&entry.resource, limit).await {
                Ok(pruned) => {
                    for removed in pruned {
                        self.events.emit_removed(removed);
                    }
                }
                // The new entry is committed; retention is retried on the next capture
                Err(e) => warn!(resource = %entry.resource, "Failed to apply retention: {}", e),
            }
        }

        self.events.emit_added(entry.clone());
        Ok(Some(entry))
    }

    /// List the history of `resource`, oldest first.
    ///
    /// Entries whose snapshot file is missing are skipped; an unreadable index
    /// yields an empty history. Cancellation yields an empty history.
    pub async fn get_entries(
        &self,
        resource: &Resource,
        cancel: &CancellationToken,
    ) -> HistoryResult<Vec<HistoryEntry>> {
        if cancel.is_cancelled() {
            return Ok(Vec::new());
        }

        let entries = match self.store.verified_entries(resource).await {
            Ok(entries) => entries,
            Err(e) if e.is_corrupt_index() => {
                warn!(resource = %resource, "Ignoring unreadable history: {}", e);
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        if cancel.is_cancelled() {
            return Ok(Vec::new());
        }

        Ok(entries)
    }

    /// Remove one entry. Returns whether anything was removed.
    pub async fn remove_entry(
        &self,
        entry: &HistoryEntry,
        cancel: &CancellationToken,
    ) -> HistoryResult<bool> {
        if cancel.is_cancelled() {
            return Ok(false);
        }

        let _commit = self.commits.acquire(&entry.resource).await?;
        match self.store.remove_entry(&entry.resource, &entry.id).await? {
            Some(removed) => {
                self.events.emit_removed(removed);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove the whole history of `resource`. Returns the number of entries removed.
    pub async fn remove_all(
        &self,
        resource: &Resource,
        cancel: &CancellationToken,
    ) -> HistoryResult<usize> {
        if cancel.is_cancelled() {
            return Ok(0);
        }

        let _commit = self.commits.acquire(resource).await?;
        let removed = self.store.remove_all(resource).await?;
        let count = removed.len();
        for entry in removed {
            self.events.emit_removed(entry);
        }

        Ok(count)
    }
}
