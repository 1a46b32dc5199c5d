//! Local history for working copies.
//!
//! This crate captures point-in-time snapshots of a working copy's content
//! and lists the snapshots recorded for a resource:
//! - Eligibility filtering by resource scheme, size and configuration
//! - Cooperative cancellation with no-op semantics
//! - Durable per-resource storage via [`localhist_storage`]
//! - Add/remove notifications consistent with what was persisted
//!
//! # Example
//!
//! ```no_run
//! use localhist_core::{HistoryConfig, HistoryService, WorkingCopy};
//! use localhist_storage::Resource;
//! use tokio_util::sync::CancellationToken;
//!
//! struct Editor(Resource);
//!
//! impl WorkingCopy for Editor {
//!     fn resource(&self) -> &Resource {
//!         &self.0
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = HistoryService::new("/var/lib/localhist/history", HistoryConfig::default());
//! let mut added = service.on_did_add_entry();
//!
//! let editor = Editor(Resource::file("/project/src/main.rs"));
//! let cancel = CancellationToken::new();
//!
//! if let Some(entry) = service.add_entry(&editor, &cancel).await? {
//!     assert_eq!(added.recv().await.map(|e| e.entry), Some(entry));
//! }
//!
//! let history = service.get_entries(&Resource::file("/project/src/main.rs"), &cancel).await?;
//! # Ok(())
//! # }
//! ```

pub mod capability;
pub mod config;
pub mod error;
pub mod events;
mod service;

pub use capability::{LocalFileReader, LocalSchemes, ResourceReader, SchemeSupport, WorkingCopy};
pub use config::HistoryConfig;
pub use error::{HistoryError, HistoryResult};
pub use events::{EntryAdded, EntryRemoved, Event, HistoryEvents, Subscription};
pub use localhist_storage::{EntryId, HistoryEntry, Resource};
pub use service::HistoryService;
