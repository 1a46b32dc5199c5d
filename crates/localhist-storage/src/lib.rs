//! Content store for localhist.
//!
//! This crate owns the on-disk layout of the history store:
//! - One directory per resource, named by a hash of the resource identifier
//! - One immutable file per captured snapshot
//! - An ordered JSON index of snapshot metadata per resource
//!
//! # Example
//!
//! ```no_run
//! use localhist_storage::{ContentStore, Resource};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ContentStore::new("/var/lib/localhist/history");
//! let resource = Resource::file("/project/src/main.rs");
//!
//! let entry = store.write_snapshot(&resource, b"fn main() {}", Some("save")).await?;
//! let entries = store.read_index(&resource).await?;
//! assert_eq!(entries.last(), Some(&entry));
//! # Ok(())
//! # }
//! ```

mod entry;
mod error;
pub mod index;
mod lock;
mod resource;
mod store;

pub use entry::{EntryId, HistoryEntry};
pub use error::{StorageError, StorageResult};
pub use lock::ResourceLocks;
pub use resource::{Resource, FILE_SCHEME};
pub use store::{resource_dir_name, ContentStore};
