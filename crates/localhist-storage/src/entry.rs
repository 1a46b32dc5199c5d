//! History entry data structures.

use crate::Resource;
use chrono::{DateTime, Utc};
use localhist_util::{IdPrefix, Identifier};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Unique identifier for a history entry.
///
/// Identifiers of one resource sort in creation order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub String);

impl EntryId {
    /// Create a new entry ID.
    pub fn new() -> Self {
        Self(Identifier::entry())
    }

    /// Create an entry ID that sorts strictly after `previous`.
    pub fn after(previous: Option<&EntryId>) -> Self {
        Self(Identifier::ascending_after(
            IdPrefix::Entry,
            previous.map(EntryId::as_str),
        ))
    }

    /// Create an entry ID from a string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One captured snapshot of a resource.
///
/// The bytes at `location` never change once the entry exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique identifier for this entry.
    pub id: EntryId,

    /// The resource this entry is a snapshot of.
    pub resource: Resource,

    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Where the snapshot bytes are stored.
    pub location: PathBuf,

    /// What triggered the capture (e.g. "save").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl HistoryEntry {
    /// Read the stored snapshot bytes.
    pub async fn read_contents(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.location).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_id_after_orders() {
        let first = EntryId::new();
        let second = EntryId::after(Some(&first));
        assert!(second > first);
        assert!(second.as_str().starts_with("ent_"));
    }

    #[test]
    fn test_entry_id_serializes_transparently() {
        let id = EntryId::from_string("ent_abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ent_abc\"");
        assert_eq!(id.to_string(), "ent_abc");
    }
}
