//! ULID-based identifier generation with prefixes.
//!
//! Identifiers in localhist follow the pattern: `prefix_ulid`
//! For example: `ent_01hqxyz...` for history entries.

use ulid::Ulid;

/// Known identifier prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPrefix {
    Entry,
}

impl IdPrefix {
    /// Get the string prefix for this identifier type.
    pub fn as_str(&self) -> &'static str {
        match self {
            IdPrefix::Entry => "ent",
        }
    }

    /// Parse a prefix from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ent" => Some(IdPrefix::Entry),
            _ => None,
        }
    }
}

/// Identifier generation and parsing utilities.
pub struct Identifier;

impl Identifier {
    /// Generate a new ascending identifier (newer = larger).
    ///
    /// Two identifiers created within the same millisecond are not
    /// guaranteed to be ordered; use [`Identifier::ascending_after`] when
    /// strict ordering against a known predecessor is required.
    pub fn ascending(prefix: IdPrefix) -> String {
        Self::with_ulid(prefix, Ulid::new())
    }

    /// Generate an ascending identifier strictly greater than `previous`.
    ///
    /// If `previous` is absent or unparseable this behaves like
    /// [`Identifier::ascending`].
    pub fn ascending_after(prefix: IdPrefix, previous: Option<&str>) -> String {
        let mut ulid = Ulid::new();

        if let Some((_, prev)) = previous.and_then(Self::parse) {
            if ulid <= prev {
                ulid = prev.increment().unwrap_or(ulid);
            }
        }

        Self::with_ulid(prefix, ulid)
    }

    /// Generate an identifier with a specific ULID (for testing or imports).
    pub fn with_ulid(prefix: IdPrefix, ulid: Ulid) -> String {
        format!("{}_{}", prefix.as_str(), ulid.to_string().to_lowercase())
    }

    /// Parse an identifier into its prefix and ULID parts.
    pub fn parse(id: &str) -> Option<(IdPrefix, Ulid)> {
        let (prefix, ulid) = id.split_once('_')?;
        let prefix = IdPrefix::parse(prefix)?;
        let ulid = Ulid::from_string(ulid).ok()?;
        Some((prefix, ulid))
    }

    /// Check if an identifier has the expected prefix.
    pub fn has_prefix(id: &str, prefix: IdPrefix) -> bool {
        id.starts_with(prefix.as_str()) && id.chars().nth(prefix.as_str().len()) == Some('_')
    }

    /// Generate a history entry ID (ascending for chronological order).
    pub fn entry() -> String {
        Self::ascending(IdPrefix::Entry)
    }
}
