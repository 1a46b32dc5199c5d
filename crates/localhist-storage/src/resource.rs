//! Resource identity.

use localhist_util::path::{normalize, to_slash};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// Scheme of resources backed by the local disk.
pub const FILE_SCHEME: &str = "file";

/// A stable identifier for something whose content is versioned.
///
/// A resource is a scheme plus a path. The normalized identifier string is
/// `<scheme>://<path>`; two resources are equal iff those strings are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resource {
    scheme: String,
    path: PathBuf,
    key: String,
}

impl Resource {
    /// Create a resource with an explicit scheme.
    ///
    /// The scheme is lowercased and `.`/`..` components are folded out of the path.
    pub fn new(scheme: impl AsRef<str>, path: impl AsRef<Path>) -> Self {
        let scheme = scheme.as_ref().to_ascii_lowercase();
        let path = normalize(path.as_ref());
        let key = format!("{}://{}", scheme, to_slash(&path));
        Self { scheme, path, key }
    }

    /// Create a resource for a file on the local disk.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::new(FILE_SCHEME, path)
    }

    /// Parse a resource from its identifier string.
    ///
    /// Strings without `://` are treated as local file paths.
    pub fn parse(s: &str) -> localhist_util::Result<Self> {
        let Some((scheme, path)) = s.split_once("://") else {
            if s.is_empty() {
                return Err(localhist_util::Error::invalid_input("empty resource"));
            }
            return Ok(Self::file(s));
        };

        let valid_scheme = scheme
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !valid_scheme {
            return Err(localhist_util::Error::invalid_input(format!(
                "invalid resource scheme: {:?}",
                scheme
            )));
        }
        if path.is_empty() {
            return Err(localhist_util::Error::invalid_input(format!(
                "resource has no path: {}",
                s
            )));
        }

        Ok(Self::new(scheme, path))
    }

    /// The scheme tag, e.g. `file`.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The normalized path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The normalized identifier string.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The last path component, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Whether this resource lives on the local disk.
    pub fn is_file(&self) -> bool {
        self.scheme == FILE_SCHEME
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Resource {}

impl Hash for Resource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key)
    }
}

impl TryFrom<String> for Resource {
    type Error = localhist_util::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Resource> for String {
    fn from(resource: Resource) -> Self {
        resource.key
    }
}
