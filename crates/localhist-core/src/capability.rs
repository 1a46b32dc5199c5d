//! Collaborators the history service depends on but does not own.
//!
//! - [`WorkingCopy`]: the live, editable representation of a resource.
//! - [`ResourceReader`]: reads the current bytes of a resource.
//! - [`SchemeSupport`]: decides which resource schemes can be captured.

use async_trait::async_trait;
use localhist_storage::{Resource, FILE_SCHEME};
use std::io;

/// A working copy owned by the host application.
///
/// The history service only ever reads from it.
pub trait WorkingCopy: Send + Sync {
    /// The resource this working copy edits.
    fn resource(&self) -> &Resource;

    /// A display name, for logging.
    fn name(&self) -> String {
        self.resource()
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| self.resource().to_string())
    }
}

/// Reads the current content of a resource.
#[async_trait]
pub trait ResourceReader: Send + Sync {
    /// Return the current bytes of `resource`.
    async fn read(&self, resource: &Resource) -> io::Result<Vec<u8>>;
}

/// Decides whether resources of a scheme can be captured.
pub trait SchemeSupport: Send + Sync {
    fn supports(&self, scheme: &str) -> bool;
}

impl<F> SchemeSupport for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn supports(&self, scheme: &str) -> bool {
        self(scheme)
    }
}

/// Reads `file` resources from the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileReader;

#[async_trait]
impl ResourceReader for LocalFileReader {
    async fn read(&self, resource: &Resource) -> io::Result<Vec<u8>> {
        if !resource.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("cannot read {} resources from disk", resource.scheme()),
            ));
        }
        tokio::fs::read(resource.path()).await
    }
}

/// A fixed set of supported schemes.
#[derive(Debug, Clone)]
pub struct LocalSchemes {
    schemes: Vec<String>,
}

impl LocalSchemes {
    /// Supports no scheme at all.
    pub fn none() -> Self {
        Self {
            schemes: Vec::new(),
        }
    }

    /// Add a supported scheme.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.schemes.push(scheme.into().to_ascii_lowercase());
        self
    }
}

impl Default for LocalSchemes {
    fn default() -> Self {
        Self::none().with_scheme(FILE_SCHEME)
    }
}

impl SchemeSupport for LocalSchemes {
    fn supports(&self, scheme: &str) -> bool {
        self.schemes.iter().any(|s| s.eq_ignore_ascii_case(scheme))
    }
}
