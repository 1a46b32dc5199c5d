//! Test fixtures for creating reproducible test environments.
//!
//! Provides utilities for setting up temporary project directories with a
//! history store next to them.

use localhist_core::{HistoryConfig, HistoryService, Resource};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Directory under the temp root that holds the history store.
const HISTORY_DIR: &str = ".history";

/// A temporary test project with configurable file structure.
///
/// Creates a temporary directory that is automatically cleaned up
/// when the built project is dropped.
///
/// # Example
///
/// ```rust
/// use localhist_test_utils::fixtures::TestProject;
///
/// let project = TestProject::new()
///     .with_file("a.txt", "Hello Foo")
///     .with_file("nested/b.md", "# Title")
///     .build();
///
/// assert!(project.path().join("nested/b.md").exists());
/// ```
pub struct TestProject {
    /// The temporary directory backing this project.
    temp_dir: TempDir,
    /// Files to create (path relative to root -> contents).
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl TestProject {
    /// Create a new test project builder.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            files: BTreeMap::new(),
        }
    }

    /// Add a file to the project.
    ///
    /// The path should be relative to the project root.
    /// Parent directories are created automatically.
    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Self {
        self.files
            .insert(path.as_ref().to_path_buf(), contents.as_ref().to_vec());
        self
    }

    /// Build the project, creating all files.
    pub fn build(self) -> BuiltTestProject {
        let root = self.temp_dir.path();

        for (path, contents) in &self.files {
            let full_path = root.join(path);
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent).unwrap_or_else(|e| {
                    panic!(
                        "Failed to create parent directory for {}: {}",
                        full_path.display(),
                        e
                    )
                });
            }
            fs::write(&full_path, contents)
                .unwrap_or_else(|e| panic!("Failed to write file {}: {}", full_path.display(), e));
        }

        BuiltTestProject {
            temp_dir: self.temp_dir,
        }
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// A built test project with files created on disk.
///
/// The temporary directory is automatically cleaned up when this is dropped.
pub struct BuiltTestProject {
    temp_dir: TempDir,
}

impl BuiltTestProject {
    /// Get the path to the project root.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Root directory for history stores created by this fixture.
    pub fn history_root(&self) -> PathBuf {
        self.path().join(HISTORY_DIR)
    }

    /// The `file` resource of a project file.
    pub fn resource(&self, path: impl AsRef<Path>) -> Resource {
        Resource::file(self.path().join(path))
    }

    /// A local-file history service with default configuration.
    pub fn history_service(&self) -> HistoryService {
        self.history_service_with(HistoryConfig::default())
    }

    /// A local-file history service with the given configuration.
    pub fn history_service_with(&self, config: HistoryConfig) -> HistoryService {
        HistoryService::new(self.history_root(), config)
    }

    /// Read a file from the project.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Vec<u8> {
        let full_path = self.path().join(path.as_ref());
        fs::read(&full_path)
            .unwrap_or_else(|e| panic!("Failed to read file {}: {}", full_path.display(), e))
    }

    /// Write a file to the project (for modifying during tests).
    pub fn write_file(&self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) {
        let full_path = self.path().join(path.as_ref());
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).ok();
        }
        fs::write(&full_path, contents.as_ref())
            .unwrap_or_else(|e| panic!("Failed to write file {}: {}", full_path.display(), e));
    }
}

/// Common test file contents.
pub mod content {
    /// A single-line ASCII document.
    pub const HELLO_FOO: &str = "Hello Foo";

    /// A multi-line document with non-ASCII text.
    pub const UNICODE_LINES: &str = "Lorem ipsum dolor öäü sit amet\n\
        Consectetur adipiscing ßß elit\n\
        日本語のテキスト 🎉\n";
}
