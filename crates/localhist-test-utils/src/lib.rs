//! Testing utilities, fixtures, and mocks for localhist.
//!
//! This crate provides common testing infrastructure used across the localhist workspace:
//!
//! - **Fixtures**: Temporary project trees and history stores
//! - **Mocks**: Working copies and read capabilities with scripted behavior
//! - **Assertions**: Helpers for checking stored snapshot bytes and event streams
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use localhist_test_utils::{fixtures::TestProject, mocks::TestWorkingCopy};
//!
//! #[tokio::test]
//! async fn test_capture() {
//!     let project = TestProject::new().with_file("a.txt", "Hello Foo").build();
//!     let service = project.history_service();
//!     let doc = TestWorkingCopy::file(project.path().join("a.txt"));
//!     // ...
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mocks;

// Re-export commonly used items
pub use fixtures::TestProject;
pub use mocks::{MockReader, TestWorkingCopy};

/// Install a test-friendly tracing subscriber once per test binary.
///
/// Output is captured by the test harness; `RUST_LOG` controls the level.
pub fn init_test_logging() {
    let _ = localhist_util::log::init(localhist_util::log::LogConfig {
        print: true,
        level: localhist_util::log::LogLevel::Debug,
        include_location: true,
        test_writer: true,
    });
}
