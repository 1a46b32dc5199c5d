//! Shared utilities for localhist.
//!
//! This crate provides common utilities used across the localhist workspace:
//! - Error handling patterns
//! - ULID-based identifier generation
//! - Logging setup with tracing
//! - Path utilities

pub mod error;
pub mod id;
pub mod log;
pub mod path;

pub use error::{Error, ErrorKind, Result};
pub use id::{IdPrefix, Identifier};
