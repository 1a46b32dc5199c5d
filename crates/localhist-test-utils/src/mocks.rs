//! Mock implementations for testing.
//!
//! Provides working copies and read capabilities with scripted behavior, so
//! history service tests can drive failures and cancellation deterministically.

use async_trait::async_trait;
use localhist_core::{ResourceReader, WorkingCopy};
use localhist_storage::Resource;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// A working copy that only knows its resource.
#[derive(Debug, Clone)]
pub struct TestWorkingCopy {
    resource: Resource,
}

impl TestWorkingCopy {
    pub fn new(resource: Resource) -> Self {
        Self { resource }
    }

    /// A working copy of a local file.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::new(Resource::file(path))
    }
}

impl WorkingCopy for TestWorkingCopy {
    fn resource(&self) -> &Resource {
        &self.resource
    }
}

/// Scripted behavior for one read.
#[derive(Debug, Clone)]
enum Response {
    Bytes(Vec<u8>),
    Error(io::ErrorKind),
}

/// A read capability with configurable responses.
///
/// Records every resource read and can cancel a token or pause while reading.
///
/// # Example
///
/// ```rust
/// use localhist_storage::Resource;
/// use localhist_test_utils::mocks::MockReader;
///
/// let reader = MockReader::new()
///     .with_content(Resource::file("/a.txt"), "Hello")
///     .with_error(Resource::file("/locked.txt"), std::io::ErrorKind::PermissionDenied);
/// assert_eq!(reader.read_count(), 0);
/// ```
#[derive(Clone, Default)]
pub struct MockReader {
    responses: Arc<Mutex<HashMap<Resource, Response>>>,
    reads: Arc<Mutex<Vec<Resource>>>,
    cancel_on_read: Option<CancellationToken>,
    gate: Option<Arc<Notify>>,
}

impl MockReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `content` for `resource`.
    pub fn with_content(self, resource: Resource, content: impl AsRef<[u8]>) -> Self {
        self.set_content(resource, content);
        self
    }

    /// Fail reads of `resource` with `kind`.
    pub fn with_error(self, resource: Resource, kind: io::ErrorKind) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(resource, Response::Error(kind));
        self
    }

    /// Cancel `token` whenever a read happens.
    pub fn cancelling(mut self, token: CancellationToken) -> Self {
        self.cancel_on_read = Some(token);
        self
    }

    /// Block each read until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Change the content served for `resource`.
    pub fn set_content(&self, resource: Resource, content: impl AsRef<[u8]>) {
        self.responses
            .lock()
            .unwrap()
            .insert(resource, Response::Bytes(content.as_ref().to_vec()));
    }

    /// Number of reads performed.
    pub fn read_count(&self) -> usize {
        self.reads.lock().unwrap().len()
    }

    /// Resources read, in order.
    pub fn reads(&self) -> Vec<Resource> {
        self.reads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResourceReader for MockReader {
    async fn read(&self, resource: &Resource) -> io::Result<Vec<u8>> {
        self.reads.lock().unwrap().push(resource.clone());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(token) = &self.cancel_on_read {
            token.cancel();
        }

        let response = self.responses.lock().unwrap().get(resource).cloned();
        match response {
            Some(Response::Bytes(bytes)) => Ok(bytes),
            Some(Response::Error(kind)) => Err(io::Error::new(kind, "scripted read failure")),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no content scripted for {}", resource),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_reader_serves_and_records() {
        let a = Resource::file("/a.txt");
        let reader = MockReader::new().with_content(a.clone(), "Hello");

        assert_eq!(reader.read(&a).await.unwrap(), b"Hello");
        let err = reader.read(&Resource::file("/b.txt")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        assert_eq!(reader.read_count(), 2);
        assert_eq!(reader.reads()[0], a);
    }

    #[tokio::test]
    async fn test_mock_reader_cancels() {
        let token = CancellationToken::new();
        let a = Resource::file("/a.txt");
        let reader = MockReader::new()
            .with_content(a.clone(), "x")
            .cancelling(token.clone());

        reader.read(&a).await.unwrap();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_mock_reader_scripted_error() {
        let a = Resource::file("/a.txt");
        let reader = MockReader::new().with_error(a.clone(), io::ErrorKind::PermissionDenied);
        let err = reader.read(&a).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }
}
